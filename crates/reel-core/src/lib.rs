//! Core types and the review workflow for reel.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Persistence, campaign lookup, file storage, and notification are traits
//! the embedding application implements.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod actor;
pub mod asset;
pub mod desk;
pub mod entry;
pub mod error;
pub mod locks;
pub mod memory;
pub mod metrics;
pub mod notify;
mod request;
pub mod status;
pub mod store;
pub mod thread;
pub mod version;

pub use desk::{ReviewDesk, ReviewOutcome};
pub use error::{Error, Result};

#[cfg(test)]
mod testing;
