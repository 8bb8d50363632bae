//! JSON REST API for Reel.
//!
//! Exposes an axum [`Router`] over a [`ReviewDesk`] whose store also serves
//! as its campaign directory. The acting party is read from the
//! `x-actor-id` / `x-actor-role` headers; authenticating the caller, TLS,
//! and transport concerns are the embedder's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", reel_api::api_router(desk.clone(), files.clone()))
//! ```

pub mod actor;
pub mod admin;
pub mod assets;
pub mod entries;
pub mod error;
pub mod reviews;
pub mod storage;
pub mod threads;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use reel_core::{ReviewDesk, access::CampaignDirectory, store::ReviewStore};

pub use actor::ActingAs;
pub use error::ApiError;
pub use storage::LocalFileStorage;

/// A persistence backend that also answers campaign directory lookups.
pub trait Backend: ReviewStore + CampaignDirectory + 'static {}

impl<T> Backend for T where T: ReviewStore + CampaignDirectory + 'static {}

/// Shared state threaded through all API handlers.
pub struct ApiState<B> {
  pub desk:  Arc<ReviewDesk<B, B>>,
  pub files: Arc<LocalFileStorage>,
}

impl<B> Clone for ApiState<B> {
  fn clone(&self) -> Self {
    Self {
      desk:  self.desk.clone(),
      files: self.files.clone(),
    }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<B: Backend>(
  desk: Arc<ReviewDesk<B, B>>,
  files: Arc<LocalFileStorage>,
) -> Router<()> {
  Router::new()
    // Campaign-scoped
    .route("/campaigns/{campaign_id}/entries", post(entries::submit::<B>))
    .route("/campaigns/{campaign_id}/threads", get(threads::list::<B>))
    .route("/campaigns/{campaign_id}/requests", post(reviews::request::<B>))
    // Threads
    .route("/threads/{thread_id}", get(threads::get_one::<B>))
    .route("/threads/{thread_id}/entries", get(threads::entries::<B>))
    .route("/threads/{thread_id}/verify", post(threads::verify::<B>))
    .route(
      "/threads/{thread_id}/comments",
      get(threads::comments::<B>).post(threads::add_comment::<B>),
    )
    // Entries
    .route("/entries/{entry_id}", axum::routing::delete(entries::discard::<B>))
    .route("/entries/{entry_id}/replace", post(entries::replace::<B>))
    .route("/entries/{entry_id}/restore", post(entries::restore::<B>))
    .route("/entries/{entry_id}/versions", get(entries::versions::<B>))
    .route(
      "/entries/{entry_id}/request-changes",
      post(reviews::request_changes::<B>),
    )
    // Review
    .route("/reviews", post(reviews::review::<B>))
    // Assets
    .route("/assets", post(assets::upload::<B>))
    // Directory seeding
    .route("/admin/campaigns/{campaign_id}", put(admin::upsert_campaign::<B>))
    .route(
      "/admin/campaigns/{campaign_id}/applications/{influencer_id}",
      put(admin::set_application::<B>),
    )
    .with_state(ApiState { desk, files })
}
