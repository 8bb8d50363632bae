//! Error types for `reel-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The actor lacks the campaign relationship the operation requires.
  #[error("not authorized: {0}")]
  NotAuthorized(String),

  #[error("thread not found: {0}")]
  ThreadNotFound(i64),

  #[error("entry not found: {0}")]
  EntryNotFound(i64),

  #[error("campaign not found: {0}")]
  CampaignNotFound(i64),

  #[error("invalid state: {0}")]
  InvalidState(String),

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// A failure reported by a persistence or lookup collaborator, passed
  /// through untouched.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn unauthorized(msg: impl Into<String>) -> Self {
    Self::NotAuthorized(msg.into())
  }

  pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
    Self::InvalidState(msg.into())
  }

  pub(crate) fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
