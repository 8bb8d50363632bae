//! Error type for `reel-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A text column held a value no enum variant answers to.
  #[error("unknown {column} value: {value:?}")]
  UnknownVariant { column: &'static str, value: String },

  #[error("thread not found: {0}")]
  ThreadNotFound(i64),

  /// The thread's `latest_version` moved between planning and commit.
  #[error(
    "version conflict on thread {thread_id}: expected {expected}, found {found}"
  )]
  VersionConflict {
    thread_id: i64,
    expected:  u32,
    found:     u32,
  },

  #[error("entry {entry_id} does not belong to thread {thread_id}")]
  ForeignEntry { entry_id: i64, thread_id: i64 },

  #[error("malformed change: {0}")]
  MalformedChange(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
