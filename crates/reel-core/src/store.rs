//! The `ReviewStore` trait and the atomic change set it commits.
//!
//! The trait is implemented by storage backends (`reel-store-sqlite`, and the
//! in-memory store in [`crate::memory`]). [`crate::desk::ReviewDesk`] plans
//! every mutation as a [`ThreadChange`]; the backend applies it as one unit.

use std::future::Future;

use crate::{
  entry::{Entry, EntryStatus, NewEntry, Review},
  thread::{Comment, NewComment, Thread, ThreadKey, ThreadSummary},
};

// ─── Change set ──────────────────────────────────────────────────────────────

/// A brand decision to record on an existing entry.
#[derive(Debug, Clone)]
pub struct EntryReview {
  pub entry_id: i64,
  pub status:   EntryStatus,
  pub review:   Review,
}

/// Everything one logical operation changes on a thread.
///
/// Backends must apply a change atomically: reviews, the soft-delete stamp,
/// appended entries, and the new summary become visible together or not at
/// all.
#[derive(Debug, Clone)]
pub struct ThreadChange {
  pub thread_id:        i64,
  /// The `latest_version` the change was planned against. Backends reject
  /// the commit if the thread has moved on since.
  pub expected_version: u32,
  pub reviews:          Vec<EntryReview>,
  /// Entry to soft-delete.
  pub discard:          Option<i64>,
  /// New entries, in version order, numbered from `expected_version + 1`.
  pub appended:         Vec<NewEntry>,
  pub summary:          ThreadSummary,
}

impl ThreadChange {
  pub fn new(thread_id: i64, expected_version: u32, summary: ThreadSummary) -> Self {
    Self {
      thread_id,
      expected_version,
      reviews: Vec::new(),
      discard: None,
      appended: Vec::new(),
      summary,
    }
  }
}

/// What a committed [`ThreadChange`] produced.
#[derive(Debug, Clone)]
pub struct Committed {
  pub thread:   Thread,
  /// The appended entries as persisted, ids and parents resolved.
  pub appended: Vec<Entry>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Persistence for threads, entries, and comments.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ReviewStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Threads ───────────────────────────────────────────────────────────

  /// Return the thread for `key`, creating it if none exists. Must never
  /// create a second thread for the same key.
  fn find_or_create_thread(
    &self,
    key: ThreadKey,
  ) -> impl Future<Output = Result<Thread, Self::Error>> + Send + '_;

  fn get_thread(
    &self,
    thread_id: i64,
  ) -> impl Future<Output = Result<Option<Thread>, Self::Error>> + Send + '_;

  /// All threads on a campaign, oldest first.
  fn list_threads(
    &self,
    campaign_id: i64,
  ) -> impl Future<Output = Result<Vec<Thread>, Self::Error>> + Send + '_;

  // ── Entries ───────────────────────────────────────────────────────────

  /// All entries of a thread ordered by version ascending, soft-deleted
  /// entries included.
  fn list_entries(
    &self,
    thread_id: i64,
  ) -> impl Future<Output = Result<Vec<Entry>, Self::Error>> + Send + '_;

  fn get_entry(
    &self,
    entry_id: i64,
  ) -> impl Future<Output = Result<Option<Entry>, Self::Error>> + Send + '_;

  /// The entry with `version = 1` for a thread.
  fn root_entry(
    &self,
    thread_id: i64,
  ) -> impl Future<Output = Result<Option<Entry>, Self::Error>> + Send + '_;

  /// Apply `change` atomically. A root entry (`root_entry_id == None`) is
  /// stored as its own parent.
  fn commit(
    &self,
    change: ThreadChange,
  ) -> impl Future<Output = Result<Committed, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn add_comment(
    &self,
    comment: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Comments on a thread, oldest first.
  fn list_comments(
    &self,
    thread_id: i64,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;
}
