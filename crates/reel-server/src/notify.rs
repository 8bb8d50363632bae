//! Review events written to the tracing log.

use reel_core::notify::{Notifier, ReviewEvent};
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  fn notify(&self, event: &ReviewEvent) {
    match event {
      ReviewEvent::EntryAppended { thread_id, entry_id, version, status, by } => {
        info!(thread_id, entry_id, version, %status, %by, "entry appended");
      }
      ReviewEvent::EntriesReviewed { thread_id, entry_ids, decision } => {
        info!(thread_id, ?entry_ids, %decision, "entries reviewed");
      }
      ReviewEvent::EntryDiscarded { thread_id, entry_id } => {
        info!(thread_id, entry_id, "entry discarded");
      }
      ReviewEvent::ThreadVerified { thread_id } => {
        info!(thread_id, "thread verified");
      }
      ReviewEvent::CommentAdded { thread_id, comment_id } => {
        info!(thread_id, comment_id, "comment added");
      }
    }
  }
}
