//! Outbound notifications about committed changes.

use serde::Serialize;

use crate::{actor::Role, entry::EntryStatus, status::Decision};

/// Something that happened on a thread, emitted after the change committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReviewEvent {
  EntryAppended {
    thread_id: i64,
    entry_id:  i64,
    version:   u32,
    status:    EntryStatus,
    by:        Role,
  },
  EntriesReviewed {
    thread_id: i64,
    entry_ids: Vec<i64>,
    decision:  Decision,
  },
  EntryDiscarded {
    thread_id: i64,
    entry_id:  i64,
  },
  ThreadVerified {
    thread_id: i64,
  },
  CommentAdded {
    thread_id:  i64,
    comment_id: i64,
  },
}

/// Receives [`ReviewEvent`]s. Implementations must not block.
pub trait Notifier: Send + Sync {
  fn notify(&self, event: &ReviewEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
  fn notify(&self, _event: &ReviewEvent) {}
}
