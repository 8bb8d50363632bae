//! Fixtures shared by unit tests.

use chrono::Utc;

use crate::{
  actor::Role,
  entry::{Category, Entry, EntryStatus, MediaKind, Source},
  metrics::Metrics,
};

pub fn entry(id: i64, version: u32, parent: i64, status: EntryStatus) -> Entry {
  Entry {
    entry_id: id,
    thread_id: 1,
    parent_entry_id: parent,
    version,
    submitted_by: if status == EntryStatus::Requested {
      Role::Brand
    } else {
      Role::Influencer
    },
    author_id: 1,
    category: Category::new(Source::Manual, MediaKind::Post),
    metrics: Metrics::new(),
    notes: None,
    asset: None,
    permalink: None,
    status,
    review: None,
    created_at: Utc::now(),
    deleted_at: None,
  }
}
