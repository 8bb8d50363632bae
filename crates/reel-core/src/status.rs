//! Thread status derivation.
//!
//! A thread's status is never set directly. It is recomputed from the
//! thread's entries after every change and cached on the thread row.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  entry::{Entry, EntryStatus, NewEntry},
  thread::{ThreadStatus, ThreadSummary},
};

/// A brand's verdict in a review.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Decision {
  Approved,
  Rejected,
  NeedsChanges,
}

impl Decision {
  pub fn entry_status(self) -> EntryStatus {
    match self {
      Self::Approved => EntryStatus::Approved,
      Self::Rejected => EntryStatus::Rejected,
      Self::NeedsChanges => EntryStatus::NeedsChanges,
    }
  }
}

/// The part of an entry that status derivation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
  pub version: u32,
  pub status:  EntryStatus,
  pub live:    bool,
}

impl From<&Entry> for Snapshot {
  fn from(e: &Entry) -> Self {
    Self { version: e.version, status: e.status, live: e.is_live() }
  }
}

impl From<&NewEntry> for Snapshot {
  fn from(e: &NewEntry) -> Self {
    Self { version: e.version, status: e.status, live: true }
  }
}

fn mirror(status: EntryStatus) -> ThreadStatus {
  match status {
    EntryStatus::Submitted => ThreadStatus::Submitted,
    EntryStatus::NeedsChanges => ThreadStatus::NeedsChanges,
    EntryStatus::Approved => ThreadStatus::Approved,
    EntryStatus::Rejected => ThreadStatus::Rejected,
    EntryStatus::Requested => ThreadStatus::Requested,
  }
}

/// The thread mirrors its newest live entry; `Open` when there is none.
pub fn derive_status(entries: &[Snapshot]) -> ThreadStatus {
  entries
    .iter()
    .filter(|s| s.live)
    .max_by_key(|s| s.version)
    .map_or(ThreadStatus::Open, |s| mirror(s.status))
}

/// A thread is verified when it has at least one live entry and every live
/// entry is settled: either approved or rejected, or followed by a later live
/// version that superseded it.
pub fn is_verified(entries: &[Snapshot]) -> bool {
  let Some(newest) = entries
    .iter()
    .filter(|s| s.live)
    .map(|s| s.version)
    .max()
  else {
    return false;
  };

  entries
    .iter()
    .filter(|s| s.live)
    .all(|s| s.status.is_terminal() || s.version < newest)
}

/// Recompute the cached summary columns, keeping the mode flags of
/// `previous`.
pub fn summarize(previous: ThreadSummary, entries: &[Snapshot]) -> ThreadSummary {
  ThreadSummary {
    latest_status: derive_status(entries),
    latest_version: entries.iter().map(|s| s.version).max().unwrap_or(0),
    verified: is_verified(entries),
    ..previous
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn snap(version: u32, status: EntryStatus) -> Snapshot {
    Snapshot { version, status, live: true }
  }

  #[test]
  fn empty_thread_is_open_and_unverified() {
    assert_eq!(derive_status(&[]), ThreadStatus::Open);
    assert!(!is_verified(&[]));
  }

  #[test]
  fn status_mirrors_newest_live_entry() {
    let entries = [
      snap(1, EntryStatus::NeedsChanges),
      snap(2, EntryStatus::Requested),
    ];
    assert_eq!(derive_status(&entries), ThreadStatus::Requested);

    let mut with_deleted = entries.to_vec();
    with_deleted.push(Snapshot {
      version: 3,
      status:  EntryStatus::Submitted,
      live:    false,
    });
    assert_eq!(derive_status(&with_deleted), ThreadStatus::Requested);
  }

  #[test]
  fn verified_requires_settled_head() {
    assert!(is_verified(&[snap(1, EntryStatus::Approved)]));
    assert!(is_verified(&[snap(1, EntryStatus::Rejected)]));
    assert!(!is_verified(&[snap(1, EntryStatus::Submitted)]));
    assert!(!is_verified(&[snap(1, EntryStatus::NeedsChanges)]));
    assert!(!is_verified(&[
      snap(1, EntryStatus::Approved),
      snap(2, EntryStatus::Requested),
    ]));
  }

  #[test]
  fn superseded_outstanding_entries_do_not_block_verification() {
    let entries = [
      snap(1, EntryStatus::NeedsChanges),
      snap(2, EntryStatus::Requested),
      snap(3, EntryStatus::Approved),
    ];
    assert!(is_verified(&entries));
  }

  #[test]
  fn summarize_keeps_mode_flags() {
    let previous = ThreadSummary {
      manual_used: true,
      ..ThreadSummary::default()
    };
    let summary = summarize(previous, &[
      snap(1, EntryStatus::Submitted),
      Snapshot { version: 2, status: EntryStatus::Submitted, live: false },
    ]);
    assert!(summary.manual_used);
    assert!(!summary.platform_used);
    assert_eq!(summary.latest_version, 2);
    assert_eq!(summary.latest_status, ThreadStatus::Submitted);
    assert!(!summary.verified);
  }
}
