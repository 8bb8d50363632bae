//! Version chains: allocation of the next version number and parent link, and
//! the read view over one chain.
//!
//! Versions are numbered per thread, `1..=N` with no gaps. Each entry points
//! at the root of its chain; a root points at itself. A thread normally holds
//! a single chain rooted at version 1, and a brand may open a fresh chain
//! after approving a deliverable.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  entry::{Entry, EntryStatus},
};

/// What the next append needs to know about a thread's existing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainHead {
  /// Root of the chain the newest entry belongs to; `None` for an empty
  /// thread.
  pub root_id:        Option<i64>,
  /// Highest version allocated so far, soft-deleted entries included.
  pub latest_version: u32,
  /// Status of the newest live entry.
  pub latest_status:  Option<EntryStatus>,
}

impl ChainHead {
  pub fn of(entries: &[Entry]) -> Self {
    let newest = entries.iter().max_by_key(|e| e.version);
    let newest_live = entries
      .iter()
      .filter(|e| e.is_live())
      .max_by_key(|e| e.version);

    Self {
      root_id:        newest.map(|e| e.parent_entry_id),
      latest_version: newest.map_or(0, |e| e.version),
      latest_status:  newest_live.map(|e| e.status),
    }
  }

  pub fn next_version(&self) -> u32 { self.latest_version + 1 }
}

/// Whether `entries` (one thread, any order) satisfy the numbering
/// invariants: versions `1..=N` without gaps or repeats, every root
/// self-parented, and every other entry parented by an earlier root.
pub fn is_well_formed(entries: &[Entry]) -> bool {
  let mut sorted: Vec<&Entry> = entries.iter().collect();
  sorted.sort_by_key(|e| e.version);

  let mut roots = Vec::new();
  for (i, e) in sorted.iter().enumerate() {
    if e.version as usize != i + 1 {
      return false;
    }
    if e.is_root() {
      roots.push(e.entry_id);
    } else if !roots.contains(&e.parent_entry_id) {
      return false;
    }
  }
  sorted.first().is_none_or(|first| first.is_root())
}

// ─── Read view ───────────────────────────────────────────────────────────────

/// The live versions of one chain, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionChain {
  pub root_id:    i64,
  /// The newest live version in the chain.
  pub current_id: i64,
  pub versions:   Vec<Entry>,
}

impl VersionChain {
  /// Assemble the chain containing `entry_id` from all of a thread's
  /// entries. Soft-deleted versions are left out.
  pub fn assemble(entries: Vec<Entry>, entry_id: i64) -> Result<Self> {
    let root_id = entries
      .iter()
      .find(|e| e.entry_id == entry_id)
      .map(|e| e.parent_entry_id)
      .ok_or(Error::EntryNotFound(entry_id))?;

    let mut versions: Vec<Entry> = entries
      .into_iter()
      .filter(|e| e.parent_entry_id == root_id && e.is_live())
      .collect();
    versions.sort_by_key(|e| e.version);

    let current_id = versions.last().map_or(entry_id, |e| e.entry_id);
    Ok(Self { root_id, current_id, versions })
  }
}
