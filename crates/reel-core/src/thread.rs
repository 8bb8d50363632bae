//! Threads: the aggregate grouping every version of one deliverable between
//! one brand and one influencer on one campaign.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{actor::Role, entry::Source};

/// Aggregate status, derived from the thread's entries.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ThreadStatus {
  /// No live entries yet.
  #[default]
  Open,
  Submitted,
  Requested,
  NeedsChanges,
  Approved,
  Rejected,
}

/// The identity a thread is unique over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadKey {
  pub campaign_id:   i64,
  pub brand_id:      i64,
  pub influencer_id: i64,
}

/// The cached summary columns of a thread, recomputed on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThreadSummary {
  pub latest_status:  ThreadStatus,
  pub latest_version: u32,
  pub verified:       bool,
  pub manual_used:    bool,
  pub platform_used:  bool,
}

impl ThreadSummary {
  /// Mark the submission mode `source` as used.
  pub fn with_mode(mut self, source: Source) -> Self {
    match source {
      Source::Manual => self.manual_used = true,
      Source::Platform => self.platform_used = true,
    }
    self
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
  pub thread_id:  i64,
  #[serde(flatten)]
  pub key:        ThreadKey,
  #[serde(flatten)]
  pub summary:    ThreadSummary,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Thread {
  pub fn campaign_id(&self) -> i64 { self.key.campaign_id }

  pub fn brand_id(&self) -> i64 { self.key.brand_id }

  pub fn influencer_id(&self) -> i64 { self.key.influencer_id }

  pub fn status(&self) -> ThreadStatus { self.summary.latest_status }
}

// ─── Comments ────────────────────────────────────────────────────────────────

/// A free-text remark on a thread. Comments never affect status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:  i64,
  pub thread_id:   i64,
  pub author_role: Role,
  pub author_id:   i64,
  pub body:        String,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
  pub thread_id:   i64,
  pub author_role: Role,
  pub author_id:   i64,
  pub body:        String,
}
