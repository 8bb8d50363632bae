//! Entries: one version of a deliverable within a thread.
//!
//! Substantive content (category, metrics, media) is never updated once
//! written; edits always append a new version. Only the review fields and the
//! soft-delete stamp change in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, actor::Role, asset::AssetRef, metrics::Metrics};

// ─── Category ────────────────────────────────────────────────────────────────

/// How the content of an entry was obtained.
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
pub enum Source {
  /// Uploaded or typed in by the influencer.
  Manual,
  /// Pulled from the social platform (a live post with platform insights).
  Platform,
}

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
pub enum MediaKind {
  Post,
  Reel,
  Story,
  Video,
}

/// What kind of deliverable an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub source:     Source,
  pub media_kind: MediaKind,
}

impl Category {
  pub fn new(source: Source, media_kind: MediaKind) -> Self {
    Self { source, media_kind }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

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
pub enum EntryStatus {
  Submitted,
  NeedsChanges,
  Approved,
  Rejected,
  /// A brand request card awaiting the influencer's answer.
  Requested,
}

impl EntryStatus {
  /// A final review outcome.
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Approved | Self::Rejected)
  }

  /// Statuses a brand decision may move an entry away from.
  pub fn is_reviewable(self) -> bool {
    matches!(self, Self::Submitted | Self::Requested)
  }
}

/// A brand's decision over an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
  pub reviewed_by: i64,
  pub note:        Option<String>,
  pub reviewed_at: DateTime<Utc>,
}

// ─── Entry ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
  pub entry_id:        i64,
  pub thread_id:       i64,
  /// Root of the version chain this entry belongs to. A root points at
  /// itself.
  pub parent_entry_id: i64,
  pub version:         u32,
  pub submitted_by:    Role,
  pub author_id:       i64,
  pub category:        Category,
  pub metrics:         Metrics,
  pub notes:           Option<String>,
  pub asset:           Option<AssetRef>,
  pub permalink:       Option<String>,
  pub status:          EntryStatus,
  pub review:          Option<Review>,
  pub created_at:      DateTime<Utc>,
  pub deleted_at:      Option<DateTime<Utc>>,
}

impl Entry {
  pub fn is_root(&self) -> bool { self.parent_entry_id == self.entry_id }

  pub fn is_live(&self) -> bool { self.deleted_at.is_none() }

  /// Whether the entry carries anything an influencer produced.
  pub fn has_content(&self) -> bool {
    self.asset.is_some() || self.permalink.is_some() || !self.metrics.is_empty()
  }
}

// ─── NewEntry ────────────────────────────────────────────────────────────────

/// An entry about to be appended. Ids and timestamps are set by the store.
#[derive(Debug, Clone)]
pub struct NewEntry {
  pub thread_id:     i64,
  pub version:       u32,
  /// Chain root to attach to; `None` makes the new entry a root of its own.
  pub root_entry_id: Option<i64>,
  pub submitted_by:  Role,
  pub author_id:     i64,
  pub category:      Category,
  pub metrics:       Metrics,
  pub notes:         Option<String>,
  pub asset:         Option<AssetRef>,
  pub permalink:     Option<String>,
  pub status:        EntryStatus,
}

impl NewEntry {
  /// An influencer submission carrying `content`.
  pub fn submission(
    thread_id: i64,
    version: u32,
    root_entry_id: Option<i64>,
    author_id: i64,
    content: Submission,
  ) -> Self {
    Self {
      thread_id,
      version,
      root_entry_id,
      submitted_by: Role::Influencer,
      author_id,
      category: content.category,
      metrics: content.metrics,
      notes: content.notes,
      asset: content.asset,
      permalink: content.permalink,
      status: EntryStatus::Submitted,
    }
  }

  /// A brand request card: no content, the note is the instruction.
  pub fn request_card(
    thread_id: i64,
    version: u32,
    root_entry_id: Option<i64>,
    brand_id: i64,
    category: Category,
    note: Option<String>,
  ) -> Self {
    Self {
      thread_id,
      version,
      root_entry_id,
      submitted_by: Role::Brand,
      author_id: brand_id,
      category,
      metrics: Metrics::new(),
      notes: note,
      asset: None,
      permalink: None,
      status: EntryStatus::Requested,
    }
  }
}

// ─── Payloads ────────────────────────────────────────────────────────────────

/// Content of an influencer submission.
#[derive(Debug, Clone)]
pub struct Submission {
  pub category:  Category,
  pub metrics:   Metrics,
  pub notes:     Option<String>,
  pub asset:     Option<AssetRef>,
  pub permalink: Option<String>,
}

impl Submission {
  pub fn new(category: Category) -> Self {
    Self {
      category,
      metrics: Metrics::new(),
      notes: None,
      asset: None,
      permalink: None,
    }
  }

  pub fn validate(&self) -> Result<()> {
    self.metrics.check_kind(self.category.media_kind)?;

    if let Some(link) = &self.permalink
      && !(link.starts_with("https://") || link.starts_with("http://"))
    {
      return Err(Error::validation(format!(
        "permalink {link:?} is not an http(s) url"
      )));
    }

    if self.category.source == Source::Platform && self.permalink.is_none() {
      return Err(Error::validation(
        "platform-sourced submissions need a permalink",
      ));
    }

    if self.asset.is_none() && self.permalink.is_none() && self.metrics.is_empty()
    {
      return Err(Error::validation(
        "submission carries no asset, permalink, or metrics",
      ));
    }

    Ok(())
  }
}

/// A partial replacement: fields left `None` are inherited from the entry
/// being replaced.
#[derive(Debug, Clone, Default)]
pub struct Amendment {
  pub metrics:   Option<Metrics>,
  pub notes:     Option<String>,
  pub asset:     Option<AssetRef>,
  pub permalink: Option<String>,
}

impl Amendment {
  pub fn apply_to(self, base: &Entry) -> Submission {
    Submission {
      category:  base.category,
      metrics:   self.metrics.unwrap_or_else(|| base.metrics.clone()),
      notes:     self.notes.or_else(|| base.notes.clone()),
      asset:     self.asset.or_else(|| base.asset.clone()),
      permalink: self.permalink.or_else(|| base.permalink.clone()),
    }
  }
}

/// Options for re-publishing an older version as the newest one.
#[derive(Debug, Clone, Default)]
pub struct Restore {
  /// Replaces the restored entry's notes when set.
  pub notes: Option<String>,
}

impl Restore {
  pub fn apply_to(self, base: &Entry) -> Submission {
    Submission {
      category:  base.category,
      metrics:   base.metrics.clone(),
      notes:     self.notes.or_else(|| base.notes.clone()),
      asset:     base.asset.clone(),
      permalink: base.permalink.clone(),
    }
  }
}
