//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Enums are stored as their
//! snake_case names. Metrics and asset references are stored as compact
//! JSON.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use reel_core::{
  access::ApplicationStatus,
  asset::AssetRef,
  entry::{Category, Entry, Review},
  metrics::Metrics,
  thread::{Comment, Thread, ThreadKey, ThreadSummary},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Parse a snake_case enum column.
pub fn decode_enum<T>(column: &'static str, s: &str) -> Result<T>
where
  T: FromStr<Err = strum::ParseError>,
{
  s.parse().map_err(|_| Error::UnknownVariant {
    column,
    value: s.to_owned(),
  })
}

pub fn decode_application_status(s: &str) -> Result<ApplicationStatus> {
  decode_enum("application status", s)
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_metrics(m: &Metrics) -> Result<String> {
  Ok(serde_json::to_string(m)?)
}

pub fn encode_asset(a: Option<&AssetRef>) -> Result<Option<String>> {
  Ok(a.map(serde_json::to_string).transpose()?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawThread::from_row`].
pub const THREAD_COLUMNS: &str = "thread_id, campaign_id, brand_id, \
   influencer_id, latest_status, latest_version, verified, manual_used, \
   platform_used, created_at, updated_at";

/// Raw values read directly from a `threads` row.
pub struct RawThread {
  pub thread_id:      i64,
  pub campaign_id:    i64,
  pub brand_id:       i64,
  pub influencer_id:  i64,
  pub latest_status:  String,
  pub latest_version: u32,
  pub verified:       bool,
  pub manual_used:    bool,
  pub platform_used:  bool,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawThread {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      thread_id:      row.get(0)?,
      campaign_id:    row.get(1)?,
      brand_id:       row.get(2)?,
      influencer_id:  row.get(3)?,
      latest_status:  row.get(4)?,
      latest_version: row.get(5)?,
      verified:       row.get(6)?,
      manual_used:    row.get(7)?,
      platform_used:  row.get(8)?,
      created_at:     row.get(9)?,
      updated_at:     row.get(10)?,
    })
  }

  pub fn into_thread(self) -> Result<Thread> {
    Ok(Thread {
      thread_id:  self.thread_id,
      key:        ThreadKey {
        campaign_id:   self.campaign_id,
        brand_id:      self.brand_id,
        influencer_id: self.influencer_id,
      },
      summary:    ThreadSummary {
        latest_status:  decode_enum("thread status", &self.latest_status)?,
        latest_version: self.latest_version,
        verified:       self.verified,
        manual_used:    self.manual_used,
        platform_used:  self.platform_used,
      },
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawEntry::from_row`].
pub const ENTRY_COLUMNS: &str = "entry_id, thread_id, parent_entry_id, \
   version, submitted_by, author_id, source, media_kind, metrics_json, notes, \
   asset_json, permalink, status, reviewed_by, review_note, reviewed_at, \
   created_at, deleted_at";

/// Raw values read directly from an `entries` row.
pub struct RawEntry {
  pub entry_id:        i64,
  pub thread_id:       i64,
  pub parent_entry_id: i64,
  pub version:         u32,
  pub submitted_by:    String,
  pub author_id:       i64,
  pub source:          String,
  pub media_kind:      String,
  pub metrics_json:    String,
  pub notes:           Option<String>,
  pub asset_json:      Option<String>,
  pub permalink:       Option<String>,
  pub status:          String,
  // review columns, all set or all null
  pub reviewed_by:     Option<i64>,
  pub review_note:     Option<String>,
  pub reviewed_at:     Option<String>,
  pub created_at:      String,
  pub deleted_at:      Option<String>,
}

impl RawEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:        row.get(0)?,
      thread_id:       row.get(1)?,
      parent_entry_id: row.get(2)?,
      version:         row.get(3)?,
      submitted_by:    row.get(4)?,
      author_id:       row.get(5)?,
      source:          row.get(6)?,
      media_kind:      row.get(7)?,
      metrics_json:    row.get(8)?,
      notes:           row.get(9)?,
      asset_json:      row.get(10)?,
      permalink:       row.get(11)?,
      status:          row.get(12)?,
      reviewed_by:     row.get(13)?,
      review_note:     row.get(14)?,
      reviewed_at:     row.get(15)?,
      created_at:      row.get(16)?,
      deleted_at:      row.get(17)?,
    })
  }

  pub fn into_entry(self) -> Result<Entry> {
    let review = match (self.reviewed_by, self.reviewed_at) {
      (Some(reviewed_by), Some(at)) => Some(Review {
        reviewed_by,
        note: self.review_note,
        reviewed_at: decode_dt(&at)?,
      }),
      _ => None,
    };

    let asset = self
      .asset_json
      .as_deref()
      .map(serde_json::from_str::<AssetRef>)
      .transpose()?;

    Ok(Entry {
      entry_id: self.entry_id,
      thread_id: self.thread_id,
      parent_entry_id: self.parent_entry_id,
      version: self.version,
      submitted_by: decode_enum("role", &self.submitted_by)?,
      author_id: self.author_id,
      category: Category {
        source:     decode_enum("source", &self.source)?,
        media_kind: decode_enum("media kind", &self.media_kind)?,
      },
      metrics: serde_json::from_str(&self.metrics_json)?,
      notes: self.notes,
      asset,
      permalink: self.permalink,
      status: decode_enum("entry status", &self.status)?,
      review,
      created_at: decode_dt(&self.created_at)?,
      deleted_at: self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Column list matching [`RawComment::from_row`].
pub const COMMENT_COLUMNS: &str =
  "comment_id, thread_id, author_role, author_id, body, created_at";

/// Raw values read directly from a `comments` row.
pub struct RawComment {
  pub comment_id:  i64,
  pub thread_id:   i64,
  pub author_role: String,
  pub author_id:   i64,
  pub body:        String,
  pub created_at:  String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id:  row.get(0)?,
      thread_id:   row.get(1)?,
      author_role: row.get(2)?,
      author_id:   row.get(3)?,
      body:        row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id:  self.comment_id,
      thread_id:   self.thread_id,
      author_role: decode_enum("role", &self.author_role)?,
      author_id:   self.author_id,
      body:        self.body,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
