//! [`SqliteStore`]: the SQLite implementation of [`ReviewStore`] and
//! [`CampaignDirectory`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use reel_core::{
  access::{ApplicationStatus, CampaignDirectory},
  entry::Entry,
  store::{Committed, ReviewStore, ThreadChange},
  thread::{Comment, NewComment, Thread, ThreadKey},
};

use crate::{
  Error, Result,
  encode::{
    COMMENT_COLUMNS, ENTRY_COLUMNS, RawComment, RawEntry, RawThread,
    THREAD_COLUMNS, decode_application_status, encode_asset, encode_dt,
    encode_metrics,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Reel review store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// An appended entry with every column already encoded, ready to move onto
/// the database thread.
struct EncodedEntry {
  version:       u32,
  root_entry_id: Option<i64>,
  submitted_by:  String,
  author_id:     i64,
  source:        String,
  media_kind:    String,
  metrics_json:  String,
  notes:         Option<String>,
  asset_json:    Option<String>,
  permalink:     Option<String>,
  status:        String,
}

/// Rows produced by a commit, decoded after the transaction closes.
struct RawCommitted {
  thread:   RawThread,
  appended: Vec<RawEntry>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn thread_where(
    &self,
    clause: &'static str,
    params: Vec<i64>,
  ) -> Result<Vec<Thread>> {
    let raws: Vec<RawThread> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads WHERE {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawThread::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawThread::into_thread).collect()
  }

  async fn entry_where(
    &self,
    clause: &'static str,
    params: Vec<i64>,
  ) -> Result<Vec<Entry>> {
    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }
}

fn select_thread(
  conn: &rusqlite::Connection,
  thread_id: i64,
) -> rusqlite::Result<Option<RawThread>> {
  conn
    .query_row(
      &format!("SELECT {THREAD_COLUMNS} FROM threads WHERE thread_id = ?1"),
      rusqlite::params![thread_id],
      RawThread::from_row,
    )
    .optional()
}

// ─── ReviewStore impl ────────────────────────────────────────────────────────

impl ReviewStore for SqliteStore {
  type Error = Error;

  // ── Threads ───────────────────────────────────────────────────────────────

  async fn find_or_create_thread(&self, key: ThreadKey) -> Result<Thread> {
    let now = encode_dt(Utc::now());

    let raw: RawThread = self
      .conn
      .call(move |conn| {
        // The UNIQUE key makes this race-free: a concurrent creator's row
        // wins and is read back below.
        conn.execute(
          "INSERT INTO threads (
             campaign_id, brand_id, influencer_id, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?4)
           ON CONFLICT (campaign_id, brand_id, influencer_id) DO NOTHING",
          rusqlite::params![
            key.campaign_id,
            key.brand_id,
            key.influencer_id,
            now
          ],
        )?;
        Ok(conn.query_row(
          &format!(
            "SELECT {THREAD_COLUMNS} FROM threads
             WHERE campaign_id = ?1 AND brand_id = ?2 AND influencer_id = ?3"
          ),
          rusqlite::params![key.campaign_id, key.brand_id, key.influencer_id],
          RawThread::from_row,
        )?)
      })
      .await?;

    raw.into_thread()
  }

  async fn get_thread(&self, thread_id: i64) -> Result<Option<Thread>> {
    Ok(
      self
        .thread_where("thread_id = ?1", vec![thread_id])
        .await?
        .into_iter()
        .next(),
    )
  }

  async fn list_threads(&self, campaign_id: i64) -> Result<Vec<Thread>> {
    self
      .thread_where("campaign_id = ?1 ORDER BY thread_id", vec![campaign_id])
      .await
  }

  // ── Entries ───────────────────────────────────────────────────────────────

  async fn list_entries(&self, thread_id: i64) -> Result<Vec<Entry>> {
    self
      .entry_where("thread_id = ?1 ORDER BY version", vec![thread_id])
      .await
  }

  async fn get_entry(&self, entry_id: i64) -> Result<Option<Entry>> {
    Ok(
      self
        .entry_where("entry_id = ?1", vec![entry_id])
        .await?
        .into_iter()
        .next(),
    )
  }

  async fn root_entry(&self, thread_id: i64) -> Result<Option<Entry>> {
    Ok(
      self
        .entry_where("thread_id = ?1 AND version = 1", vec![thread_id])
        .await?
        .into_iter()
        .next(),
    )
  }

  // ── Commit ────────────────────────────────────────────────────────────────

  async fn commit(&self, change: ThreadChange) -> Result<Committed> {
    let thread_id = change.thread_id;
    let expected = change.expected_version;
    let now = encode_dt(Utc::now());

    let mut appended = Vec::with_capacity(change.appended.len());
    for (offset, new) in change.appended.iter().enumerate() {
      let want = expected + offset as u32 + 1;
      if new.thread_id != thread_id || new.version != want {
        return Err(Error::MalformedChange(format!(
          "appended entry must be version {want} of thread {thread_id}"
        )));
      }
      appended.push(EncodedEntry {
        version:       new.version,
        root_entry_id: new.root_entry_id,
        submitted_by:  new.submitted_by.to_string(),
        author_id:     new.author_id,
        source:        new.category.source.to_string(),
        media_kind:    new.category.media_kind.to_string(),
        metrics_json:  encode_metrics(&new.metrics)?,
        notes:         new.notes.clone(),
        asset_json:    encode_asset(new.asset.as_ref())?,
        permalink:     new.permalink.clone(),
        status:        new.status.to_string(),
      });
    }

    let reviews: Vec<_> = change
      .reviews
      .into_iter()
      .map(|r| {
        (
          r.entry_id,
          r.status.to_string(),
          r.review.reviewed_by,
          r.review.note,
          encode_dt(r.review.reviewed_at),
        )
      })
      .collect();
    let discard = change.discard;
    let summary = change.summary;
    let latest_status = summary.latest_status.to_string();

    let outcome: Result<RawCommitted> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Returning early drops `tx`, which rolls everything back.
        let found: Option<u32> = tx
          .query_row(
            "SELECT latest_version FROM threads WHERE thread_id = ?1",
            rusqlite::params![thread_id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(found) = found else {
          return Ok(Err(Error::ThreadNotFound(thread_id)));
        };
        if found != expected {
          return Ok(Err(Error::VersionConflict {
            thread_id,
            expected,
            found,
          }));
        }

        for (entry_id, status, reviewed_by, note, reviewed_at) in reviews {
          let n = tx.execute(
            "UPDATE entries
             SET status = ?1, reviewed_by = ?2, review_note = ?3, reviewed_at = ?4
             WHERE entry_id = ?5 AND thread_id = ?6",
            rusqlite::params![
              status,
              reviewed_by,
              note,
              reviewed_at,
              entry_id,
              thread_id
            ],
          )?;
          if n != 1 {
            return Ok(Err(Error::ForeignEntry { entry_id, thread_id }));
          }
        }

        if let Some(entry_id) = discard {
          let n = tx.execute(
            "UPDATE entries SET deleted_at = ?1
             WHERE entry_id = ?2 AND thread_id = ?3",
            rusqlite::params![now, entry_id, thread_id],
          )?;
          if n != 1 {
            return Ok(Err(Error::ForeignEntry { entry_id, thread_id }));
          }
        }

        let mut ids = Vec::with_capacity(appended.len());
        for e in appended {
          tx.execute(
            "INSERT INTO entries (
               thread_id, parent_entry_id, version, submitted_by, author_id,
               source, media_kind, metrics_json, notes, asset_json, permalink,
               status, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            rusqlite::params![
              thread_id,
              e.root_entry_id,
              e.version,
              e.submitted_by,
              e.author_id,
              e.source,
              e.media_kind,
              e.metrics_json,
              e.notes,
              e.asset_json,
              e.permalink,
              e.status,
              now,
            ],
          )?;
          let entry_id = tx.last_insert_rowid();
          if e.root_entry_id.is_none() {
            tx.execute(
              "UPDATE entries SET parent_entry_id = entry_id WHERE entry_id = ?1",
              rusqlite::params![entry_id],
            )?;
          }
          ids.push(entry_id);
        }

        tx.execute(
          "UPDATE threads
           SET latest_status = ?1, latest_version = ?2, verified = ?3,
               manual_used = ?4, platform_used = ?5, updated_at = ?6
           WHERE thread_id = ?7",
          rusqlite::params![
            latest_status,
            summary.latest_version,
            summary.verified,
            summary.manual_used,
            summary.platform_used,
            now,
            thread_id,
          ],
        )?;

        let Some(thread) = select_thread(&tx, thread_id)? else {
          return Ok(Err(Error::ThreadNotFound(thread_id)));
        };
        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
          rows.push(tx.query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE entry_id = ?1"),
            rusqlite::params![id],
            RawEntry::from_row,
          )?);
        }

        tx.commit()?;
        Ok(Ok(RawCommitted { thread, appended: rows }))
      })
      .await?;

    let raw = outcome?;
    Ok(Committed {
      thread:   raw.thread.into_thread()?,
      appended: raw
        .appended
        .into_iter()
        .map(RawEntry::into_entry)
        .collect::<Result<_>>()?,
    })
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, comment: NewComment) -> Result<Comment> {
    let thread_id = comment.thread_id;
    let role = comment.author_role.to_string();
    let created_at = encode_dt(Utc::now());

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        if select_thread(conn, thread_id)?.is_none() {
          return Ok(None);
        }
        conn.execute(
          "INSERT INTO comments (thread_id, author_role, author_id, body, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            thread_id,
            role,
            comment.author_id,
            comment.body,
            created_at
          ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Some(conn.query_row(
          &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1"),
          rusqlite::params![id],
          RawComment::from_row,
        )?))
      })
      .await?;

    raw
      .ok_or(Error::ThreadNotFound(thread_id))?
      .into_comment()
  }

  async fn list_comments(&self, thread_id: i64) -> Result<Vec<Comment>> {
    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comments
           WHERE thread_id = ?1 ORDER BY comment_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![thread_id], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }
}

// ─── CampaignDirectory impl ──────────────────────────────────────────────────

impl CampaignDirectory for SqliteStore {
  type Error = Error;

  async fn campaign_owner(&self, campaign_id: i64) -> Result<Option<i64>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT brand_id FROM campaigns WHERE campaign_id = ?1",
                rusqlite::params![campaign_id],
                |r| r.get(0),
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn application_status(
    &self,
    campaign_id: i64,
    influencer_id: i64,
  ) -> Result<Option<ApplicationStatus>> {
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT status FROM applications
               WHERE campaign_id = ?1 AND influencer_id = ?2",
              rusqlite::params![campaign_id, influencer_id],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.as_deref().map(decode_application_status).transpose()
  }

  async fn upsert_campaign(&self, campaign_id: i64, brand_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO campaigns (campaign_id, brand_id) VALUES (?1, ?2)
           ON CONFLICT (campaign_id) DO UPDATE SET brand_id = excluded.brand_id",
          rusqlite::params![campaign_id, brand_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_application_status(
    &self,
    campaign_id: i64,
    influencer_id: i64,
    status: ApplicationStatus,
  ) -> Result<()> {
    let status = status.to_string();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO applications (campaign_id, influencer_id, status)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (campaign_id, influencer_id)
           DO UPDATE SET status = excluded.status",
          rusqlite::params![campaign_id, influencer_id, status],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
