//! In-memory implementation of [`ReviewStore`] and [`CampaignDirectory`].
//!
//! All state lives behind one mutex and is lost on drop. Used by tests and
//! by embedders that do not need durability.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use thiserror::Error;

use crate::{
  access::{ApplicationStatus, CampaignDirectory},
  entry::Entry,
  store::{Committed, ReviewStore, ThreadChange},
  thread::{Comment, NewComment, Thread, ThreadKey, ThreadSummary},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("thread not found: {0}")]
  ThreadNotFound(i64),

  #[error("entry {entry_id} does not belong to thread {thread_id}")]
  ForeignEntry { entry_id: i64, thread_id: i64 },

  #[error(
    "version conflict on thread {thread_id}: expected {expected}, found {found}"
  )]
  VersionConflict {
    thread_id: i64,
    expected:  u32,
    found:     u32,
  },

  #[error("malformed change: {0}")]
  MalformedChange(String),
}

#[derive(Debug, Default)]
struct Tables {
  last_id:      i64,
  threads:      BTreeMap<i64, Thread>,
  entries:      BTreeMap<i64, Entry>,
  comments:     Vec<Comment>,
  campaigns:    HashMap<i64, i64>,
  applications: HashMap<(i64, i64), ApplicationStatus>,
}

impl Tables {
  fn next_id(&mut self) -> i64 {
    self.last_id += 1;
    self.last_id
  }

  fn check_member(&self, entry_id: i64, thread_id: i64) -> Result<(), MemoryError> {
    match self.entries.get(&entry_id) {
      Some(e) if e.thread_id == thread_id => Ok(()),
      _ => Err(MemoryError::ForeignEntry { entry_id, thread_id }),
    }
  }
}

/// A volatile store. Cloning is cheap and clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
  tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
  pub fn new() -> Self { Self::default() }

  fn tables(&self) -> MutexGuard<'_, Tables> {
    self.tables.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl ReviewStore for InMemoryStore {
  type Error = MemoryError;

  async fn find_or_create_thread(&self, key: ThreadKey) -> Result<Thread, MemoryError> {
    let mut t = self.tables();
    if let Some(existing) = t.threads.values().find(|th| th.key == key) {
      return Ok(existing.clone());
    }

    let now = Utc::now();
    let thread = Thread {
      thread_id: t.next_id(),
      key,
      summary: ThreadSummary::default(),
      created_at: now,
      updated_at: now,
    };
    t.threads.insert(thread.thread_id, thread.clone());
    Ok(thread)
  }

  async fn get_thread(&self, thread_id: i64) -> Result<Option<Thread>, MemoryError> {
    Ok(self.tables().threads.get(&thread_id).cloned())
  }

  async fn list_threads(&self, campaign_id: i64) -> Result<Vec<Thread>, MemoryError> {
    Ok(
      self
        .tables()
        .threads
        .values()
        .filter(|th| th.campaign_id() == campaign_id)
        .cloned()
        .collect(),
    )
  }

  async fn list_entries(&self, thread_id: i64) -> Result<Vec<Entry>, MemoryError> {
    let mut entries: Vec<Entry> = self
      .tables()
      .entries
      .values()
      .filter(|e| e.thread_id == thread_id)
      .cloned()
      .collect();
    entries.sort_by_key(|e| e.version);
    Ok(entries)
  }

  async fn get_entry(&self, entry_id: i64) -> Result<Option<Entry>, MemoryError> {
    Ok(self.tables().entries.get(&entry_id).cloned())
  }

  async fn root_entry(&self, thread_id: i64) -> Result<Option<Entry>, MemoryError> {
    Ok(
      self
        .tables()
        .entries
        .values()
        .find(|e| e.thread_id == thread_id && e.version == 1)
        .cloned(),
    )
  }

  async fn commit(&self, change: ThreadChange) -> Result<Committed, MemoryError> {
    let mut t = self.tables();
    let thread_id = change.thread_id;

    // Validate everything before touching any table.
    let found = t
      .threads
      .get(&thread_id)
      .ok_or(MemoryError::ThreadNotFound(thread_id))?
      .summary
      .latest_version;
    if found != change.expected_version {
      return Err(MemoryError::VersionConflict {
        thread_id,
        expected: change.expected_version,
        found,
      });
    }
    for r in &change.reviews {
      t.check_member(r.entry_id, thread_id)?;
    }
    if let Some(id) = change.discard {
      t.check_member(id, thread_id)?;
    }
    for (offset, new) in change.appended.iter().enumerate() {
      let want = change.expected_version + offset as u32 + 1;
      if new.thread_id != thread_id || new.version != want {
        return Err(MemoryError::MalformedChange(format!(
          "appended entry must be version {want} of thread {thread_id}"
        )));
      }
    }

    let now = Utc::now();
    for r in change.reviews {
      if let Some(e) = t.entries.get_mut(&r.entry_id) {
        e.status = r.status;
        e.review = Some(r.review);
      }
    }
    if let Some(id) = change.discard
      && let Some(e) = t.entries.get_mut(&id)
    {
      e.deleted_at = Some(now);
    }

    let mut appended = Vec::with_capacity(change.appended.len());
    for new in change.appended {
      let entry_id = t.next_id();
      let entry = Entry {
        entry_id,
        thread_id,
        parent_entry_id: new.root_entry_id.unwrap_or(entry_id),
        version: new.version,
        submitted_by: new.submitted_by,
        author_id: new.author_id,
        category: new.category,
        metrics: new.metrics,
        notes: new.notes,
        asset: new.asset,
        permalink: new.permalink,
        status: new.status,
        review: None,
        created_at: now,
        deleted_at: None,
      };
      t.entries.insert(entry_id, entry.clone());
      appended.push(entry);
    }

    let thread = t
      .threads
      .get_mut(&thread_id)
      .ok_or(MemoryError::ThreadNotFound(thread_id))?;
    thread.summary = change.summary;
    thread.updated_at = now;

    Ok(Committed { thread: thread.clone(), appended })
  }

  async fn add_comment(&self, comment: NewComment) -> Result<Comment, MemoryError> {
    let mut t = self.tables();
    if !t.threads.contains_key(&comment.thread_id) {
      return Err(MemoryError::ThreadNotFound(comment.thread_id));
    }
    let stored = Comment {
      comment_id:  t.next_id(),
      thread_id:   comment.thread_id,
      author_role: comment.author_role,
      author_id:   comment.author_id,
      body:        comment.body,
      created_at:  Utc::now(),
    };
    t.comments.push(stored.clone());
    Ok(stored)
  }

  async fn list_comments(&self, thread_id: i64) -> Result<Vec<Comment>, MemoryError> {
    Ok(
      self
        .tables()
        .comments
        .iter()
        .filter(|c| c.thread_id == thread_id)
        .cloned()
        .collect(),
    )
  }
}

impl CampaignDirectory for InMemoryStore {
  type Error = MemoryError;

  async fn campaign_owner(&self, campaign_id: i64) -> Result<Option<i64>, MemoryError> {
    Ok(self.tables().campaigns.get(&campaign_id).copied())
  }

  async fn application_status(
    &self,
    campaign_id: i64,
    influencer_id: i64,
  ) -> Result<Option<ApplicationStatus>, MemoryError> {
    Ok(
      self
        .tables()
        .applications
        .get(&(campaign_id, influencer_id))
        .copied(),
    )
  }

  async fn upsert_campaign(&self, campaign_id: i64, brand_id: i64) -> Result<(), MemoryError> {
    self.tables().campaigns.insert(campaign_id, brand_id);
    Ok(())
  }

  async fn set_application_status(
    &self,
    campaign_id: i64,
    influencer_id: i64,
    status: ApplicationStatus,
  ) -> Result<(), MemoryError> {
    self
      .tables()
      .applications
      .insert((campaign_id, influencer_id), status);
    Ok(())
  }
}
