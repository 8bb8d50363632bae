//! [`ReviewDesk`]: the operations callers use to move deliverables through
//! review.
//!
//! Every mutation follows the same path: gate the actor, take the thread's
//! lock, reload the thread and its entries, plan a [`ThreadChange`], and
//! commit it in one step. Status is never written directly; it is derived
//! from the planned entries by [`crate::status`].

use std::{collections::BTreeSet, sync::Arc};

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::{
  Error, Result,
  access::{
    CampaignDirectory, ensure_brand_owns_campaign, ensure_can_contribute,
    ensure_can_view_thread, ensure_influencer_approved_on_campaign,
  },
  actor::{Actor, Role},
  entry::{
    Amendment, Entry, EntryStatus, NewEntry, Restore, Review, Submission,
  },
  locks::ThreadLocks,
  notify::{NoopNotifier, Notifier, ReviewEvent},
  status::{self, Decision, Snapshot},
  store::{Committed, EntryReview, ReviewStore, ThreadChange},
  thread::{Comment, NewComment, Thread, ThreadKey, ThreadStatus},
  version::{ChainHead, VersionChain},
};

/// Result of [`ReviewDesk::review_entries`].
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
  pub updated_count:     usize,
  /// The request card appended when a follow-up was asked for.
  pub spawned_follow_up: Option<Entry>,
  pub thread:            Thread,
}

/// The review workflow over a persistence backend `S` and a campaign
/// directory `D`.
pub struct ReviewDesk<S, D> {
  store:     S,
  directory: D,
  notifier:  Arc<dyn Notifier>,
  locks:     ThreadLocks,
}

impl<S, D> ReviewDesk<S, D>
where
  S: ReviewStore,
  D: CampaignDirectory,
{
  pub fn new(store: S, directory: D) -> Self {
    Self {
      store,
      directory,
      notifier: Arc::new(NoopNotifier),
      locks: ThreadLocks::new(),
    }
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn directory(&self) -> &D { &self.directory }

  // ── Content ───────────────────────────────────────────────────────────

  /// Submit new content as the next version of the influencer's thread on
  /// `campaign_id`, creating the thread on first use.
  ///
  /// `thread_ref` pins the submission to a known thread; it must belong to
  /// the campaign and the submitting influencer.
  pub async fn submit_entry(
    &self,
    thread_ref: Option<i64>,
    campaign_id: i64,
    actor: Actor,
    submission: Submission,
  ) -> Result<Entry> {
    if actor.role != Role::Influencer {
      return Err(Error::unauthorized(
        "only influencers submit content; brands use request cards",
      ));
    }
    ensure_influencer_approved_on_campaign(&self.directory, actor.id, campaign_id)
      .await?;
    submission.validate()?;

    let thread = match thread_ref {
      Some(thread_id) => {
        let thread = self.load_thread(thread_id).await?;
        if thread.campaign_id() != campaign_id {
          return Err(Error::validation(format!(
            "thread {thread_id} does not belong to campaign {campaign_id}"
          )));
        }
        if thread.influencer_id() != actor.id {
          return Err(Error::unauthorized(format!(
            "thread {thread_id} belongs to another influencer"
          )));
        }
        thread
      }
      None => {
        let brand_id = self
          .directory
          .campaign_owner(campaign_id)
          .await
          .map_err(Error::store)?
          .ok_or(Error::CampaignNotFound(campaign_id))?;
        self
          .store
          .find_or_create_thread(ThreadKey {
            campaign_id,
            brand_id,
            influencer_id: actor.id,
          })
          .await
          .map_err(Error::store)?
      }
    };

    self
      .append_content(thread.thread_id, actor, submission, None)
      .await
  }

  /// Replace an entry's content with a new version in the same chain. Fields
  /// the amendment leaves unset are carried over from the replaced entry.
  /// Approved entries cannot be replaced.
  pub async fn replace_entry(
    &self,
    entry_id: i64,
    actor: Actor,
    amendment: Amendment,
  ) -> Result<Entry> {
    let entry = self.load_entry(entry_id).await?;
    let thread = self.load_thread(entry.thread_id).await?;
    ensure_can_contribute(&self.directory, actor, &thread).await?;

    if !entry.is_live() {
      return Err(Error::invalid_state(format!(
        "entry {entry_id} was discarded; restore it instead"
      )));
    }

    self
      .append_content(
        thread.thread_id,
        actor,
        amendment.apply_to(&entry),
        Some(entry_id),
      )
      .await
  }

  /// Republish an earlier version's content, discarded versions included, as
  /// the newest version of its chain.
  pub async fn restore_version(
    &self,
    entry_id: i64,
    actor: Actor,
    restore: Restore,
  ) -> Result<Entry> {
    let entry = self.load_entry(entry_id).await?;
    let thread = self.load_thread(entry.thread_id).await?;
    ensure_can_contribute(&self.directory, actor, &thread).await?;

    if !entry.has_content() {
      return Err(Error::validation(format!(
        "entry {entry_id} carries no content to restore"
      )));
    }

    self
      .append_content(
        thread.thread_id,
        actor,
        restore.apply_to(&entry),
        Some(entry_id),
      )
      .await
  }

  /// Soft-delete an influencer's own submission that has not been reviewed.
  /// The version number stays allocated.
  pub async fn discard_entry(&self, entry_id: i64, actor: Actor) -> Result<Thread> {
    let entry = self.load_entry(entry_id).await?;
    let thread = self.load_thread(entry.thread_id).await?;
    ensure_can_contribute(&self.directory, actor, &thread).await?;

    if entry.submitted_by != Role::Influencer || entry.author_id != actor.id {
      return Err(Error::unauthorized(format!(
        "entry {entry_id} was not submitted by influencer {}",
        actor.id
      )));
    }

    let _guard = self.locks.lock(thread.thread_id).await;
    let thread = self.load_thread(thread.thread_id).await?;
    let entries = self.thread_entries(thread.thread_id).await?;
    ensure_not_approved(&thread)?;

    let current = find_entry(&entries, entry_id)?;
    if !current.is_live() {
      return Err(Error::invalid_state(format!(
        "entry {entry_id} is already discarded"
      )));
    }
    if current.status != EntryStatus::Submitted {
      return Err(Error::invalid_state(format!(
        "entry {entry_id} is {} and can no longer be discarded",
        current.status
      )));
    }

    let mut change = begin(&thread);
    change.discard = Some(entry_id);
    let committed = self.commit(settle(change, &entries)).await?;

    debug!(thread_id = thread.thread_id, entry_id, "discarded entry");
    self.emit(ReviewEvent::EntryDiscarded {
      thread_id: thread.thread_id,
      entry_id,
    });
    Ok(committed.thread)
  }

  // ── Review ────────────────────────────────────────────────────────────

  /// Record a brand decision over a batch of entries from one thread.
  ///
  /// With `spawn_follow_up`, a request card is appended: after
  /// `needs_changes` or `rejected` it continues the current chain and asks
  /// for a redo; after `approved` it opens a fresh chain asking for the next
  /// deliverable of the same kind.
  ///
  /// An approval must cover the thread's newest live version.
  pub async fn review_entries(
    &self,
    entry_ids: &[i64],
    actor: Actor,
    decision: Decision,
    note: Option<String>,
    spawn_follow_up: bool,
  ) -> Result<ReviewOutcome> {
    let ids: BTreeSet<i64> = entry_ids.iter().copied().collect();
    if ids.is_empty() {
      return Err(Error::validation("no entries to review"));
    }
    if !actor.is_brand() {
      return Err(Error::unauthorized("only brands review entries"));
    }

    let mut thread_ids = BTreeSet::new();
    for &id in &ids {
      thread_ids.insert(self.load_entry(id).await?.thread_id);
    }
    for &thread_id in &thread_ids {
      let thread = self.load_thread(thread_id).await?;
      ensure_brand_owns_campaign(&self.directory, actor.id, thread.campaign_id())
        .await?;
    }
    if thread_ids.len() > 1 {
      return Err(Error::invalid_state(format!(
        "a review batch must target one thread, got {}",
        thread_ids.len()
      )));
    }
    let Some(thread_id) = thread_ids.pop_first() else {
      return Err(Error::validation("no entries to review"));
    };

    let _guard = self.locks.lock(thread_id).await;
    let thread = self.load_thread(thread_id).await?;
    let entries = self.thread_entries(thread_id).await?;
    ensure_not_approved(&thread)?;

    let note = clean(note);
    let reviewed_at = Utc::now();
    let mut targets = Vec::with_capacity(ids.len());
    for &id in &ids {
      let entry = find_entry(&entries, id)?;
      if !entry.is_live() {
        return Err(Error::invalid_state(format!("entry {id} was discarded")));
      }
      if !entry.status.is_reviewable() {
        return Err(Error::invalid_state(format!(
          "entry {id} is already {}",
          entry.status
        )));
      }
      targets.push(entry);
    }

    if decision == Decision::Approved
      && let Some(newest) = newest_live(&entries)
      && !ids.contains(&newest.entry_id)
    {
      return Err(Error::invalid_state(format!(
        "version {} is the newest of thread {thread_id}; approve it instead",
        newest.version
      )));
    }

    let mut change = begin(&thread);
    change.reviews = targets
      .iter()
      .map(|e| EntryReview {
        entry_id: e.entry_id,
        status:   decision.entry_status(),
        review:   Review {
          reviewed_by: actor.id,
          note: note.clone(),
          reviewed_at,
        },
      })
      .collect();

    if spawn_follow_up
      && let Some(newest) = targets.iter().max_by_key(|e| e.version)
    {
      let head = ChainHead::of(&entries);
      let root = match decision {
        Decision::Approved => None,
        Decision::NeedsChanges | Decision::Rejected => Some(newest.parent_entry_id),
      };
      change.appended.push(NewEntry::request_card(
        thread_id,
        head.next_version(),
        root,
        actor.id,
        newest.category,
        note.clone(),
      ));
    }

    let committed = self.commit(settle(change, &entries)).await?;
    let updated_count = targets.len();

    debug!(
      thread_id,
      updated_count,
      %decision,
      status = %committed.thread.status(),
      "reviewed entries"
    );
    self.emit(ReviewEvent::EntriesReviewed {
      thread_id,
      entry_ids: ids.into_iter().collect(),
      decision,
    });
    self.emit_appended(&committed);
    self.emit_verified(&thread, &committed.thread);

    let Committed { thread, appended } = committed;
    Ok(ReviewOutcome {
      updated_count,
      spawned_follow_up: appended.into_iter().next(),
      thread,
    })
  }

  /// Re-evaluate whether every entry of the thread has settled, persist the
  /// flag, and return it. The thread's status is left untouched.
  pub async fn verified_thread(&self, thread_id: i64, actor: Actor) -> Result<bool> {
    let thread = self.load_thread(thread_id).await?;
    ensure_can_view_thread(&self.directory, actor, &thread).await?;

    let _guard = self.locks.lock(thread_id).await;
    let thread = self.load_thread(thread_id).await?;
    let entries = self.thread_entries(thread_id).await?;

    let snapshots: Vec<Snapshot> = entries.iter().map(Snapshot::from).collect();
    let verified = status::is_verified(&snapshots);

    if verified != thread.summary.verified {
      let mut change = begin(&thread);
      change.summary.verified = verified;
      let committed = self.commit(change).await?;
      self.emit_verified(&thread, &committed.thread);
    }
    Ok(verified)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The chain containing `entry_id`, visible to the campaign's brand and
  /// the thread's influencer.
  pub async fn version_chain(&self, entry_id: i64, actor: Actor) -> Result<VersionChain> {
    let entry = self.load_entry(entry_id).await?;
    let thread = self.load_thread(entry.thread_id).await?;
    ensure_can_view_thread(&self.directory, actor, &thread).await?;

    let entries = self.thread_entries(thread.thread_id).await?;
    VersionChain::assemble(entries, entry_id)
  }

  pub async fn thread(&self, thread_id: i64, actor: Actor) -> Result<Thread> {
    let thread = self.load_thread(thread_id).await?;
    ensure_can_view_thread(&self.directory, actor, &thread).await?;
    Ok(thread)
  }

  /// Every entry of a thread in version order, discarded ones included.
  pub async fn entries(&self, thread_id: i64, actor: Actor) -> Result<Vec<Entry>> {
    let thread = self.thread(thread_id, actor).await?;
    self.thread_entries(thread.thread_id).await
  }

  /// A brand owning the campaign sees every thread; an influencer sees
  /// their own.
  pub async fn threads_for_campaign(
    &self,
    campaign_id: i64,
    actor: Actor,
  ) -> Result<Vec<Thread>> {
    if actor.is_brand() {
      ensure_brand_owns_campaign(&self.directory, actor.id, campaign_id).await?;
    }
    let mut threads = self
      .store
      .list_threads(campaign_id)
      .await
      .map_err(Error::store)?;
    if !actor.is_brand() {
      threads.retain(|t| t.influencer_id() == actor.id);
    }
    Ok(threads)
  }

  // ── Comments ──────────────────────────────────────────────────────────

  pub async fn add_comment(
    &self,
    thread_id: i64,
    actor: Actor,
    body: String,
  ) -> Result<Comment> {
    let thread = self.thread(thread_id, actor).await?;
    let body = body.trim().to_owned();
    if body.is_empty() {
      return Err(Error::validation("comment body is empty"));
    }

    let comment = self
      .store
      .add_comment(NewComment {
        thread_id: thread.thread_id,
        author_role: actor.role,
        author_id: actor.id,
        body,
      })
      .await
      .map_err(Error::store)?;

    self.emit(ReviewEvent::CommentAdded {
      thread_id,
      comment_id: comment.comment_id,
    });
    Ok(comment)
  }

  pub async fn comments(&self, thread_id: i64, actor: Actor) -> Result<Vec<Comment>> {
    let thread = self.thread(thread_id, actor).await?;
    self
      .store
      .list_comments(thread.thread_id)
      .await
      .map_err(Error::store)
  }

  // ── Internals ─────────────────────────────────────────────────────────

  /// Append influencer content as the next version of `thread_id`.
  ///
  /// With a `source` entry the new version joins that entry's chain;
  /// otherwise it joins the chain of the thread's newest entry.
  async fn append_content(
    &self,
    thread_id: i64,
    actor: Actor,
    content: Submission,
    source: Option<i64>,
  ) -> Result<Entry> {
    content.validate()?;

    let _guard = self.locks.lock(thread_id).await;
    let thread = self.load_thread(thread_id).await?;
    let entries = self.thread_entries(thread_id).await?;
    ensure_not_approved(&thread)?;

    let head = ChainHead::of(&entries);
    let root = match source {
      Some(entry_id) => {
        let source = find_entry(&entries, entry_id)?;
        ensure_not_frozen(source)?;
        Some(source.parent_entry_id)
      }
      None => head.root_id,
    };
    let source = content.category.source;
    let mut change = begin(&thread);
    change.summary = change.summary.with_mode(source);
    change.appended.push(NewEntry::submission(
      thread_id,
      head.next_version(),
      root,
      actor.id,
      content,
    ));

    let committed = self.commit(settle(change, &entries)).await?;
    self.emit_appended(&committed);
    self.emit_verified(&thread, &committed.thread);

    committed
      .appended
      .into_iter()
      .next()
      .ok_or_else(|| Error::invalid_state("store committed no entry"))
  }

  pub(crate) async fn load_thread(&self, thread_id: i64) -> Result<Thread> {
    self
      .store
      .get_thread(thread_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ThreadNotFound(thread_id))
  }

  pub(crate) async fn load_entry(&self, entry_id: i64) -> Result<Entry> {
    self
      .store
      .get_entry(entry_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::EntryNotFound(entry_id))
  }

  pub(crate) async fn thread_entries(&self, thread_id: i64) -> Result<Vec<Entry>> {
    self
      .store
      .list_entries(thread_id)
      .await
      .map_err(Error::store)
  }

  pub(crate) async fn commit(&self, change: ThreadChange) -> Result<Committed> {
    self.store.commit(change).await.map_err(Error::store)
  }

  pub(crate) fn lock(&self) -> &ThreadLocks { &self.locks }

  pub(crate) fn emit(&self, event: ReviewEvent) { self.notifier.notify(&event); }

  pub(crate) fn emit_appended(&self, committed: &Committed) {
    for e in &committed.appended {
      debug!(
        thread_id = e.thread_id,
        entry_id = e.entry_id,
        version = e.version,
        status = %e.status,
        "appended entry"
      );
      self.emit(ReviewEvent::EntryAppended {
        thread_id: e.thread_id,
        entry_id:  e.entry_id,
        version:   e.version,
        status:    e.status,
        by:        e.submitted_by,
      });
    }
  }

  pub(crate) fn emit_verified(&self, before: &Thread, after: &Thread) {
    if after.summary.verified && !before.summary.verified {
      self.emit(ReviewEvent::ThreadVerified {
        thread_id: after.thread_id,
      });
    }
  }
}

// ─── Planning helpers ────────────────────────────────────────────────────────

/// An empty change against the thread's current version.
pub(crate) fn begin(thread: &Thread) -> ThreadChange {
  ThreadChange::new(
    thread.thread_id,
    thread.summary.latest_version,
    thread.summary,
  )
}

/// Fill in the summary the thread will have once `change` is applied to
/// `entries`.
pub(crate) fn settle(mut change: ThreadChange, entries: &[Entry]) -> ThreadChange {
  let snapshots: Vec<Snapshot> = entries
    .iter()
    .map(|e| {
      let mut s = Snapshot::from(e);
      if let Some(r) = change.reviews.iter().find(|r| r.entry_id == e.entry_id) {
        s.status = r.status;
      }
      if change.discard == Some(e.entry_id) {
        s.live = false;
      }
      s
    })
    .chain(change.appended.iter().map(Snapshot::from))
    .collect();

  change.summary = status::summarize(change.summary, &snapshots);
  change
}

pub(crate) fn find_entry(entries: &[Entry], entry_id: i64) -> Result<&Entry> {
  entries
    .iter()
    .find(|e| e.entry_id == entry_id)
    .ok_or(Error::EntryNotFound(entry_id))
}

/// Approved deliverables are frozen until the brand reopens the thread with
/// a request card.
pub(crate) fn ensure_not_approved(thread: &Thread) -> Result<()> {
  if thread.status() == ThreadStatus::Approved {
    Err(Error::invalid_state(format!(
      "thread {} is approved",
      thread.thread_id
    )))
  } else {
    Ok(())
  }
}

/// An approved entry keeps its content; the influencer answers a later
/// request with a new submission instead.
pub(crate) fn ensure_not_frozen(entry: &Entry) -> Result<()> {
  if entry.status == EntryStatus::Approved {
    Err(Error::invalid_state(format!(
      "entry {} is approved and can no longer change",
      entry.entry_id
    )))
  } else {
    Ok(())
  }
}

pub(crate) fn newest_live(entries: &[Entry]) -> Option<&Entry> {
  entries
    .iter()
    .filter(|e| e.is_live())
    .max_by_key(|e| e.version)
}

/// Trim a free-text note; blank notes become `None`.
pub(crate) fn clean(note: Option<String>) -> Option<String> {
  note
    .map(|n| n.trim().to_owned())
    .filter(|n| !n.is_empty())
}
