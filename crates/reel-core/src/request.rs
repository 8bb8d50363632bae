//! Request cards: brand-authored entries that ask the influencer for content
//! without any influencer action.
//!
//! Requests never de-duplicate. Asking twice appends two cards to the same
//! thread.

use crate::{
  Error, Result,
  access::{
    CampaignDirectory, ensure_brand_owns_campaign,
    ensure_influencer_approved_on_campaign,
  },
  actor::Actor,
  desk::{ReviewDesk, begin, clean, find_entry, settle},
  entry::{Category, Entry, NewEntry},
  store::ReviewStore,
  thread::{Thread, ThreadKey},
  version::ChainHead,
};

impl<S, D> ReviewDesk<S, D>
where
  S: ReviewStore,
  D: CampaignDirectory,
{
  /// Ask an approved influencer for a deliverable of `category`.
  ///
  /// Finds or creates the `(campaign, brand, influencer)` thread, marks the
  /// submission mode as used, and appends a `requested` card carrying
  /// `note`.
  pub async fn request_from_brand(
    &self,
    campaign_id: i64,
    actor: Actor,
    influencer_id: i64,
    note: Option<String>,
    category: Category,
  ) -> Result<Thread> {
    if !actor.is_brand() {
      return Err(Error::unauthorized("only brands issue requests"));
    }
    ensure_brand_owns_campaign(self.directory(), actor.id, campaign_id).await?;
    ensure_influencer_approved_on_campaign(
      self.directory(),
      influencer_id,
      campaign_id,
    )
    .await?;

    let thread = self
      .store()
      .find_or_create_thread(ThreadKey {
        campaign_id,
        brand_id: actor.id,
        influencer_id,
      })
      .await
      .map_err(Error::store)?;

    let _guard = self.lock().lock(thread.thread_id).await;
    let thread = self.load_thread(thread.thread_id).await?;
    let entries = self.thread_entries(thread.thread_id).await?;

    let head = ChainHead::of(&entries);
    let mut change = begin(&thread);
    change.summary = change.summary.with_mode(category.source);
    change.appended.push(NewEntry::request_card(
      thread.thread_id,
      head.next_version(),
      head.root_id,
      actor.id,
      category,
      clean(note),
    ));

    let committed = self.commit(settle(change, &entries)).await?;
    self.emit_appended(&committed);
    Ok(committed.thread)
  }

  /// Ask for a redo of `entry_id`: appends a `requested` card of the same
  /// category to that entry's chain, with `note` as the instruction.
  pub async fn request_changes_over_entry(
    &self,
    actor: Actor,
    entry_id: i64,
    note: Option<String>,
  ) -> Result<Entry> {
    if !actor.is_brand() {
      return Err(Error::unauthorized("only brands request changes"));
    }
    let source = self.load_entry(entry_id).await?;
    let thread = self.load_thread(source.thread_id).await?;
    ensure_brand_owns_campaign(self.directory(), actor.id, thread.campaign_id())
      .await?;

    let _guard = self.lock().lock(thread.thread_id).await;
    let thread = self.load_thread(thread.thread_id).await?;
    let entries = self.thread_entries(thread.thread_id).await?;
    let source = find_entry(&entries, entry_id)?;

    let head = ChainHead::of(&entries);
    let mut change = begin(&thread);
    change.appended.push(NewEntry::request_card(
      thread.thread_id,
      head.next_version(),
      Some(source.parent_entry_id),
      actor.id,
      source.category,
      clean(note),
    ));

    let committed = self.commit(settle(change, &entries)).await?;
    self.emit_appended(&committed);

    committed
      .appended
      .into_iter()
      .next()
      .ok_or_else(|| Error::invalid_state("store committed no entry"))
  }
}
