//! Capability checks gating every mutation.
//!
//! All checks are read-only and run before anything is persisted. They answer
//! through a [`CampaignDirectory`], the lookup collaborator that knows which
//! brand owns a campaign and which influencers were accepted onto it.

use std::future::Future;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  Error, Result,
  actor::{Actor, Role},
  thread::Thread,
};

/// Where an influencer's application to a campaign stands.
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
pub enum ApplicationStatus {
  Pending,
  /// Accepted by a marketplace admin.
  Approved,
  /// Accepted directly by the brand.
  BrandApproved,
  Rejected,
  Withdrawn,
}

impl ApplicationStatus {
  /// Whether the influencer may deliver content on the campaign.
  pub fn admits_delivery(self) -> bool {
    matches!(self, Self::Approved | Self::BrandApproved)
  }
}

/// Campaign ownership and application lookups.
///
/// The two write methods exist so an admin surface can seed the directory;
/// the gates below only read.
pub trait CampaignDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The brand owning `campaign_id`, or `None` if the campaign is unknown.
  fn campaign_owner(
    &self,
    campaign_id: i64,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  fn application_status(
    &self,
    campaign_id: i64,
    influencer_id: i64,
  ) -> impl Future<Output = Result<Option<ApplicationStatus>, Self::Error>>
  + Send
  + '_;

  /// Register a campaign or move it to another brand.
  fn upsert_campaign(
    &self,
    campaign_id: i64,
    brand_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn set_application_status(
    &self,
    campaign_id: i64,
    influencer_id: i64,
    status: ApplicationStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Gates ───────────────────────────────────────────────────────────────────

/// Succeeds iff the influencer holds an approved or brand-approved
/// application on the campaign.
pub async fn ensure_influencer_approved_on_campaign<D: CampaignDirectory>(
  directory: &D,
  influencer_id: i64,
  campaign_id: i64,
) -> Result<()> {
  let status = directory
    .application_status(campaign_id, influencer_id)
    .await
    .map_err(Error::store)?;

  match status {
    Some(s) if s.admits_delivery() => Ok(()),
    _ => Err(Error::unauthorized(format!(
      "influencer {influencer_id} is not approved on campaign {campaign_id}"
    ))),
  }
}

/// Succeeds iff `brand_id` owns the campaign.
pub async fn ensure_brand_owns_campaign<D: CampaignDirectory>(
  directory: &D,
  brand_id: i64,
  campaign_id: i64,
) -> Result<()> {
  let owner = directory
    .campaign_owner(campaign_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::CampaignNotFound(campaign_id))?;

  if owner == brand_id {
    Ok(())
  } else {
    Err(Error::unauthorized(format!(
      "brand {brand_id} does not own campaign {campaign_id}"
    )))
  }
}

/// Read access: the brand owning the thread's campaign, or the thread's own
/// influencer.
pub async fn ensure_can_view_thread<D: CampaignDirectory>(
  directory: &D,
  actor: Actor,
  thread: &Thread,
) -> Result<()> {
  match actor.role {
    Role::Brand => {
      ensure_brand_owns_campaign(directory, actor.id, thread.campaign_id()).await
    }
    Role::Influencer if actor.id == thread.influencer_id() => Ok(()),
    Role::Influencer => Err(Error::unauthorized(format!(
      "influencer {} is not a party to thread {}",
      actor.id, thread.thread_id
    ))),
  }
}

/// Content access: the thread's own influencer, still approved on the
/// campaign.
pub async fn ensure_can_contribute<D: CampaignDirectory>(
  directory: &D,
  actor: Actor,
  thread: &Thread,
) -> Result<()> {
  if actor.role != Role::Influencer || actor.id != thread.influencer_id() {
    return Err(Error::unauthorized(format!(
      "{} {} cannot submit content to thread {}",
      actor.role, actor.id, thread.thread_id
    )));
  }
  ensure_influencer_approved_on_campaign(directory, actor.id, thread.campaign_id())
    .await
}
