//! Directory seeding: register campaigns and record application outcomes.
//!
//! Campaign and application lifecycles are owned by the surrounding
//! marketplace. These endpoints only mirror their current state into the
//! campaign directory the review gates read from.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use reel_core::access::{ApplicationStatus, CampaignDirectory as _};
use serde::Deserialize;
use tracing::info;

use crate::{ApiState, Backend, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CampaignBody {
  pub brand_id: i64,
}

/// `PUT /admin/campaigns/:id`: returns 204.
pub async fn upsert_campaign<B: Backend>(
  State(state): State<ApiState<B>>,
  Path(campaign_id): Path<i64>,
  Json(body): Json<CampaignBody>,
) -> Result<StatusCode, ApiError> {
  state
    .desk
    .directory()
    .upsert_campaign(campaign_id, body.brand_id)
    .await
    .map_err(|e| ApiError::Storage(Box::new(e)))?;
  info!(campaign_id, brand_id = body.brand_id, "registered campaign");
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ApplicationBody {
  pub status: ApplicationStatus,
}

/// `PUT /admin/campaigns/:id/applications/:influencer_id`: returns 204.
pub async fn set_application<B: Backend>(
  State(state): State<ApiState<B>>,
  Path((campaign_id, influencer_id)): Path<(i64, i64)>,
  Json(body): Json<ApplicationBody>,
) -> Result<StatusCode, ApiError> {
  state
    .desk
    .directory()
    .set_application_status(campaign_id, influencer_id, body.status)
    .await
    .map_err(|e| ApiError::Storage(Box::new(e)))?;
  info!(
    campaign_id,
    influencer_id,
    status = %body.status,
    "recorded application status"
  );
  Ok(StatusCode::NO_CONTENT)
}
