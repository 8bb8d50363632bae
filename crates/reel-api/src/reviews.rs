//! Handlers for brand-side review and request endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/reviews` | Body: [`ReviewBody`]; returns the review outcome |
//! | `POST` | `/campaigns/:id/requests` | Body: [`RequestBody`]; returns 201 + thread |
//! | `POST` | `/entries/:id/request-changes` | Body: `{"note":"..."}`; returns 201 + card |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use reel_core::{
  ReviewOutcome,
  entry::{Category, MediaKind, Source},
  status::Decision,
};
use serde::Deserialize;

use crate::{ApiState, Backend, actor::ActingAs, error::ApiError};

// ─── Review ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub entry_ids:       Vec<i64>,
  pub decision:        Decision,
  pub note:            Option<String>,
  /// Append a request card after recording the decision.
  #[serde(default)]
  pub spawn_follow_up: bool,
}

/// `POST /reviews`
pub async fn review<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Json(body): Json<ReviewBody>,
) -> Result<Json<ReviewOutcome>, ApiError> {
  let outcome = state
    .desk
    .review_entries(
      &body.entry_ids,
      actor,
      body.decision,
      body.note,
      body.spawn_follow_up,
    )
    .await?;
  Ok(Json(outcome))
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RequestBody {
  pub influencer_id: i64,
  pub source:        Source,
  pub media_kind:    MediaKind,
  pub note:          Option<String>,
}

/// `POST /campaigns/:id/requests`: returns 201 + the thread.
pub async fn request<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(campaign_id): Path<i64>,
  Json(body): Json<RequestBody>,
) -> Result<impl IntoResponse, ApiError> {
  let thread = state
    .desk
    .request_from_brand(
      campaign_id,
      actor,
      body.influencer_id,
      body.note,
      Category::new(body.source, body.media_kind),
    )
    .await?;
  Ok((StatusCode::CREATED, Json(thread)))
}

#[derive(Debug, Deserialize)]
pub struct RequestChangesBody {
  pub note: Option<String>,
}

/// `POST /entries/:id/request-changes`: returns 201 + the request card.
pub async fn request_changes<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(entry_id): Path<i64>,
  Json(body): Json<RequestChangesBody>,
) -> Result<impl IntoResponse, ApiError> {
  let card = state
    .desk
    .request_changes_over_entry(actor, entry_id, body.note)
    .await?;
  Ok((StatusCode::CREATED, Json(card)))
}
