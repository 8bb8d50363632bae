//! Handlers for entry endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/campaigns/:id/entries` | Body: [`SubmitBody`]; returns 201 + entry |
//! | `POST`   | `/entries/:id/replace` | Body: [`ReplaceBody`]; returns 201 + new version |
//! | `POST`   | `/entries/:id/restore` | Body: `{"notes":"..."}` (optional) |
//! | `DELETE` | `/entries/:id` | Soft delete; returns the thread |
//! | `GET`    | `/entries/:id/versions` | The entry's version chain |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use reel_core::{
  asset::AssetRef,
  entry::{Amendment, Category, MediaKind, Restore, Source, Submission},
  metrics::Metrics,
  store::ReviewStore as _,
  thread::Thread,
  version::VersionChain,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{ApiState, Backend, actor::ActingAs, error::ApiError};

// ─── Submit ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /campaigns/:id/entries`.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  /// Pin the submission to a known thread.
  pub thread_id:  Option<i64>,
  pub source:     Source,
  pub media_kind: MediaKind,
  /// Metric counts; numeric strings are accepted.
  #[serde(default)]
  pub metrics:    Map<String, Value>,
  pub notes:      Option<String>,
  pub asset:      Option<AssetRef>,
  pub permalink:  Option<String>,
}

impl SubmitBody {
  fn into_submission(self) -> Result<Submission, ApiError> {
    let category = Category::new(self.source, self.media_kind);
    Ok(Submission {
      metrics: Metrics::parse(category.media_kind, &self.metrics)?,
      category,
      notes: self.notes,
      asset: self.asset,
      permalink: self.permalink,
    })
  }
}

/// `POST /campaigns/:id/entries`: returns 201 + the stored entry.
pub async fn submit<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(campaign_id): Path<i64>,
  Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, ApiError> {
  let thread_ref = body.thread_id;
  let entry = state
    .desk
    .submit_entry(thread_ref, campaign_id, actor, body.into_submission()?)
    .await?;
  Ok((StatusCode::CREATED, Json(entry)))
}

// ─── Replace ─────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /entries/:id/replace`. Omitted fields are
/// carried over from the replaced entry.
#[derive(Debug, Default, Deserialize)]
pub struct ReplaceBody {
  pub metrics:   Option<Map<String, Value>>,
  pub notes:     Option<String>,
  pub asset:     Option<AssetRef>,
  pub permalink: Option<String>,
}

/// `POST /entries/:id/replace`: returns 201 + the new version.
pub async fn replace<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(entry_id): Path<i64>,
  Json(body): Json<ReplaceBody>,
) -> Result<impl IntoResponse, ApiError> {
  // Metrics are coerced against the replaced entry's media kind.
  let metrics = match &body.metrics {
    Some(raw) => {
      let base = state
        .desk
        .store()
        .get_entry(entry_id)
        .await
        .map_err(|e| ApiError::Storage(Box::new(e)))?
        .ok_or(reel_core::Error::EntryNotFound(entry_id))?;
      Some(Metrics::parse(base.category.media_kind, raw)?)
    }
    None => None,
  };

  let amendment = Amendment {
    metrics,
    notes: body.notes,
    asset: body.asset,
    permalink: body.permalink,
  };
  let entry = state.desk.replace_entry(entry_id, actor, amendment).await?;
  Ok((StatusCode::CREATED, Json(entry)))
}

// ─── Restore ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RestoreBody {
  pub notes: Option<String>,
}

/// `POST /entries/:id/restore`: returns 201 + the new version.
pub async fn restore<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(entry_id): Path<i64>,
  body: Option<Json<RestoreBody>>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body.unwrap_or_default();
  let entry = state
    .desk
    .restore_version(entry_id, actor, Restore { notes: body.notes })
    .await?;
  Ok((StatusCode::CREATED, Json(entry)))
}

// ─── Discard ─────────────────────────────────────────────────────────────────

/// `DELETE /entries/:id`
pub async fn discard<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(entry_id): Path<i64>,
) -> Result<Json<Thread>, ApiError> {
  Ok(Json(state.desk.discard_entry(entry_id, actor).await?))
}

// ─── Versions ────────────────────────────────────────────────────────────────

/// `GET /entries/:id/versions`
pub async fn versions<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(entry_id): Path<i64>,
) -> Result<Json<VersionChain>, ApiError> {
  Ok(Json(state.desk.version_chain(entry_id, actor).await?))
}
