//! Handlers for thread endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/campaigns/:id/threads` | Brand owner sees all, influencer sees own |
//! | `GET`  | `/threads/:id` | |
//! | `GET`  | `/threads/:id/entries` | Every version, discarded ones included |
//! | `POST` | `/threads/:id/verify` | Recompute the verified flag |
//! | `GET`  | `/threads/:id/comments` | |
//! | `POST` | `/threads/:id/comments` | Body: `{"body":"..."}`; returns 201 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use reel_core::{
  entry::Entry,
  thread::{Comment, Thread},
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, Backend, actor::ActingAs, error::ApiError};

/// `GET /campaigns/:id/threads`
pub async fn list<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(campaign_id): Path<i64>,
) -> Result<Json<Vec<Thread>>, ApiError> {
  Ok(Json(state.desk.threads_for_campaign(campaign_id, actor).await?))
}

/// `GET /threads/:id`
pub async fn get_one<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(thread_id): Path<i64>,
) -> Result<Json<Thread>, ApiError> {
  Ok(Json(state.desk.thread(thread_id, actor).await?))
}

/// `GET /threads/:id/entries`
pub async fn entries<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(thread_id): Path<i64>,
) -> Result<Json<Vec<Entry>>, ApiError> {
  Ok(Json(state.desk.entries(thread_id, actor).await?))
}

// ─── Verification ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Verified {
  pub thread_id: i64,
  pub verified:  bool,
}

/// `POST /threads/:id/verify`
pub async fn verify<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(thread_id): Path<i64>,
) -> Result<Json<Verified>, ApiError> {
  let verified = state.desk.verified_thread(thread_id, actor).await?;
  Ok(Json(Verified { thread_id, verified }))
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub body: String,
}

/// `GET /threads/:id/comments`
pub async fn comments<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(thread_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
  Ok(Json(state.desk.comments(thread_id, actor).await?))
}

/// `POST /threads/:id/comments`: returns 201 + the stored comment.
pub async fn add_comment<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  Path(thread_id): Path<i64>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let comment = state.desk.add_comment(thread_id, actor, body.body).await?;
  Ok((StatusCode::CREATED, Json(comment)))
}
