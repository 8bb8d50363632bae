//! `POST /assets`: upload raw bytes and get back an [`AssetRef`] to attach
//! to a submission.
//!
//! The request body is the file itself. `Content-Type` becomes the asset's
//! media type; an optional `x-file-name` header records the original name.

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use bytes::Bytes;
use reel_core::{
  actor::Role,
  asset::{FileStorage as _, UploadMeta},
};

use crate::{ApiState, Backend, actor::ActingAs, error::ApiError, storage::StorageError};

pub const FILE_NAME_HEADER: &str = "x-file-name";

/// `POST /assets`: returns 201 + the stored [`AssetRef`](reel_core::asset::AssetRef).
pub async fn upload<B: Backend>(
  State(state): State<ApiState<B>>,
  ActingAs(actor): ActingAs,
  headers: HeaderMap,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
  if actor.role != Role::Influencer {
    return Err(
      reel_core::Error::NotAuthorized("only influencers upload assets".into()).into(),
    );
  }

  let text = |name: &str| {
    headers
      .get(name)
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned)
  };
  let meta = UploadMeta {
    media_type: text(header::CONTENT_TYPE.as_str())
      .unwrap_or_else(|| "application/octet-stream".to_owned()),
    file_name:  text(FILE_NAME_HEADER),
  };

  let asset = state
    .files
    .store(body.to_vec(), meta)
    .await
    .map_err(|e| match e {
      StorageError::Empty => ApiError::BadRequest(e.to_string()),
      other => ApiError::Storage(Box::new(other)),
    })?;

  tracing::debug!(
    influencer_id = actor.id,
    path = %asset.path,
    size = asset.size,
    "uploaded asset"
  );
  Ok((StatusCode::CREATED, Json(asset)))
}
