//! Extracting the acting party from request headers.
//!
//! Authentication happens in front of this router; by the time a request
//! arrives here the caller is trusted to state who it acts for.

use axum::{extract::FromRequestParts, http::request::Parts};
use reel_core::actor::{Actor, Role};

use crate::error::ApiError;

/// Header carrying the numeric brand or influencer id.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying `brand` or `influencer`.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The [`Actor`] a request is made on behalf of.
#[derive(Debug, Clone, Copy)]
pub struct ActingAs(pub Actor);

impl<S> FromRequestParts<S> for ActingAs
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let header = |name: &str| {
      parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .ok_or_else(|| ApiError::Unauthenticated(format!("missing {name} header")))
    };

    let id = header(ACTOR_ID_HEADER)?
      .parse::<i64>()
      .map_err(|_| ApiError::BadRequest(format!("{ACTOR_ID_HEADER} is not an integer")))?;
    let role = header(ACTOR_ROLE_HEADER)?
      .parse::<Role>()
      .map_err(|_| {
        ApiError::BadRequest(format!(
          "{ACTOR_ROLE_HEADER} must be \"brand\" or \"influencer\""
        ))
      })?;

    Ok(ActingAs(Actor { id, role }))
  }
}
