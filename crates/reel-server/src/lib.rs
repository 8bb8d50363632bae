//! HTTP server for Reel.
//!
//! Mounts the [`reel_api`] router under `/api` behind HTTP Basic auth, adds
//! request tracing, and logs review events.

pub mod auth;
pub mod error;
pub mod notify;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{Json, Router, middleware, routing::get};
use reel_api::{Backend, LocalFileStorage};
use reel_core::ReviewDesk;
use reel_store_sqlite::SqliteStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};
use notify::LogNotifier;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Root directory for uploaded assets.
  pub asset_dir:          PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
}

impl ServerConfig {
  /// Credentials the `/api` routes are checked against.
  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the router is built from.
pub struct AppState<B> {
  pub desk:  Arc<ReviewDesk<B, B>>,
  pub files: Arc<LocalFileStorage>,
  pub auth:  Arc<AuthConfig>,
}

impl<B> Clone for AppState<B> {
  fn clone(&self) -> Self {
    Self {
      desk:  self.desk.clone(),
      files: self.files.clone(),
      auth:  self.auth.clone(),
    }
  }
}

impl AppState<SqliteStore> {
  /// Open the store and asset directory named by `config` and wire review
  /// events into the log.
  pub async fn open(config: &ServerConfig) -> anyhow::Result<Self> {
    let store_path = expand_tilde(&config.store_path);
    let asset_dir = expand_tilde(&config.asset_dir);

    let store = SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?;
    tokio::fs::create_dir_all(&asset_dir)
      .await
      .with_context(|| format!("failed to create asset dir {asset_dir:?}"))?;
    tracing::info!(store = ?store_path, assets = ?asset_dir, "opened storage");

    let desk = ReviewDesk::new(store.clone(), store)
      .with_notifier(Arc::new(LogNotifier));
    Ok(Self {
      desk:  Arc::new(desk),
      files: Arc::new(LocalFileStorage::new(asset_dir)),
      auth:  Arc::new(config.auth()),
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server's axum [`Router`]. `/health` is left unauthenticated.
pub fn router<B: Backend>(state: AppState<B>) -> Router {
  let api = reel_api::api_router(state.desk, state.files)
    .layer(middleware::from_fn_with_state(state.auth, require_auth));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use tower::ServiceExt as _;

  async fn make_state(password: &str) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt  = SaltString::generate(&mut OsRng);
    let hash  = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    AppState {
      desk:  Arc::new(ReviewDesk::new(store.clone(), store)),
      files: Arc::new(LocalFileStorage::new(std::env::temp_dir().join(
        format!("reel-server-test-{}", std::process::id()),
      ))),
      auth:  Arc::new(AuthConfig {
        username:      "reviewer".to_string(),
        password_hash: hash,
      }),
    }
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn oneshot(
    state:   AppState<SqliteStore>,
    method:  &str,
    uri:     &str,
    headers: Vec<(&str, String)>,
    body:    &str,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  #[tokio::test]
  async fn open_creates_store_and_asset_dir() {
    let root = std::env::temp_dir()
      .join(format!("reel-server-open-{}", std::process::id()));
    let config = ServerConfig {
      host:               "127.0.0.1".into(),
      port:               0,
      store_path:         root.join("reel.db"),
      asset_dir:          root.join("assets"),
      auth_username:      "reviewer".into(),
      auth_password_hash: "$argon2id$placeholder".into(),
    };
    std::fs::create_dir_all(&root).unwrap();

    let state = AppState::open(&config).await.unwrap();
    assert!(root.join("assets").is_dir());
    assert!(root.join("reel.db").exists());
    assert_eq!(state.auth.username, "reviewer");

    drop(state);
    std::fs::remove_dir_all(&root).unwrap();
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else {
      return;
    };
    assert_eq!(
      expand_tilde(Path::new("~/reel/reel.db")),
      PathBuf::from(home).join("reel/reel.db")
    );
    assert_eq!(expand_tilde(Path::new("/srv/reel")), PathBuf::from("/srv/reel"));
  }

  #[tokio::test]
  async fn health_needs_no_credentials() {
    let state = make_state("secret").await;
    let resp  = oneshot(state, "GET", "/health", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_rejects_missing_credentials() {
    let state = make_state("secret").await;
    let resp  = oneshot(state, "GET", "/api/threads/1", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let challenge = resp.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert_eq!(challenge, "Basic realm=\"reel\"");
  }

  #[tokio::test]
  async fn api_rejects_wrong_password() {
    let state = make_state("secret").await;
    let resp  = oneshot(
      state,
      "GET",
      "/api/threads/1",
      vec![("authorization", auth_header("reviewer", "nope"))],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn authenticated_requests_reach_the_api() {
    let state = make_state("secret").await;
    let auth  = auth_header("reviewer", "secret");

    let resp = oneshot(
      state.clone(),
      "PUT",
      "/api/admin/campaigns/10",
      vec![
        ("authorization", auth.clone()),
        (header::CONTENT_TYPE.as_str(), "application/json".into()),
      ],
      r#"{"brand_id":1}"#,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = oneshot(
      state,
      "GET",
      "/api/campaigns/10/threads",
      vec![
        ("authorization", auth),
        ("x-actor-id", "1".into()),
        ("x-actor-role", "brand".into()),
      ],
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    assert_eq!(&bytes[..], b"[]");
  }
}
