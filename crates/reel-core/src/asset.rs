//! Drive assets: references to stored files, and the storage collaborator
//! that produces them.
//!
//! The core never handles raw bytes. Callers hand uploads to a
//! [`FileStorage`] and attach the returned [`AssetRef`] to a submission.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// A stable reference to a stored file; no binary data lives in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
  /// Path relative to the storage root.
  pub path:         String,
  /// SHA-256 hex digest of the content.
  pub content_hash: String,
  pub media_type:   String,
  pub size:         u64,
  /// Name of the file as uploaded, if the client sent one.
  pub file_name:    Option<String>,
}

/// Metadata accompanying an upload.
#[derive(Debug, Clone, Default)]
pub struct UploadMeta {
  pub media_type: String,
  pub file_name:  Option<String>,
}

/// Persists uploaded content and hands back a reference to it.
pub trait FileStorage: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn store(
    &self,
    bytes: Vec<u8>,
    meta: UploadMeta,
  ) -> impl Future<Output = Result<AssetRef, Self::Error>> + Send + '_;
}
