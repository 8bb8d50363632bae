//! [`LocalFileStorage`]: content-addressed asset files on local disk.
//!
//! Files live at `<root>/<first two hex digits>/<sha256>.<ext>`. Uploading
//! the same bytes twice yields the same path and writes nothing new.

use std::path::{Path, PathBuf};

use reel_core::asset::{AssetRef, FileStorage, UploadMeta};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("upload is empty")]
  Empty,
}

#[derive(Debug, Clone)]
pub struct LocalFileStorage {
  root: PathBuf,
}

impl LocalFileStorage {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  /// Resolve a stored [`AssetRef::path`] to a location on disk.
  pub fn resolve(&self, relative: &str) -> PathBuf { self.root.join(relative) }
}

/// File extension for a stored upload: the client's own extension if it sent
/// a file name, otherwise one guessed from the media type.
fn extension(meta: &UploadMeta) -> String {
  let from_name = meta
    .file_name
    .as_deref()
    .and_then(|n| Path::new(n).extension())
    .and_then(|e| e.to_str())
    .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
    .map(str::to_ascii_lowercase);
  if let Some(ext) = from_name {
    return ext;
  }

  match meta.media_type.as_str() {
    "image/jpeg" => "jpg",
    "image/png" => "png",
    "image/webp" => "webp",
    "image/gif" => "gif",
    "video/mp4" => "mp4",
    "video/quicktime" => "mov",
    _ => "bin",
  }
  .to_owned()
}

impl FileStorage for LocalFileStorage {
  type Error = StorageError;

  async fn store(
    &self,
    bytes: Vec<u8>,
    meta: UploadMeta,
  ) -> Result<AssetRef, StorageError> {
    if bytes.is_empty() {
      return Err(StorageError::Empty);
    }

    let hash = hex::encode(Sha256::digest(&bytes));
    let relative = format!("{}/{hash}.{}", &hash[..2], extension(&meta));
    let target = self.resolve(&relative);

    if tokio::fs::try_exists(&target).await? {
      debug!(path = %relative, "asset already stored");
    } else {
      if let Some(dir) = target.parent() {
        tokio::fs::create_dir_all(dir).await?;
      }
      // Write then rename so a reader never sees a partial file.
      let partial = target.with_extension("part");
      tokio::fs::write(&partial, &bytes).await?;
      tokio::fs::rename(&partial, &target).await?;
      debug!(path = %relative, size = bytes.len(), "stored asset");
    }

    Ok(AssetRef {
      path:         relative,
      content_hash: hash,
      media_type:   meta.media_type,
      size:         bytes.len() as u64,
      file_name:    meta.file_name,
    })
  }
}
