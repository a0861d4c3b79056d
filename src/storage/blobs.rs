// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blob storage for uploaded file bodies.
//!
//! Blobs are addressed by slash-separated keys such as `encrypted/<id>` or
//! `plain/<id>`. Keys are validated before they touch the filesystem so a
//! stored locator can never escape the blob root.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

/// Prefix for envelope-sealed blobs.
pub const ENCRYPTED_PREFIX: &str = "encrypted";

/// Prefix for blobs stored as plaintext.
pub const PLAIN_PREFIX: &str = "plain";

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("invalid blob key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BlobResult<T> = Result<T, BlobError>;

/// Key for a new blob under `prefix`.
pub fn new_blob_key(prefix: &str) -> String {
    format!("{prefix}/{}", uuid::Uuid::new_v4())
}

/// Accept only `[A-Za-z0-9._-]` segments separated by `/`, no `.`/`..`.
pub fn validate_key(key: &str) -> BlobResult<()> {
    let valid = !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        });

    if valid {
        Ok(())
    } else {
        Err(BlobError::InvalidKey(key.to_string()))
    }
}

/// Byte storage keyed by locator.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`, replacing any previous value.
    async fn put(&self, key: &str, data: &[u8]) -> BlobResult<()>;

    /// Retrieve the bytes under `key`.
    ///
    /// Returns `BlobError::NotFound` if nothing is stored there.
    async fn get(&self, key: &str) -> BlobResult<Vec<u8>>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> BlobResult<()>;
}

/// Local filesystem blob store rooted at `{data}/blobs`.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create the store, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> BlobResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn blob_path(&self, key: &str) -> BlobResult<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, s| path.join(s)))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: &[u8]) -> BlobResult<()> {
        let path = self.blob_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write then rename so readers never observe a partial blob
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> BlobResult<Vec<u8>> {
        let path = self.blob_path(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        let path = self.blob_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
