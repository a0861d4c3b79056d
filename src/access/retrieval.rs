// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fetch the stored bytes of a content item.
//!
//! Locators are tried in order: encrypted blob, plain blob, external URL.
//! Sealed bytes are returned as-is; opening them is the caller's job.

use std::sync::Arc;

use super::AccessError;
use crate::config::ExternalFileMode;
use crate::storage::{BlobError, BlobStore, FileLocation, StorageLocator};

/// What the store handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievedFile {
    /// Envelope bytes that still need to be opened.
    Sealed(Vec<u8>),
    /// Plaintext bytes.
    Bytes(Vec<u8>),
    /// External location for the client to fetch.
    Redirect(url::Url),
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("no file configured")]
    NoFileConfigured,

    #[error("blob store: {0}")]
    Blob(#[from] BlobError),

    #[error("invalid external URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("external fetch failed: {0}")]
    Fetch(String),
}

impl From<RetrievalError> for AccessError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::NoFileConfigured => AccessError::NoFileConfigured,
            other => AccessError::FileRetrievalFailure(other.to_string()),
        }
    }
}

pub struct FileRetriever {
    blobs: Arc<dyn BlobStore>,
    http: reqwest::Client,
    external_mode: ExternalFileMode,
}

impl FileRetriever {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        http: reqwest::Client,
        external_mode: ExternalFileMode,
    ) -> Self {
        Self {
            blobs,
            http,
            external_mode,
        }
    }

    pub async fn retrieve(&self, location: &FileLocation) -> Result<RetrievedFile, RetrievalError> {
        match location.resolve() {
            Some(StorageLocator::EncryptedBlob(key)) => {
                Ok(RetrievedFile::Sealed(self.blobs.get(key).await?))
            }
            Some(StorageLocator::PlainBlob(key)) => {
                Ok(RetrievedFile::Bytes(self.blobs.get(key).await?))
            }
            Some(StorageLocator::ExternalUrl(raw)) => {
                let url = url::Url::parse(raw).map_err(|e| RetrievalError::InvalidUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                })?;
                match self.external_mode {
                    ExternalFileMode::Redirect => Ok(RetrievedFile::Redirect(url)),
                    ExternalFileMode::Fetch => self.fetch(url).await.map(RetrievedFile::Bytes),
                }
            }
            None => Err(RetrievalError::NoFileConfigured),
        }
    }

    async fn fetch(&self, url: url::Url) -> Result<Vec<u8>, RetrievalError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RetrievalError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Fetch(format!("HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RetrievalError::Fetch(e.to_string()))?;
        Ok(body.to_vec())
    }
}
