// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted content and grant records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Content lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    /// Uploaded, no access token attached yet.
    Pending,
    /// Access token attached; content is live.
    Minted,
}

/// Metadata of the uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FileMetadata {
    /// Original file name.
    pub name: String,
    /// MIME type reported at upload.
    pub mime_type: String,
    /// Plaintext size in bytes.
    pub size: u64,
    /// Hex SHA-256 of the plaintext.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Where the file bytes live. Resolution order is encrypted blob, plain
/// blob, then external URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_blob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_blob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

/// The locator that wins resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLocator<'a> {
    EncryptedBlob(&'a str),
    PlainBlob(&'a str),
    ExternalUrl(&'a str),
}

impl FileLocation {
    /// First configured locator, if any.
    pub fn resolve(&self) -> Option<StorageLocator<'_>> {
        fn non_empty(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.is_empty())
        }

        non_empty(&self.encrypted_blob)
            .map(StorageLocator::EncryptedBlob)
            .or_else(|| non_empty(&self.plain_blob).map(StorageLocator::PlainBlob))
            .or_else(|| non_empty(&self.external_url).map(StorageLocator::ExternalUrl))
    }
}

/// An access-controlled upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredContent {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Creator wallet address.
    pub creator: String,
    pub price: f64,
    pub file: FileMetadata,
    pub location: FileLocation,
    /// Token a wallet must hold; `None` while pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_token_id: Option<String>,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredContent {
    /// A freshly uploaded, not yet minted, content record.
    pub fn new_pending(creator: String, file: FileMetadata, location: FileLocation) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: String::new(),
            description: String::new(),
            category: None,
            creator,
            price: 0.0,
            file,
            location,
            required_token_id: None,
            status: ContentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_minted(&self) -> bool {
        self.status == ContentStatus::Minted
    }
}

/// Data attached when the access token is minted.
#[derive(Debug, Clone, PartialEq)]
pub struct MintAttachment {
    pub token_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: Option<String>,
}

/// Creator-editable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ContentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl ContentPatch {
    /// Apply to `content`; returns whether anything changed.
    pub fn apply(&self, content: &mut StoredContent) -> bool {
        let mut changed = false;
        if let Some(title) = &self.title {
            if *title != content.title {
                content.title = title.clone();
                changed = true;
            }
        }
        if let Some(description) = &self.description {
            if *description != content.description {
                content.description = description.clone();
                changed = true;
            }
        }
        if let Some(price) = self.price {
            if price != content.price {
                content.price = price;
                changed = true;
            }
        }
        changed
    }
}

/// How a grant came to exist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Creator's own grant recorded at mint time.
    CreatorInitial,
    /// Recorded after a confirmed purchase.
    Purchased,
}

/// Locally recorded access grant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredGrant {
    pub content_id: String,
    /// Wallet address that was granted access.
    pub owner: String,
    pub token_id: String,
    pub grant_type: GrantType,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> FileMetadata {
        FileMetadata {
            name: "a.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 3,
            sha256: None,
        }
    }

    #[test]
    fn locator_resolution_order() {
        let mut location = FileLocation {
            encrypted_blob: Some("encrypted/abc".into()),
            plain_blob: Some("plain/abc".into()),
            external_url: Some("https://cdn.example/abc".into()),
        };
        assert_eq!(
            location.resolve(),
            Some(StorageLocator::EncryptedBlob("encrypted/abc"))
        );

        location.encrypted_blob = None;
        assert_eq!(location.resolve(), Some(StorageLocator::PlainBlob("plain/abc")));

        location.plain_blob = Some(String::new());
        assert_eq!(
            location.resolve(),
            Some(StorageLocator::ExternalUrl("https://cdn.example/abc"))
        );

        assert_eq!(FileLocation::default().resolve(), None);
    }

    #[test]
    fn new_content_is_pending_without_token() {
        let content = StoredContent::new_pending("creator".into(), file(), FileLocation::default());
        assert_eq!(content.status, ContentStatus::Pending);
        assert!(content.required_token_id.is_none());
        assert!(!content.is_minted());
    }

    #[test]
    fn patch_reports_changes_only() {
        let mut content =
            StoredContent::new_pending("creator".into(), file(), FileLocation::default());
        content.title = "Old".into();

        let same = ContentPatch {
            title: Some("Old".into()),
            ..Default::default()
        };
        assert!(!same.apply(&mut content));

        let patch = ContentPatch {
            title: Some("New".into()),
            price: Some(2.5),
            ..Default::default()
        };
        assert!(patch.apply(&mut content));
        assert_eq!(content.title, "New");
        assert_eq!(content.price, 2.5);
    }
}
