// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Field names are camelCase on
//! the wire. All types derive `ToSchema` for the OpenAPI document.
//!
//! ## Model Categories
//!
//! - **Access**: signed access requests, tokens, file links
//! - **Contents**: public content views, mint/update/delete bodies
//! - **Grants**: purchase records
//! - **Uploads**: multipart form and upload results
//! - **Ownership**: ledger-only ownership probe

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::access::SignedRequest;
use crate::auth::ChallengeAction;
use crate::storage::{ContentStatus, FileMetadata, GrantType, StoredContent, StoredGrant};

// =============================================================================
// Access
// =============================================================================

/// Short-lived download token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in_seconds: u64,
}

/// Returned instead of bytes when the file lives at an external URL.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileLinkResponse {
    pub success: bool,
    pub file_url: String,
    pub file_name: String,
    pub content_type: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ChallengeQuery {
    /// Action the challenge should authorize (default `verify_access`).
    pub action: Option<ChallengeAction>,
}

/// A challenge document ready to be signed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    /// Exact text to sign.
    pub message: String,
    /// Milliseconds the signed message stays acceptable.
    pub valid_for_ms: i64,
}

// =============================================================================
// Contents
// =============================================================================

/// File metadata as exposed to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileView {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl From<&FileMetadata> for FileView {
    fn from(file: &FileMetadata) -> Self {
        Self {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            sha256: file.sha256.clone(),
        }
    }
}

/// Public view of a content item. Never exposes storage locators.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentView {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub creator: String,
    pub price: f64,
    pub status: ContentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    pub file: FileView,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&StoredContent> for ContentView {
    fn from(content: &StoredContent) -> Self {
        Self {
            id: content.id.clone(),
            title: content.title.clone(),
            description: content.description.clone(),
            category: content.category.clone(),
            creator: content.creator.clone(),
            price: content.price,
            status: content.status,
            token_id: content.required_token_id.clone(),
            file: FileView::from(&content.file),
            created_at: content.created_at,
            updated_at: content.updated_at,
        }
    }
}

/// Listing entry with the caller's ownership flag.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    #[serde(flatten)]
    pub content: ContentView,
    /// Caller holds a grant for this content.
    pub owned: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListContentsQuery {
    /// Only list content by this creator wallet.
    pub creator: Option<String>,
}

/// Attach the access token to an upload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    /// Creator proof over an `attach_token` challenge.
    #[serde(flatten)]
    pub proof: SignedRequest,
    pub token_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    pub category: Option<String>,
}

/// Creator edit. Only title, description and price can change.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentRequest {
    /// Creator proof over an `update_content` challenge.
    #[serde(flatten)]
    pub proof: SignedRequest,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

// =============================================================================
// Grants
// =============================================================================

/// Record a confirmed purchase.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    /// Buyer wallet address.
    pub buyer: String,
    pub token_id: String,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantView {
    pub content_id: String,
    pub owner: String,
    pub token_id: String,
    pub grant_type: GrantType,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredGrant> for GrantView {
    fn from(grant: &StoredGrant) -> Self {
        Self {
            content_id: grant.content_id.clone(),
            owner: grant.owner.clone(),
            token_id: grant.token_id.clone(),
            grant_type: grant.grant_type,
            created_at: grant.created_at,
        }
    }
}

// =============================================================================
// Uploads
// =============================================================================

/// Multipart form accepted by `POST /v1/uploads`.
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    /// The file to protect.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Creator wallet address.
    pub creator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub content_id: String,
    pub upload: FileView,
}

// =============================================================================
// Ownership
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOwnershipRequest {
    pub wallet_address: String,
    pub token_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOwnershipResponse {
    pub has_access: bool,
}
