// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state for the content service.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   db/content.redb        # Content records and access grants (redb)
//!   blobs/
//!     encrypted/{id}       # Envelope-sealed uploads
//!     plain/{id}           # Unencrypted uploads
//!   audit/
//!     {date}/events.jsonl  # Daily audit logs
//! ```
//!
//! Records and grants are stored as JSON values in redb tables; file bodies
//! live in the blob store and are referenced from the record by key.

pub mod audit;
pub mod blobs;
pub mod content_db;
pub mod paths;
pub mod records;

pub use audit::{AuditEvent, AuditEventType, AuditLog};
pub use blobs::{BlobError, BlobStore, LocalBlobStore};
pub use content_db::{ContentDatabase, ContentDbError};
pub use paths::StoragePaths;
pub use records::{
    ContentPatch, ContentStatus, FileLocation, FileMetadata, GrantType, MintAttachment,
    StorageLocator, StoredContent, StoredGrant,
};
