// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded content and grant database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `contents`: content_id → serialized StoredContent
//! - `grants`: composite key (content_id|owner) → serialized StoredGrant
//!
//! The composite grant key makes `(content, owner)` unique and lets all grants
//! of one content be range-scanned.

use std::path::Path;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::records::{ContentPatch, ContentStatus, MintAttachment, StoredContent, StoredGrant};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: content_id → serialized StoredContent (JSON bytes).
const CONTENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("contents");

/// Grants: `content_id|owner` → serialized StoredGrant (JSON bytes).
const GRANTS: TableDefinition<&str, &[u8]> = TableDefinition::new("grants");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ContentDbError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("content {0} already has an access token")]
    AlreadyMinted(String),
}

pub type ContentDbResult<T> = Result<T, ContentDbError>;

// =============================================================================
// Key Helpers
// =============================================================================

fn grant_key(content_id: &str, owner: &str) -> String {
    format!("{content_id}|{owner}")
}

/// `[start, end)` covering every grant key of `content_id`. `}` is the byte
/// right after `|`.
fn grant_range(content_id: &str) -> (String, String) {
    (format!("{content_id}|"), format!("{content_id}}}"))
}

// =============================================================================
// ContentDatabase
// =============================================================================

/// Embedded ACID store for content records and access grants.
pub struct ContentDatabase {
    db: Database,
}

impl ContentDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> ContentDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CONTENTS)?;
            let _ = write_txn.open_table(GRANTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Open a read transaction to confirm the database is usable.
    pub fn ping(&self) -> ContentDbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(CONTENTS)?;
        Ok(())
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Insert a new content record.
    pub fn insert_resource(&self, content: &StoredContent) -> ContentDbResult<()> {
        let json = serde_json::to_vec(content)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CONTENTS)?;
            if table.get(content.id.as_str())?.is_some() {
                return Err(ContentDbError::AlreadyExists(content.id.clone()));
            }
            table.insert(content.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a content record by id.
    pub fn find_resource(&self, content_id: &str) -> ContentDbResult<Option<StoredContent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONTENTS)?;
        match table.get(content_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List content, optionally filtered by status and creator, newest first.
    pub fn list_resources(
        &self,
        status: Option<ContentStatus>,
        creator: Option<&str>,
    ) -> ContentDbResult<Vec<StoredContent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONTENTS)?;

        let mut contents = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let content: StoredContent = serde_json::from_slice(value.value())?;
            if status.is_some_and(|s| s != content.status) {
                continue;
            }
            if creator.is_some_and(|c| c != content.creator) {
                continue;
            }
            contents.push(content);
        }

        contents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(contents)
    }

    /// Attach the access token to a pending content and mark it minted.
    ///
    /// Succeeds at most once per content.
    pub fn attach_token(
        &self,
        content_id: &str,
        attachment: &MintAttachment,
    ) -> ContentDbResult<StoredContent> {
        let write_txn = self.db.begin_write()?;
        let content = {
            let mut table = write_txn.open_table(CONTENTS)?;
            let mut content: StoredContent = match table.get(content_id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(ContentDbError::NotFound(content_id.to_string())),
            };

            if content.is_minted() || content.required_token_id.is_some() {
                return Err(ContentDbError::AlreadyMinted(content_id.to_string()));
            }

            content.required_token_id = Some(attachment.token_id.clone());
            content.title = attachment.title.clone();
            content.description = attachment.description.clone();
            content.price = attachment.price;
            content.category = attachment.category.clone();
            content.status = ContentStatus::Minted;
            content.updated_at = Utc::now();

            let json = serde_json::to_vec(&content)?;
            table.insert(content_id, json.as_slice())?;
            content
        };
        write_txn.commit()?;
        Ok(content)
    }

    /// Apply a creator edit. Returns the number of modified records (0 or 1);
    /// a patch that changes nothing modifies nothing.
    pub fn update_resource(&self, content_id: &str, patch: &ContentPatch) -> ContentDbResult<u64> {
        let write_txn = self.db.begin_write()?;
        let modified = {
            let mut table = write_txn.open_table(CONTENTS)?;
            let mut content: StoredContent = match table.get(content_id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Ok(0),
            };

            if patch.apply(&mut content) {
                content.updated_at = Utc::now();
                let json = serde_json::to_vec(&content)?;
                table.insert(content_id, json.as_slice())?;
                1
            } else {
                0
            }
        };
        write_txn.commit()?;
        Ok(modified)
    }

    /// Remove a content record together with all of its grants.
    ///
    /// Returns the removed record.
    pub fn delete_resource(&self, content_id: &str) -> ContentDbResult<Option<StoredContent>> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut contents = write_txn.open_table(CONTENTS)?;
            let removed: Option<StoredContent> = match contents.remove(content_id)? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };

            let mut grants = write_txn.open_table(GRANTS)?;
            let (start, end) = grant_range(content_id);
            let keys: Vec<String> = grants
                .range(start.as_str()..end.as_str())?
                .map(|entry| entry.map(|(key, _)| key.value().to_string()))
                .collect::<Result<_, _>>()?;
            for key in &keys {
                grants.remove(key.as_str())?;
            }

            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    // =========================================================================
    // Grants
    // =========================================================================

    /// Record a grant. At most one grant exists per `(content, owner)`.
    pub fn insert_grant(&self, grant: &StoredGrant) -> ContentDbResult<()> {
        let key = grant_key(&grant.content_id, &grant.owner);
        let json = serde_json::to_vec(grant)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(GRANTS)?;
            if table.get(key.as_str())?.is_some() {
                return Err(ContentDbError::AlreadyExists(key));
            }
            table.insert(key.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up the grant for `(content, owner)`.
    pub fn find_grant(&self, content_id: &str, owner: &str) -> ContentDbResult<Option<StoredGrant>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(GRANTS)?;
        match table.get(grant_key(content_id, owner).as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All grants recorded for one content.
    pub fn list_grants_for_resource(&self, content_id: &str) -> ContentDbResult<Vec<StoredGrant>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(GRANTS)?;
        let (start, end) = grant_range(content_id);

        let mut grants = Vec::new();
        for entry in table.range(start.as_str()..end.as_str())? {
            let (_, value) = entry?;
            grants.push(serde_json::from_slice(value.value())?);
        }
        Ok(grants)
    }

    /// All grants held by one wallet.
    pub fn list_grants_by_owner(&self, owner: &str) -> ContentDbResult<Vec<StoredGrant>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(GRANTS)?;

        let mut grants = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let grant: StoredGrant = serde_json::from_slice(value.value())?;
            if grant.owner == owner {
                grants.push(grant);
            }
        }
        Ok(grants)
    }
}

// =============================================================================
// Tests
// =============================================================================
