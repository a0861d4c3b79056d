// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Unlockd - Soulbound-Gated Encrypted File Delivery
//!
//! Creators upload files that are sealed at rest with AES-256-GCM. A file is
//! released only to a wallet that signs a fresh challenge and currently holds
//! the non-transferable access token minted for it.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `access` - Verification state machine, ownership oracle, file retrieval
//! - `auth` - Challenge documents, wallet signatures, access tokens
//! - `crypto` - Envelope sealing of stored files
//! - `ledger` - Token ownership index client
//! - `storage` - Content records, blobs and audit log

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod models;
pub mod state;
pub mod storage;
