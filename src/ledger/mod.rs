// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger token-ownership index integration.
//!
//! This module provides functionality for:
//! - Querying the current holder of a soulbound access token
//! - Reporting burn / freeze state from the index

pub mod client;
pub mod types;

pub use client::DasClient;
pub use types::{LedgerError, LedgerIndex, TokenHolder};
