// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Types shared by ledger index implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Current on-ledger state of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolder {
    /// Wallet address currently holding the token.
    pub holder: String,
    /// Token has been burned.
    pub burned: bool,
    /// Token account is frozen.
    pub frozen: bool,
}

impl TokenHolder {
    /// Holder matches and the token is still live.
    pub fn is_live_holder(&self, wallet_address: &str) -> bool {
        self.holder == wallet_address && !self.burned && !self.frozen
    }
}

/// Errors that can occur while querying the ledger index.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed index response: {0}")]
    MalformedResponse(String),
}

/// Read-only view of the token-ownership index.
#[async_trait]
pub trait LedgerIndex: Send + Sync {
    /// Look up the current holder of `token_id`.
    ///
    /// `Ok(None)` means the index does not know the token.
    async fn get_token_holder(&self, token_id: &str) -> Result<Option<TokenHolder>, LedgerError>;
}
