// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership oracle: live ledger first, local grant as fallback.

use std::sync::Arc;
use std::time::Duration;

use crate::ledger::LedgerIndex;
use crate::storage::{ContentDatabase, ContentDbError};

/// How an ownership question was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipDecision {
    /// The ledger reports the wallet as live holder of the token.
    LedgerConfirmed,
    /// No ledger evidence, but a local grant exists.
    GrantConfirmed,
    Denied,
}

impl OwnershipDecision {
    pub fn is_granted(self) -> bool {
        !matches!(self, OwnershipDecision::Denied)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OwnershipDecision::LedgerConfirmed => "ledger_confirmed",
            OwnershipDecision::GrantConfirmed => "grant_confirmed",
            OwnershipDecision::Denied => "denied",
        }
    }
}

pub struct OwnershipOracle {
    ledger: Arc<dyn LedgerIndex>,
    content_db: Arc<ContentDatabase>,
    ledger_timeout: Duration,
}

impl OwnershipOracle {
    pub fn new(
        ledger: Arc<dyn LedgerIndex>,
        content_db: Arc<ContentDatabase>,
        ledger_timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            content_db,
            ledger_timeout,
        }
    }

    /// Does `wallet` currently satisfy the access policy for `content_id`?
    ///
    /// A missing `required_token_id` is `Denied` without any lookup.
    pub async fn has_access(
        &self,
        wallet: &str,
        required_token_id: Option<&str>,
        content_id: &str,
    ) -> Result<OwnershipDecision, ContentDbError> {
        let Some(token_id) = required_token_id else {
            return Ok(OwnershipDecision::Denied);
        };

        if self.ledger_confirms(wallet, token_id).await {
            return Ok(OwnershipDecision::LedgerConfirmed);
        }

        match self.content_db.find_grant(content_id, wallet)? {
            Some(_) => Ok(OwnershipDecision::GrantConfirmed),
            None => Ok(OwnershipDecision::Denied),
        }
    }

    /// Ledger-only check. Errors and timeouts count as "no evidence".
    pub async fn ledger_confirms(&self, wallet: &str, token_id: &str) -> bool {
        let lookup = tokio::time::timeout(self.ledger_timeout, self.ledger.get_token_holder(token_id));

        match lookup.await {
            Ok(Ok(Some(holder))) => holder.is_live_holder(wallet),
            Ok(Ok(None)) => {
                tracing::debug!(token_id = %token_id, "token not found on ledger");
                false
            }
            Ok(Err(e)) => {
                tracing::warn!(token_id = %token_id, error = %e, "ledger lookup failed");
                false
            }
            Err(_) => {
                tracing::warn!(
                    token_id = %token_id,
                    timeout_ms = self.ledger_timeout.as_millis() as u64,
                    "ledger lookup timed out"
                );
                false
            }
        }
    }
}
