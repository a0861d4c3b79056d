// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use crate::access::{AccessVerifier, FileRetriever, OwnershipOracle};
use crate::auth::{AccessTokenIssuer, DEFAULT_TOKEN_TTL_SECS};
use crate::config::{
    AppConfig, ExternalFileMode, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_LEDGER_TIMEOUT_SECS,
};
use crate::crypto::EnvelopeKey;
use crate::ledger::LedgerIndex;
use crate::storage::{AuditLog, BlobStore, ContentDatabase, StoragePaths};

/// Tunables shared by handlers.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub access_token_ttl_secs: u64,
    pub diagnostic_errors: bool,
    pub ledger_timeout: Duration,
    pub fetch_timeout: Duration,
    pub external_file_mode: ExternalFileMode,
    /// Bearer accepted from the payment backend; empty accepts nothing.
    pub payment_webhook_secret: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            access_token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            diagnostic_errors: false,
            ledger_timeout: Duration::from_secs(DEFAULT_LEDGER_TIMEOUT_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            external_file_mode: ExternalFileMode::Fetch,
            payment_webhook_secret: String::new(),
        }
    }
}

impl ServiceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            access_token_ttl_secs: config.access_token_ttl_secs,
            diagnostic_errors: config.diagnostic_errors,
            ledger_timeout: config.ledger_timeout,
            fetch_timeout: config.fetch_timeout,
            external_file_mode: config.external_file_mode,
            payment_webhook_secret: config.payment_webhook_secret.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub content_db: Arc<ContentDatabase>,
    pub blobs: Arc<dyn BlobStore>,
    pub envelope_key: Arc<EnvelopeKey>,
    pub tokens: AccessTokenIssuer,
    pub verifier: Arc<AccessVerifier>,
    pub audit: AuditLog,
    pub paths: StoragePaths,
    pub settings: Arc<ServiceSettings>,
}

impl AppState {
    /// Wire the service together from its handles.
    pub fn new(
        content_db: Arc<ContentDatabase>,
        blobs: Arc<dyn BlobStore>,
        ledger: Arc<dyn LedgerIndex>,
        envelope_key: EnvelopeKey,
        jwt_secret: &[u8],
        paths: StoragePaths,
        settings: ServiceSettings,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(settings.fetch_timeout)
            .build()?;

        let envelope_key = Arc::new(envelope_key);
        let tokens = AccessTokenIssuer::new(jwt_secret, settings.access_token_ttl_secs);
        let audit = AuditLog::new(paths.clone());

        let oracle = OwnershipOracle::new(ledger, content_db.clone(), settings.ledger_timeout);
        let retriever = FileRetriever::new(blobs.clone(), http, settings.external_file_mode);
        let verifier = AccessVerifier::new(
            content_db.clone(),
            oracle,
            retriever,
            envelope_key.clone(),
            tokens.clone(),
            audit.clone(),
        );

        Ok(Self {
            content_db,
            blobs,
            envelope_key,
            tokens,
            verifier: Arc::new(verifier),
            audit,
            paths,
            settings: Arc::new(settings),
        })
    }

    /// Whether internal error detail may be returned to clients.
    pub fn diagnostics(&self) -> bool {
        self.settings.diagnostic_errors
    }
}
