// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access verification orchestrator.
//!
//! A request walks `ReceivedRequest → SignatureChecked → FreshnessChecked →
//! OwnershipChecked` and ends in `Granted` or `Denied`. Every step either
//! advances or terminates with an [`AccessError`]; nothing is skipped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use super::oracle::{OwnershipDecision, OwnershipOracle};
use super::retrieval::{FileRetriever, RetrievedFile};
use super::AccessError;
use crate::auth::{
    verify_wallet_signature, AccessChallenge, AccessTokenIssuer, ChallengeAction, ChallengeError,
    IssuedToken, TokenSubject,
};
use crate::crypto::{self, EnvelopeKey};
use crate::storage::{
    AuditEvent, AuditEventType, AuditLog, ContentDatabase, FileMetadata, StoredContent,
};

/// Wallet proof attached to access and creator requests.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedRequest {
    /// Base58 wallet public key.
    pub wallet_address: String,
    /// Base58 Ed25519 signature over `message`.
    pub signature: String,
    /// The exact challenge text that was signed.
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    ReceivedRequest,
    SignatureChecked,
    FreshnessChecked,
    OwnershipChecked,
    Granted,
    Denied,
}

/// Tracks one request through the state machine.
struct Verification<'a> {
    content_id: &'a str,
    state: VerificationState,
}

impl<'a> Verification<'a> {
    fn start(content_id: &'a str) -> Self {
        Self {
            content_id,
            state: VerificationState::ReceivedRequest,
        }
    }

    fn advance(&mut self, next: VerificationState) {
        tracing::debug!(
            content_id = %self.content_id,
            from = ?self.state,
            to = ?next,
            "access verification step"
        );
        self.state = next;
    }

    fn deny(&mut self, reason: AccessError) -> AccessError {
        self.advance(VerificationState::Denied);
        reason
    }
}

/// Outcome of a successful verification.
#[derive(Debug, Clone)]
pub struct GrantedAccess {
    pub wallet_address: String,
    pub content: StoredContent,
    pub decision: OwnershipDecision,
}

/// What the client receives for a granted download.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    File { bytes: Vec<u8>, file: FileMetadata },
    Redirect { url: url::Url, file: FileMetadata },
}

fn challenge_denial(err: ChallengeError) -> AccessError {
    match err {
        ChallengeError::Malformed
        | ChallengeError::WrongAction { .. }
        | ChallengeError::WrongContent { .. } => AccessError::InvalidSignature,
        ChallengeError::InvalidTimestamp | ChallengeError::OutsideWindow { .. } => {
            AccessError::ChallengeExpired
        }
    }
}

/// Check signature, challenge scope and freshness.
///
/// Shared by downloads and creator mutations.
pub fn authenticate(
    request: &SignedRequest,
    action: ChallengeAction,
    content_id: &str,
    now: DateTime<Utc>,
) -> Result<AccessChallenge, AccessError> {
    check_signature(request)?;
    check_challenge(request, action, content_id, now)
}

fn check_signature(request: &SignedRequest) -> Result<(), AccessError> {
    if verify_wallet_signature(
        &request.wallet_address,
        &request.signature,
        request.message.as_bytes(),
    ) {
        Ok(())
    } else {
        Err(AccessError::InvalidSignature)
    }
}

/// Parse the signed message and enforce its scope and the replay window.
fn check_challenge(
    request: &SignedRequest,
    action: ChallengeAction,
    content_id: &str,
    now: DateTime<Utc>,
) -> Result<AccessChallenge, AccessError> {
    let challenge = AccessChallenge::parse(&request.message).map_err(challenge_denial)?;
    challenge
        .ensure_scope(action, content_id)
        .map_err(challenge_denial)?;
    challenge.ensure_fresh(now).map_err(challenge_denial)?;
    Ok(challenge)
}

pub struct AccessVerifier {
    content_db: Arc<ContentDatabase>,
    oracle: OwnershipOracle,
    retriever: FileRetriever,
    envelope_key: Arc<EnvelopeKey>,
    tokens: AccessTokenIssuer,
    audit: AuditLog,
}

impl AccessVerifier {
    pub fn new(
        content_db: Arc<ContentDatabase>,
        oracle: OwnershipOracle,
        retriever: FileRetriever,
        envelope_key: Arc<EnvelopeKey>,
        tokens: AccessTokenIssuer,
        audit: AuditLog,
    ) -> Self {
        Self {
            content_db,
            oracle,
            retriever,
            envelope_key,
            tokens,
            audit,
        }
    }

    pub fn oracle(&self) -> &OwnershipOracle {
        &self.oracle
    }

    /// Run the full verification for `content_id`.
    pub async fn verify(
        &self,
        content_id: &str,
        request: &SignedRequest,
        now: DateTime<Utc>,
    ) -> Result<GrantedAccess, AccessError> {
        let result = self.run(content_id, request, now).await;
        match &result {
            Ok(granted) => {
                tracing::info!(
                    content_id = %content_id,
                    wallet = %granted.wallet_address,
                    decision = granted.decision.as_str(),
                    "access granted"
                );
                self.audit.record(
                    AuditEvent::new(AuditEventType::AccessGranted)
                        .with_wallet(&granted.wallet_address)
                        .with_content(content_id)
                        .with_details(json!({ "decision": granted.decision.as_str() })),
                );
            }
            Err(reason) => {
                tracing::info!(
                    content_id = %content_id,
                    wallet = %request.wallet_address,
                    reason = reason.error_code(),
                    "access denied"
                );
                self.audit.record(
                    AuditEvent::new(AuditEventType::AccessDenied)
                        .with_wallet(&request.wallet_address)
                        .with_content(content_id)
                        .failed(reason.error_code()),
                );
            }
        }
        result
    }

    async fn run(
        &self,
        content_id: &str,
        request: &SignedRequest,
        now: DateTime<Utc>,
    ) -> Result<GrantedAccess, AccessError> {
        let mut v = Verification::start(content_id);

        check_signature(request).map_err(|e| v.deny(e))?;
        v.advance(VerificationState::SignatureChecked);

        check_challenge(request, ChallengeAction::VerifyAccess, content_id, now)
            .map_err(|e| v.deny(e))?;
        v.advance(VerificationState::FreshnessChecked);

        let content = self
            .content_db
            .find_resource(content_id)
            .map_err(|e| v.deny(AccessError::StorageFailure(e.to_string())))?
            .ok_or_else(|| v.deny(AccessError::ResourceNotFound))?;

        let Some(token_id) = content.required_token_id.as_deref() else {
            return Err(v.deny(AccessError::MisconfiguredResource));
        };

        let decision = self
            .oracle
            .has_access(&request.wallet_address, Some(token_id), content_id)
            .await
            .map_err(|e| v.deny(AccessError::StorageFailure(e.to_string())))?;
        v.advance(VerificationState::OwnershipChecked);

        if !decision.is_granted() {
            return Err(v.deny(AccessError::AccessRefused));
        }
        v.advance(VerificationState::Granted);

        Ok(GrantedAccess {
            wallet_address: request.wallet_address.clone(),
            content,
            decision,
        })
    }

    /// Mint a short-lived token for a granted pair.
    pub fn issue_token(
        &self,
        granted: &GrantedAccess,
        ttl_secs: u64,
    ) -> Result<IssuedToken, AccessError> {
        let issued = self
            .tokens
            .issue(&granted.wallet_address, &granted.content.id, ttl_secs)
            .map_err(|e| AccessError::Internal(e.to_string()))?;

        self.audit.record(
            AuditEvent::new(AuditEventType::AccessTokenIssued)
                .with_wallet(&granted.wallet_address)
                .with_content(&granted.content.id)
                .with_details(json!({ "expires_in_seconds": issued.expires_in_seconds })),
        );
        Ok(issued)
    }

    /// Resolve a validated token to its content. The token must be bound to
    /// `content_id`.
    pub fn content_for_token(
        &self,
        content_id: &str,
        subject: &TokenSubject,
    ) -> Result<StoredContent, AccessError> {
        if subject.content_id != content_id {
            return Err(AccessError::TokenExpiredOrInvalid);
        }
        self.content_db
            .find_resource(content_id)
            .map_err(|e| AccessError::StorageFailure(e.to_string()))?
            .ok_or(AccessError::ResourceNotFound)
    }

    /// Fetch and, where needed, open the file of a granted content.
    pub async fn deliver(&self, content: &StoredContent) -> Result<Delivery, AccessError> {
        let file = content.file.clone();
        let delivery = match self.retriever.retrieve(&content.location).await? {
            RetrievedFile::Sealed(envelope) => {
                let bytes = crypto::open(&envelope, &self.envelope_key).map_err(|_| {
                    tracing::error!(content_id = %content.id, "stored envelope failed to open");
                    AccessError::FileIntegrityFailure
                })?;
                Delivery::File { bytes, file }
            }
            RetrievedFile::Bytes(bytes) => Delivery::File { bytes, file },
            RetrievedFile::Redirect(url) => Delivery::Redirect { url, file },
        };
        Ok(delivery)
    }

    /// Record a completed download.
    pub fn record_download(&self, wallet_address: &str, content_id: &str) {
        self.audit.record(
            AuditEvent::new(AuditEventType::FileDownloaded)
                .with_wallet(wallet_address)
                .with_content(content_id),
        );
    }
}
