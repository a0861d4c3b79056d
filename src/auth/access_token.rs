// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Short-lived download tokens.
//!
//! After a wallet passes signature, freshness and ownership checks it may be
//! handed an HS256 JWT instead of the file itself. The token binds exactly one
//! `(wallet, content)` pair and expires `ttl` seconds after issuance. Nothing
//! is stored server-side; the signing secret is the only state.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default token lifetime (15 minutes).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 900;

/// Longest lifetime the service will configure for access tokens.
pub const MAX_TOKEN_TTL_SECS: u64 = 86_400;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessClaims {
    /// Wallet address the token was issued to.
    sub: String,
    /// Content the token unlocks.
    content_id: String,
    /// Issued at (Unix seconds).
    iat: i64,
    /// Expiry (Unix seconds).
    exp: i64,
}

/// Identity and content recovered from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub wallet_address: String,
    pub content_id: String,
    pub expires_at: i64,
}

/// A freshly minted token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in_seconds: u64,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to sign access token: {0}")]
pub struct AccessTokenError(String);

/// Issues and validates access tokens with a process-wide HMAC secret.
#[derive(Clone)]
pub struct AccessTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    default_ttl_secs: u64,
}

impl AccessTokenIssuer {
    pub fn new(secret: &[u8], default_ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            default_ttl_secs,
        }
    }

    /// Lifetime applied when callers do not ask for a specific one.
    pub fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    /// Issue a token valid for `ttl_secs` from now.
    pub fn issue(
        &self,
        wallet_address: &str,
        content_id: &str,
        ttl_secs: u64,
    ) -> Result<IssuedToken, AccessTokenError> {
        self.issue_at(wallet_address, content_id, ttl_secs, Utc::now())
    }

    /// Issue a token as if the current instant were `now`.
    pub fn issue_at(
        &self,
        wallet_address: &str,
        content_id: &str,
        ttl_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AccessTokenError> {
        let iat = now.timestamp();
        let claims = AccessClaims {
            sub: wallet_address.to_string(),
            content_id: content_id.to_string(),
            iat,
            exp: iat.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AccessTokenError(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_in_seconds: ttl_secs,
        })
    }

    /// Validate signature, structure and expiry.
    ///
    /// Every failure collapses to `None`.
    pub fn validate(&self, token: &str) -> Option<TokenSubject> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        match decode::<AccessClaims>(token, &self.decoding, &validation) {
            Ok(data) => Some(TokenSubject {
                wallet_address: data.claims.sub,
                content_id: data.claims.content_id,
                expires_at: data.claims.exp,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "access token rejected");
                None
            }
        }
    }

    /// Validate and additionally require the token to be bound to `content_id`.
    pub fn validate_for(&self, token: &str, content_id: &str) -> Option<TokenSubject> {
        self.validate(token)
            .filter(|subject| subject.content_id == content_id)
    }
}
