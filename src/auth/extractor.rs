// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for bearer credentials.
//!
//! Use the `AccessBearer` extractor on download handlers:
//!
//! ```rust,ignore
//! async fn download(AccessBearer(subject): AccessBearer) -> impl IntoResponse {
//!     // subject.wallet_address / subject.content_id come from a valid token
//! }
//! ```
//!
//! The extractor checks signature, structure and expiry. Binding the token to
//! the requested content id is the handler's job because only the handler
//! knows the path parameter.
//!
//! `PaymentBackend` guards endpoints only the settlement backend may call.
//! Its bearer must equal `PAYMENT_WEBHOOK_SECRET`.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::{AuthError, TokenSubject};
use crate::state::AppState;

/// Validated access token subject.
pub struct AccessBearer(pub TokenSubject);

impl FromRequestParts<AppState> for AccessBearer {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let subject = state
            .tokens
            .validate(token)
            .ok_or(AuthError::TokenExpiredOrInvalid)?;

        Ok(AccessBearer(subject))
    }
}

/// Request authenticated as the payment backend.
pub struct PaymentBackend;

impl FromRequestParts<AppState> for PaymentBackend {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = bearer_token(parts)?;

        if !credential_matches(&state.settings.payment_webhook_secret, presented) {
            tracing::warn!("payment backend credential rejected");
            return Err(AuthError::InvalidPaymentCredential);
        }
        Ok(PaymentBackend)
    }
}

/// Constant-time comparison over digests; an unset secret matches nothing.
fn credential_matches(expected: &str, presented: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let expected = Sha256::digest(expected.as_bytes());
    let presented = Sha256::digest(presented.as_bytes());
    expected.as_slice().ct_eq(presented.as_slice()).into()
}

/// Pull the raw token out of `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{test_state, TestState, TEST_PAYMENT_SECRET};
    use crate::state::ServiceSettings;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(v) = value {
            builder = builder.header("Authorization", v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn requires_auth_header() {
        let TestState { state, _dir, .. } = test_state();
        let mut parts = parts_with_auth(None);

        let result = AccessBearer::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn rejects_non_bearer_scheme() {
        let TestState { state, _dir, .. } = test_state();
        let mut parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));

        let result = AccessBearer::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn rejects_garbage_token() {
        let TestState { state, _dir, .. } = test_state();
        let mut parts = parts_with_auth(Some("Bearer not.a.token"));

        let result = AccessBearer::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::TokenExpiredOrInvalid)));
    }

    #[tokio::test]
    async fn accepts_issued_token() {
        let TestState { state, _dir, .. } = test_state();
        let issued = state.tokens.issue("wallet-1", "content-1", 60).unwrap();
        let header = format!("Bearer {}", issued.token);
        let mut parts = parts_with_auth(Some(&header));

        let AccessBearer(subject) = AccessBearer::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(subject.wallet_address, "wallet-1");
        assert_eq!(subject.content_id, "content-1");
    }

    #[tokio::test]
    async fn payment_backend_requires_the_configured_secret() {
        let TestState { state, _dir, .. } = test_state();

        let header = format!("Bearer {TEST_PAYMENT_SECRET}");
        let mut parts = parts_with_auth(Some(&header));
        assert!(PaymentBackend::from_request_parts(&mut parts, &state)
            .await
            .is_ok());

        let mut parts = parts_with_auth(Some("Bearer guessed-secret"));
        assert!(matches!(
            PaymentBackend::from_request_parts(&mut parts, &state).await,
            Err(AuthError::InvalidPaymentCredential)
        ));

        let mut parts = parts_with_auth(None);
        assert!(matches!(
            PaymentBackend::from_request_parts(&mut parts, &state).await,
            Err(AuthError::MissingAuthHeader)
        ));
    }

    #[tokio::test]
    async fn unset_payment_secret_accepts_nothing() {
        let TestState { state, _dir, .. } =
            crate::state::test_support::test_state_with(ServiceSettings::default());
        assert!(state.settings.payment_webhook_secret.is_empty());

        let mut parts = parts_with_auth(Some("Bearer anything"));
        assert!(matches!(
            PaymentBackend::from_request_parts(&mut parts, &state).await,
            Err(AuthError::InvalidPaymentCredential)
        ));
    }
}
