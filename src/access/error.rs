// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reasons an access attempt can fail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Signature did not verify, or the signed message does not authorize
    /// this request.
    #[error("Invalid signature")]
    InvalidSignature,
    /// Challenge timestamp unparsable or outside the replay window.
    #[error("Challenge expired")]
    ChallengeExpired,
    #[error("Content not found")]
    ResourceNotFound,
    /// Content has no required token id.
    #[error("Content is not configured for access")]
    MisconfiguredResource,
    #[error("Access denied")]
    AccessRefused,
    #[error("File integrity check failed")]
    FileIntegrityFailure,
    #[error("File retrieval failed")]
    FileRetrievalFailure(String),
    #[error("No file configured for content")]
    NoFileConfigured,
    #[error("Access token expired or invalid")]
    TokenExpiredOrInvalid,
    /// Record or blob store fault.
    #[error("Storage failure")]
    StorageFailure(String),
    #[error("Internal server error")]
    Internal(String),
}

impl AccessError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::InvalidSignature => "invalid_signature",
            AccessError::ChallengeExpired => "challenge_expired",
            AccessError::ResourceNotFound => "resource_not_found",
            AccessError::MisconfiguredResource => "misconfigured_resource",
            AccessError::AccessRefused => "access_refused",
            AccessError::FileIntegrityFailure => "file_integrity_failure",
            AccessError::FileRetrievalFailure(_) => "file_retrieval_failure",
            AccessError::NoFileConfigured => "no_file_configured",
            AccessError::TokenExpiredOrInvalid => "token_expired_or_invalid",
            AccessError::StorageFailure(_) => "storage_failure",
            AccessError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AccessError::InvalidSignature
            | AccessError::ChallengeExpired
            | AccessError::TokenExpiredOrInvalid => StatusCode::UNAUTHORIZED,
            AccessError::AccessRefused => StatusCode::FORBIDDEN,
            AccessError::ResourceNotFound => StatusCode::NOT_FOUND,
            AccessError::MisconfiguredResource
            | AccessError::FileIntegrityFailure
            | AccessError::FileRetrievalFailure(_)
            | AccessError::NoFileConfigured
            | AccessError::StorageFailure(_)
            | AccessError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal detail, if any, for diagnostic mode.
    fn detail(&self) -> Option<&str> {
        match self {
            AccessError::FileRetrievalFailure(detail)
            | AccessError::StorageFailure(detail)
            | AccessError::Internal(detail) => Some(detail),
            _ => None,
        }
    }

    /// Convert to the HTTP error shape. Server faults are logged here.
    pub fn into_api_error(self, diagnostics: bool) -> ApiError {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                error_code = self.error_code(),
                detail = self.detail().unwrap_or_default(),
                "access request failed"
            );
        }

        let mut error = ApiError::new(status, self.to_string()).with_code(self.error_code());
        if diagnostics {
            if let Some(detail) = self.detail() {
                error = error.with_details(detail);
            }
        }
        error
    }
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        self.into_api_error(false).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn status_mapping() {
        assert_eq!(AccessError::InvalidSignature.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AccessError::ChallengeExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AccessError::TokenExpiredOrInvalid.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AccessError::AccessRefused.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AccessError::ResourceNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AccessError::NoFileConfigured.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AccessError::MisconfiguredResource.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn body_carries_reason_code() {
        let response = AccessError::AccessRefused.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "access_refused");
        assert!(body.get("details").is_none());
    }

    #[test]
    fn details_only_in_diagnostic_mode() {
        let err = AccessError::FileRetrievalFailure("HTTP 502 from cdn".into());
        assert!(err.clone().into_api_error(false).details.is_none());

        let api = err.into_api_error(true);
        assert_eq!(api.details.as_deref(), Some("HTTP 502 from cdn"));
        assert_eq!(api.message, "File retrieval failed");
    }
}
