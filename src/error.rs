// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::{BlobError, ContentDbError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let code = match status {
            StatusCode::BAD_REQUEST => "bad_request",
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::FORBIDDEN => "forbidden",
            StatusCode::NOT_FOUND => "not_found",
            StatusCode::CONFLICT => "conflict",
            StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
            StatusCode::UNPROCESSABLE_ENTITY => "unprocessable_entity",
            _ if status.is_server_error() => "internal_error",
            _ => "error",
        };
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Server fault. The cause is logged; the body carries a generic message
    /// and the cause only when `diagnostics` is on.
    pub fn internal(cause: impl std::fmt::Display, diagnostics: bool) -> Self {
        let cause = cause.to_string();
        tracing::error!(error = %cause, "internal error");
        let mut error = Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        if diagnostics {
            error.details = Some(cause);
        }
        error
    }

    /// Override the machine-readable code.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Map a record-store failure. Only `NotFound`/`AlreadyExists`/
    /// `AlreadyMinted` are client-visible; the rest are server faults.
    pub fn from_content_db(err: ContentDbError, diagnostics: bool) -> Self {
        match err {
            ContentDbError::NotFound(_) => Self::not_found("Content not found"),
            ContentDbError::AlreadyExists(_) => Self::conflict("Record already exists"),
            ContentDbError::AlreadyMinted(_) => {
                Self::conflict("Content already has an access token").with_code("already_minted")
            }
            other => Self::internal(other, diagnostics).with_code("storage_failure"),
        }
    }

    /// Map a blob-store failure; always a server fault.
    pub fn from_blob(err: BlobError, diagnostics: bool) -> Self {
        Self::internal(err, diagnostics).with_code("storage_failure")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code,
            details: self.details,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.code, "not_found");
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let unp = ApiError::unprocessable("oops");
        assert_eq!(unp.status, StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(ApiError::forbidden("no").status, StatusCode::FORBIDDEN);
        assert_eq!(ApiError::conflict("dup").code, "conflict");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data","error_code":"bad_request"}"#);
    }

    #[tokio::test]
    async fn internal_hides_cause_unless_diagnostic() {
        let hidden = ApiError::internal("disk on fire", false);
        assert_eq!(hidden.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(hidden.details.is_none());

        let body_bytes = to_bytes(hidden.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(!String::from_utf8_lossy(&body_bytes).contains("disk on fire"));

        let shown = ApiError::internal("disk on fire", true);
        assert_eq!(shown.details.as_deref(), Some("disk on fire"));
    }

    #[test]
    fn content_db_errors_map_to_status() {
        let minted = ApiError::from_content_db(ContentDbError::AlreadyMinted("c".into()), false);
        assert_eq!(minted.status, StatusCode::CONFLICT);
        assert_eq!(minted.code, "already_minted");

        let missing = ApiError::from_content_db(ContentDbError::NotFound("c".into()), false);
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let serde = serde_json::from_str::<u8>("x").unwrap_err();
        let fault = ApiError::from_content_db(ContentDbError::Serde(serde), false);
        assert_eq!(fault.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(fault.code, "storage_failure");
    }
}
