// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Download endpoints: signed one-shot access, token issuance, token download.

use axum::{
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::{
    access::{Delivery, SignedRequest},
    auth::{challenge::MAX_CHALLENGE_AGE_MS, AccessBearer, AccessChallenge, ChallengeAction},
    error::ApiError,
    models::{AccessTokenResponse, ChallengeQuery, ChallengeResponse, FileLinkResponse},
    state::AppState,
    storage::FileMetadata,
};

/// Header-safe filename: printable ASCII without quotes or backslashes.
fn disposition_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim().is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}

fn file_response(bytes: Vec<u8>, file: &FileMetadata) -> Response {
    let content_type = HeaderValue::from_str(&file.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        disposition_filename(&file.name)
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    let length = HeaderValue::from(bytes.len());

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_DISPOSITION, disposition),
            (CONTENT_LENGTH, length),
        ],
        bytes,
    )
        .into_response()
}

fn delivery_response(delivery: Delivery) -> Response {
    match delivery {
        Delivery::File { bytes, file } => file_response(bytes, &file),
        Delivery::Redirect { url, file } => Json(FileLinkResponse {
            success: true,
            file_url: url.to_string(),
            file_name: file.name,
            content_type: file.mime_type,
        })
        .into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/contents/{content_id}/challenge",
    params(
        ("content_id" = String, Path, description = "Content identifier"),
        ChallengeQuery
    ),
    tag = "Access",
    responses((status = 200, body = ChallengeResponse))
)]
pub async fn get_challenge(
    Path(content_id): Path<String>,
    Query(query): Query<ChallengeQuery>,
) -> Json<ChallengeResponse> {
    let action = query.action.unwrap_or(ChallengeAction::VerifyAccess);
    let challenge = AccessChallenge::new(action, content_id, Utc::now());
    Json(ChallengeResponse {
        message: challenge.to_message(),
        valid_for_ms: MAX_CHALLENGE_AGE_MS,
    })
}

#[utoipa::path(
    post,
    path = "/v1/contents/{content_id}/access",
    params(("content_id" = String, Path, description = "Content identifier")),
    request_body = SignedRequest,
    tag = "Access",
    responses(
        (status = 200, description = "File bytes, or a link for externally hosted files", body = FileLinkResponse),
        (status = 401, description = "Invalid signature or expired challenge"),
        (status = 403, description = "Wallet does not hold the required token"),
        (status = 404, description = "Content not found")
    )
)]
pub async fn request_access(
    Path(content_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SignedRequest>,
) -> Result<Response, ApiError> {
    let diagnostics = state.diagnostics();
    let granted = state
        .verifier
        .verify(&content_id, &request, Utc::now())
        .await
        .map_err(|e| e.into_api_error(diagnostics))?;

    let delivery = state
        .verifier
        .deliver(&granted.content)
        .await
        .map_err(|e| e.into_api_error(diagnostics))?;

    state
        .verifier
        .record_download(&granted.wallet_address, &content_id);
    Ok(delivery_response(delivery))
}

#[utoipa::path(
    post,
    path = "/v1/contents/{content_id}/access-token",
    params(("content_id" = String, Path, description = "Content identifier")),
    request_body = SignedRequest,
    tag = "Access",
    responses(
        (status = 200, body = AccessTokenResponse),
        (status = 401, description = "Invalid signature or expired challenge"),
        (status = 403, description = "Wallet does not hold the required token"),
        (status = 404, description = "Content not found")
    )
)]
pub async fn issue_access_token(
    Path(content_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SignedRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let diagnostics = state.diagnostics();
    let granted = state
        .verifier
        .verify(&content_id, &request, Utc::now())
        .await
        .map_err(|e| e.into_api_error(diagnostics))?;

    let issued = state
        .verifier
        .issue_token(&granted, state.settings.access_token_ttl_secs)
        .map_err(|e| e.into_api_error(diagnostics))?;

    Ok(Json(AccessTokenResponse {
        access_token: issued.token,
        expires_in_seconds: issued.expires_in_seconds,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/contents/{content_id}/download",
    params(("content_id" = String, Path, description = "Content identifier")),
    tag = "Access",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "File bytes, or a link for externally hosted files", body = FileLinkResponse),
        (status = 401, description = "Missing, expired or foreign access token"),
        (status = 404, description = "Content not found")
    )
)]
pub async fn download(
    Path(content_id): Path<String>,
    State(state): State<AppState>,
    AccessBearer(subject): AccessBearer,
) -> Result<Response, ApiError> {
    let diagnostics = state.diagnostics();
    let content = state
        .verifier
        .content_for_token(&content_id, &subject)
        .map_err(|e| e.into_api_error(diagnostics))?;

    let delivery = state
        .verifier
        .deliver(&content)
        .await
        .map_err(|e| e.into_api_error(diagnostics))?;

    state
        .verifier
        .record_download(&subject.wallet_address, &content_id);
    Ok(delivery_response(delivery))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::auth::signature::test_support::TestWallet;
    use crate::config::ExternalFileMode;
    use crate::state::test_support::{minted_content, test_state, test_state_with, TestState};
    use crate::state::ServiceSettings;
    use crate::storage::{FileLocation, FileMetadata, MintAttachment, StoredContent};
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    fn signed_body(wallet: &TestWallet, content_id: &str) -> String {
        let message =
            AccessChallenge::new(ChallengeAction::VerifyAccess, content_id, Utc::now()).to_message();
        serde_json::json!({
            "walletAddress": wallet.address(),
            "signature": wallet.sign(message.as_bytes()),
            "message": message,
        })
        .to_string()
    }

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn filenames_are_header_safe() {
        assert_eq!(disposition_filename("report.pdf"), "report.pdf");
        assert_eq!(disposition_filename("a\"b\\c\n.txt"), "a_b_c_.txt");
        assert_eq!(disposition_filename("résumé.pdf"), "r_sum_.pdf");
        assert_eq!(disposition_filename(""), "download");
    }

    #[tokio::test]
    async fn combined_flow_streams_decrypted_file() {
        let TestState { state, ledger, _dir } = test_state();
        let wallet = TestWallet::generate();
        let content = minted_content(&state, "creator", b"%PDF-1.7 body").await;
        ledger.hold(content.required_token_id.as_deref().unwrap(), &wallet.address());

        let response = router(state)
            .oneshot(post_json(
                &format!("/v1/contents/{}/access", content.id),
                signed_body(&wallet, &content.id),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "application/octet-stream");
        assert_eq!(headers[CONTENT_DISPOSITION], "attachment; filename=\"file.bin\"");
        assert_eq!(headers[CONTENT_LENGTH], "13");
        assert_eq!(headers["x-content-type-options"], "nosniff");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"%PDF-1.7 body");
    }

    #[tokio::test]
    async fn refused_wallet_gets_403_reason() {
        let TestState { state, _dir, .. } = test_state();
        let wallet = TestWallet::generate();
        let content = minted_content(&state, "creator", b"x").await;

        let response = router(state)
            .oneshot(post_json(
                &format!("/v1/contents/{}/access", content.id),
                signed_body(&wallet, &content.id),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error_code"], "access_refused");
    }

    #[tokio::test]
    async fn external_file_in_redirect_mode_returns_link() {
        let TestState { state, ledger, _dir } = test_state_with(ServiceSettings {
            external_file_mode: ExternalFileMode::Redirect,
            ..Default::default()
        });
        let wallet = TestWallet::generate();

        let content = StoredContent::new_pending(
            "creator".into(),
            FileMetadata {
                name: "video.mp4".into(),
                mime_type: "video/mp4".into(),
                size: 1024,
                sha256: None,
            },
            FileLocation {
                external_url: Some("https://cdn.example.com/video.mp4".into()),
                ..Default::default()
            },
        );
        state.content_db.insert_resource(&content).unwrap();
        state
            .content_db
            .attach_token(
                &content.id,
                &MintAttachment {
                    token_id: "MintVideo".into(),
                    title: "Video".into(),
                    description: String::new(),
                    price: 0.0,
                    category: None,
                },
            )
            .unwrap();
        ledger.hold("MintVideo", &wallet.address());

        let response = router(state)
            .oneshot(post_json(
                &format!("/v1/contents/{}/access", content.id),
                signed_body(&wallet, &content.id),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["fileUrl"], "https://cdn.example.com/video.mp4");
        assert_eq!(body["fileName"], "video.mp4");
        assert_eq!(body["contentType"], "video/mp4");
    }

    #[tokio::test]
    async fn token_flow_downloads_once_issued() {
        let TestState { state, ledger, _dir } = test_state();
        let wallet = TestWallet::generate();
        let content = minted_content(&state, "creator", b"token bytes").await;
        ledger.hold(content.required_token_id.as_deref().unwrap(), &wallet.address());
        let app = router(state);

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/v1/contents/{}/access-token", content.id),
                signed_body(&wallet, &content.id),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["expiresInSeconds"], 900);
        let token = body["accessToken"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/v1/contents/{}/download", content.id))
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"token bytes");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/contents/some-other-content/download")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await["error_code"],
            "token_expired_or_invalid"
        );
    }

    #[tokio::test]
    async fn download_without_token_is_401() {
        let TestState { state, _dir, .. } = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/v1/contents/c1/download")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error_code"], "missing_auth_header");
    }

    #[tokio::test]
    async fn challenge_endpoint_returns_signable_message() {
        let TestState { state, _dir, .. } = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/v1/contents/c1/challenge?action=delete_content")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let challenge = AccessChallenge::parse(body["message"].as_str().unwrap()).unwrap();
        challenge
            .ensure_scope(ChallengeAction::DeleteContent, "c1")
            .unwrap();
        challenge.ensure_fresh(Utc::now()).unwrap();
    }
}
