// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Creator uploads. Files are sealed before they touch the blob store.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::{
    crypto,
    error::ApiError,
    models::{FileView, UploadForm, UploadResponse},
    state::AppState,
    storage::{
        blobs::{new_blob_key, ENCRYPTED_PREFIX},
        AuditEvent, AuditEventType, FileLocation, FileMetadata, StoredContent,
    },
};

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

struct UploadedFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::new(e.status(), e.body_text())
}

/// Upload a file and create its pending content record.
#[utoipa::path(
    post,
    path = "/v1/uploads",
    tag = "Uploads",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored, content pending mint", body = UploadResponse),
        (status = 400, description = "Missing file or creator"),
        (status = 413, description = "Upload too large")
    )
)]
pub async fn upload_content(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut file: Option<UploadedFile> = None;
    let mut creator: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| "upload".to_string());
                let mime_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
                let bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
                file = Some(UploadedFile {
                    name,
                    mime_type,
                    bytes,
                });
            }
            Some("creator") => {
                let value = field.text().await.map_err(multipart_error)?;
                creator = Some(value.trim().to_string()).filter(|c| !c.is_empty());
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    let creator =
        creator.ok_or_else(|| ApiError::bad_request("Creator wallet address required"))?;
    if file.bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let diagnostics = state.diagnostics();
    let digest = hex::encode(Sha256::digest(&file.bytes));
    let envelope = crypto::seal(&file.bytes, &state.envelope_key);

    let blob_key = new_blob_key(ENCRYPTED_PREFIX);
    state
        .blobs
        .put(&blob_key, &envelope)
        .await
        .map_err(|e| ApiError::from_blob(e, diagnostics))?;

    let content = StoredContent::new_pending(
        creator.clone(),
        FileMetadata {
            name: file.name,
            mime_type: file.mime_type,
            size: file.bytes.len() as u64,
            sha256: Some(digest),
        },
        FileLocation {
            encrypted_blob: Some(blob_key.clone()),
            ..Default::default()
        },
    );

    if let Err(e) = state.content_db.insert_resource(&content) {
        if let Err(cleanup) = state.blobs.delete(&blob_key).await {
            tracing::warn!(key = %blob_key, error = %cleanup, "failed to remove orphaned upload");
        }
        return Err(ApiError::from_content_db(e, diagnostics));
    }

    tracing::info!(
        content_id = %content.id,
        creator = %creator,
        size = content.file.size,
        "content uploaded"
    );
    state.audit.record(
        AuditEvent::new(AuditEventType::ContentUploaded)
            .with_wallet(&creator)
            .with_content(&content.id)
            .with_details(json!({
                "file_name": content.file.name,
                "size": content.file.size,
            })),
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            content_id: content.id.clone(),
            upload: FileView::from(&content.file),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::state::test_support::{test_state, TestState};
    use crate::storage::ContentStatus;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    const BOUNDARY: &str = "unlockd-test-boundary";

    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file_name {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: text/plain\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/uploads")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn upload_seals_file_and_creates_pending_content() {
        let TestState { state, _dir, .. } = test_state();
        let body = multipart_body(&[
            ("file", Some("hello.txt"), b"hello world"),
            ("creator", None, b"CreatorWallet111"),
        ]);

        let response = router(state.clone()).oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let upload: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(upload["upload"]["name"], "hello.txt");
        assert_eq!(upload["upload"]["size"], 11);
        assert_eq!(
            upload["upload"]["sha256"],
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );

        let content_id = upload["contentId"].as_str().unwrap();
        let content = state.content_db.find_resource(content_id).unwrap().unwrap();
        assert_eq!(content.status, ContentStatus::Pending);
        assert_eq!(content.creator, "CreatorWallet111");
        assert!(content.required_token_id.is_none());

        let key = content.location.encrypted_blob.unwrap();
        assert!(key.starts_with("encrypted/"));
        let stored = state.blobs.get(&key).await.unwrap();
        assert_ne!(stored, b"hello world");
        assert_eq!(crypto::open(&stored, &state.envelope_key).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn upload_without_creator_is_rejected() {
        let TestState { state, _dir, .. } = test_state();
        let body = multipart_body(&[("file", Some("a.txt"), b"abc")]);

        let response = router(state.clone()).oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.content_db.list_resources(None, None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_without_file_is_rejected() {
        let TestState { state, _dir, .. } = test_state();
        let body = multipart_body(&[("creator", None, b"CreatorWallet111")]);

        let response = router(state).oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
