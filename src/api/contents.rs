// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Content lifecycle endpoints.
//!
//! Listing and lookups of minted content are public. Mint, update and delete require the
//! creator's signature over a challenge scoped to that action and content.
//! Purchases are recorded by the payment backend once settlement confirms,
//! authenticated with its shared bearer secret.

use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    access::{authenticate, SignedRequest},
    auth::{ChallengeAction, PaymentBackend},
    error::ApiError,
    models::{
        ContentSummary, ContentView, GrantView, ListContentsQuery, MintRequest, PurchaseRequest,
        UpdateContentRequest,
    },
    state::AppState,
    storage::{
        AuditEvent, AuditEventType, ContentDbError, ContentPatch, ContentStatus,
        GrantType, MintAttachment, StoredContent, StoredGrant,
    },
};

/// Header naming the caller's wallet for the `owned` flag on listings.
pub const WALLET_HEADER: &str = "x-wallet-address";

fn load_content(state: &AppState, content_id: &str) -> Result<StoredContent, ApiError> {
    state
        .content_db
        .find_resource(content_id)
        .map_err(|e| ApiError::from_content_db(e, state.diagnostics()))?
        .ok_or_else(|| ApiError::not_found("Content not found"))
}

/// Verify the signed proof and require the signer to be the creator.
fn require_creator(
    state: &AppState,
    proof: &SignedRequest,
    action: ChallengeAction,
    content: &StoredContent,
) -> Result<(), ApiError> {
    authenticate(proof, action, &content.id, Utc::now())
        .map_err(|e| e.into_api_error(state.diagnostics()))?;

    if proof.wallet_address != content.creator {
        tracing::info!(
            content_id = %content.id,
            wallet = %proof.wallet_address,
            action = action.as_str(),
            "creator action refused"
        );
        return Err(ApiError::forbidden("Only the creator can modify this content"));
    }
    Ok(())
}

fn valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}

/// List minted content.
#[utoipa::path(
    get,
    path = "/v1/contents",
    params(
        ListContentsQuery,
        ("X-Wallet-Address" = Option<String>, Header, description = "Wallet used to compute the owned flag")
    ),
    tag = "Contents",
    responses((status = 200, body = Vec<ContentSummary>))
)]
pub async fn list_contents(
    State(state): State<AppState>,
    Query(query): Query<ListContentsQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<ContentSummary>>, ApiError> {
    let diagnostics = state.diagnostics();
    let contents = state
        .content_db
        .list_resources(Some(ContentStatus::Minted), query.creator.as_deref())
        .map_err(|e| ApiError::from_content_db(e, diagnostics))?;

    let owned: HashSet<String> = match caller_wallet(&headers) {
        Some(wallet) => state
            .content_db
            .list_grants_by_owner(wallet)
            .map_err(|e| ApiError::from_content_db(e, diagnostics))?
            .into_iter()
            .map(|g| g.content_id)
            .collect(),
        None => HashSet::new(),
    };

    let summaries = contents
        .iter()
        .map(|content| ContentSummary {
            owned: owned.contains(&content.id),
            content: ContentView::from(content),
        })
        .collect();

    Ok(Json(summaries))
}

fn caller_wallet(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(WALLET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|w| !w.is_empty())
}

/// Fetch one content record.
///
/// Pending uploads are only visible to their creator.
#[utoipa::path(
    get,
    path = "/v1/contents/{content_id}",
    params(
        ("content_id" = String, Path, description = "Content identifier"),
        ("X-Wallet-Address" = Option<String>, Header, description = "Creator wallet, required to see pending uploads")
    ),
    tag = "Contents",
    responses(
        (status = 200, body = ContentView),
        (status = 404, description = "Content not found")
    )
)]
pub async fn get_content(
    Path(content_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ContentView>, ApiError> {
    let content = load_content(&state, &content_id)?;
    if !content.is_minted() && caller_wallet(&headers) != Some(content.creator.as_str()) {
        return Err(ApiError::not_found("Content not found"));
    }
    Ok(Json(ContentView::from(&content)))
}

/// Attach the access token to a pending upload.
///
/// Runs once per content; the creator receives a grant for their own work.
#[utoipa::path(
    post,
    path = "/v1/contents/{content_id}/mint",
    params(("content_id" = String, Path, description = "Content identifier")),
    request_body = MintRequest,
    tag = "Contents",
    responses(
        (status = 200, body = ContentView),
        (status = 400, description = "Invalid mint details"),
        (status = 401, description = "Invalid signature or expired challenge"),
        (status = 403, description = "Signer is not the creator"),
        (status = 404, description = "Content not found"),
        (status = 409, description = "Content already minted")
    )
)]
pub async fn mint_content(
    Path(content_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<MintRequest>,
) -> Result<Json<ContentView>, ApiError> {
    let diagnostics = state.diagnostics();
    let content = load_content(&state, &content_id)?;
    require_creator(&state, &request.proof, ChallengeAction::AttachToken, &content)?;

    let token_id = request.token_id.trim();
    let title = request.title.trim();
    if token_id.is_empty() {
        return Err(ApiError::bad_request("tokenId is required"));
    }
    if title.is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }
    if !valid_price(request.price) {
        return Err(ApiError::bad_request("price must be a non-negative number"));
    }

    let minted = state
        .content_db
        .attach_token(
            &content_id,
            &MintAttachment {
                token_id: token_id.to_string(),
                title: title.to_string(),
                description: request.description.clone(),
                price: request.price,
                category: request.category.clone(),
            },
        )
        .map_err(|e| ApiError::from_content_db(e, diagnostics))?;

    let grant = StoredGrant {
        content_id: content_id.clone(),
        owner: minted.creator.clone(),
        token_id: token_id.to_string(),
        grant_type: GrantType::CreatorInitial,
        created_at: Utc::now(),
        payment_reference: None,
    };
    match state.content_db.insert_grant(&grant) {
        Ok(()) | Err(ContentDbError::AlreadyExists(_)) => {}
        Err(e) => return Err(ApiError::from_content_db(e, diagnostics)),
    }

    tracing::info!(content_id = %content_id, token_id = %token_id, "content minted");
    state.audit.record(
        AuditEvent::new(AuditEventType::ContentMinted)
            .with_wallet(&minted.creator)
            .with_content(&content_id)
            .with_details(json!({ "token_id": token_id })),
    );

    Ok(Json(ContentView::from(&minted)))
}

#[utoipa::path(
    put,
    path = "/v1/contents/{content_id}",
    params(("content_id" = String, Path, description = "Content identifier")),
    request_body = UpdateContentRequest,
    tag = "Contents",
    responses(
        (status = 200, body = ContentView),
        (status = 400, description = "No changes made"),
        (status = 401, description = "Invalid signature or expired challenge"),
        (status = 403, description = "Signer is not the creator"),
        (status = 404, description = "Content not found")
    )
)]
pub async fn update_content(
    Path(content_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateContentRequest>,
) -> Result<Json<ContentView>, ApiError> {
    let diagnostics = state.diagnostics();
    let content = load_content(&state, &content_id)?;
    require_creator(&state, &request.proof, ChallengeAction::UpdateContent, &content)?;

    if request.price.is_some_and(|p| !valid_price(p)) {
        return Err(ApiError::bad_request("price must be a non-negative number"));
    }

    let patch = ContentPatch {
        title: request.title.clone(),
        description: request.description.clone(),
        price: request.price,
    };
    let modified = state
        .content_db
        .update_resource(&content_id, &patch)
        .map_err(|e| ApiError::from_content_db(e, diagnostics))?;
    if modified == 0 {
        return Err(ApiError::bad_request("No changes made"));
    }

    state.audit.record(
        AuditEvent::new(AuditEventType::ContentUpdated)
            .with_wallet(&content.creator)
            .with_content(&content_id),
    );

    let updated = load_content(&state, &content_id)?;
    Ok(Json(ContentView::from(&updated)))
}

#[utoipa::path(
    delete,
    path = "/v1/contents/{content_id}",
    params(("content_id" = String, Path, description = "Content identifier")),
    request_body = SignedRequest,
    tag = "Contents",
    responses(
        (status = 204, description = "Content, grants and stored file removed"),
        (status = 401, description = "Invalid signature or expired challenge"),
        (status = 403, description = "Signer is not the creator"),
        (status = 404, description = "Content not found")
    )
)]
pub async fn delete_content(
    Path(content_id): Path<String>,
    State(state): State<AppState>,
    Json(proof): Json<SignedRequest>,
) -> Result<StatusCode, ApiError> {
    let diagnostics = state.diagnostics();
    let content = load_content(&state, &content_id)?;
    require_creator(&state, &proof, ChallengeAction::DeleteContent, &content)?;

    let removed = state
        .content_db
        .delete_resource(&content_id)
        .map_err(|e| ApiError::from_content_db(e, diagnostics))?
        .ok_or_else(|| ApiError::not_found("Content not found"))?;

    let blob_keys = [
        removed.location.encrypted_blob.as_deref(),
        removed.location.plain_blob.as_deref(),
    ];
    for key in blob_keys.into_iter().flatten().filter(|k| !k.is_empty()) {
        if let Err(e) = state.blobs.delete(key).await {
            tracing::warn!(content_id = %content_id, key = %key, error = %e, "failed to remove stored file");
        }
    }

    tracing::info!(content_id = %content_id, "content deleted");
    state.audit.record(
        AuditEvent::new(AuditEventType::ContentDeleted)
            .with_wallet(&removed.creator)
            .with_content(&content_id),
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Record a settled purchase as a local grant.
#[utoipa::path(
    post,
    path = "/v1/contents/{content_id}/purchases",
    params(("content_id" = String, Path, description = "Content identifier")),
    request_body = PurchaseRequest,
    tag = "Contents",
    security(("payment_auth" = [])),
    responses(
        (status = 201, body = GrantView),
        (status = 400, description = "Token does not belong to this content"),
        (status = 401, description = "Missing or invalid payment backend credential"),
        (status = 404, description = "Content not found"),
        (status = 409, description = "Content not minted, or buyer already holds a grant")
    )
)]
pub async fn record_purchase(
    _backend: PaymentBackend,
    Path(content_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<GrantView>), ApiError> {
    let diagnostics = state.diagnostics();
    let buyer = request.buyer.trim();
    if buyer.is_empty() {
        return Err(ApiError::bad_request("buyer is required"));
    }

    let content = load_content(&state, &content_id)?;
    let Some(token_id) = content.required_token_id.as_deref().filter(|_| content.is_minted())
    else {
        return Err(ApiError::conflict("Content is not minted yet").with_code("not_minted"));
    };
    if request.token_id != token_id {
        return Err(ApiError::bad_request("tokenId does not match this content"));
    }

    let grant = StoredGrant {
        content_id: content_id.clone(),
        owner: buyer.to_string(),
        token_id: token_id.to_string(),
        grant_type: GrantType::Purchased,
        created_at: Utc::now(),
        payment_reference: request.payment_reference.clone(),
    };
    state.content_db.insert_grant(&grant).map_err(|e| match e {
        ContentDbError::AlreadyExists(_) => {
            ApiError::conflict("Buyer already has access").with_code("already_granted")
        }
        other => ApiError::from_content_db(other, diagnostics),
    })?;

    state.audit.record(
        AuditEvent::new(AuditEventType::GrantRecorded)
            .with_wallet(buyer)
            .with_content(&content_id)
            .with_details(json!({
                "grant_type": "purchased",
                "payment_reference": request.payment_reference,
            })),
    );

    Ok((StatusCode::CREATED, Json(GrantView::from(&grant))))
}
