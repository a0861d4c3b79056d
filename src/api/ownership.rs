// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    error::ApiError,
    models::{VerifyOwnershipRequest, VerifyOwnershipResponse},
    state::AppState,
};

/// Ask the ledger whether a wallet holds a token.
///
/// Ledger only; local grants are not consulted. Lookup failures read as
/// `false`.
#[utoipa::path(
    post,
    path = "/v1/ownership/verify",
    request_body = VerifyOwnershipRequest,
    tag = "Ownership",
    responses(
        (status = 200, body = VerifyOwnershipResponse),
        (status = 400, description = "Missing wallet address or token id")
    )
)]
pub async fn verify_ownership(
    State(state): State<AppState>,
    Json(request): Json<VerifyOwnershipRequest>,
) -> Result<Json<VerifyOwnershipResponse>, ApiError> {
    let wallet = request.wallet_address.trim();
    let token_id = request.token_id.trim();
    if wallet.is_empty() || token_id.is_empty() {
        return Err(ApiError::bad_request("walletAddress and tokenId are required"));
    }

    let has_access = state
        .verifier
        .oracle()
        .ledger_confirms(wallet, token_id)
        .await;

    Ok(Json(VerifyOwnershipResponse { has_access }))
}
