// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    access::SignedRequest,
    auth::ChallengeAction,
    models::{
        AccessTokenResponse, ChallengeResponse, ContentSummary, ContentView, FileLinkResponse,
        FileView, GrantView, MintRequest, PurchaseRequest, UpdateContentRequest, UploadForm,
        UploadResponse,
        VerifyOwnershipRequest, VerifyOwnershipResponse,
    },
    state::AppState,
    storage::{ContentStatus, GrantType},
};

pub mod access;
pub mod contents;
pub mod health;
pub mod ownership;
pub mod uploads;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/uploads",
            post(uploads::upload_content)
                .layer(DefaultBodyLimit::max(uploads::MAX_UPLOAD_BYTES)),
        )
        .route("/contents", get(contents::list_contents))
        .route(
            "/contents/{content_id}",
            get(contents::get_content)
                .put(contents::update_content)
                .delete(contents::delete_content),
        )
        .route("/contents/{content_id}/mint", post(contents::mint_content))
        .route(
            "/contents/{content_id}/purchases",
            post(contents::record_purchase),
        )
        .route(
            "/contents/{content_id}/challenge",
            get(access::get_challenge),
        )
        .route("/contents/{content_id}/access", post(access::request_access))
        .route(
            "/contents/{content_id}/access-token",
            post(access::issue_access_token),
        )
        .route("/contents/{content_id}/download", get(access::download))
        .route("/ownership/verify", post(ownership::verify_ownership))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
            components.add_security_scheme(
                "payment_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        uploads::upload_content,
        contents::list_contents,
        contents::get_content,
        contents::mint_content,
        contents::update_content,
        contents::delete_content,
        contents::record_purchase,
        access::get_challenge,
        access::request_access,
        access::issue_access_token,
        access::download,
        ownership::verify_ownership,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            SignedRequest,
            ChallengeAction,
            ChallengeResponse,
            AccessTokenResponse,
            FileLinkResponse,
            FileView,
            ContentView,
            ContentSummary,
            ContentStatus,
            MintRequest,
            UpdateContentRequest,
            PurchaseRequest,
            GrantView,
            GrantType,
            UploadResponse,
            VerifyOwnershipRequest,
            VerifyOwnershipResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            UploadForm
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Uploads", description = "Creator file uploads"),
        (name = "Contents", description = "Content lifecycle and purchases"),
        (name = "Access", description = "Wallet-verified downloads"),
        (name = "Ownership", description = "Ledger ownership checks"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
