// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{IdentityClaims, Role},
    models::{OnboardingRequest, Profile},
    state::AppState,
};

pub mod admin;
pub mod health;
pub mod profile;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/users/me", get(users::get_current_user))
        .route("/profile", get(profile::get_profile))
        .route("/onboarding", post(profile::complete_onboarding))
        .route("/admin/profiles", get(admin::list_profiles));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        users::get_current_user,
        profile::get_profile,
        profile::complete_onboarding,
        admin::list_profiles
    ),
    components(
        schemas(
            Profile,
            OnboardingRequest,
            Role,
            IdentityClaims,
            users::UserMeResponse,
            admin::AdminProfileListResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Users", description = "Current user"),
        (name = "Profile", description = "Own profile and onboarding"),
        (name = "Admin", description = "Cross-user views for admins")
    )
)]
struct ApiDoc;
