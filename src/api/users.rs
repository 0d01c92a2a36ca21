// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Authenticated, Role, SessionIdentity};

/// Response for GET /v1/users/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// User's unique ID (from Clerk)
    pub user_id: String,
    /// User's role
    pub role: Role,
    /// Whether onboarding has been completed
    pub onboarding_complete: bool,
    /// Session ID (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// When the presented session token expires
    pub expires_at: DateTime<Utc>,
}

impl From<&SessionIdentity> for UserMeResponse {
    fn from(identity: &SessionIdentity) -> Self {
        Self {
            user_id: identity.user_id().to_string(),
            role: identity.role(),
            onboarding_complete: identity.claims().onboarding_complete,
            session_id: identity.session_id().map(str::to_string),
            expires_at: identity.expires_at(),
        }
    }
}

/// Get the current authenticated user's information.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 303, description = "No session; redirect to the sign-in page"),
    )
)]
pub async fn get_current_user(Authenticated(identity): Authenticated) -> Json<UserMeResponse> {
    Json((&identity).into())
}
