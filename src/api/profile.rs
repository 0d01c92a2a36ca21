// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile actions for the signed-in user.
//!
//! Reads go through a [`ScopedClient`] so row-level policy applies. Completing
//! onboarding writes with a privileged client, after the caller's identity has
//! been resolved, and only ever touches the caller's own row.

use axum::{extract::State, Json};
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    auth::Authenticated,
    db::ScopedClient,
    error::ApiError,
    models::{OnboardingRequest, Profile, ProfileUpsert, MAX_DISPLAY_NAME_CHARS, PROFILES_TABLE},
    state::AppState,
};

/// Get the caller's profile.
#[utoipa::path(
    get,
    path = "/v1/profile",
    tag = "Profile",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller's profile", body = Profile),
        (status = 303, description = "No session; redirect to the sign-in page"),
        (status = 404, description = "No profile yet"),
        (status = 500, description = "Server misconfigured"),
        (status = 502, description = "Database unavailable")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> Result<Json<Profile>, ApiError> {
    let client = ScopedClient::for_identity(&state.config.supabase, &identity, state.http.clone())?;

    let rows: Vec<Profile> = client
        .from(PROFILES_TABLE)
        .select("*")
        .eq("user_id", client.user_id())
        .limit(1)
        .fetch()
        .await?;

    rows.into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Profile not found"))
}

/// Mark the caller's onboarding as complete.
///
/// Creates the profile row if missing, otherwise updates it in place.
#[utoipa::path(
    post,
    path = "/v1/onboarding",
    tag = "Profile",
    security(("bearer" = [])),
    request_body = OnboardingRequest,
    responses(
        (status = 200, description = "Profile after onboarding", body = Profile),
        (status = 303, description = "No session; redirect to the sign-in page"),
        (status = 400, description = "Invalid display name"),
        (status = 500, description = "Server misconfigured"),
        (status = 502, description = "Database unavailable")
    )
)]
pub async fn complete_onboarding(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Json(request): Json<OnboardingRequest>,
) -> Result<Json<Profile>, ApiError> {
    let display_name = validate_display_name(&request.display_name)?;

    let client = state.privileged.privileged_client_for(&identity)?;

    let row = ProfileUpsert {
        user_id: identity.user_id(),
        display_name,
        onboarding_complete: true,
        updated_at: Utc::now(),
    };
    let rows: Vec<Profile> = client.from(PROFILES_TABLE).upsert(&row, "user_id").await?;

    let Some(profile) = rows.into_iter().next() else {
        warn!(user_id = %identity.user_id(), "Profile upsert succeeded but returned no rows");
        return Err(ApiError::bad_gateway());
    };

    info!(user_id = %identity.user_id(), "Onboarding completed");
    Ok(Json(profile))
}

fn validate_display_name(raw: &str) -> Result<&str, ApiError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Display name is required"));
    }
    if name.chars().count() > MAX_DISPLAY_NAME_CHARS {
        return Err(ApiError::bad_request(format!(
            "Display name must be at most {MAX_DISPLAY_NAME_CHARS} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(ApiError::bad_request(
            "Display name contains invalid characters",
        ));
    }
    Ok(name)
}
