// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only endpoints.
//!
//! These require the `admin` role and read across all users with a
//! privileged client.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::AdminOnly,
    error::ApiError,
    models::{Profile, PROFILES_TABLE},
    state::AppState,
};

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 200;

/// Pagination for admin listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageParams {
    /// Rows to return (default 50, max 200).
    pub limit: Option<usize>,
    /// Rows to skip.
    pub offset: Option<usize>,
}

impl PageParams {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminProfileListResponse {
    pub profiles: Vec<Profile>,
    pub limit: usize,
    pub offset: usize,
}

/// List all profiles, newest first.
#[utoipa::path(
    get,
    path = "/v1/admin/profiles",
    tag = "Admin",
    security(("bearer" = [])),
    params(PageParams),
    responses(
        (status = 200, description = "Profiles", body = AdminProfileListResponse),
        (status = 303, description = "No session; redirect to the sign-in page"),
        (status = 403, description = "Forbidden - admin role required"),
        (status = 500, description = "Server misconfigured"),
        (status = 502, description = "Database unavailable")
    )
)]
pub async fn list_profiles(
    State(state): State<AppState>,
    AdminOnly(admin): AdminOnly,
    Query(params): Query<PageParams>,
) -> Result<Json<AdminProfileListResponse>, ApiError> {
    let client = state.privileged.privileged_client_for(&admin)?;
    let (limit, offset) = (params.limit(), params.offset());

    let profiles: Vec<Profile> = client
        .from(PROFILES_TABLE)
        .select("*")
        .order("created_at", false)
        .limit(limit)
        .offset(offset)
        .fetch()
        .await?;

    info!(admin_id = %admin.user_id(), count = profiles.len(), "Admin listed profiles");

    Ok(Json(AdminProfileListResponse {
        profiles,
        limit,
        offset,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_default_and_clamp() {
        let params = PageParams::default();
        assert_eq!(params.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.offset(), 0);

        let params = PageParams {
            limit: Some(10_000),
            offset: Some(20),
        };
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 20);

        let params = PageParams {
            limit: Some(0),
            offset: None,
        };
        assert_eq!(params.limit(), 1);
    }
}
