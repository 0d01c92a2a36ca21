// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the session identity.
//!
//! Use `Authenticated` in any action that touches user data:
//!
//! ```rust,ignore
//! async fn my_action(
//!     State(state): State<AppState>,
//!     Authenticated(identity): Authenticated,
//! ) -> Result<Json<Profile>, ApiError> {
//!     // identity is resolved; only now may a privileged client be created
//!     let client = state.privileged.privileged_client_for(&identity)?;
//! }
//! ```
//!
//! Axum runs these extractors before the handler body, so an anonymous
//! caller is turned away before any database client exists.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, SessionIdentity};
use crate::state::AppState;

/// Resolution result stored in request extensions, so that a request using
/// several extractors verifies its token once.
#[derive(Clone)]
struct ResolvedSession(Option<SessionIdentity>);

async fn resolve(parts: &mut Parts, state: &AppState) -> Result<Option<SessionIdentity>, AuthError> {
    if let Some(ResolvedSession(identity)) = parts.extensions.get::<ResolvedSession>() {
        return Ok(identity.clone());
    }

    let identity = state.authenticator.resolve_identity(&parts.headers).await?;
    parts.extensions.insert(ResolvedSession(identity.clone()));
    Ok(identity)
}

/// Optional session. Anonymous callers yield `None`.
///
/// Rejects only when the auth provider itself fails.
pub struct MaybeSession(pub Option<SessionIdentity>);

impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(resolve(parts, state).await?))
    }
}

/// Required session. Anonymous callers are redirected to the sign-in page.
pub struct Authenticated(pub SessionIdentity);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await?
            .map(Authenticated)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Extractor that requires admin role.
pub struct AdminOnly(pub SessionIdentity);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Authenticated(identity) = Authenticated::from_request_parts(parts, state).await?;

        if !identity.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(identity))
    }
}
