// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

use super::session::SIGN_IN_PATH;

/// Authentication error type.
///
/// Token problems (malformed, expired, wrong issuer and so on) never reach a
/// handler: the session authenticator turns them into an anonymous caller.
/// What does reach handlers is `Unauthenticated` (anonymous caller on a
/// route that needs one), `InsufficientPermissions`, and provider failures.
#[derive(Debug)]
pub enum AuthError {
    /// No valid session on a route that requires one
    Unauthenticated,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token issuer is invalid
    InvalidIssuer,
    /// Token audience is invalid
    InvalidAudience,
    /// Token is not yet valid
    TokenNotYetValid,
    /// Token was issued for an origin that is not allowed
    UnauthorizedParty,
    /// No matching key in JWKS
    NoMatchingKey,
    /// JWKS fetch failed
    JwksFetchError(String),
    /// Internal error
    InternalError(String),
    /// Insufficient permissions
    InsufficientPermissions,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::UnauthorizedParty => "unauthorized_party",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::JwksFetchError(_) => "jwks_fetch_error",
            AuthError::InternalError(_) => "internal_error",
            AuthError::InsufficientPermissions => "insufficient_permissions",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated => StatusCode::SEE_OTHER,
            AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidIssuer
            | AuthError::InvalidAudience
            | AuthError::TokenNotYetValid
            | AuthError::UnauthorizedParty
            | AuthError::NoMatchingKey => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::JwksFetchError(_) | AuthError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether this error only says the presented token is not acceptable.
    pub fn is_invalid_token(&self) -> bool {
        self.status_code() == StatusCode::UNAUTHORIZED
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unauthenticated => write!(f, "Sign in required"),
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::InvalidIssuer => write!(f, "Token issuer is invalid"),
            AuthError::InvalidAudience => write!(f, "Token audience is invalid"),
            AuthError::TokenNotYetValid => write!(f, "Token is not yet valid"),
            AuthError::UnauthorizedParty => write!(f, "Token authorized party is not allowed"),
            AuthError::NoMatchingKey => write!(f, "No matching key found in JWKS"),
            AuthError::JwksFetchError(msg) => write!(f, "Failed to fetch JWKS: {msg}"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Unauthenticated = self {
            return Redirect::to(SIGN_IN_PATH).into_response();
        }

        let status = self.status_code();
        let error = if status.is_server_error() {
            tracing::error!(error = %self, "Authentication provider failure");
            "Authentication is temporarily unavailable".to_string()
        } else {
            self.to_string()
        };

        let body = Json(AuthErrorBody {
            error,
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::header::LOCATION};

    #[tokio::test]
    async fn unauthenticated_redirects_to_sign_in() {
        let response = AuthError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/auth");
    }

    #[tokio::test]
    async fn insufficient_permissions_returns_403() {
        let response = AuthError::InsufficientPermissions.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "insufficient_permissions");
    }

    #[tokio::test]
    async fn provider_failure_hides_details() {
        let response =
            AuthError::JwksFetchError("connect to 10.0.0.7 refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert!(!body.contains("10.0.0.7"));
        assert!(body.contains("jwks_fetch_error"));
    }

    #[test]
    fn token_problems_are_classified_as_invalid_token() {
        assert!(AuthError::TokenExpired.is_invalid_token());
        assert!(AuthError::NoMatchingKey.is_invalid_token());
        assert!(!AuthError::JwksFetchError("x".into()).is_invalid_token());
        assert!(!AuthError::Unauthenticated.is_invalid_token());
    }
}
