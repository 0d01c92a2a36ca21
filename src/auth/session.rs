// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session authenticator.
//!
//! Turns the ambient request context (headers) into the caller's
//! [`SessionIdentity`], or reports that there is none.

use std::sync::Arc;

use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap,
};
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Validation};
use tracing::debug;

use super::claims::SessionClaims;
use super::{AuthError, JwksManager, SessionIdentity};
use crate::config::AuthSettings;

/// Cookie Clerk sets for same-origin requests.
pub const SESSION_COOKIE: &str = "__session";

/// Where anonymous callers are sent.
pub const SIGN_IN_PATH: &str = "/auth";

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Resolves callers from Clerk session tokens.
///
/// ## Verification Modes
///
/// - **Production** (JWKS configured): full signature verification
/// - **Development** (`dev` feature, no JWKS): structure and expiry only
/// - Otherwise no token can be verified and every caller is anonymous
#[derive(Clone)]
pub struct SessionAuthenticator {
    jwks: Option<Arc<JwksManager>>,
    issuer: Option<String>,
    audience: Option<String>,
    authorized_parties: Arc<[String]>,
}

impl SessionAuthenticator {
    pub fn new(settings: &AuthSettings, client: reqwest::Client) -> Self {
        Self {
            jwks: settings
                .jwks_url
                .as_ref()
                .map(|url| Arc::new(JwksManager::new(url.clone(), client))),
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            authorized_parties: settings.authorized_parties.clone().into(),
        }
    }

    /// Replace the key source.
    pub fn with_jwks(mut self, jwks: JwksManager) -> Self {
        self.jwks = Some(Arc::new(jwks));
        self
    }

    pub fn jwks(&self) -> Option<&JwksManager> {
        self.jwks.as_deref()
    }

    /// Whether signatures are checked.
    pub fn verifies_signatures(&self) -> bool {
        self.jwks.is_some()
    }

    /// Resolve the caller of the current request.
    ///
    /// - `Ok(Some(identity))`: a valid session token was presented
    /// - `Ok(None)`: no token, or a token that does not verify
    /// - `Err(_)`: the key provider could not be reached
    pub async fn resolve_identity(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<SessionIdentity>, AuthError> {
        let Some(token) = session_token(headers) else {
            return Ok(None);
        };

        match self.verify(token).await {
            Ok(identity) => Ok(Some(identity)),
            Err(e) if e.is_invalid_token() => {
                debug!(error_code = e.error_code(), "Session token rejected");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn verify(&self, token: &str) -> Result<SessionIdentity, AuthError> {
        let claims = match &self.jwks {
            Some(jwks) => self.verify_signed(token, jwks).await?,
            None => verify_unsigned(token)?,
        };

        if !self.authorized_parties.is_empty() {
            let allowed = claims
                .azp
                .as_ref()
                .is_some_and(|azp| self.authorized_parties.iter().any(|p| p == azp));
            if !allowed {
                return Err(AuthError::UnauthorizedParty);
            }
        }

        SessionIdentity::from_claims(claims, token).ok_or(AuthError::MalformedToken)
    }

    async fn verify_signed(
        &self,
        token: &str,
        jwks: &JwksManager,
    ) -> Result<SessionClaims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        let (decoding_key, algorithm) = match &header.kid {
            Some(kid) => jwks.get_decoding_key(kid).await?,
            None => jwks.get_any_decoding_key().await?,
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_nbf = true;

        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }

        if let Some(ref audience) = self.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        let token_data =
            decode::<SessionClaims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })?;

        Ok(token_data.claims)
    }
}

/// Development verification (no signature check).
///
/// WARNING: only compiled with the `dev` feature.
#[cfg(feature = "dev")]
fn verify_unsigned(token: &str) -> Result<SessionClaims, AuthError> {
    let token_data = jsonwebtoken::dangerous::insecure_decode::<SessionClaims>(token)
        .map_err(|_| AuthError::MalformedToken)?;
    let claims = token_data.claims;

    let now = chrono::Utc::now().timestamp();
    if claims.exp < now - CLOCK_SKEW_LEEWAY as i64 {
        return Err(AuthError::TokenExpired);
    }
    Ok(claims)
}

/// Without keys nothing verifies.
#[cfg(not(feature = "dev"))]
fn verify_unsigned(_token: &str) -> Result<SessionClaims, AuthError> {
    Err(AuthError::NoMatchingKey)
}

/// Find the session token: bearer header first, then the session cookie.
fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
            .map(|(_, value)| value)
    })
}
