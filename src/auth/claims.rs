// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token claims and the resolved caller identity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims read from a Clerk session token.
///
/// `metadata` is the custom session claim that mirrors the user's public
/// metadata (configured in the Clerk dashboard as
/// `{"metadata": "{{user.public_metadata}}"}`).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Session ID
    #[serde(default)]
    pub sid: Option<String>,
    /// Authorized party (origin that requested the token)
    #[serde(default)]
    pub azp: Option<String>,
    #[serde(default)]
    pub metadata: Option<SessionMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SessionMetadata {
    #[serde(default, rename = "onboardingComplete")]
    pub onboarding_complete: Option<bool>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Structured claims carried by an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct IdentityClaims {
    /// Whether the user finished onboarding
    pub onboarding_complete: bool,
    /// Role from public metadata, `member` when unset or unknown
    pub role: Role,
}

/// An authenticated caller.
///
/// Only the session authenticator can build one, so a function that takes
/// `&SessionIdentity` can rely on authentication having happened.
#[derive(Clone)]
pub struct SessionIdentity {
    user_id: String,
    session_id: Option<String>,
    issuer: String,
    expires_at: DateTime<Utc>,
    claims: IdentityClaims,
    token: String,
}

impl SessionIdentity {
    /// Build an identity from verified claims.
    ///
    /// Returns `None` when the subject is empty or the expiry is out of range.
    pub(crate) fn from_claims(claims: SessionClaims, token: &str) -> Option<Self> {
        if claims.sub.trim().is_empty() {
            return None;
        }
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)?;

        let metadata = claims.metadata.unwrap_or_default();
        let role = metadata
            .role
            .as_deref()
            .and_then(Role::parse)
            .unwrap_or_default();

        Some(Self {
            user_id: claims.sub,
            session_id: claims.sid,
            issuer: claims.iss,
            expires_at,
            claims: IdentityClaims {
                onboarding_complete: metadata.onboarding_complete.unwrap_or(false),
                role,
            },
            token: token.to_string(),
        })
    }

    /// Canonical user ID (Clerk `sub` claim). Never empty.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn claims(&self) -> IdentityClaims {
        self.claims
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn is_admin(&self) -> bool {
        self.claims.role == Role::Admin
    }

    /// The raw session token, forwarded as the bearer of a scoped client.
    pub(crate) fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("user_id", &self.user_id)
            .field("session_id", &self.session_id)
            .field("expires_at", &self.expires_at)
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> SessionClaims {
        SessionClaims {
            sub: "user_2abc".to_string(),
            exp: 1_900_000_000,
            iss: "https://clerk.example.com".to_string(),
            sid: Some("sess_abc".to_string()),
            azp: None,
            metadata: Some(SessionMetadata {
                onboarding_complete: Some(true),
                role: Some("admin".to_string()),
            }),
        }
    }

    #[test]
    fn from_claims_extracts_user_id_and_metadata() {
        let identity = SessionIdentity::from_claims(sample_claims(), "tok").unwrap();
        assert_eq!(identity.user_id(), "user_2abc");
        assert_eq!(identity.session_id(), Some("sess_abc"));
        assert!(identity.claims().onboarding_complete);
        assert!(identity.is_admin());
        assert_eq!(identity.expires_at().timestamp(), 1_900_000_000);
    }

    #[test]
    fn from_claims_defaults_missing_metadata() {
        let mut claims = sample_claims();
        claims.metadata = None;
        let identity = SessionIdentity::from_claims(claims, "tok").unwrap();
        assert_eq!(identity.claims(), IdentityClaims::default());
        assert_eq!(identity.role(), Role::Member);
    }

    #[test]
    fn unknown_role_falls_back_to_member() {
        let mut claims = sample_claims();
        claims.metadata = Some(SessionMetadata {
            onboarding_complete: None,
            role: Some("superuser".to_string()),
        });
        let identity = SessionIdentity::from_claims(claims, "tok").unwrap();
        assert_eq!(identity.role(), Role::Member);
    }

    #[test]
    fn empty_subject_is_rejected() {
        let mut claims = sample_claims();
        claims.sub = "  ".to_string();
        assert!(SessionIdentity::from_claims(claims, "tok").is_none());
    }

    #[test]
    fn debug_output_omits_token() {
        let identity = SessionIdentity::from_claims(sample_claims(), "raw-session-token").unwrap();
        assert!(!format!("{identity:?}").contains("raw-session-token"));
    }

    #[test]
    fn metadata_uses_camel_case_onboarding_flag() {
        let claims: SessionClaims = serde_json::from_value(serde_json::json!({
            "sub": "user_1",
            "exp": 1_900_000_000,
            "metadata": { "onboardingComplete": true }
        }))
        .unwrap();
        assert_eq!(
            claims.metadata.and_then(|m| m.onboarding_complete),
            Some(true)
        );
    }
}
