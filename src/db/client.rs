// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The two database client types.
//!
//! | Type | Key | Bearer | Row level security |
//! |------|-----|--------|--------------------|
//! | [`ScopedClient`] | publishable key | caller's session token | enforced |
//! | [`PrivilegedClient`] | service credential | service credential | bypassed |
//!
//! They are deliberately unrelated types: nothing converts one into the
//! other, and code that needs superuser access has to ask for a
//! `PrivilegedClient` by name.

use std::fmt;

use url::Url;

use super::rest::{rest_endpoint, Query, RestClient};
use super::ServiceCredential;
use crate::auth::SessionIdentity;
use crate::config::{ConfigError, SupabaseSettings};

/// Session handling options of a client.
///
/// Server-side clients never refresh tokens and never persist sessions: the
/// privileged client has no user session to refresh, and a scoped client
/// lives for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub auto_refresh_token: bool,
    pub persist_session: bool,
}

impl ClientOptions {
    pub const SERVER: ClientOptions = ClientOptions {
        auto_refresh_token: false,
        persist_session: false,
    };
}

/// Policy-enforced client acting as the signed-in caller.
pub struct ScopedClient {
    rest: RestClient,
    user_id: String,
    options: ClientOptions,
}

impl ScopedClient {
    /// Build a client that acts as `identity`.
    pub fn for_identity(
        settings: &SupabaseSettings,
        identity: &SessionIdentity,
        http: reqwest::Client,
    ) -> Result<Self, ConfigError> {
        let url = settings.url.as_deref().filter(|u| !u.trim().is_empty());
        let key = settings.anon_key.as_ref().filter(|k| !k.is_blank());

        let (Some(url), Some(key)) = (url, key) else {
            let has_url = url.is_some();
            let has_anon_key = key.is_some();
            tracing::error!(
                has_url,
                has_anon_key,
                "Supabase scoped client configuration missing"
            );
            return Err(ConfigError::MissingScopedConfig {
                has_url,
                has_anon_key,
            });
        };

        Ok(Self {
            rest: RestClient::new(rest_endpoint(url)?, key.expose(), identity.token(), http),
            user_id: identity.user_id().to_string(),
            options: ClientOptions::SERVER,
        })
    }

    /// The caller this client acts as.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn options(&self) -> ClientOptions {
        self.options
    }

    pub fn endpoint(&self) -> &Url {
        self.rest.base()
    }

    pub fn from(&self, table: &str) -> Query<'_> {
        self.rest.from(table)
    }
}

impl fmt::Debug for ScopedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedClient")
            .field("endpoint", &self.rest.base().as_str())
            .field("user_id", &self.user_id)
            .field("options", &self.options)
            .finish()
    }
}

/// Client holding the service credential.
///
/// Every query bypasses row level security. The client is not tied to any
/// caller, so the action using it must scope each query itself.
///
/// Only [`PrivilegedClientFactory`](super::PrivilegedClientFactory) creates
/// these. The type is neither `Clone` nor `Serialize`.
pub struct PrivilegedClient {
    rest: RestClient,
    options: ClientOptions,
}

impl PrivilegedClient {
    pub(super) fn new(base: Url, credential: &ServiceCredential, http: reqwest::Client) -> Self {
        Self {
            rest: RestClient::new(base, credential.expose(), credential.expose(), http),
            options: ClientOptions::SERVER,
        }
    }

    pub fn options(&self) -> ClientOptions {
        self.options
    }

    pub fn endpoint(&self) -> &Url {
        self.rest.base()
    }

    pub fn from(&self, table: &str) -> Query<'_> {
        self.rest.from(table)
    }
}

impl fmt::Debug for PrivilegedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivilegedClient")
            .field("endpoint", &self.rest.base().as_str())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
