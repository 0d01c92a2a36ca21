// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Privileged client factory.
//!
//! ## States
//!
//! ```text
//! Unconfigured --(first successful validation)--> Ready
//! ```
//!
//! Only the validated configuration is memoized. Every call still gets its
//! own client. A failed validation leaves the factory `Unconfigured` and the
//! same failure is reported on every call, since configuration cannot change
//! without a restart.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use tracing::{debug, error};
use url::Url;

use super::client::PrivilegedClient;
use super::rest::rest_endpoint;
use super::ServiceCredential;
use crate::auth::SessionIdentity;
use crate::config::{ConfigError, SupabaseSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryState {
    Unconfigured,
    Ready,
}

#[derive(Debug)]
struct ValidatedConfig {
    rest_url: Url,
    credential: ServiceCredential,
}

/// Creates [`PrivilegedClient`]s from the process configuration.
pub struct PrivilegedClientFactory {
    settings: SupabaseSettings,
    http: reqwest::Client,
    ready: OnceLock<ValidatedConfig>,
    issued: AtomicU64,
}

impl PrivilegedClientFactory {
    /// `http` is a shared transport only; credentials are attached per client.
    pub fn new(settings: SupabaseSettings, http: reqwest::Client) -> Self {
        Self {
            settings,
            http,
            ready: OnceLock::new(),
            issued: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> FactoryState {
        if self.ready.get().is_some() {
            FactoryState::Ready
        } else {
            FactoryState::Unconfigured
        }
    }

    /// Whether both required values are present. Does not log.
    pub fn is_configured(&self) -> bool {
        let (has_url, has_service_key) = presence(&self.settings);
        has_url && has_service_key
    }

    /// Number of privileged clients handed out so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    /// Create a client holding the service credential.
    ///
    /// Only call this from server-side code, and in request handling only
    /// after the caller's identity has been resolved; prefer
    /// [`privileged_client_for`](Self::privileged_client_for) there.
    ///
    /// # Errors
    /// `ConfigError` when the endpoint or the service credential is missing,
    /// or the endpoint is not an http(s) URL.
    pub fn create_privileged_client(&self) -> Result<PrivilegedClient, ConfigError> {
        let config = match self.ready.get() {
            Some(config) => config,
            None => {
                let validated = validate(&self.settings)?;
                self.ready.get_or_init(|| validated)
            }
        };

        self.issued.fetch_add(1, Ordering::Relaxed);
        Ok(PrivilegedClient::new(
            config.rest_url.clone(),
            &config.credential,
            self.http.clone(),
        ))
    }

    /// Create a privileged client on behalf of a resolved caller.
    ///
    /// Taking `&SessionIdentity` means an action cannot reach this without
    /// having authenticated first.
    pub fn privileged_client_for(
        &self,
        caller: &SessionIdentity,
    ) -> Result<PrivilegedClient, ConfigError> {
        debug!(user_id = %caller.user_id(), "Issuing privileged client");
        self.create_privileged_client()
    }
}

fn presence(settings: &SupabaseSettings) -> (bool, bool) {
    let has_url = settings
        .url
        .as_deref()
        .is_some_and(|u| !u.trim().is_empty());
    let has_service_key = settings
        .service_role_key
        .as_ref()
        .is_some_and(|k| !k.is_blank());
    (has_url, has_service_key)
}

fn validate(settings: &SupabaseSettings) -> Result<ValidatedConfig, ConfigError> {
    let url = settings.url.as_deref().filter(|u| !u.trim().is_empty());
    let credential = settings.service_role_key.as_ref().filter(|k| !k.is_blank());

    let (Some(url), Some(credential)) = (url, credential) else {
        let has_url = url.is_some();
        let has_service_key = credential.is_some();
        error!(
            has_url,
            has_service_key, "Supabase privileged client configuration missing"
        );
        return Err(ConfigError::MissingPrivilegedConfig {
            has_url,
            has_service_key,
        });
    };

    let rest_url = rest_endpoint(url).inspect_err(|_| {
        error!("Supabase endpoint is not an absolute http(s) URL");
    })?;

    Ok(ValidatedConfig {
        rest_url,
        credential: credential.clone(),
    })
}
