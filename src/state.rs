// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use crate::auth::SessionAuthenticator;
use crate::config::AppConfig;
use crate::db::PrivilegedClientFactory;

/// Timeout for outbound calls to Clerk and Supabase.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub authenticator: SessionAuthenticator,
    pub privileged: Arc<PrivilegedClientFactory>,
    /// Shared outbound transport. Carries no credentials.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            authenticator: SessionAuthenticator::new(&config.auth, http.clone()),
            privileged: Arc::new(PrivilegedClientFactory::new(
                config.supabase.clone(),
                http.clone(),
            )),
            config: Arc::new(config),
            http,
        })
    }

    pub fn with_authenticator(mut self, authenticator: SessionAuthenticator) -> Self {
        self.authenticator = authenticator;
        self
    }
}
