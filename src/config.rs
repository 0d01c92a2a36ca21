// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment exactly once at startup into an
//! [`AppConfig`], which is then handed to every component that needs it. No
//! component reads the environment on its own after that point.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `CLERK_JWKS_URL` | Clerk JWKS endpoint for session token verification | Derived from publishable key |
//! | `CLERK_ISSUER` | Expected session token issuer | Derived from publishable key |
//! | `CLERK_AUDIENCE` | Expected session token audience | Optional |
//! | `CLERK_AUTHORIZED_PARTIES` | Comma-separated allowed `azp` origins | Optional |
//! | `CLERK_PUBLISHABLE_KEY` | Clerk publishable key (`NEXT_PUBLIC_`/`EXPO_PUBLIC_` variants accepted) | Optional |
//! | `NEXT_PUBLIC_SUPABASE_URL` | Supabase project endpoint (fallback `SUPABASE_URL`) | Required for data actions |
//! | `SUPABASE_SERVICE_ROLE_KEY` | Service credential, bypasses row level security | Required for privileged actions |
//! | `NEXT_PUBLIC_SUPABASE_ANON_KEY` | Publishable key for policy-enforced access | Required for scoped reads |
//!
//! Blank values are treated exactly like unset ones.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

use crate::db::{PublishableKey, ServiceCredential};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const CLERK_JWKS_URL_ENV: &str = "CLERK_JWKS_URL";
pub const CLERK_ISSUER_ENV: &str = "CLERK_ISSUER";
pub const CLERK_AUDIENCE_ENV: &str = "CLERK_AUDIENCE";
pub const CLERK_AUTHORIZED_PARTIES_ENV: &str = "CLERK_AUTHORIZED_PARTIES";

/// Publishable key variables, in lookup order. The prefixed names are the
/// ones the web and mobile front ends already carry.
pub const CLERK_PUBLISHABLE_KEY_ENVS: [&str; 3] = [
    "CLERK_PUBLISHABLE_KEY",
    "NEXT_PUBLIC_CLERK_PUBLISHABLE_KEY",
    "EXPO_PUBLIC_CLERK_PUBLISHABLE_KEY",
];

/// Supabase endpoint variables, in lookup order.
pub const SUPABASE_URL_ENVS: [&str; 2] = ["NEXT_PUBLIC_SUPABASE_URL", "SUPABASE_URL"];

/// Service credential. Secret: never logged, never sent to a browser.
pub const SUPABASE_SERVICE_ROLE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Publishable (anon) key variables, in lookup order.
pub const SUPABASE_ANON_KEY_ENVS: [&str; 3] = [
    "NEXT_PUBLIC_SUPABASE_ANON_KEY",
    "SUPABASE_ANON_KEY",
    "EXPO_PUBLIC_SUPABASE_ANON_KEY",
];

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Configuration failures.
///
/// These are fatal for the action that hits them: nothing short of a
/// redeploy with corrected environment makes them go away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "privileged client configuration missing (has_url={has_url}, has_service_key={has_service_key})"
    )]
    MissingPrivilegedConfig { has_url: bool, has_service_key: bool },

    #[error("scoped client configuration missing (has_url={has_url}, has_anon_key={has_anon_key})")]
    MissingScopedConfig { has_url: bool, has_anon_key: bool },

    #[error("database endpoint is not an absolute http(s) URL")]
    InvalidEndpoint,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Session token verification settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSettings {
    /// JWKS endpoint. `None` means tokens cannot be verified.
    pub jwks_url: Option<String>,
    /// Expected `iss` claim.
    pub issuer: Option<String>,
    /// Expected `aud` claim.
    pub audience: Option<String>,
    /// Allowed `azp` values. Empty disables the check.
    pub authorized_parties: Vec<String>,
}

/// Database gateway settings.
///
/// Values are kept as `Option` so that a missing credential surfaces as a
/// configuration error on the action that needs it, not as a startup crash.
#[derive(Debug, Clone, Default)]
pub struct SupabaseSettings {
    pub url: Option<String>,
    pub service_role_key: Option<ServiceCredential>,
    pub anon_key: Option<PublishableKey>,
}

/// Process-wide configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub auth: AuthSettings,
    pub supabase: SupabaseSettings,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| non_blank(lookup(name));
        let first = |names: &[&str]| names.iter().find_map(|&name| var(name));

        let port = var(PORT_ENV)
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let frontend_api = first(&CLERK_PUBLISHABLE_KEY_ENVS[..])
            .and_then(|key| frontend_api_from_publishable_key(&key));

        let auth = AuthSettings {
            jwks_url: var(CLERK_JWKS_URL_ENV).or_else(|| {
                frontend_api
                    .as_ref()
                    .map(|domain| format!("https://{domain}/.well-known/jwks.json"))
            }),
            issuer: var(CLERK_ISSUER_ENV)
                .or_else(|| frontend_api.as_ref().map(|domain| format!("https://{domain}"))),
            audience: var(CLERK_AUDIENCE_ENV),
            authorized_parties: var(CLERK_AUTHORIZED_PARTIES_ENV)
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        };

        let supabase = SupabaseSettings {
            url: first(&SUPABASE_URL_ENVS[..]),
            service_role_key: var(SUPABASE_SERVICE_ROLE_KEY_ENV).map(ServiceCredential::new),
            anon_key: first(&SUPABASE_ANON_KEY_ENVS[..]).map(PublishableKey::new),
        };

        Self {
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            log_format: var(LOG_FORMAT_ENV)
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
            auth,
            supabase,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Extract the Clerk Frontend API domain from a publishable key.
///
/// Keys look like `pk_test_<base64("example.clerk.accounts.dev$")>`.
pub fn frontend_api_from_publishable_key(key: &str) -> Option<String> {
    let encoded = key
        .strip_prefix("pk_test_")
        .or_else(|| key.strip_prefix("pk_live_"))?;

    let engine = GeneralPurpose::new(
        &alphabet::STANDARD,
        GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
    );
    let decoded = engine.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let domain = decoded.strip_suffix('$')?;
    if domain.is_empty() || domain.contains('$') {
        return None;
    }
    Some(domain.to_string())
}
