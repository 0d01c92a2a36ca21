// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Security
//!
//! - JWKS is fetched from the configured Clerk endpoint
//! - Keys are cached with a configurable TTL
//! - Stale cache is used on fetch failure (fail-open for availability)
//! - An unknown `kid` triggers one refresh, which picks up rotated keys;
//!   such refreshes are throttled to one per cooldown so that forged tokens
//!   cannot turn into a stream of outbound fetches

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum spacing between refreshes forced by an unknown `kid`.
const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(30);

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// JWKS manager with caching.
///
/// Either backed by a remote endpoint, or by a fixed key set that never
/// expires (see [`JwksManager::from_key_set`]).
#[derive(Clone)]
pub struct JwksManager {
    /// JWKS URL (Clerk endpoint), `None` for a fixed key set
    jwks_url: Option<String>,
    /// Cache TTL
    cache_ttl: Duration,
    /// Cached JWKS
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// Cooldown between unknown-`kid` refreshes
    refresh_cooldown: Duration,
    /// When the last unknown-`kid` refresh was attempted
    last_forced_refresh: Arc<Mutex<Option<Instant>>>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a manager that fetches keys from `jwks_url`.
    ///
    /// # Arguments
    /// - `jwks_url`: e.g. `https://your-app.clerk.accounts.dev/.well-known/jwks.json`
    /// - `client`: shared HTTP client (carries the request timeout)
    pub fn new(jwks_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            jwks_url: Some(jwks_url.into()),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN,
            last_forced_refresh: Arc::new(Mutex::new(None)),
            client,
        }
    }

    /// Create a manager over a fixed key set. Nothing is ever fetched.
    pub fn from_key_set(jwks: JwkSet) -> Self {
        Self {
            jwks_url: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(Some(CacheEntry {
                jwks,
                fetched_at: Instant::now(),
            }))),
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN,
            last_forced_refresh: Arc::new(Mutex::new(None)),
            client: reqwest::Client::new(),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the minimum spacing between refreshes forced by an unknown `kid`.
    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> Option<&str> {
        self.jwks_url.as_deref()
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if self.jwks_url.is_none() || entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        match self.fetch_jwks().await {
            Ok(jwks) => {
                self.store(jwks.clone()).await;
                Ok(jwks)
            }
            Err(e) => {
                let cache = self.cache.read().await;
                match &*cache {
                    Some(entry) => {
                        warn!(error = %e, "JWKS refresh failed, using stale keys");
                        Ok(entry.jwks.clone())
                    }
                    None => Err(e),
                }
            }
        }
    }

    async fn store(&self, jwks: JwkSet) {
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        });
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let Some(url) = &self.jwks_url else {
            return Err(AuthError::JwksFetchError(
                "no JWKS endpoint configured".to_string(),
            ));
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchError(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))
    }

    /// Get a decoding key for the given key ID.
    ///
    /// A miss against a remote key set forces one refresh before giving up,
    /// at most once per cooldown. A failed refresh leaves the cached keys in
    /// place and the miss is reported as `NoMatchingKey`.
    pub async fn get_decoding_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError> {
        let jwks = self.get_jwks().await?;
        if let Some(jwk) = find_key(&jwks, kid) {
            return jwk_to_decoding_key(jwk);
        }

        if self.jwks_url.is_none() || !self.begin_forced_refresh().await {
            return Err(AuthError::NoMatchingKey);
        }

        let jwks = match self.fetch_jwks().await {
            Ok(jwks) => {
                self.store(jwks.clone()).await;
                jwks
            }
            Err(e) => {
                warn!(error = %e, "JWKS refresh for unknown kid failed, keeping cached keys");
                return Err(AuthError::NoMatchingKey);
            }
        };
        let jwk = find_key(&jwks, kid).ok_or(AuthError::NoMatchingKey)?;
        jwk_to_decoding_key(jwk)
    }

    /// Claim the forced-refresh slot if the cooldown has passed.
    async fn begin_forced_refresh(&self) -> bool {
        let mut last = self.last_forced_refresh.lock().await;
        if last.is_some_and(|at| at.elapsed() < self.refresh_cooldown) {
            return false;
        }
        *last = Some(Instant::now());
        true
    }

    /// Get any valid decoding key (for tokens without kid).
    pub async fn get_any_decoding_key(&self) -> Result<(DecodingKey, Algorithm), AuthError> {
        let jwks = self.get_jwks().await?;

        jwks.keys
            .iter()
            .find_map(|jwk| jwk_to_decoding_key(jwk).ok())
            .ok_or(AuthError::NoMatchingKey)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let jwks = self.fetch_jwks().await?;
        self.store(jwks).await;
        Ok(())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        match &*cache {
            Some(entry) => self.jwks_url.is_none() || entry.fetched_at.elapsed() < self.cache_ttl,
            None => false,
        }
    }
}

fn find_key<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(kid))
}

/// Convert a JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| AuthError::InternalError(format!("Failed to create RSA key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                _ => Algorithm::RS256,
            };
            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| AuthError::InternalError(format!("Failed to create EC key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };
            Ok((key, alg))
        }
        AlgorithmParameters::OctetKey(oct) => {
            let key = DecodingKey::from_base64_secret(&oct.value)
                .map_err(|e| AuthError::InternalError(format!("Failed to create HMAC key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::HS384) => Algorithm::HS384,
                Some(KeyAlgorithm::HS512) => Algorithm::HS512,
                _ => Algorithm::HS256,
            };
            Ok((key, alg))
        }
        _ => Err(AuthError::InternalError(
            "Unsupported key type in JWKS".to_string(),
        )),
    }
}
