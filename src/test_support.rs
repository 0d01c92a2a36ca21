// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests: signed session tokens, application state
//! and an in-process stand-in for the Supabase REST gateway.

use std::io;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, jwk::JwkSet, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::auth::claims::{SessionClaims, SessionMetadata};
use crate::auth::{JwksManager, Role, SessionAuthenticator, SessionIdentity};
use crate::config::{AppConfig, AuthSettings, LogFormat, SupabaseSettings};
use crate::state::AppState;

pub const TEST_KEY_ID: &str = "test-key";
pub const TEST_ISSUER: &str = "https://clerk.test";

const TEST_SECRET: &[u8] = b"test-signing-secret-0123456789abcdef";
const TEST_SECRET_B64: &str = "dGVzdC1zaWduaW5nLXNlY3JldC0wMTIzNDU2Nzg5YWJjZGVm";

pub fn test_jwks() -> JwkSet {
    serde_json::from_value(json!({
        "keys": [{
            "kty": "oct",
            "kid": TEST_KEY_ID,
            "alg": "HS256",
            "k": TEST_SECRET_B64
        }]
    }))
    .unwrap()
}

/// Claims for a valid one-hour session issued by [`TEST_ISSUER`].
pub fn token_claims(sub: &str) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "sub": sub,
        "exp": now + 3600,
        "iat": now,
        "nbf": now - 5,
        "iss": TEST_ISSUER,
        "sid": "sess_test"
    })
}

pub fn sign_token(claims: Value) -> String {
    sign_token_with_secret(claims, TEST_SECRET)
}

pub fn sign_token_with_secret(claims: Value, secret: &[u8]) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(TEST_KEY_ID.to_string());
    encode(&header, &claims, &EncodingKey::from_secret(secret)).unwrap()
}

pub fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

pub fn cookie_headers(cookies: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_str(cookies).unwrap());
    headers
}

pub fn test_authenticator() -> SessionAuthenticator {
    let settings = AuthSettings {
        issuer: Some(TEST_ISSUER.to_string()),
        ..Default::default()
    };
    SessionAuthenticator::new(&settings, reqwest::Client::new())
        .with_jwks(JwksManager::from_key_set(test_jwks()))
}

pub fn test_config(supabase: SupabaseSettings) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        log_format: LogFormat::Pretty,
        auth: AuthSettings {
            issuer: Some(TEST_ISSUER.to_string()),
            ..Default::default()
        },
        supabase,
    }
}

/// State whose authenticator trusts tokens from [`sign_token`].
pub fn test_state(supabase: SupabaseSettings) -> AppState {
    AppState::new(test_config(supabase))
        .unwrap()
        .with_authenticator(test_authenticator())
}

pub fn test_identity(user_id: &str, role: Role) -> SessionIdentity {
    let claims = SessionClaims {
        sub: user_id.to_string(),
        exp: Utc::now().timestamp() + 3600,
        iss: TEST_ISSUER.to_string(),
        sid: Some("sess_test".to_string()),
        azp: None,
        metadata: Some(SessionMetadata {
            onboarding_complete: Some(false),
            role: Some(role.to_string()),
        }),
    };
    SessionIdentity::from_claims(claims, "test-session-token").unwrap()
}

// =============================================================================
// Fake REST gateway
// =============================================================================

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json_body(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// HTTP server on a random local port that records every request and
/// answers all of them with the current canned response.
pub struct FakeGateway {
    pub url: String,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    response: Arc<Mutex<(StatusCode, Value)>>,
}

impl FakeGateway {
    /// A `Value::Null` body is sent as an empty body.
    pub async fn spawn(status: StatusCode, body: Value) -> Self {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let response = Arc::new(Mutex::new((status, body)));
        let sink = recorded.clone();
        let canned = response.clone();

        let app = Router::new().fallback(
            move |method: Method, uri: Uri, headers: HeaderMap, bytes: Bytes| {
                let sink = sink.clone();
                let (status, body) = canned.lock().unwrap().clone();
                async move {
                    sink.lock().unwrap().push(RecordedRequest {
                        method: method.to_string(),
                        path: uri.path().to_string(),
                        query: uri.query().map(str::to_string),
                        headers,
                        body: bytes,
                    });
                    if body.is_null() {
                        status.into_response()
                    } else {
                        (status, Json(body)).into_response()
                    }
                }
            },
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            recorded,
            response,
        }
    }

    /// Change the response for subsequent requests.
    pub fn respond_with(&self, status: StatusCode, body: Value) {
        *self.response.lock().unwrap() = (status, body);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn single_request(&self) -> RecordedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected one request, got {requests:?}");
        requests.into_iter().next().unwrap()
    }
}

// =============================================================================
// Log capture
// =============================================================================

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a JSON subscriber installed on this thread and return what it
/// logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || writer.clone())
        .finish();

    let output = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (output, logs)
}
