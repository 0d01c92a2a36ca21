// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! REST gateway (PostgREST) client shared by the scoped and privileged
//! clients.
//!
//! The two public client types differ only in which key and bearer they
//! attach. Everything else, from URL building to error mapping, lives here.

use std::fmt;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::config::ConfigError;

/// Path of the REST gateway below the project endpoint.
const REST_PATH: &str = "rest/v1/";

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";
const PREFER_MINIMAL: &str = "return=minimal";

/// Errors raised while talking to the database gateway.
///
/// These are passed through to the calling action untouched; the action
/// decides whether and how to recover.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("database request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("database returned HTTP {status}: {message}")]
    Gateway {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("database request was invalid: {0}")]
    InvalidRequest(String),

    #[error("database response was invalid: {0}")]
    InvalidResponse(String),
}

pub type DataResult<T> = Result<T, DataError>;

/// PostgREST error body.
#[derive(Deserialize)]
struct GatewayErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Validate a project endpoint and derive the REST gateway base URL.
pub(crate) fn rest_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidEndpoint)?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEndpoint);
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    url.join(REST_PATH).map_err(|_| ConfigError::InvalidEndpoint)
}

/// Credentials and transport for one gateway client.
#[derive(Clone)]
pub(crate) struct RestClient {
    base: Url,
    api_key: String,
    bearer: String,
    http: Client,
}

impl RestClient {
    pub(crate) fn new(base: Url, api_key: &str, bearer: &str, http: Client) -> Self {
        Self {
            base,
            api_key: api_key.to_string(),
            bearer: bearer.to_string(),
            http,
        }
    }

    pub(crate) fn base(&self) -> &Url {
        &self.base
    }

    pub(crate) fn from(&self, table: &str) -> Query<'_> {
        Query {
            client: self,
            table: table.to_string(),
            params: Vec::new(),
        }
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

/// A query against one table.
///
/// ```rust,ignore
/// let rows: Vec<Profile> = client
///     .from("profiles")
///     .select("*")
///     .eq("user_id", identity.user_id())
///     .fetch()
///     .await?;
/// ```
#[must_use = "a query does nothing until it is executed"]
pub struct Query<'a> {
    client: &'a RestClient,
    table: String,
    params: Vec<(String, String)>,
}

impl Query<'_> {
    /// Columns to return.
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    /// Filter `column = value`.
    pub fn eq(mut self, column: &str, value: impl fmt::Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{value}")));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{column}.{direction}")));
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.params.push(("limit".to_string(), count.to_string()));
        self
    }

    pub fn offset(mut self, count: usize) -> Self {
        self.params.push(("offset".to_string(), count.to_string()));
        self
    }

    /// Read matching rows.
    pub async fn fetch<T: DeserializeOwned>(self) -> DataResult<Vec<T>> {
        let response = self.request(Method::GET)?.send().await?;
        read_json(response).await
    }

    /// Insert rows and return them as stored.
    pub async fn insert<B, T>(self, body: &B) -> DataResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST)?
            .header("Prefer", PREFER_REPRESENTATION)
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Insert rows, merging into existing ones that collide on `on_conflict`.
    pub async fn upsert<B, T>(mut self, body: &B, on_conflict: &str) -> DataResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.params
            .push(("on_conflict".to_string(), on_conflict.to_string()));
        let response = self
            .request(Method::POST)?
            .header("Prefer", PREFER_UPSERT)
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Update matching rows and return them.
    pub async fn update<B, T>(self, body: &B) -> DataResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::PATCH)?
            .header("Prefer", PREFER_REPRESENTATION)
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    /// Delete matching rows.
    pub async fn delete(self) -> DataResult<()> {
        let response = self
            .request(Method::DELETE)?
            .header("Prefer", PREFER_MINIMAL)
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    fn url(&self) -> DataResult<Url> {
        if self.table.is_empty()
            || self.table.starts_with('.')
            || self.table.contains(['/', '\\', '?', '#', ':'])
        {
            return Err(DataError::InvalidRequest(format!(
                "invalid table name {:?}",
                self.table
            )));
        }
        let mut url = self
            .client
            .base
            .join(&self.table)
            .map_err(|e| DataError::InvalidRequest(e.to_string()))?;
        // Credentials are attached to this URL; it must stay on the gateway.
        if url.origin() != self.client.base.origin() {
            return Err(DataError::InvalidRequest(format!(
                "table name {:?} leaves the gateway",
                self.table
            )));
        }
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.params);
        }
        Ok(url)
    }

    fn request(&self, method: Method) -> DataResult<RequestBuilder> {
        Ok(self
            .client
            .http
            .request(method, self.url()?)
            .header("apikey", &self.client.api_key)
            .bearer_auth(&self.client.bearer))
    }
}

async fn check_status(response: Response) -> DataResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<GatewayErrorBody>(&body) {
        Ok(parsed) => (parsed.code, parsed.message.unwrap_or(body)),
        Err(_) => (None, body),
    };

    Err(DataError::Gateway {
        status: status.as_u16(),
        code,
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> DataResult<T> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| DataError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeGateway;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    fn client_for(gateway: &FakeGateway) -> RestClient {
        RestClient::new(
            rest_endpoint(&gateway.url).unwrap(),
            "api-key",
            "bearer-token",
            Client::new(),
        )
    }

    #[test]
    fn rest_endpoint_appends_gateway_path() {
        assert_eq!(
            rest_endpoint("https://x.example").unwrap().as_str(),
            "https://x.example/rest/v1/"
        );
        assert_eq!(
            rest_endpoint("https://x.example/proxy").unwrap().as_str(),
            "https://x.example/proxy/rest/v1/"
        );
    }

    #[test]
    fn rest_endpoint_rejects_non_http_urls() {
        assert_eq!(rest_endpoint("not a url"), Err(ConfigError::InvalidEndpoint));
        assert_eq!(
            rest_endpoint("ftp://x.example"),
            Err(ConfigError::InvalidEndpoint)
        );
        assert_eq!(rest_endpoint("mailto:a@b.c"), Err(ConfigError::InvalidEndpoint));
    }

    #[tokio::test]
    async fn fetch_sends_filters_and_credentials() {
        let gateway = FakeGateway::spawn(StatusCode::OK, json!([{ "id": 1 }])).await;
        let client = client_for(&gateway);

        let rows: Vec<Value> = client
            .from("profiles")
            .select("*")
            .eq("user_id", "user_1")
            .order("created_at", false)
            .limit(10)
            .fetch()
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({ "id": 1 })]);

        let request = gateway.single_request();
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/rest/v1/profiles");
        assert_eq!(
            request.query.as_deref(),
            Some("select=*&user_id=eq.user_1&order=created_at.desc&limit=10")
        );
        assert_eq!(request.header("apikey"), Some("api-key"));
        assert_eq!(request.header("authorization"), Some("Bearer bearer-token"));
    }

    #[tokio::test]
    async fn upsert_sends_merge_preference_and_body() {
        let gateway = FakeGateway::spawn(StatusCode::CREATED, json!([{ "user_id": "u" }])).await;
        let client = client_for(&gateway);

        let rows: Vec<Value> = client
            .from("profiles")
            .upsert(&json!({ "user_id": "u" }), "user_id")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let request = gateway.single_request();
        assert_eq!(request.method, "POST");
        assert_eq!(request.query.as_deref(), Some("on_conflict=user_id"));
        assert_eq!(request.header("prefer"), Some(PREFER_UPSERT));
        assert_eq!(request.json_body(), json!({ "user_id": "u" }));
    }

    #[tokio::test]
    async fn delete_succeeds_on_no_content() {
        let gateway = FakeGateway::spawn(StatusCode::NO_CONTENT, Value::Null).await;
        let client = client_for(&gateway);

        client.from("profiles").eq("user_id", "u").delete().await.unwrap();
        assert_eq!(gateway.single_request().method, "DELETE");
    }

    #[tokio::test]
    async fn gateway_errors_keep_code_and_message() {
        let gateway = FakeGateway::spawn(
            StatusCode::CONFLICT,
            json!({ "code": "23505", "message": "duplicate key value" }),
        )
        .await;
        let client = client_for(&gateway);

        let result: DataResult<Vec<Value>> = client.from("profiles").insert(&json!({})).await;
        match result {
            Err(DataError::Gateway {
                status,
                code,
                message,
            }) => {
                assert_eq!(status, 409);
                assert_eq!(code.as_deref(), Some("23505"));
                assert_eq!(message, "duplicate key value");
            }
            other => panic!("expected gateway error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unexpected_body_is_invalid_response() {
        let gateway = FakeGateway::spawn(StatusCode::OK, json!({ "not": "a list" })).await;
        let client = client_for(&gateway);

        let result: DataResult<Vec<Value>> = client.from("profiles").fetch().await;
        assert!(matches!(result, Err(DataError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn table_names_cannot_escape_the_gateway() {
        let gateway = FakeGateway::spawn(StatusCode::OK, json!([])).await;
        let client = client_for(&gateway);

        let result: DataResult<Vec<Value>> = client.from("../auth/v1/admin").fetch().await;
        assert!(matches!(result, Err(DataError::InvalidRequest(_))));
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn scheme_like_table_names_cannot_change_host() {
        let gateway = FakeGateway::spawn(StatusCode::OK, json!([])).await;
        let client = client_for(&gateway);

        for table in ["http:evil.example", "https:evil.example", "\\\\evil.example"] {
            let result: DataResult<Vec<Value>> = client.from(table).fetch().await;
            assert!(
                matches!(result, Err(DataError::InvalidRequest(_))),
                "{table} was accepted"
            );
        }
        assert!(gateway.requests().is_empty());
    }

    #[test]
    fn debug_output_hides_credentials() {
        let client = RestClient::new(
            rest_endpoint("https://x.example").unwrap(),
            "secret-key",
            "secret-bearer",
            Client::new(),
        );
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("secret"));
    }
}
