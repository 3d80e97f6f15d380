use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::{Map, Value};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::{TokenStore, resolve_token};
use crate::config::ClientConfig;
use crate::http::health::{ConnectionStatus, HealthState, HealthStatus};
use crate::http::request::{QueryValue, RequestConfig};
use crate::infrastructure::Backoff;
use crate::types::ApiError;

/// Deserialization target for endpoints that return no meaningful body
/// (and for 204 responses).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
pub struct Empty {}

/// Issues REST calls against the Covenant API: attaches bearer
/// authentication, retries transient failures with exponential backoff, and
/// surfaces every failure as a typed [`ApiError`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use covenant_client::{ClientConfig, MemoryTokenStore, RequestClient};
///
/// # async fn example() -> Result<(), covenant_client::ApiError> {
/// let client = RequestClient::new(ClientConfig::from_env(), Arc::new(MemoryTokenStore::new()));
/// let contracts: serde_json::Value = client.get("/contracts").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RequestClient {
    config: ClientConfig,
    http: reqwest::Client,
    tokens: Arc<dyn TokenStore>,
    health: Arc<HealthState>,
}

impl RequestClient {
    /// Creates a client with its own health context.
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Self {
        Self::with_health(config, tokens, Arc::new(HealthState::new()))
    }

    /// Creates a client sharing an existing health context (several clients
    /// can report into one flag).
    pub fn with_health(
        config: ClientConfig,
        tokens: Arc<dyn TokenStore>,
        health: Arc<HealthState>,
    ) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            tokens,
            health,
        }
    }

    /// Last-known API reachability, as maintained by requests and probes.
    pub fn connection_status(&self) -> ConnectionStatus {
        self.health.status()
    }

    /// The health context, for sharing with other clients or inspecting in
    /// tests.
    pub fn health(&self) -> Arc<HealthState> {
        Arc::clone(&self.health)
    }

    /// Issues a request described by `config` against `path` (relative to the
    /// configured base URL) and decodes the JSON response into `T`.
    ///
    /// Transient failures (5xx, 408, 429, network errors) are retried up to
    /// `max_retries` additional times with exponential backoff; all other
    /// failures are surfaced immediately. A 204 response decodes as an empty
    /// object; use [`Empty`] for such endpoints.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<T, ApiError> {
        HealthState::maybe_probe(
            &self.health,
            self.http.clone(),
            self.config.api_base_url.clone(),
        );

        let url = self.build_url(path, &config.query)?;
        let token = resolve_token(
            self.tokens.as_ref(),
            &self.config.token_key,
            &self.config.legacy_token_key,
        );

        let mut backoff = Backoff::new(self.config.retry_base_delay_ms);
        let mut attempt: u32 = 0;

        loop {
            if self.config.debug {
                tracing::debug!(
                    attempt,
                    method = %config.method,
                    url = %url,
                    has_token = token.is_some(),
                    "issuing request"
                );
            }

            let error = match self.execute(&url, &config, token.as_deref()).await {
                Ok(response) if response.status().is_success() => {
                    self.health.mark(ConnectionStatus::Connected);
                    return self.decode(response).await;
                }
                Ok(response) => ApiError::from_response(response).await,
                Err(source) => ApiError::transport(&source),
            };

            if !error.is_retryable() {
                return Err(error);
            }
            if attempt >= self.config.max_retries {
                self.health.mark(ConnectionStatus::Error);
                return Err(error);
            }

            if self.config.debug {
                tracing::debug!(
                    attempt,
                    status = error.status,
                    "request failed, retrying after backoff"
                );
            }
            backoff.schedule_timeout().await;
            attempt += 1;
        }
    }

    /// `GET path`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(path, RequestConfig::get()).await
    }

    /// `POST path` with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = encode_body(body)?;
        self.request(path, RequestConfig::post().with_body(body)).await
    }

    /// `PUT path` with a JSON body.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = encode_body(body)?;
        self.request(path, RequestConfig::put().with_body(body)).await
    }

    /// `DELETE path`.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(path, RequestConfig::delete()).await
    }

    /// Calls `GET /health` directly and returns the typed status. Unlike the
    /// opportunistic probe this is a regular request with retries.
    pub async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        self.request("/health", RequestConfig::get()).await
    }

    async fn execute(
        &self,
        url: &Url,
        config: &RequestConfig,
        token: Option<&str>,
    ) -> reqwest::Result<reqwest::Response> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token
            && let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}"))
        {
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in &config.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            } else {
                tracing::warn!("skipping invalid header override: {name}");
            }
        }

        let mut builder = self
            .http
            .request(config.method.as_reqwest(), url.clone())
            .headers(headers);
        if let Some(timeout_ms) = self.config.request_timeout_ms {
            builder = builder.timeout(std::time::Duration::from_millis(timeout_ms));
        }
        if let Some(body) = &config.body {
            builder = builder.json(body);
        }
        builder.send().await
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(Value::Object(Map::new()))
                .map_err(|source| ApiError::decode(status.as_u16(), &source));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::transport(&source))?;

        if self.config.debug {
            tracing::debug!(status = status.as_u16(), bytes = bytes.len(), "decoding response");
        }
        serde_json::from_slice(&bytes).map_err(|source| ApiError::decode(status.as_u16(), &source))
    }

    fn build_url(&self, path: &str, query: &[(String, QueryValue)]) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined).map_err(|source| {
            ApiError::new(
                crate::types::constants::TRANSPORT_FAILURE_STATUS,
                format!("invalid request URL {joined}: {source}"),
                None,
            )
        })?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, &value.to_string());
            }
        }
        Ok(url)
    }
}

fn encode_body<B: Serialize>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|source| {
        ApiError::new(
            crate::types::constants::TRANSPORT_FAILURE_STATUS,
            format!("failed to encode request body: {source}"),
            None,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn client_with(base: &str) -> RequestClient {
        let config = ClientConfig {
            api_base_url: base.to_string(),
            ..ClientConfig::default()
        };
        RequestClient::new(config, Arc::new(MemoryTokenStore::new()))
    }

    #[test]
    fn build_url_joins_base_and_path() {
        let client = client_with("https://api.covenant.app/v1/");
        let url = client.build_url("/contracts", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.covenant.app/v1/contracts");
    }

    #[test]
    fn build_url_stringifies_and_encodes_query() {
        let client = client_with("https://api.covenant.app/v1");
        let url = client
            .build_url(
                "/contracts/search",
                &[
                    ("q".to_string(), QueryValue::from("non compete")),
                    ("page".to_string(), QueryValue::from(2)),
                    ("archived".to_string(), QueryValue::from(false)),
                ],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.covenant.app/v1/contracts/search?q=non+compete&page=2&archived=false"
        );
    }

    #[test]
    fn build_url_rejects_garbage_base() {
        let client = client_with("not a url");
        let error = client.build_url("/contracts", &[]).unwrap_err();
        assert_eq!(error.status, 0);
    }

    #[test]
    fn empty_decodes_from_empty_object() {
        let empty: Empty = serde_json::from_value(Value::Object(Map::new())).unwrap();
        assert_eq!(empty, Empty {});
    }
}
