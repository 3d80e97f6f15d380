use serde_json::Value;
use thiserror::Error;

use crate::types::constants::TRANSPORT_FAILURE_STATUS;

/// Classified failure surfaced by [`RequestClient`](crate::http::RequestClient).
///
/// `status` is the HTTP status code of the final failed attempt, or `0` when
/// no HTTP response was received at all (network/transport failure).
#[derive(Debug, Clone, Error, PartialEq)]
#[error("api error (status {status}): {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    /// Raw error payload from the server, when the body was parseable JSON.
    pub data: Option<Value>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status,
            message: message.into(),
            data,
        }
    }

    /// A failure with no HTTP response (DNS, refused connection, timeout...).
    pub fn transport(source: &reqwest::Error) -> Self {
        Self::new(
            TRANSPORT_FAILURE_STATUS,
            format!("network error: {source}"),
            None,
        )
    }

    /// A 2xx response whose body could not be decoded as the expected shape.
    pub fn decode(status: u16, source: &serde_json::Error) -> Self {
        Self::new(
            status,
            format!("failed to decode response body: {source}"),
            None,
        )
    }

    /// Builds an error from a non-2xx response, pulling the human-readable
    /// message out of the body when the server provided one.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let fallback = status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();

        let data = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice::<Value>(&bytes).ok(),
            Err(_) => None,
        };

        let message = data
            .as_ref()
            .and_then(|body| {
                ["message", "error", "detail"]
                    .iter()
                    .find_map(|key| body.get(key).and_then(Value::as_str))
            })
            .map(str::to_string)
            .unwrap_or(fallback);

        Self::new(status.as_u16(), message, data)
    }

    /// True for 401/403, where the caller should redirect to sign-in.
    pub fn is_auth(&self) -> bool {
        self.status == 401 || self.status == 403
    }

    /// Whether the retry policy may reissue the request.
    ///
    /// Client errors (4xx) are final, except 408 and 429 which are transient.
    /// Everything else, 5xx and transport failures included, is retryable.
    pub fn is_retryable(&self) -> bool {
        match self.status {
            408 | 429 => true,
            400..500 => false,
            _ => true,
        }
    }
}

/// Errors produced by [`RealtimeClient`](crate::realtime::RealtimeClient).
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// WebSocket protocol error (handshake failed, invalid frame, etc.)
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// General connection error with descriptive message
    #[error("connection error: {0}")]
    Connection(String),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed endpoint URL)
    #[error("url parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Convenience type alias for `Result<T, RealtimeError>`.
pub type Result<T> = std::result::Result<T, RealtimeError>;
