use std::time::Duration;

/// Default REST API base URL (local development server).
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Default realtime WebSocket base URL (local development server).
pub const DEFAULT_WS_BASE_URL: &str = "ws://localhost:8000/ws";

/// Default number of retries after the initial request attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between request retries (milliseconds).
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Default cap on consecutive reconnection attempts.
pub const DEFAULT_RECONNECT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay before a reconnection attempt (milliseconds).
pub const DEFAULT_RECONNECT_BASE_DELAY_MS: u64 = 1000;

/// Default interval between keepalive pings (milliseconds).
pub const DEFAULT_KEEPALIVE_INTERVAL_MS: u64 = 30_000;

/// Storage key the bearer token is resolved from.
pub const DEFAULT_TOKEN_KEY: &str = "covenant.auth_token";

/// Pre-migration storage key, consulted when the primary key is absent.
pub const LEGACY_TOKEN_KEY: &str = "auth_token";

/// Minimum spacing between opportunistic health probes.
pub const HEALTH_PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Per-probe timeout; probes are best-effort and never delay a request.
pub const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// `ApiError::status` value for failures with no HTTP response.
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// WebSocket close code for a deliberate, caller-initiated close.
pub const WS_CLOSE_NORMAL: u16 = 1000;

/// Handler key that receives every realtime message regardless of type.
pub const WILDCARD_KEY: &str = "*";

/// Environment variable names consumed by `ClientConfig::from_env`.
pub mod env_keys {
    pub const API_URL: &str = "COVENANT_API_URL";
    pub const WS_URL: &str = "COVENANT_WS_URL";
    pub const MAX_RETRIES: &str = "COVENANT_MAX_RETRIES";
    pub const RETRY_DELAY_MS: &str = "COVENANT_RETRY_DELAY_MS";
    pub const REQUEST_TIMEOUT_MS: &str = "COVENANT_REQUEST_TIMEOUT_MS";
    pub const DEBUG: &str = "COVENANT_DEBUG";
    pub const TOKEN_KEY: &str = "COVENANT_TOKEN_KEY";
    pub const TOKEN_KEY_LEGACY: &str = "COVENANT_TOKEN_KEY_LEGACY";
}
