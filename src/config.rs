use std::env;

use crate::types::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_TOKEN_KEY,
    DEFAULT_WS_BASE_URL, LEGACY_TOKEN_KEY, env_keys,
};

/// Process-wide configuration for the Covenant clients.
///
/// Every knob has a documented default; [`ClientConfig::from_env`] overrides
/// them from environment variables so deployments never hard-code endpoints.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API base URL, e.g. `https://api.covenant.app/v1`.
    pub api_base_url: String,
    /// Realtime WebSocket base URL, e.g. `wss://api.covenant.app/ws`.
    pub ws_base_url: String,
    /// Retries after the initial attempt for transient request failures.
    pub max_retries: u32,
    /// Base delay for exponential request backoff, in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Optional per-attempt request timeout in milliseconds; `None` leaves
    /// requests bounded only by the retry/backoff envelope.
    pub request_timeout_ms: Option<u64>,
    /// Emit verbose per-attempt request logging.
    pub debug: bool,
    /// Storage key the bearer token is read from.
    pub token_key: String,
    /// Fallback storage key kept for pre-migration sign-ins.
    pub legacy_token_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            ws_base_url: DEFAULT_WS_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            request_timeout_ms: None,
            debug: false,
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            legacy_token_key: LEGACY_TOKEN_KEY.to_string(),
        }
    }
}

impl ClientConfig {
    /// Resolves configuration from the process environment.
    ///
    /// Missing variables keep their defaults. Malformed numeric values are
    /// logged and defaulted rather than failing startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_base_url: env_string(env_keys::API_URL, defaults.api_base_url),
            ws_base_url: env_string(env_keys::WS_URL, defaults.ws_base_url),
            max_retries: env_parsed(env_keys::MAX_RETRIES, defaults.max_retries),
            retry_base_delay_ms: env_parsed(env_keys::RETRY_DELAY_MS, defaults.retry_base_delay_ms),
            request_timeout_ms: env::var(env_keys::REQUEST_TIMEOUT_MS)
                .ok()
                .and_then(|raw| raw.parse().ok()),
            debug: env_flag(env_keys::DEBUG),
            token_key: env_string(env_keys::TOKEN_KEY, defaults.token_key),
            legacy_token_key: env_string(env_keys::TOKEN_KEY_LEGACY, defaults.legacy_token_key),
        }
    }
}

fn env_string(key: &str, default: String) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default,
    }
}

fn env_parsed<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("ignoring malformed {key}={raw}, using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_flag(key: &str) -> bool {
    matches!(
        env::var(key).unwrap_or_default().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ClientConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_base_delay_ms, 1000);
        assert!(!config.debug);
        assert_eq!(config.token_key, "covenant.auth_token");
        assert_eq!(config.legacy_token_key, "auth_token");
    }

    #[test]
    fn env_overrides_and_malformed_values() {
        // set_var is unsafe under edition 2024; keys are unique to this test
        unsafe {
            env::set_var("COVENANT_TEST_URL", "https://api.example.com/v1");
            env::set_var("COVENANT_TEST_RETRIES", "7");
            env::set_var("COVENANT_TEST_BAD", "not-a-number");
        }

        assert_eq!(
            env_string("COVENANT_TEST_URL", "default".into()),
            "https://api.example.com/v1"
        );
        assert_eq!(env_parsed("COVENANT_TEST_RETRIES", 3u32), 7);
        assert_eq!(env_parsed("COVENANT_TEST_BAD", 3u32), 3);
        assert_eq!(env_parsed("COVENANT_TEST_UNSET", 3u32), 3);
    }

    #[test]
    fn debug_flag_accepts_common_truthy_spellings() {
        for (value, expected) in [("1", true), ("TRUE", true), ("off", false), ("", false)] {
            unsafe { env::set_var("COVENANT_TEST_FLAG", value) };
            assert_eq!(env_flag("COVENANT_TEST_FLAG"), expected, "value {value:?}");
        }
    }
}
