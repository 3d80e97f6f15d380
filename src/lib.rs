//! # Covenant client
//!
//! Rust client SDK for the Covenant contract-management platform API.
//!
//! Two independent components:
//!
//! - [`RequestClient`]: REST calls with bearer authentication, exponential
//!   retry backoff for transient failures, and typed [`ApiError`] reporting.
//! - [`RealtimeClient`]: a persistent WebSocket channel with automatic
//!   reconnection and per-message-type handler dispatch.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use covenant_client::{
//!     ClientConfig, MemoryTokenStore, RealtimeClient, RealtimeOptions, RequestClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env();
//!     let tokens = Arc::new(MemoryTokenStore::new());
//!     tokens.set(&config.token_key, "my-bearer-token");
//!
//!     let api = RequestClient::new(config.clone(), tokens);
//!     let contracts: serde_json::Value = api.get("/contracts").await?;
//!     println!("{contracts}");
//!
//!     let realtime = RealtimeClient::new(&config.ws_base_url, RealtimeOptions::default())?;
//!     realtime.connect("my-bearer-token").await?;
//!     realtime.subscribe(vec!["contracts".to_string()]).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod http;
pub mod infrastructure;
pub mod realtime;
pub mod types;

pub use auth::{EnvTokenStore, MemoryTokenStore, TokenStore};
pub use config::ClientConfig;
pub use http::{
    ConnectionStatus, Empty, HealthState, HealthStatus, HttpMethod, QueryValue, RequestClient,
    RequestConfig,
};
pub use realtime::{ConnectionState, RealtimeClient, RealtimeClientBuilder, RealtimeOptions};
pub use types::{ApiError, RealtimeError, RealtimeMessage};
