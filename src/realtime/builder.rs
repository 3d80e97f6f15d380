use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use url::Url;

use crate::realtime::client::RealtimeClient;
use crate::realtime::connection::{ConnectionManager, ConnectionState};
use crate::realtime::state::ClientState;
use crate::realtime::transport::{Transport, WebSocketTransport};
use crate::types::constants::{
    DEFAULT_KEEPALIVE_INTERVAL_MS, DEFAULT_RECONNECT_BASE_DELAY_MS,
    DEFAULT_RECONNECT_MAX_ATTEMPTS,
};
use crate::types::error::Result;

/// Configuration for [`RealtimeClient`].
#[derive(Clone)]
pub struct RealtimeOptions {
    /// Cap on consecutive reconnection attempts after an unexpected close.
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential reconnect backoff, in milliseconds.
    pub reconnect_base_delay_ms: u64,
    /// Interval between keepalive pings; `None` disables the keepalive task.
    pub keepalive_interval_ms: Option<u64>,
    /// Transport override, used by tests to avoid a real socket.
    pub transport: Option<Arc<dyn Transport>>,
}

impl Default for RealtimeOptions {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: DEFAULT_RECONNECT_MAX_ATTEMPTS,
            reconnect_base_delay_ms: DEFAULT_RECONNECT_BASE_DELAY_MS,
            keepalive_interval_ms: Some(DEFAULT_KEEPALIVE_INTERVAL_MS),
            transport: None,
        }
    }
}

impl std::fmt::Debug for RealtimeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeOptions")
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .field("reconnect_base_delay_ms", &self.reconnect_base_delay_ms)
            .field("keepalive_interval_ms", &self.keepalive_interval_ms)
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

/// Builder for [`RealtimeClient`] that validates the endpoint and spawns the
/// reconnect watcher. Must run inside a Tokio runtime.
pub struct RealtimeClientBuilder {
    endpoint: String,
    options: RealtimeOptions,
}

impl RealtimeClientBuilder {
    /// Creates a builder for the given WebSocket base URL (e.g.
    /// `wss://api.covenant.app/ws`).
    pub fn new(endpoint: impl Into<String>, options: RealtimeOptions) -> Result<Self> {
        let endpoint = endpoint.into();
        Url::parse(&endpoint)?;

        Ok(Self { endpoint, options })
    }

    /// Builds the client and spawns the reconnect watcher task.
    pub fn build(self) -> RealtimeClient {
        let transport: Arc<dyn Transport> = self
            .options
            .transport
            .clone()
            .unwrap_or_else(|| Arc::new(WebSocketTransport));

        let client = RealtimeClient {
            endpoint: self.endpoint,
            options: self.options,
            transport,
            connection: Arc::new(ConnectionManager::new()),
            state: Arc::new(RwLock::new(ClientState::new())),
        };

        let (state_tx, state_rx) =
            watch::channel((ConnectionState::Disconnected, false));

        // The state is freshly built and unshared, so try_write cannot fail here.
        if let Ok(mut state) = client.state.try_write() {
            state.state_change_tx = Some(state_tx);
        }

        // Watch for unexpected disconnects and drive reconnection.
        let watcher = client.clone();
        let handle = tokio::spawn(async move {
            let mut rx = state_rx;
            while rx.changed().await.is_ok() {
                let (state, was_manual) = *rx.borrow();
                if state == ConnectionState::Disconnected && !was_manual {
                    if let Err(error) = watcher.try_reconnect().await {
                        tracing::error!("reconnect watcher failed: {error}");
                    }
                }
            }
            tracing::debug!("reconnect watcher finished");
        });

        if let Ok(mut state) = client.state.try_write() {
            state.watcher_task = Some(handle);
        }

        client
    }
}
