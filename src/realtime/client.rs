use std::sync::Arc;
use std::time::Duration;

use futures::stream::StreamExt;
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::infrastructure::Backoff;
use crate::realtime::builder::{RealtimeClientBuilder, RealtimeOptions};
use crate::realtime::connection::{ConnectionManager, ConnectionState};
use crate::realtime::router::MessageRouter;
use crate::realtime::state::ClientState;
use crate::realtime::transport::Transport;
use crate::types::constants::WS_CLOSE_NORMAL;
use crate::types::error::{RealtimeError, Result};
use crate::types::message::RealtimeMessage;

/// Persistent bidirectional channel to the Covenant realtime endpoint.
///
/// `RealtimeClient` owns the WebSocket connection, reconnects with
/// exponential backoff after unexpected closures, and dispatches incoming
/// messages to handlers registered by message type.
///
/// # Example
///
/// ```no_run
/// use covenant_client::{RealtimeClient, RealtimeOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RealtimeClient::new("wss://api.covenant.app/ws", RealtimeOptions::default())?;
///
/// client
///     .on_message("contract_update", |message| {
///         println!("contract changed: {:?}", message.field("contract_id"));
///     })
///     .await;
///
/// client.connect("my-bearer-token").await?;
/// client.subscribe(vec!["contracts:42".to_string()]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeClient {
    pub(crate) endpoint: String,
    pub(crate) options: RealtimeOptions,
    pub(crate) transport: Arc<dyn Transport>,

    pub(crate) connection: Arc<ConnectionManager>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,
}

impl RealtimeClient {
    /// Creates a client for the given WebSocket base URL. No connection is
    /// opened until [`connect`](Self::connect).
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UrlParse`] when the endpoint is malformed.
    pub fn new(endpoint: impl Into<String>, options: RealtimeOptions) -> Result<Self> {
        RealtimeClientBuilder::new(endpoint, options).map(|builder| builder.build())
    }

    /// Opens the connection, passing `token` as a query parameter.
    ///
    /// Calling while already connected replaces the prior socket: its
    /// background tasks are torn down silently and a fresh connection is
    /// dialed. The token is remembered and reused by automatic reconnection.
    pub async fn connect(&self, token: &str) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.token = Some(token.to_string());
            state.was_manual_disconnect = false;
        }
        self.dial().await
    }

    /// Closes the connection with the normal-closure code and suppresses
    /// auto-reconnect. Safe to call when already disconnected.
    pub async fn disconnect(&self) -> Result<()> {
        if self.connection.state().await == ConnectionState::Disconnected {
            return Ok(());
        }

        tracing::info!("disconnecting from realtime endpoint");
        {
            let mut state = self.state.write().await;
            state.was_manual_disconnect = true;
            state.task_manager.abort_all();
        }

        self.connection.close().await?;
        self.set_state(ConnectionState::Disconnected).await;
        self.notify_observers(false).await;
        Ok(())
    }

    /// Serializes `message` and transmits it if the connection is open.
    ///
    /// While disconnected this is a documented no-op: the message is dropped,
    /// not queued, and no error is returned.
    pub async fn send(&self, message: &RealtimeMessage) -> Result<()> {
        if !self.is_connected().await {
            tracing::debug!("dropping {} message sent while disconnected", message.kind);
            return Ok(());
        }
        self.connection.send_message(message).await
    }

    /// Registers `handler` for messages whose `type` equals `kind`.
    ///
    /// Re-registering a key replaces the previous handler (last writer wins).
    /// A handler under the wildcard key `"*"` receives every message, after
    /// the type-specific handler for that message has run.
    pub async fn on_message<F>(&self, kind: impl Into<String>, handler: F)
    where
        F: Fn(&RealtimeMessage) + Send + Sync + 'static,
    {
        let mut state = self.state.write().await;
        state.handlers.insert(kind.into(), Arc::new(handler));
    }

    /// Registers an observer invoked with `true` on every open and `false`
    /// on every close, including closes that will be followed by a
    /// reconnection attempt.
    pub async fn on_connection<F>(&self, handler: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let mut state = self.state.write().await;
        state.observers.push(Arc::new(handler));
    }

    /// Sends `{"type":"subscribe","topics":[...]}` and remembers the topics
    /// so they are replayed after an automatic reconnect.
    pub async fn subscribe(&self, topics: Vec<String>) -> Result<()> {
        {
            let mut state = self.state.write().await;
            for topic in &topics {
                if !state.topics.contains(topic) {
                    state.topics.push(topic.clone());
                }
            }
        }
        self.send(&RealtimeMessage::subscribe(&topics)).await
    }

    /// Sends the fixed keepalive message `{"type":"ping"}`.
    pub async fn ping(&self) -> Result<()> {
        self.send(&RealtimeMessage::ping()).await
    }

    /// True iff the underlying socket is open.
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    /// Current state of the connection state machine.
    pub async fn connection_state(&self) -> ConnectionState {
        self.connection.state().await
    }

    /// Set connection state and notify watchers
    async fn set_state(&self, new_state: ConnectionState) {
        self.connection.set_state(new_state).await;

        let state = self.state.read().await;
        state.notify_state_change(new_state, state.was_manual_disconnect);
    }

    async fn notify_observers(&self, open: bool) {
        let observers = self.state.read().await.observers.clone();
        for observer in observers {
            observer(open);
        }
    }

    /// Tears down any live socket and dials a fresh one with the stored
    /// token.
    pub(crate) async fn dial(&self) -> Result<()> {
        let token = {
            let mut state = self.state.write().await;
            state.task_manager.abort_all();
            state.last_close_code = None;
            state.token.clone()
        };
        let Some(token) = token else {
            return Err(RealtimeError::Connection(
                "no token available: call connect() first".into(),
            ));
        };

        self.connection.clear_writer().await;
        self.set_state(ConnectionState::Connecting).await;

        let url = self.build_endpoint_url(&token)?;
        tracing::info!("connecting to {}", self.endpoint);

        let (sink, mut stream) = match self.transport.connect(url).await {
            Ok(halves) => halves,
            Err(error) => {
                self.set_state(ConnectionState::Disconnected).await;
                return Err(error);
            }
        };

        self.connection.set_writer(sink).await;
        {
            let mut state = self.state.write().await;
            state.reconnect_attempts = 0;
        }
        self.set_state(ConnectionState::Connected).await;
        self.notify_observers(true).await;

        let router = MessageRouter::new(Arc::clone(&self.state));
        let client = self.clone();
        {
            let mut state = self.state.write().await;
            state.task_manager.spawn(async move {
                tracing::debug!("read task started");
                let mut close_code: Option<u16> = None;

                while let Some(item) = stream.next().await {
                    match item {
                        Ok(Message::Text(text)) => {
                            match serde_json::from_str::<RealtimeMessage>(text.as_str()) {
                                Ok(message) => router.route(message).await,
                                Err(error) => {
                                    tracing::error!(
                                        "discarding malformed message: {error} - raw: {text}"
                                    );
                                }
                            }
                        }
                        Ok(Message::Close(frame)) => {
                            match &frame {
                                Some(frame) => tracing::info!(
                                    "server closed connection: code={:?} reason='{}'",
                                    frame.code,
                                    frame.reason
                                ),
                                None => {
                                    tracing::warn!("server closed connection without close frame")
                                }
                            }
                            close_code = frame.map(|frame| u16::from(frame.code));
                            break;
                        }
                        Ok(Message::Ping(data)) => {
                            tracing::debug!("received ping ({} bytes)", data.len());
                        }
                        Ok(Message::Pong(data)) => {
                            tracing::debug!("received pong ({} bytes)", data.len());
                        }
                        Ok(Message::Binary(data)) => {
                            tracing::warn!(
                                "ignoring unexpected binary message ({} bytes)",
                                data.len()
                            );
                        }
                        Ok(Message::Frame(_)) => {
                            tracing::debug!("received raw frame");
                        }
                        Err(error) => {
                            // Read errors alone don't drive the state machine;
                            // the closed path below does, once the stream ends.
                            tracing::error!("websocket read error: {error}");
                            break;
                        }
                    }
                }

                tracing::debug!("read task finished");
                client.handle_socket_closed(close_code).await;
            });

            if let Some(interval_ms) = self.options.keepalive_interval_ms {
                let client = self.clone();
                state.task_manager.spawn(async move {
                    let mut ticker =
                        tokio::time::interval(Duration::from_millis(interval_ms));
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    ticker.tick().await; // first tick completes immediately

                    loop {
                        ticker.tick().await;
                        if !client.is_connected().await {
                            continue;
                        }
                        if let Err(error) = client.ping().await {
                            tracing::warn!("keepalive ping failed: {error}");
                        }
                    }
                });
            }
        }

        tracing::info!("realtime connection established");
        Ok(())
    }

    /// Shared path for every way a socket dies: close frame, read error, or
    /// the stream simply ending.
    async fn handle_socket_closed(&self, close_code: Option<u16>) {
        {
            let mut state = self.state.write().await;
            state.last_close_code = close_code;
        }
        self.connection.clear_writer().await;

        // Observers hear about the close before the reconnect watcher can
        // start dialing again.
        self.notify_observers(false).await;
        self.set_state(ConnectionState::Disconnected).await;
    }

    /// Reconnection loop driven by the watcher task: waits out the backoff,
    /// increments the attempt counter, and dials again with the stored
    /// token, until connected or the attempt cap is reached.
    pub(crate) async fn try_reconnect(&self) -> Result<()> {
        {
            let state = self.state.read().await;
            if state.was_manual_disconnect {
                tracing::info!("manual disconnect, not reconnecting");
                return Ok(());
            }
            if state.last_close_code == Some(WS_CLOSE_NORMAL) {
                tracing::info!("connection closed cleanly, not reconnecting");
                return Ok(());
            }
        }

        loop {
            if self.connection.state().await != ConnectionState::Disconnected {
                break;
            }

            let attempts = {
                let state = self.state.read().await;
                if state.was_manual_disconnect {
                    break;
                }
                state.reconnect_attempts
            };
            if attempts >= self.options.max_reconnect_attempts {
                tracing::warn!("giving up after {attempts} reconnection attempts");
                break;
            }

            tokio::time::sleep(Backoff::delay_for(
                self.options.reconnect_base_delay_ms,
                attempts,
            ))
            .await;

            {
                let mut state = self.state.write().await;
                if state.was_manual_disconnect {
                    break;
                }
                state.reconnect_attempts += 1;
            }

            tracing::info!("reconnection attempt {}", attempts + 1);
            match self.dial().await {
                Ok(()) => {
                    tracing::info!("reconnected");
                    self.resubscribe().await;
                    break;
                }
                Err(error) => {
                    tracing::error!("reconnection attempt failed: {error}");
                }
            }
        }
        Ok(())
    }

    /// Replays the accumulated subscription topics after a reconnect.
    async fn resubscribe(&self) {
        let topics = self.state.read().await.topics.clone();
        if topics.is_empty() {
            return;
        }
        if let Err(error) = self.send(&RealtimeMessage::subscribe(&topics)).await {
            tracing::warn!("failed to resubscribe after reconnect: {error}");
        }
    }

    /// Builds `{ws_base}/connect?token=<token>` with a percent-encoded token.
    fn build_endpoint_url(&self, token: &str) -> Result<Url> {
        let base = self.endpoint.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/connect"))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn endpoint_url_carries_encoded_token() {
        let client =
            RealtimeClient::new("ws://localhost:8000/ws/", RealtimeOptions::default()).unwrap();
        let url = client.build_endpoint_url("a token+with/specials").unwrap();

        assert_eq!(
            url.as_str(),
            "ws://localhost:8000/ws/connect?token=a+token%2Bwith%2Fspecials"
        );
    }

    #[tokio::test]
    async fn malformed_endpoint_is_rejected() {
        let result = RealtimeClient::new("not a url", RealtimeOptions::default());
        assert!(matches!(result, Err(RealtimeError::UrlParse(_))));
    }
}
