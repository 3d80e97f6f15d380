use std::sync::Arc;

use futures::SinkExt;
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use crate::realtime::transport::WsSink;
use crate::types::error::Result;
use crate::types::message::RealtimeMessage;

/// Observable connectivity of the realtime channel. Transitions are the only
/// way consumers learn of connectivity changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Owns the write half of the socket and the connection state.
pub struct ConnectionManager {
    writer: Arc<RwLock<Option<WsSink>>>,
    state: Arc<RwLock<ConnectionState>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            writer: Arc::new(RwLock::new(None)),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        }
    }

    /// Installs the write half of a freshly dialed socket.
    pub async fn set_writer(&self, writer: WsSink) {
        *self.writer.write().await = Some(writer);
    }

    /// Drops the writer without a close handshake (socket replacement).
    pub async fn clear_writer(&self) {
        *self.writer.write().await = None;
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn set_state(&self, new_state: ConnectionState) {
        *self.state.write().await = new_state;
    }

    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Connected
    }

    /// Serializes and transmits a message. A no-op when no writer is
    /// installed.
    pub async fn send_message(&self, message: &RealtimeMessage) -> Result<()> {
        let json = serde_json::to_string(message)?;

        let mut writer = self.writer.write().await;
        if let Some(sink) = writer.as_mut() {
            sink.send(Message::Text(json.into())).await?;
        }
        Ok(())
    }

    /// Performs the normal-closure handshake and drops the writer.
    pub async fn close(&self) -> Result<()> {
        let mut writer = self.writer.write().await;
        if let Some(sink) = writer.as_mut() {
            let frame = CloseFrame {
                code: CloseCode::Normal,
                reason: "client disconnect".into(),
            };
            // The peer may already be gone; a failed close frame is not an error worth surfacing.
            if let Err(error) = sink.send(Message::Close(Some(frame))).await {
                tracing::debug!("close frame not delivered: {error}");
            }
            if let Err(error) = sink.close().await {
                tracing::debug!("sink close failed: {error}");
            }
        }
        *writer = None;
        Ok(())
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
