use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::infrastructure::TaskManager;
use crate::realtime::connection::ConnectionState;
use crate::types::message::RealtimeMessage;

/// Handler invoked for realtime messages matching its registered type key.
pub type MessageHandler = Arc<dyn Fn(&RealtimeMessage) + Send + Sync + 'static>;

/// Observer invoked with `true` on every open and `false` on every close.
pub type ConnectionObserver = Arc<dyn Fn(bool) + Send + Sync + 'static>;

/// Consolidated mutable state for [`RealtimeClient`](crate::realtime::RealtimeClient).
/// A single struct keeps lock traffic down.
pub struct ClientState {
    /// Token from the most recent `connect`, reused by reconnection.
    pub token: Option<String>,

    /// Message-type key (or wildcard) to handler. Re-registration replaces.
    pub handlers: HashMap<String, MessageHandler>,

    /// Connection open/close observers.
    pub observers: Vec<ConnectionObserver>,

    /// Topics accumulated by `subscribe`, replayed after a reconnect.
    pub topics: Vec<String>,

    /// Consecutive reconnection attempts since the last successful open.
    pub reconnect_attempts: u32,

    /// Whether the last disconnect was caller-initiated (suppresses
    /// auto-reconnect).
    pub was_manual_disconnect: bool,

    /// Close code of the last close frame received, if any.
    pub last_close_code: Option<u16>,

    /// Background tasks tied to the current socket (reader, keepalive).
    pub task_manager: TaskManager,

    /// Reconnect watcher handle; outlives individual sockets.
    pub watcher_task: Option<JoinHandle<()>>,

    /// Sender for state change notifications.
    pub state_change_tx: Option<watch::Sender<(ConnectionState, bool)>>,
}

impl ClientState {
    pub fn new() -> Self {
        Self {
            token: None,
            handlers: HashMap::new(),
            observers: Vec::new(),
            topics: Vec::new(),
            reconnect_attempts: 0,
            was_manual_disconnect: false,
            last_close_code: None,
            task_manager: TaskManager::new(),
            watcher_task: None,
            state_change_tx: None,
        }
    }

    /// Notify state change watchers
    pub fn notify_state_change(&self, state: ConnectionState, manual: bool) {
        if let Some(tx) = &self.state_change_tx
            && tx.send((state, manual)).is_err()
        {
            tracing::debug!("state watcher gone, dropping notification: {state:?}");
        }
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new()
    }
}
