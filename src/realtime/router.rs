use std::sync::Arc;

use tokio::sync::RwLock;

use crate::realtime::state::ClientState;
use crate::types::constants::WILDCARD_KEY;
use crate::types::message::RealtimeMessage;

/// Routes incoming messages to registered handlers by message type.
///
/// The type-specific handler fires first, then the wildcard handler; both see
/// the same message.
pub struct MessageRouter {
    state: Arc<RwLock<ClientState>>,
}

impl MessageRouter {
    pub fn new(state: Arc<RwLock<ClientState>>) -> Self {
        Self { state }
    }

    pub async fn route(&self, message: RealtimeMessage) {
        let (specific, wildcard) = {
            let state = self.state.read().await;
            (
                state.handlers.get(&message.kind).cloned(),
                state.handlers.get(WILDCARD_KEY).cloned(),
            )
        };

        if specific.is_none() && wildcard.is_none() {
            tracing::debug!("no handler for message type {}", message.kind);
            return;
        }

        if let Some(handler) = specific {
            handler(&message);
        }
        // A handler registered under the wildcard key itself is the
        // type-specific handler above; don't fire it twice.
        if message.kind != WILDCARD_KEY
            && let Some(handler) = wildcard
        {
            handler(&message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_handler(
        log: &Arc<Mutex<Vec<String>>>,
        label: &'static str,
    ) -> crate::realtime::state::MessageHandler {
        let log = Arc::clone(log);
        Arc::new(move |message: &RealtimeMessage| {
            log.lock().unwrap().push(format!("{label}:{}", message.kind));
        })
    }

    #[tokio::test]
    async fn specific_handler_fires_before_wildcard() {
        let state = Arc::new(RwLock::new(ClientState::new()));
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let mut guard = state.write().await;
            guard
                .handlers
                .insert("contract_update".into(), recording_handler(&log, "specific"));
            guard
                .handlers
                .insert(WILDCARD_KEY.into(), recording_handler(&log, "wildcard"));
        }

        let router = MessageRouter::new(Arc::clone(&state));
        router
            .route(RealtimeMessage::new(
                "contract_update",
                serde_json::Value::Object(Default::default()),
            ))
            .await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["specific:contract_update", "wildcard:contract_update"]
        );
    }

    #[tokio::test]
    async fn wildcard_receives_types_without_specific_handler() {
        let state = Arc::new(RwLock::new(ClientState::new()));
        let log = Arc::new(Mutex::new(Vec::new()));
        state
            .write()
            .await
            .handlers
            .insert(WILDCARD_KEY.into(), recording_handler(&log, "wildcard"));

        let router = MessageRouter::new(Arc::clone(&state));
        router
            .route(RealtimeMessage::new(
                "notification",
                serde_json::Value::Object(Default::default()),
            ))
            .await;

        assert_eq!(*log.lock().unwrap(), vec!["wildcard:notification"]);
    }
}
