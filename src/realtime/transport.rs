use std::pin::Pin;

use futures::future::BoxFuture;
use futures::stream::StreamExt;
use futures::{Sink, Stream};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use url::Url;

use crate::types::error::Result;

/// Write half of an established connection.
pub type WsSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send + Sync>>;

/// Read half of an established connection.
pub type WsStream =
    Pin<Box<dyn Stream<Item = std::result::Result<Message, WsError>> + Send + Sync>>;

/// Dials a realtime endpoint and hands back the split halves of the socket.
///
/// The production implementation wraps `tokio-tungstenite`; tests inject a
/// channel-backed fake so the reconnect state machine runs without a server.
pub trait Transport: Send + Sync {
    fn connect(&self, url: Url) -> BoxFuture<'static, Result<(WsSink, WsStream)>>;
}

/// The default transport: a real WebSocket connection, TLS included.
pub struct WebSocketTransport;

impl Transport for WebSocketTransport {
    fn connect(&self, url: Url) -> BoxFuture<'static, Result<(WsSink, WsStream)>> {
        Box::pin(async move {
            let (socket, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
            let (sink, stream) = socket.split();
            Ok((Box::pin(sink) as WsSink, Box::pin(stream) as WsStream))
        })
    }
}
