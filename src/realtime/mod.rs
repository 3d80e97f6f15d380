mod builder;
mod client;
mod connection;
mod router;
mod state;
mod transport;

pub use builder::{RealtimeClientBuilder, RealtimeOptions};
pub use client::RealtimeClient;
pub use connection::{ConnectionManager, ConnectionState};
pub use state::{ClientState, ConnectionObserver, MessageHandler};
pub use transport::{Transport, WebSocketTransport, WsSink, WsStream};
