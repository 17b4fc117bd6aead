//! Message transport.
//!
//! A [`Connection`] is one long-lived, self-reconnecting duplex channel to
//! the gateway. Inbound frames and state changes are delivered to the
//! [`ConnectionHandler`] the connection was opened with.

mod websocket;

pub use websocket::WsConnection;

use crate::config::ReconnectPolicy;
use std::{future::Future, pin::Pin, sync::Arc};
use thiserror::Error;
pub use tokio_tungstenite::tungstenite::http::HeaderMap;

/// An outbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 payload.
    Text(String),
    /// Raw payload.
    Binary(Vec<u8>),
}

impl Frame {
    /// The payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Frame::Text(text) => text.as_bytes(),
            Frame::Binary(data) => data,
        }
    }
}

/// Transport failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The URL or headers could not form a handshake request.
    #[error("invalid connection request: {0}")]
    InvalidRequest(String),

    /// The websocket layer failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// No live connection to send on.
    #[error("connection is not established")]
    NotConnected,

    /// The connection was closed for good.
    #[error("connection is closed")]
    Closed,
}

// ============================================================================
// ConnectionHandler
// ============================================================================

/// Callbacks a connection reports to.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a ConnectionHandler",
    label = "implement `on_connect`, `on_error` and `on_message` for this type"
)]
pub trait ConnectionHandler: Send + Sync + 'static {
    /// The connection `name` is established (again).
    fn on_connect(&self, name: &str);

    /// The connection `name` failed; it will retry on its own.
    fn on_error(&self, name: &str, error: &TransportError);

    /// A frame arrived.
    fn on_message(&self, payload: &[u8]) -> impl Future<Output = ()> + Send;
}

/// Object-safe form of [`ConnectionHandler`].
pub trait DynConnectionHandler: Send + Sync + 'static {
    /// See [`ConnectionHandler::on_connect`].
    fn on_connect_dyn(&self, name: &str);

    /// See [`ConnectionHandler::on_error`].
    fn on_error_dyn(&self, name: &str, error: &TransportError);

    /// See [`ConnectionHandler::on_message`].
    fn on_message_dyn<'a>(
        &'a self,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

impl<T: ConnectionHandler> DynConnectionHandler for T {
    fn on_connect_dyn(&self, name: &str) {
        self.on_connect(name);
    }

    fn on_error_dyn(&self, name: &str, error: &TransportError) {
        self.on_error(name, error);
    }

    fn on_message_dyn<'a>(
        &'a self,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(self.on_message(payload))
    }
}

// ============================================================================
// Connection
// ============================================================================

/// A named, self-reconnecting duplex channel.
pub trait Connection: Send + Sync + 'static {
    /// Create an idle connection reporting to `handler`.
    fn open(
        name: impl Into<String>,
        handler: Arc<dyn DynConnectionHandler>,
        policy: ReconnectPolicy,
    ) -> Self
    where
        Self: Sized;

    /// The name given at construction.
    fn name(&self) -> &str;

    /// Start connecting to `url` in the background, retrying until closed.
    ///
    /// Returns once the request is validated; establishment is reported
    /// through [`ConnectionHandler::on_connect`].
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidRequest`] for a malformed URL or header.
    fn dial(&self, url: &str, headers: HeaderMap) -> Result<(), TransportError>;

    /// Queue a frame on the live connection.
    ///
    /// # Errors
    ///
    /// [`TransportError::NotConnected`] when the link is down and
    /// [`TransportError::Closed`] after [`close`](Self::close).
    fn send(&self, frame: Frame) -> Result<(), TransportError>;

    /// Whether the link is currently up.
    fn is_connected(&self) -> bool;

    /// Stop the connection and any pending reconnect.
    fn close(&self);
}
