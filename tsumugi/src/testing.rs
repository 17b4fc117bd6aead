//! Test doubles for code built on the gateway client.
//!
//! - [`MockConnection`]: An in-memory [`Connection`] whose link state and
//!   inbound traffic are driven by the test
//! - [`MemoryLogSink`]: A [`LogSink`] that keeps every entry
//!
//! The handler recorders from `tsumugi_std::testing` are re-exported here.

use crate::{
    config::ReconnectPolicy,
    log::{LogKind, LogSink},
    transport::{Connection, DynConnectionHandler, Frame, HeaderMap, TransportError},
};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

pub use tsumugi_std::testing::{
    CountingHandler, FailingHandler, PanickingHandler, RecordingHandler,
};

// ============================================================================
// MockConnection
// ============================================================================

/// A connection that never touches the network.
///
/// [`dial`](Connection::dial) records the request and marks the link up;
/// sent frames are kept for inspection; [`deliver`](Self::deliver) feeds a
/// frame to the handler as if the peer had sent it.
pub struct MockConnection {
    name: String,
    handler: Arc<dyn DynConnectionHandler>,
    connected: AtomicBool,
    closed: AtomicBool,
    sent: Mutex<Vec<Frame>>,
    dials: Mutex<Vec<(String, HeaderMap)>>,
}

impl MockConnection {
    /// Force the link state without dialing.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        if connected {
            self.handler.on_connect_dyn(&self.name);
        }
    }

    /// Frames sent so far.
    pub fn sent(&self) -> Vec<Frame> {
        self.sent.lock().clone()
    }

    /// Sent text frames parsed as JSON.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .iter()
            .filter_map(|frame| serde_json::from_slice(frame.as_bytes()).ok())
            .collect()
    }

    /// Every `(url, headers)` passed to `dial`.
    pub fn dials(&self) -> Vec<(String, HeaderMap)> {
        self.dials.lock().clone()
    }

    /// Whether `close` was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Hand `payload` to the handler as an inbound frame.
    pub async fn deliver(&self, payload: impl AsRef<[u8]>) {
        self.handler.on_message_dyn(payload.as_ref()).await;
    }

    /// Report `error` to the handler.
    pub fn fail(&self, error: TransportError) {
        self.connected.store(false, Ordering::SeqCst);
        self.handler.on_error_dyn(&self.name, &error);
    }
}

impl Connection for MockConnection {
    fn open(
        name: impl Into<String>,
        handler: Arc<dyn DynConnectionHandler>,
        _policy: ReconnectPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            handler,
            connected: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            dials: Mutex::new(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dial(&self, url: &str, headers: HeaderMap) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.dials.lock().push((url.to_string(), headers));
        self.set_connected(true);
        Ok(())
    }

    fn send(&self, frame: Frame) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        self.sent.lock().push(frame);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// MemoryLogSink
// ============================================================================

/// A log sink that records every entry in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<(LogKind, String)>>,
}

impl MemoryLogSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in arrival order.
    pub fn entries(&self) -> Vec<(LogKind, String)> {
        self.entries.lock().clone()
    }

    /// Texts of the entries of the given kind.
    pub fn texts(&self, kind: LogKind) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Number of entries of the given kind.
    pub fn count(&self, kind: LogKind) -> usize {
        self.entries.lock().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl LogSink for MemoryLogSink {
    fn add_log(&self, kind: LogKind, text: &str) {
        self.entries.lock().push((kind, text.to_string()));
    }
}
