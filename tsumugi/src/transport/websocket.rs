//! Websocket transport over `tokio-tungstenite`.

use super::{Connection, DynConnectionHandler, Frame, HeaderMap, TransportError};
use crate::config::ReconnectPolicy;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, client::IntoClientRequest, handshake::client::Request},
};
use tokio_util::sync::CancellationToken;

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A websocket connection that redials with exponential backoff.
///
/// Outbound frames go through an unbounded queue drained by the
/// connection task, so [`send`](Connection::send) never blocks.
pub struct WsConnection {
    name: String,
    handler: Arc<dyn DynConnectionHandler>,
    policy: ReconnectPolicy,
    link: Arc<Link>,
    outbound: Mutex<Option<mpsc::UnboundedSender<Frame>>>,
    session: Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
}

impl Connection for WsConnection {
    fn open(
        name: impl Into<String>,
        handler: Arc<dyn DynConnectionHandler>,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            handler,
            policy,
            link: Arc::new(Link::default()),
            outbound: Mutex::new(None),
            session: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dial(&self, url: &str, headers: HeaderMap) -> Result<(), TransportError> {
        if self.shutdown.is_cancelled() {
            return Err(TransportError::Closed);
        }
        build_request(url, &headers)?;

        // rustls needs a process-wide crypto provider before the first `wss` handshake.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = self.shutdown.child_token();
        if let Some(previous) = self.session.lock().replace(cancel.clone()) {
            previous.cancel();
        }
        *self.outbound.lock() = Some(tx);

        let session = Session {
            name: self.name.clone(),
            url: url.to_string(),
            headers,
            handler: Arc::clone(&self.handler),
            policy: self.policy.clone(),
            link: Arc::clone(&self.link),
            generation: self.link.claim(),
            cancel,
        };
        tokio::spawn(session.run(rx));
        Ok(())
    }

    fn send(&self, frame: Frame) -> Result<(), TransportError> {
        if self.shutdown.is_cancelled() {
            return Err(TransportError::Closed);
        }
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        match self.outbound.lock().as_ref() {
            Some(tx) => tx.send(frame).map_err(|_| TransportError::Closed),
            None => Err(TransportError::NotConnected),
        }
    }

    fn is_connected(&self) -> bool {
        self.link.is_up()
    }

    fn close(&self) {
        self.shutdown.cancel();
        self.outbound.lock().take();
        self.link.release();
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn build_request(url: &str, headers: &HeaderMap) -> Result<Request, TransportError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
    for (key, value) in headers {
        request.headers_mut().insert(key.clone(), value.clone());
    }
    Ok(request)
}

/// Which dial owns the connection, and whether its link is up.
///
/// Every dial claims a new generation; a session only flips the state
/// while its generation is current, so a replaced session winding down
/// cannot mark its successor's link as down.
#[derive(Debug, Default)]
struct Link {
    state: Mutex<LinkState>,
}

#[derive(Debug, Default)]
struct LinkState {
    generation: u64,
    up: bool,
}

impl Link {
    fn claim(&self) -> u64 {
        let mut state = self.state.lock();
        state.generation += 1;
        state.up = false;
        state.generation
    }

    /// Returns `false` if a later dial has taken over.
    fn set_up(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        state.up = true;
        true
    }

    fn set_down(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.generation == generation {
            state.up = false;
        }
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.up = false;
    }

    fn is_up(&self) -> bool {
        self.state.lock().up
    }
}

/// How one established link ended.
enum Exit {
    /// We were asked to stop.
    Cancelled,
    /// The peer went away.
    Remote,
}

struct Session {
    name: String,
    url: String,
    headers: HeaderMap,
    handler: Arc<dyn DynConnectionHandler>,
    policy: ReconnectPolicy,
    link: Arc<Link>,
    generation: u64,
    cancel: CancellationToken,
}

impl Session {
    async fn run(self, mut outbound: mpsc::UnboundedReceiver<Frame>) {
        let mut backoff = self.policy.initial_backoff();

        loop {
            let attempt = async {
                let request = build_request(&self.url, &self.headers)?;
                let (stream, _) = connect_async(request).await?;
                Ok::<_, TransportError>(stream)
            };
            let attempt = tokio::select! {
                _ = self.cancel.cancelled() => return,
                attempt = attempt => attempt,
            };

            match attempt {
                Ok(stream) => {
                    if !self.link.set_up(self.generation) {
                        tracing::debug!(connection = %self.name, "session superseded");
                        return;
                    }
                    tracing::info!(connection = %self.name, url = %self.url, "connected");
                    backoff = self.policy.initial_backoff();
                    self.handler.on_connect_dyn(&self.name);

                    let result = self.pump(stream, &mut outbound).await;
                    self.link.set_down(self.generation);

                    match result {
                        Ok(Exit::Cancelled) => return,
                        Ok(Exit::Remote) => {
                            tracing::warn!(connection = %self.name, "connection closed by peer");
                        }
                        Err(e) => self.handler.on_error_dyn(&self.name, &e),
                    }
                }
                Err(e) => {
                    tracing::debug!(connection = %self.name, error = %e, "connect failed");
                    self.handler.on_error_dyn(&self.name, &e);
                }
            }

            let delay_ms = backoff.as_millis() as u64;
            tracing::info!(connection = %self.name, delay_ms, "reconnecting");
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = self.policy.next_backoff(backoff);
        }
    }

    async fn pump(
        &self,
        stream: Stream,
        outbound: &mut mpsc::UnboundedReceiver<Frame>,
    ) -> Result<Exit, TransportError> {
        let (mut sink, mut reader) = stream.split();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(Exit::Cancelled);
                }
                frame = outbound.recv() => match frame {
                    Some(Frame::Text(text)) => sink.send(Message::Text(text.into())).await?,
                    Some(Frame::Binary(data)) => sink.send(Message::Binary(data.into())).await?,
                    None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return Ok(Exit::Cancelled);
                    }
                },
                msg = reader.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        self.handler.on_message_dyn(text.as_bytes()).await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        self.handler.on_message_dyn(&data).await;
                    }
                    Some(Ok(Message::Ping(data))) => sink.send(Message::Pong(data)).await?,
                    Some(Ok(Message::Close(_))) | None => return Ok(Exit::Remote),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                },
            }
        }
    }
}
