//! Gateway client.
//!
//! The client owns two connections to the gateway: the API connection,
//! which carries outbound actions and their acknowledgements, and the event
//! connection, whose frames are decoded and routed through the plugins.
//!
//! Construction happens in two steps so plugins can capture an [`ApiClient`]
//! before the registry is built:
//!
//! ```rust,ignore
//! let builder = GatewayClient::builder(GatewayConfig::default(), Arc::new(TracingLogSink::new()));
//! let api = builder.api();
//! let client: GatewayClient = builder
//!     .register(Welcome::new(api.clone()))
//!     .initialize()?;
//! client.connect("ws://127.0.0.1:6700", &token)?;
//! ```

use crate::{
    action::{Action, ActionResponse, Echo},
    config::GatewayConfig,
    error::GatewayError,
    event::Event,
    log::{LogKind, LogSink},
    pending::{EchoSequence, PendingRequests},
    transport::{Connection, ConnectionHandler, Frame, HeaderMap, TransportError, WsConnection},
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header::AUTHORIZATION};
use tokio_util::sync::CancellationToken;
use tsumugi_core::{DynPlugin, Plugin};
use tsumugi_std::{EventRouter, Registry, RegistryBuilder};
use url::Url;

// ============================================================================
// ApiClient - outbound actions
// ============================================================================

/// Cloneable handle for sending actions over the API connection.
pub struct ApiClient<C: Connection = WsConnection> {
    inner: Arc<ApiInner<C>>,
}

struct ApiInner<C> {
    connection: C,
    pending: Arc<PendingRequests>,
    echo: EchoSequence,
}

impl<C: Connection> Clone for ApiClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connection> ApiClient<C> {
    /// Whether the API connection is up.
    pub fn is_available(&self) -> bool {
        self.inner.connection.is_connected()
    }

    /// Post `message` to a group.
    ///
    /// See [`send_action`](Self::send_action).
    pub fn send_group_message(
        &self,
        group_id: i64,
        message: impl Into<String>,
    ) -> Result<Option<Echo>, GatewayError> {
        self.send_action(&Action::group_message(group_id, message))
    }

    /// Send `message` directly to a user.
    ///
    /// See [`send_action`](Self::send_action).
    pub fn send_private_message(
        &self,
        user_id: i64,
        message: impl Into<String>,
    ) -> Result<Option<Echo>, GatewayError> {
        self.send_action(&Action::private_message(user_id, message))
    }

    /// Send an action and track it until acknowledged.
    ///
    /// Returns `Ok(None)` without sending anything when the API connection
    /// is down. Otherwise returns the echo id the acknowledgement will carry.
    ///
    /// # Errors
    ///
    /// Fails if the action cannot be encoded or the transport refuses the
    /// frame; the id is not left tracked in either case.
    pub fn send_action(&self, action: &Action) -> Result<Option<Echo>, GatewayError> {
        if !self.is_available() {
            tracing::debug!(action = action.name(), "api connection unavailable, dropping action");
            return Ok(None);
        }

        let echo = self.inner.echo.next();
        let payload = action.encode(echo)?;

        self.inner.pending.track(echo);
        if let Err(e) = self.inner.connection.send(Frame::Text(payload)) {
            self.inner.pending.resolve(echo);
            return Err(e.into());
        }

        tracing::debug!(action = action.name(), echo, "action sent");
        Ok(Some(echo))
    }

    /// Actions awaiting acknowledgement.
    pub fn pending(&self) -> &PendingRequests {
        &self.inner.pending
    }

    /// The underlying API connection.
    pub fn connection(&self) -> &C {
        &self.inner.connection
    }
}

// ============================================================================
// Connection handlers
// ============================================================================

fn report_connect(log: &dyn LogSink, name: &str) {
    log.add_log(LogKind::Info, &format!("{name} connected"));
}

fn report_error(log: &dyn LogSink, name: &str, error: &TransportError) {
    tracing::warn!(connection = %name, error = %error, "connection error");
    log.add_log(LogKind::Error, &format!("{name}: {error}"));
}

/// Resolves acknowledgements arriving on the API connection.
struct AckHandler {
    pending: Arc<PendingRequests>,
    log: Arc<dyn LogSink>,
}

impl ConnectionHandler for AckHandler {
    fn on_connect(&self, name: &str) {
        report_connect(self.log.as_ref(), name);
    }

    fn on_error(&self, name: &str, error: &TransportError) {
        report_error(self.log.as_ref(), name, error);
    }

    async fn on_message(&self, payload: &[u8]) {
        let response = match ActionResponse::from_slice(payload) {
            Ok(response) => response,
            Err(e) => {
                self.log
                    .add_log(LogKind::Error, &format!("failed to decode acknowledgement: {e}"));
                return;
            }
        };

        let Some(echo) = response.echo else {
            tracing::debug!("acknowledgement without echo");
            return;
        };

        if !self.pending.resolve(echo) {
            tracing::debug!(echo, "acknowledgement for unknown or expired request");
        }

        if response.is_failure() {
            self.log.add_log(
                LogKind::Error,
                &format!(
                    "request {echo} failed (status {}, retcode {})",
                    response.status.as_deref().unwrap_or("unknown"),
                    response.retcode.unwrap_or_default()
                ),
            );
        }
    }
}

/// Decodes and routes frames arriving on the event connection.
struct EventHandler {
    router: Arc<EventRouter<Event>>,
    log: Arc<dyn LogSink>,
}

impl ConnectionHandler for EventHandler {
    fn on_connect(&self, name: &str) {
        report_connect(self.log.as_ref(), name);
    }

    fn on_error(&self, name: &str, error: &TransportError) {
        report_error(self.log.as_ref(), name, error);
    }

    async fn on_message(&self, payload: &[u8]) {
        let event = match Event::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable event");
                self.log
                    .add_log(LogKind::Error, &format!("failed to decode event: {e}"));
                return;
            }
        };

        let report = self.router.route(&event).await;
        for failure in &report.failures {
            self.log.add_log(
                LogKind::Error,
                &format!("plugin {} failed: {}", failure.plugin, failure.error),
            );
        }
    }
}

// ============================================================================
// ClientBuilder
// ============================================================================

/// First construction step of a [`GatewayClient`].
///
/// Owns the API connection from the start so plugins can be handed an
/// [`ApiClient`] before they are registered.
pub struct ClientBuilder<C: Connection = WsConnection> {
    config: GatewayConfig,
    log: Arc<dyn LogSink>,
    api: ApiClient<C>,
    plugins: RegistryBuilder<Event>,
}

impl<C: Connection> ClientBuilder<C> {
    /// Open the (idle) API connection and the pending-request table.
    pub fn new(config: GatewayConfig, log: Arc<dyn LogSink>) -> Self {
        let pending = Arc::new(PendingRequests::new(config.request_timeout()));
        let handler = AckHandler {
            pending: Arc::clone(&pending),
            log: Arc::clone(&log),
        };
        let connection = C::open(
            config.api_name.clone(),
            Arc::new(handler),
            config.reconnect.clone(),
        );

        Self {
            api: ApiClient {
                inner: Arc::new(ApiInner {
                    connection,
                    pending,
                    echo: EchoSequence::new(),
                }),
            },
            config,
            log,
            plugins: RegistryBuilder::new(),
        }
    }

    /// A handle plugins can send actions through.
    pub fn api(&self) -> ApiClient<C> {
        self.api.clone()
    }

    /// Register a plugin.
    pub fn register<P: Plugin<Event>>(mut self, plugin: P) -> Self {
        self.plugins.register_mut(plugin);
        self
    }

    /// Register an already type-erased plugin.
    pub fn register_dyn(mut self, plugin: Arc<dyn DynPlugin<Event>>) -> Self {
        self.plugins = self.plugins.register_dyn(plugin);
        self
    }

    /// Register every plugin in `plugins`, in order.
    pub fn register_all<I>(self, plugins: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn DynPlugin<Event>>>,
    {
        plugins
            .into_iter()
            .fold(self, |builder, plugin| builder.register_dyn(plugin))
    }

    /// Load and wire the plugins, open the event connection and start the
    /// sweeper.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Registry`] if a plugin fails to load; the process
    /// should not continue.
    pub fn initialize(self) -> Result<GatewayClient<C>, GatewayError> {
        let registry = self.plugins.build()?;
        let router = Arc::new(EventRouter::new(Arc::new(registry)));

        let handler = EventHandler {
            router: Arc::clone(&router),
            log: Arc::clone(&self.log),
        };
        let event = C::open(
            self.config.event_name.clone(),
            Arc::new(handler),
            self.config.reconnect.clone(),
        );

        let cancel = CancellationToken::new();
        let sweeper = self.api.inner.pending.spawn_sweeper(
            self.config.sweep_interval(),
            Arc::clone(&self.log),
            cancel.clone(),
        );

        tracing::info!(
            api = %self.config.api_name,
            event = %self.config.event_name,
            plugins = router.registry().len(),
            "gateway client initialized"
        );

        Ok(GatewayClient {
            config: self.config,
            api: self.api,
            event,
            router,
            cancel,
            sweeper: Mutex::new(Some(sweeper)),
        })
    }
}

// ============================================================================
// GatewayClient
// ============================================================================

/// `base` with `segment` appended to its path. Query is kept, fragment dropped.
fn endpoint(base: &Url, segment: &str) -> Result<Url, GatewayError> {
    let mut url = base.clone();
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| GatewayError::UnsupportedScheme(base.scheme().to_string()))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// A bridge between the gateway and the registered plugins.
///
/// Constructed once by the process entry point and passed by reference to
/// whatever needs it.
pub struct GatewayClient<C: Connection = WsConnection> {
    config: GatewayConfig,
    api: ApiClient<C>,
    event: C,
    router: Arc<EventRouter<Event>>,
    cancel: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Connection> GatewayClient<C> {
    /// Start building a client.
    pub fn builder(config: GatewayConfig, log: Arc<dyn LogSink>) -> ClientBuilder<C> {
        ClientBuilder::new(config, log)
    }

    /// Dial `<url>/api` and `<url>/event`, authenticating with `token`.
    ///
    /// The sub-paths are appended to the URL path; any query string, such as
    /// `?access_token=`, is carried over to both.
    ///
    /// Both connections retry in the background; use
    /// [`is_api_available`](Self::is_api_available) and
    /// [`is_event_available`](Self::is_event_available) to observe them.
    ///
    /// # Errors
    ///
    /// Fails when `url` is not a `ws`/`wss` URL or `token` cannot be placed
    /// in a header.
    pub fn connect(&self, url: &str, token: &str) -> Result<(), GatewayError> {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(GatewayError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        let auth = HeaderValue::from_str(&format!("Token {token}"))
            .map_err(|_| GatewayError::InvalidToken)?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let api_url = endpoint(&parsed, "api")?;
        let event_url = endpoint(&parsed, "event")?;
        self.api.connection().dial(api_url.as_str(), headers.clone())?;
        self.event.dial(event_url.as_str(), headers)?;

        tracing::info!(api = %api_url, event = %event_url, "dialing gateway");
        Ok(())
    }

    /// Whether the API connection is up.
    pub fn is_api_available(&self) -> bool {
        self.api.is_available()
    }

    /// Whether the event connection is up.
    pub fn is_event_available(&self) -> bool {
        self.event.is_connected()
    }

    /// See [`ApiClient::send_group_message`].
    pub fn send_group_message(
        &self,
        group_id: i64,
        message: impl Into<String>,
    ) -> Result<Option<Echo>, GatewayError> {
        self.api.send_group_message(group_id, message)
    }

    /// See [`ApiClient::send_private_message`].
    pub fn send_private_message(
        &self,
        user_id: i64,
        message: impl Into<String>,
    ) -> Result<Option<Echo>, GatewayError> {
        self.api.send_private_message(user_id, message)
    }

    /// See [`ApiClient::send_action`].
    pub fn send_action(&self, action: &Action) -> Result<Option<Echo>, GatewayError> {
        self.api.send_action(action)
    }

    /// The API handle.
    pub fn api(&self) -> &ApiClient<C> {
        &self.api
    }

    /// The event connection.
    pub fn event_connection(&self) -> &C {
        &self.event
    }

    /// The router events are dispatched through.
    pub fn router(&self) -> &EventRouter<Event> {
        &self.router
    }

    /// The built plugin registry.
    pub fn registry(&self) -> &Registry<Event> {
        self.router.registry()
    }

    /// The configuration the client was built with.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Stop the sweeper and close both connections.
    ///
    /// Handlers already running are not waited for.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(sweeper) = self.sweeper.lock().take() {
            sweeper.abort();
        }
        self.api.connection().close();
        self.event.close();
        tracing::info!("gateway client shut down");
    }
}

impl<C: Connection> Drop for GatewayClient<C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
