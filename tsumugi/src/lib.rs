//! # tsumugi - chat-bot gateway bridge
//!
//! `tsumugi` connects a chat-bot gateway to a set of in-process plugins.
//! The gateway pushes events over one websocket and accepts actions over
//! another; plugins declare filters and handlers and are routed every event.
//!
//! ## Layers
//!
//! - [`tsumugi_core`]: plugin, filter and handler traits
//! - [`tsumugi_std`]: the registry, dispatch entries and event router
//! - this crate: the gateway [`Event`], outbound [`Action`]s, the
//!   [`PendingRequests`] tracker, the websocket transport and the
//!   [`GatewayClient`] tying them together
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use tsumugi::prelude::*;
//!
//! let builder = GatewayClient::builder(GatewayConfig::default(), Arc::new(TracingLogSink::new()));
//! let api = builder.api();
//!
//! let welcome = PluginBuilder::new("welcome")
//!     .filter("join", |e: &Event| e.is_notice("group_increase"))
//!     .handler("join", move |e: &Event| {
//!         let api = api.clone();
//!         let group = e.group_id.unwrap_or_default();
//!         async move { api.send_group_message(group, "welcome!").map(|_| ()) }
//!     });
//!
//! let client: GatewayClient = builder.register(welcome).initialize()?;
//! client.connect("ws://127.0.0.1:6700", "secret")?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod action;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod log;
pub mod pending;
pub mod testing;
pub mod transport;

#[cfg(feature = "inventory")]
pub mod collected;

pub use tsumugi_core;
pub use tsumugi_std;

pub use action::{Action, ActionFrame, ActionResponse, Echo};
pub use client::{ApiClient, ClientBuilder, GatewayClient};
pub use config::{GatewayConfig, ReconnectPolicy};
pub use error::GatewayError;
pub use event::Event;
pub use log::{LogKind, LogSink, TracingLogSink};
pub use pending::{EchoSequence, PendingRequests};
pub use transport::{
    Connection, ConnectionHandler, DynConnectionHandler, Frame, TransportError, WsConnection,
};

pub use tsumugi_core::{
    BoxError, DispatchError, DynHandler, DynPlugin, Filter, Filters, Handler, Handlers,
    IntoOutcome, Message, Plugin, RegistryError,
};
pub use tsumugi_std::{
    EventRouter, PluginBuilder, PluginFailure, Registry, RegistryBuilder, RouteReport,
    UnusedFilter,
};

#[cfg(feature = "inventory")]
pub use collected::{CollectedPlugin, PluginFactory, collected_plugins};

#[cfg(feature = "inventory")]
pub use inventory;

/// Prelude module - common imports for tsumugi.
///
/// # Usage
///
/// ```rust,ignore
/// use tsumugi::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Action, ApiClient, BoxError, Event, Filter, Filters, GatewayClient, GatewayConfig,
        GatewayError, Handler, Handlers, LogKind, LogSink, Plugin, PluginBuilder, TracingLogSink,
    };
    pub use std::sync::Arc;
}
