//! # tsumugi-core
//!
//! Core traits for the Tsumugi chat-bot gateway bridge.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! plugins that don't need the engine in `tsumugi-std` or the gateway
//! client in `tsumugi`.
//!
//! # Layers
//!
//! ## [`Filter`]
//!
//! A synchronous predicate over an event. Filters gate handlers and compose
//! with `and`, `or` and `not`.
//!
//! ## [`Handler`]
//!
//! The action a plugin performs for an event. Its output converts into an
//! outcome via [`IntoOutcome`]; failures are reported, never propagated to
//! other plugins.
//!
//! ## [`Plugin`]
//!
//! A named bundle of filters and handlers sharing one key namespace, plus
//! `load` and `loaded` lifecycle hooks. The registry compiles each plugin
//! into a dispatch entry once, at startup.
//!
//! # Error Types
//!
//! - [`RegistryError`] - Fatal startup errors
//! - [`DispatchError`] - Per-plugin failures during routing

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod filter;
mod handler;
mod message;
mod outcome;
mod plugin;

// Re-exports
pub use error::{BoxError, DispatchError, RegistryError};
pub use filter::{Always, And, Filter, Not, Or};
pub use handler::{DynHandler, Handler, HandlerFuture};
pub use message::Message;
pub use outcome::IntoOutcome;
pub use plugin::{DynPlugin, Filters, Handlers, KeyedTable, Plugin};
