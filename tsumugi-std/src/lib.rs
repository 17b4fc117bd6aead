//! # tsumugi-std
//!
//! Standard engine for the Tsumugi gateway bridge.
//!
//! This crate provides:
//! - **Dispatch table building**: [`RegistryBuilder`], [`Registry`], [`DispatchEntry`]
//! - **Event routing**: [`EventRouter`] with per-plugin panic isolation
//! - **Closure plugins**: [`PluginBuilder`]
//! - **Testing helpers**: [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use tsumugi_core;

pub mod dynamic;
pub mod plugins;
pub mod testing;

pub use dynamic::{
    DispatchEntry, EntryOutcome, EventRouter, PluginFailure, Registry, RegistryBuilder,
    Route, RouteReport, UnusedFilter,
};
pub use plugins::PluginBuilder;
