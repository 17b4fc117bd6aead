//! Runtime dispatch tables.
//!
//! Plugins are supplied at startup as an ordered list, compiled once into
//! [`DispatchEntry`] values, and routed through without further locking.

pub mod entry;
pub mod registry;
pub mod router;

pub use entry::{DispatchEntry, EntryOutcome, Route, UnusedFilter};
pub use registry::{Registry, RegistryBuilder};
pub use router::{EventRouter, PluginFailure, RouteReport};
