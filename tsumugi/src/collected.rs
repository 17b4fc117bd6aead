//! Link-time plugin collection.
//!
//! Plugins can register themselves from anywhere in the binary:
//!
//! ```rust,ignore
//! tsumugi::inventory::submit! {
//!     CollectedPlugin::new(10, |api| Arc::new(Welcome::new(api.clone())))
//! }
//! ```
//!
//! [`collected_plugins`] then instantiates them in `order`.

use crate::{client::ApiClient, event::Event};
use std::sync::Arc;
use tsumugi_core::DynPlugin;

/// Builds a plugin given the API handle.
pub type PluginFactory = fn(&ApiClient) -> Arc<dyn DynPlugin<Event>>;

/// A plugin registration submitted to `inventory`.
pub struct CollectedPlugin {
    /// Lower values are registered first.
    pub order: i32,
    /// Creates the plugin.
    pub factory: PluginFactory,
}

impl CollectedPlugin {
    /// Create a registration.
    pub const fn new(order: i32, factory: PluginFactory) -> Self {
        Self { order, factory }
    }
}

inventory::collect!(CollectedPlugin);

/// Instantiate every submitted plugin, sorted by `order`.
///
/// Registrations with equal `order` keep the order `inventory` yields them
/// in, which is not specified.
pub fn collected_plugins(api: &ApiClient) -> Vec<Arc<dyn DynPlugin<Event>>> {
    let mut registrations: Vec<&CollectedPlugin> = inventory::iter::<CollectedPlugin>().collect();
    registrations.sort_by_key(|reg| reg.order);
    tracing::debug!(count = registrations.len(), "collected plugins");
    registrations
        .into_iter()
        .map(|reg| (reg.factory)(api))
        .collect()
}
