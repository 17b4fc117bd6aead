//! Plugin registry and dispatch table builder.
//!
//! The builder collects plugin descriptors in order, then `build()` runs
//! three passes over them:
//!
//! 1. **Load**: every plugin's `load` hook, in order. The first failure is fatal.
//! 2. **Wire**: every plugin is compiled into a [`DispatchEntry`]. A later
//!    plugin with the same name replaces the earlier entry.
//! 3. **Activate**: every plugin's `loaded` hook is spawned on its own task.

use crate::dynamic::entry::{DispatchEntry, UnusedFilter};
use std::{collections::HashMap, sync::Arc};
use tsumugi_core::{DynPlugin, Message, Plugin, RegistryError};

// ============================================================================
// RegistryBuilder - for collecting plugins
// ============================================================================

/// Builder for constructing a [`Registry`].
///
/// # Example
/// ```ignore
/// let registry = RegistryBuilder::new()
///     .register(Welcome::default())
///     .register(Audit::new(log))
///     .build()?;
/// ```
pub struct RegistryBuilder<E: Message> {
    plugins: Vec<Arc<dyn DynPlugin<E>>>,
}

impl<E: Message> RegistryBuilder<E> {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Register a plugin.
    pub fn register<P: Plugin<E>>(mut self, plugin: P) -> Self {
        self.register_mut(plugin);
        self
    }

    /// Register a plugin (mutable version).
    pub fn register_mut<P: Plugin<E>>(&mut self, plugin: P) {
        self.plugins.push(Arc::new(plugin));
    }

    /// Register an already type-erased plugin.
    pub fn register_dyn(mut self, plugin: Arc<dyn DynPlugin<E>>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Get the number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if the builder has no plugins.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Load, wire and activate every registered plugin.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Load`] for the first plugin whose load hook
    /// fails. No plugin is wired or activated in that case.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since `loaded` hooks are
    /// spawned as tasks.
    pub fn build(self) -> Result<Registry<E>, RegistryError> {
        for plugin in &self.plugins {
            plugin
                .load_dyn()
                .map_err(|source| RegistryError::Load {
                    plugin: plugin.name_dyn().to_string(),
                    source,
                })?;
            tracing::debug!(plugin = %plugin.name_dyn(), "plugin loaded");
        }

        let mut entries: Vec<DispatchEntry<E>> = Vec::with_capacity(self.plugins.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut unused = Vec::new();

        for plugin in &self.plugins {
            let name = plugin.name_dyn().to_string();
            let entry = DispatchEntry::compile(
                name.clone(),
                plugin.filters_dyn(),
                plugin.handlers_dyn(),
                &mut unused,
            );
            match index.get(&name) {
                Some(&slot) => {
                    tracing::warn!(plugin = %name, "duplicate plugin name, replacing earlier entry");
                    entries[slot] = entry;
                }
                None => {
                    index.insert(name, entries.len());
                    entries.push(entry);
                }
            }
        }

        for plugin in &self.plugins {
            let plugin = Arc::clone(plugin);
            tokio::spawn(async move {
                plugin.loaded_dyn().await;
            });
        }

        tracing::info!(plugins = entries.len(), "plugin registry built");

        Ok(Registry {
            entries,
            index,
            unused,
        })
    }
}

impl<E: Message> Default for RegistryBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Registry - immutable dispatch table
// ============================================================================

/// An immutable table of compiled dispatch entries, one per plugin name.
///
/// Built once by [`RegistryBuilder::build`] and shared read-only afterwards,
/// so routing needs no lock.
pub struct Registry<E: Message> {
    entries: Vec<DispatchEntry<E>>,
    index: HashMap<String, usize>,
    unused: Vec<UnusedFilter>,
}

impl<E: Message> Registry<E> {
    /// Iterate over all entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DispatchEntry<E>> {
        self.entries.iter()
    }

    /// Look up the entry registered under `name`.
    pub fn get(&self, name: &str) -> Option<&DispatchEntry<E>> {
        self.index.get(name).map(|&slot| &self.entries[slot])
    }

    /// Plugin names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name())
    }

    /// Filters that were skipped because no handler shared their key.
    pub fn unused_filters(&self) -> &[UnusedFilter] {
        &self.unused
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
