//! # Plugin Layer
//!
//! A plugin is an independently authored unit that supplies, under its own key
//! namespace, a table of [`Filter`]s and a table of [`Handler`]s.
//!
//! - A handler whose key has a filter runs only when that filter matches.
//! - A handler whose key has no filter runs for every event.
//! - A filter whose key has no handler is dead; the registry warns about it.
//!
//! Tables preserve insertion order, so the order a plugin declares its
//! handlers in is the order they run in.

use crate::{
    error::BoxError,
    filter::Filter,
    handler::{DynHandler, Handler},
    message::Message,
};
use std::{future::Future, pin::Pin, sync::Arc};

/// An insertion-ordered table keyed by string.
///
/// Inserting an existing key replaces its value in place.
pub struct KeyedTable<V> {
    entries: Vec<(String, V)>,
}

/// A plugin's filter table.
pub type Filters<E> = KeyedTable<Arc<dyn Filter<E>>>;

/// A plugin's handler table.
pub type Handlers<E> = KeyedTable<Arc<dyn DynHandler<E>>>;

impl<V> KeyedTable<V> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a value, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for KeyedTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for KeyedTable<V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<V> IntoIterator for KeyedTable<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<E: Message> KeyedTable<Arc<dyn Filter<E>>> {
    /// Add a filter under `key`.
    pub fn filter<F: Filter<E>>(mut self, key: impl Into<String>, filter: F) -> Self {
        self.insert(key, Arc::new(filter));
        self
    }
}

impl<E: Message> KeyedTable<Arc<dyn DynHandler<E>>> {
    /// Add a handler under `key`.
    pub fn handler<H: Handler<E>>(mut self, key: impl Into<String>, handler: H) -> Self {
        self.insert(key, Arc::new(handler));
        self
    }
}

/// A plugin descriptor.
///
/// The registry calls [`load`](Plugin::load) once during startup, reads the
/// filter and handler tables once, and after every plugin is wired calls
/// [`loaded`](Plugin::loaded) on a task of its own.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Plugin` for `{E}`",
    label = "missing `Plugin` implementation",
    note = "Plugins must at least implement `name` for the event type `{E}`."
)]
pub trait Plugin<E: Message>: Send + Sync + 'static {
    /// Unique plugin name. A later plugin with the same name supersedes an earlier one.
    fn name(&self) -> &str;

    /// Called once before wiring. An error aborts startup.
    fn load(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Filters keyed by handler key.
    fn filters(&self) -> Filters<E> {
        Filters::new()
    }

    /// Handlers keyed by filter key.
    fn handlers(&self) -> Handlers<E> {
        Handlers::new()
    }

    /// Called once after every plugin is wired. Failures are the plugin's own business.
    fn loaded(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Dynamic object-safe version of [`Plugin`].
///
/// Registries hold plugins as `Arc<dyn DynPlugin<E>>`.
pub trait DynPlugin<E: Message>: Send + Sync + 'static {
    /// See [`Plugin::name`].
    fn name_dyn(&self) -> &str;

    /// See [`Plugin::load`].
    fn load_dyn(&self) -> Result<(), BoxError>;

    /// See [`Plugin::filters`].
    fn filters_dyn(&self) -> Filters<E>;

    /// See [`Plugin::handlers`].
    fn handlers_dyn(&self) -> Handlers<E>;

    /// See [`Plugin::loaded`].
    fn loaded_dyn<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

impl<E: Message, P: Plugin<E>> DynPlugin<E> for P {
    fn name_dyn(&self) -> &str {
        <P as Plugin<E>>::name(self)
    }

    fn load_dyn(&self) -> Result<(), BoxError> {
        <P as Plugin<E>>::load(self)
    }

    fn filters_dyn(&self) -> Filters<E> {
        <P as Plugin<E>>::filters(self)
    }

    fn handlers_dyn(&self) -> Handlers<E> {
        <P as Plugin<E>>::handlers(self)
    }

    fn loaded_dyn<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(<P as Plugin<E>>::loaded(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeter;

    impl Plugin<String> for Greeter {
        fn name(&self) -> &str {
            "greeter"
        }

        fn filters(&self) -> Filters<String> {
            Filters::new().filter("hello", |e: &String| e.starts_with("hello"))
        }

        fn handlers(&self) -> Handlers<String> {
            Handlers::new()
                .handler("hello", |_: &String| async {})
                .handler("audit", |_: &String| async {})
        }
    }

    #[test]
    fn test_table_replaces_in_place() {
        let mut table = KeyedTable::new();
        table.insert("a", 1);
        table.insert("b", 2);
        table.insert("a", 3);
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(table.get("a"), Some(&3));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_plugin_through_dyn() {
        let plugin: Box<dyn DynPlugin<String>> = Box::new(Greeter);
        assert_eq!(plugin.name_dyn(), "greeter");
        assert!(plugin.load_dyn().is_ok());
        assert!(plugin.filters_dyn().contains_key("hello"));
        assert_eq!(
            plugin.handlers_dyn().keys().collect::<Vec<_>>(),
            vec!["hello", "audit"]
        );
    }
}
