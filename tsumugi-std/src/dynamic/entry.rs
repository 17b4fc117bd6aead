//! Compiled per-plugin dispatch entries.

use std::{collections::HashSet, sync::Arc};
use tsumugi_core::{DispatchError, DynHandler, Filter, Filters, Handlers, Message};

/// How one handler key of a plugin is wired.
pub enum Route<E: Message> {
    /// The handler runs only when its filter matches.
    Conditional {
        /// Gate evaluated for every event.
        filter: Arc<dyn Filter<E>>,
        /// Action run when the gate matches.
        handler: Arc<dyn DynHandler<E>>,
    },
    /// The handler had no filter under its key and runs for every event.
    Unconditional(Arc<dyn DynHandler<E>>),
}

impl<E: Message> Route<E> {
    /// Whether this route is gated by a filter.
    pub fn is_conditional(&self) -> bool {
        matches!(self, Route::Conditional { .. })
    }
}

/// A filter key with no matching handler.
///
/// Reported at build time as a hint to the plugin author; never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedFilter {
    /// Plugin that declared the filter.
    pub plugin: String,
    /// Key of the dead filter.
    pub key: String,
}

impl std::fmt::Display for UnusedFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "plugin `{}` declares filter `{}` without a matching handler",
            self.plugin, self.key
        )
    }
}

/// What happened while one plugin handled one event.
#[derive(Debug, Default)]
pub struct EntryOutcome {
    /// Handlers that were invoked.
    pub invoked: usize,
    /// Handler errors and panics, in the order they happened.
    pub failures: Vec<DispatchError>,
}

/// The compiled dispatch structure of one plugin.
///
/// Unconditional routes come first, in handler-table order, followed by
/// conditional routes in filter-table order. Immutable once built.
pub struct DispatchEntry<E: Message> {
    name: String,
    routes: Vec<(String, Route<E>)>,
}

impl<E: Message> DispatchEntry<E> {
    /// Wire a plugin's filter and handler tables.
    ///
    /// Filters without a handler are skipped and appended to `unused`.
    pub fn compile(
        name: impl Into<String>,
        filters: Filters<E>,
        handlers: Handlers<E>,
        unused: &mut Vec<UnusedFilter>,
    ) -> Self {
        let name = name.into();
        let mut claimed = HashSet::new();
        let mut conditional = Vec::new();

        for (key, filter) in filters {
            let Some(handler) = handlers.get(&key) else {
                tracing::warn!(plugin = %name, key = %key, "filter has no matching handler, skipping");
                unused.push(UnusedFilter {
                    plugin: name.clone(),
                    key,
                });
                continue;
            };
            claimed.insert(key.clone());
            conditional.push((
                key,
                Route::Conditional {
                    filter,
                    handler: Arc::clone(handler),
                },
            ));
        }

        let mut routes: Vec<(String, Route<E>)> = handlers
            .into_iter()
            .filter(|(key, _)| !claimed.contains(key))
            .map(|(key, handler)| (key, Route::Unconditional(handler)))
            .collect();
        routes.extend(conditional);

        Self { name, routes }
    }

    /// The plugin name this entry is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All routes in dispatch order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &Route<E>)> {
        self.routes.iter().map(|(k, r)| (k.as_str(), r))
    }

    /// Keys of handlers that run for every event.
    pub fn unconditional_keys(&self) -> impl Iterator<Item = &str> {
        self.routes()
            .filter(|(_, r)| !r.is_conditional())
            .map(|(k, _)| k)
    }

    /// Keys of filter-gated handlers.
    pub fn conditional_keys(&self) -> impl Iterator<Item = &str> {
        self.routes()
            .filter(|(_, r)| r.is_conditional())
            .map(|(k, _)| k)
    }

    /// Run every unconditional handler, in order.
    pub async fn dispatch_unconditional(&self, event: &E, outcome: &mut EntryOutcome) {
        for (key, route) in &self.routes {
            if let Route::Unconditional(handler) = route {
                invoke(key, handler.as_ref(), event, outcome).await;
            }
        }
    }

    /// Run every conditional handler whose filter matches, in order.
    pub async fn dispatch_conditional(&self, event: &E, outcome: &mut EntryOutcome) {
        for (key, route) in &self.routes {
            if let Route::Conditional { filter, handler } = route
                && filter.matches(event)
            {
                invoke(key, handler.as_ref(), event, outcome).await;
            }
        }
    }

    /// Run the unconditional handlers, then the matching conditional ones.
    ///
    /// A handler error is recorded and the remaining routes still run.
    pub async fn dispatch(&self, event: &E, outcome: &mut EntryOutcome) {
        self.dispatch_unconditional(event, outcome).await;
        self.dispatch_conditional(event, outcome).await;
    }
}

async fn invoke<E: Message>(
    key: &str,
    handler: &dyn DynHandler<E>,
    event: &E,
    outcome: &mut EntryOutcome,
) {
    outcome.invoked += 1;
    if let Err(source) = handler.call_dyn(event).await {
        outcome.failures.push(DispatchError::Handler {
            key: key.to_string(),
            source,
        });
    }
}
