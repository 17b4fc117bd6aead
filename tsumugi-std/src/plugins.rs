//! Closure-based plugins.

use futures::future::BoxFuture;
use std::{future::Future, sync::Arc};
use tsumugi_core::{BoxError, Filter, Filters, Handler, Handlers, Message, Plugin};

type LoadHook = Box<dyn Fn() -> Result<(), BoxError> + Send + Sync>;
type LoadedHook = Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// A plugin assembled from closures instead of a dedicated type.
///
/// # Example
///
/// ```rust,ignore
/// let welcome = PluginBuilder::new("welcome")
///     .filter("join", |e: &Event| e.is_notice("group_increase"))
///     .handler("join", WelcomeUser::new(client.clone()))
///     .handler("log", |e: &Event| { tracing::debug!(?e); async {} });
/// ```
pub struct PluginBuilder<E: Message> {
    name: String,
    filters: Filters<E>,
    handlers: Handlers<E>,
    on_load: Option<LoadHook>,
    on_loaded: Option<LoadedHook>,
}

impl<E: Message> PluginBuilder<E> {
    /// Start a plugin with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Filters::new(),
            handlers: Handlers::new(),
            on_load: None,
            on_loaded: None,
        }
    }

    /// Add a filter under `key`.
    pub fn filter<F: Filter<E>>(mut self, key: impl Into<String>, filter: F) -> Self {
        self.filters.insert(key, Arc::new(filter));
        self
    }

    /// Add a handler under `key`.
    pub fn handler<H: Handler<E>>(mut self, key: impl Into<String>, handler: H) -> Self {
        self.handlers.insert(key, Arc::new(handler));
        self
    }

    /// Set the load hook.
    pub fn on_load<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_load = Some(Box::new(hook));
        self
    }

    /// Set the loaded hook.
    pub fn on_loaded<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_loaded = Some(Box::new(move || Box::pin(hook())));
        self
    }
}

impl<E: Message> Plugin<E> for PluginBuilder<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<(), BoxError> {
        match &self.on_load {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }

    fn filters(&self) -> Filters<E> {
        self.filters.clone()
    }

    fn handlers(&self) -> Handlers<E> {
        self.handlers.clone()
    }

    async fn loaded(&self) {
        if let Some(hook) = &self.on_loaded {
            hook().await;
        }
    }
}
