//! Event router.
//!
//! Runs every inbound event through every plugin's dispatch entry. Each
//! plugin's pass is isolated: a panic inside one plugin abandons that
//! plugin's remaining routes for the current event and nothing else.

use crate::dynamic::{
    entry::{DispatchEntry, EntryOutcome},
    registry::Registry,
};
use futures::FutureExt;
use std::{panic::AssertUnwindSafe, sync::Arc};
use tokio::sync::Mutex;
use tracing::Instrument;
use tsumugi_core::{DispatchError, Message};

/// A failure inside one plugin while routing one event.
#[derive(Debug)]
pub struct PluginFailure {
    /// Plugin that failed.
    pub plugin: String,
    /// What went wrong.
    pub error: DispatchError,
}

/// The result of routing one event.
#[derive(Debug, Default)]
pub struct RouteReport {
    /// Plugins the event was delivered to.
    pub plugins: usize,
    /// Handlers invoked across all plugins.
    pub invoked: usize,
    /// Handler errors and panics, per plugin.
    pub failures: Vec<PluginFailure>,
}

impl RouteReport {
    /// Whether every invoked handler succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Routes events through a built [`Registry`].
///
/// Dispatch passes are serialized: a second event waits until every plugin
/// has finished with the first, so plugins never observe interleaved events.
pub struct EventRouter<E: Message> {
    registry: Arc<Registry<E>>,
    gate: Mutex<()>,
}

impl<E: Message> EventRouter<E> {
    /// Create a router over a built registry.
    pub fn new(registry: Arc<Registry<E>>) -> Self {
        Self {
            registry,
            gate: Mutex::new(()),
        }
    }

    /// The registry this router dispatches through.
    pub fn registry(&self) -> &Registry<E> {
        &self.registry
    }

    /// Deliver `event` to every plugin exactly once.
    ///
    /// For each plugin the unconditional handlers run first, then each
    /// conditional handler whose filter matches.
    pub async fn route(&self, event: &E) -> RouteReport {
        let _pass = self.gate.lock().await;
        let mut report = RouteReport::default();

        for entry in self.registry.iter() {
            let span = tracing::debug_span!("dispatch", plugin = %entry.name());
            let outcome = dispatch_isolated(entry, event).instrument(span).await;

            report.plugins += 1;
            report.invoked += outcome.invoked;
            for error in outcome.failures {
                tracing::error!(plugin = %entry.name(), error = %error, "plugin failed while handling event");
                report.failures.push(PluginFailure {
                    plugin: entry.name().to_string(),
                    error,
                });
            }
        }

        report
    }
}

async fn dispatch_isolated<E: Message>(entry: &DispatchEntry<E>, event: &E) -> EntryOutcome {
    let mut outcome = EntryOutcome::default();
    let pass = AssertUnwindSafe(entry.dispatch(event, &mut outcome))
        .catch_unwind()
        .await;
    if let Err(payload) = pass {
        outcome
            .failures
            .push(DispatchError::from_panic(payload.as_ref()));
    }
    outcome
}
