//! Testing utilities for Tsumugi plugins.
//!
//! - [`RecordingHandler`]: A handler that records every event it receives
//! - [`CountingHandler`]: A handler that counts invocations
//! - [`FailingHandler`]: A handler that always returns an error
//! - [`PanickingHandler`]: A handler that always panics

use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicUsize, Ordering},
};
use tsumugi_core::{BoxError, Handler, Message};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Recording Handler
// ============================================================================

/// A handler that records all events it receives.
///
/// Clones share the same recording.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHandler::<Event>::new();
/// let plugin = PluginBuilder::new("p").handler("all", recorder.clone());
///
/// // ... route events ...
///
/// assert_eq!(recorder.count(), 1);
/// ```
pub struct RecordingHandler<E> {
    events: Arc<Mutex<Vec<E>>>,
}

impl<E: Clone> RecordingHandler<E> {
    /// Create a new recording handler.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a clone of the recorded events.
    pub fn events(&self) -> Vec<E> {
        lock(&self.events).clone()
    }

    /// Get the number of recorded events.
    pub fn count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Clear all recorded events.
    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl<E: Clone> Default for RecordingHandler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RecordingHandler<E> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
        }
    }
}

impl<E: Message + Clone> Handler<E> for RecordingHandler<E> {
    type Output = ();

    async fn call(&self, event: &E) {
        lock(&self.events).push(event.clone());
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that counts invocations.
#[derive(Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a new counting handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl<E: Message> Handler<E> for CountingHandler {
    type Output = ();

    async fn call(&self, _event: &E) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Failing Handlers
// ============================================================================

/// A handler that always fails with the given message.
#[derive(Clone)]
pub struct FailingHandler {
    message: String,
}

impl FailingHandler {
    /// Create a handler failing with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl<E: Message> Handler<E> for FailingHandler {
    type Output = Result<(), BoxError>;

    async fn call(&self, _event: &E) -> Self::Output {
        Err(self.message.clone().into())
    }
}

/// A handler that always panics with the given message.
#[derive(Clone)]
pub struct PanickingHandler {
    message: String,
}

impl PanickingHandler {
    /// Create a handler panicking with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl<E: Message> Handler<E> for PanickingHandler {
    type Output = ();

    async fn call(&self, _event: &E) {
        panic!("{}", self.message);
    }
}
