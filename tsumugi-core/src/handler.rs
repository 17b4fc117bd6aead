//! # Action Layer (Handler)
//!
//! A Handler is the action a plugin performs for an event. It is either gated
//! by a [`Filter`] registered under the same key, or it runs unconditionally
//! for every event when the plugin supplies no filter for its key.
//!
//! Handlers borrow the event for the duration of the call only. To keep data
//! past the call, copy it out of the event.
//!
//! # Usage Patterns
//!
//! 1. **Struct implementation**: `impl Handler<Event> for WelcomeUser`
//! 2. **Closure**: `|event: &Event| { let id = event.group_id; async move { ... } }`
//!
//! [`Filter`]: crate::Filter

use crate::{error::BoxError, message::Message, outcome::IntoOutcome};
use std::{future::Future, pin::Pin};

/// Boxed future returned by [`DynHandler::call_dyn`].
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>;

/// An action invoked with an inbound event.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle events of type `{E}`",
    label = "missing `Handler<{E}>` implementation",
    note = "Handlers must implement the `call` method for the event type `{E}`."
)]
pub trait Handler<E: Message>: Send + Sync + 'static {
    /// The output of the handler, usually `()` or `Result<(), _>`.
    type Output: IntoOutcome;

    /// Executes the handler logic.
    fn call(&self, event: &E) -> impl Future<Output = Self::Output> + Send;
}

// Closures cannot return a future borrowing the event, so the blanket impl
// only covers futures independent of the argument lifetime.
impl<F, E, Out, Fut> Handler<E> for F
where
    E: Message,
    Out: IntoOutcome,
    F: Fn(&E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Out> + Send,
{
    type Output = Out;

    fn call(&self, event: &E) -> impl Future<Output = Self::Output> + Send {
        (self)(event)
    }
}

/// Dynamic object-safe version of [`Handler`].
///
/// Registries store handlers behind this trait.
pub trait DynHandler<E: Message>: Send + Sync + 'static {
    /// Executes the handler (dynamic dispatch version).
    fn call_dyn<'a>(&'a self, event: &'a E) -> HandlerFuture<'a>;
}

impl<E: Message, H: Handler<E>> DynHandler<E> for H {
    fn call_dyn<'a>(&'a self, event: &'a E) -> HandlerFuture<'a> {
        Box::pin(async move { self.call(event).await.into_outcome() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    struct Echo {
        seen: Arc<AtomicUsize>,
    }

    impl Handler<String> for Echo {
        type Output = Result<(), std::io::Error>;

        async fn call(&self, event: &String) -> Self::Output {
            if event.is_empty() {
                return Err(std::io::Error::other("empty"));
            }
            self.seen.fetch_add(event.len(), Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_struct_handler_via_dyn() {
        let seen = Arc::new(AtomicUsize::new(0));
        let handler: Box<dyn DynHandler<String>> = Box::new(Echo { seen: seen.clone() });

        handler.call_dyn(&"hello".to_string()).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 5);

        let err = handler.call_dyn(&String::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "empty");
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let handler = move |event: &String| {
            let len = event.len();
            let counter = counter.clone();
            async move {
                counter.fetch_add(len, Ordering::SeqCst);
            }
        };

        DynHandler::call_dyn(&handler, &"abc".to_string())
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
