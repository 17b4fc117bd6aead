//! # Gate Layer (Filter)
//!
//! A Filter is a synchronous predicate over an event. Paired with a handler
//! under the same key, it decides whether that handler runs for a given event.
//!
//! Filters must be cheap and side-effect free: the router evaluates every
//! filter of every plugin for every inbound event.

use crate::message::Message;

/// A predicate that gates a paired handler.
///
/// Closures of the form `Fn(&E) -> bool` implement this trait automatically.
///
/// # Example
///
/// ```rust,ignore
/// let is_join = |event: &Event| event.is_notice("group_increase");
/// let only_big_groups = is_join.and(|event: &Event| event.group_id > Some(1000));
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Filter` for `{E}`",
    label = "missing `Filter` implementation",
    note = "Filters are `Fn(&{E}) -> bool` closures or types implementing `matches`."
)]
pub trait Filter<E: Message>: Send + Sync + 'static {
    /// Returns `true` when the paired handler should run.
    fn matches(&self, event: &E) -> bool;

    /// Both filters must match.
    fn and<F>(self, other: F) -> And<Self, F>
    where
        Self: Sized,
        F: Filter<E>,
    {
        And {
            first: self,
            second: other,
        }
    }

    /// Either filter may match.
    fn or<F>(self, other: F) -> Or<Self, F>
    where
        Self: Sized,
        F: Filter<E>,
    {
        Or {
            first: self,
            second: other,
        }
    }

    /// Inverts this filter.
    fn not(self) -> Not<Self>
    where
        Self: Sized,
    {
        Not { inner: self }
    }
}

impl<E, F> Filter<E> for F
where
    E: Message,
    F: Fn(&E) -> bool + Send + Sync + 'static,
{
    fn matches(&self, event: &E) -> bool {
        (self)(event)
    }
}

/// Conjunction of two filters. Short-circuits on the first.
pub struct And<A, B> {
    first: A,
    second: B,
}

impl<E: Message, A: Filter<E>, B: Filter<E>> Filter<E> for And<A, B> {
    fn matches(&self, event: &E) -> bool {
        self.first.matches(event) && self.second.matches(event)
    }
}

/// Disjunction of two filters. Short-circuits on the first.
pub struct Or<A, B> {
    first: A,
    second: B,
}

impl<E: Message, A: Filter<E>, B: Filter<E>> Filter<E> for Or<A, B> {
    fn matches(&self, event: &E) -> bool {
        self.first.matches(event) || self.second.matches(event)
    }
}

/// Negation of a filter.
pub struct Not<F> {
    inner: F,
}

impl<E: Message, F: Filter<E>> Filter<E> for Not<F> {
    fn matches(&self, event: &E) -> bool {
        !self.inner.matches(event)
    }
}

/// A filter that always matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl<E: Message> Filter<E> for Always {
    fn matches(&self, _event: &E) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts_with_bang(event: &String) -> bool {
        event.starts_with('!')
    }

    fn is_long(event: &String) -> bool {
        event.len() > 5
    }

    #[test]
    fn test_closure_filter() {
        let filter = |event: &String| event == "ping";
        assert!(filter.matches(&"ping".to_string()));
        assert!(!filter.matches(&"pong".to_string()));
    }

    #[test]
    fn test_combinators() {
        let both = starts_with_bang.and(is_long);
        assert!(both.matches(&"!command".to_string()));
        assert!(!both.matches(&"!cmd".to_string()));

        let either = starts_with_bang.or(is_long);
        assert!(either.matches(&"!cmd".to_string()));
        assert!(either.matches(&"plain words".to_string()));
        assert!(!either.matches(&"hi".to_string()));

        let negated = starts_with_bang.not();
        assert!(negated.matches(&"hello".to_string()));
    }

    #[test]
    fn test_always() {
        assert!(Filter::<String>::matches(&Always, &String::new()));
    }
}
