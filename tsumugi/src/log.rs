//! Human-facing log sink.
//!
//! Connection state changes, timeouts and plugin failures are reported
//! through a [`LogSink`] supplied by the embedding application, separate
//! from the `tracing` diagnostics emitted along the way.

use serde::Serialize;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Informational.
    Info,
    /// Something went wrong.
    Error,
    /// Something completed successfully.
    Success,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogKind::Info => "info",
            LogKind::Error => "error",
            LogKind::Success => "success",
        })
    }
}

/// Receives log entries from the client.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a LogSink",
    label = "implement `add_log` for this type"
)]
pub trait LogSink: Send + Sync + 'static {
    /// Record one entry.
    fn add_log(&self, kind: LogKind, text: &str);
}

impl<T: LogSink> LogSink for Arc<T> {
    fn add_log(&self, kind: LogKind, text: &str) {
        (**self).add_log(kind, text);
    }
}

/// Forwards entries to `tracing` and counts outcomes.
#[derive(Debug, Default)]
pub struct TracingLogSink {
    successes: AtomicUsize,
    failures: AtomicUsize,
}

impl TracingLogSink {
    /// Create a sink with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries recorded as [`LogKind::Success`].
    pub fn success_count(&self) -> usize {
        self.successes.load(Ordering::Relaxed)
    }

    /// Entries recorded as [`LogKind::Error`].
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

impl LogSink for TracingLogSink {
    fn add_log(&self, kind: LogKind, text: &str) {
        match kind {
            LogKind::Info => tracing::info!(target: "tsumugi::log", %kind, "{text}"),
            LogKind::Success => {
                self.successes.fetch_add(1, Ordering::Relaxed);
                tracing::info!(target: "tsumugi::log", %kind, "{text}");
            }
            LogKind::Error => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(target: "tsumugi::log", %kind, "{text}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let sink = TracingLogSink::new();
        sink.add_log(LogKind::Info, "api connected");
        sink.add_log(LogKind::Success, "sent");
        sink.add_log(LogKind::Error, "timed out");
        sink.add_log(LogKind::Error, "timed out again");

        assert_eq!(sink.success_count(), 1);
        assert_eq!(sink.failure_count(), 2);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(LogKind::Success.to_string(), "success");
        assert_eq!(serde_json::to_string(&LogKind::Error).unwrap(), "\"error\"");
    }
}
