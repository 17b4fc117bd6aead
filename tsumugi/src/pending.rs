//! Outstanding action tracking.
//!
//! Every action sent on the API connection is recorded under its echo id
//! until the gateway acknowledges it. A background sweeper reports and
//! drops entries that stay unacknowledged longer than the request timeout.

use crate::{
    action::Echo,
    log::{LogKind, LogSink},
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

/// Source of unique echo ids.
///
/// Seeded from the wall clock so ids stay distinct across restarts, then
/// incremented, so two sends within the same instant never collide.
#[derive(Debug)]
pub struct EchoSequence {
    next: AtomicU64,
}

impl EchoSequence {
    /// Start from the current unix time in milliseconds.
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self::starting_at(seed)
    }

    /// Start from an explicit value.
    pub fn starting_at(first: Echo) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Take the next id.
    pub fn next(&self) -> Echo {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for EchoSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Actions awaiting acknowledgement, keyed by echo id.
#[derive(Debug)]
pub struct PendingRequests {
    inflight: Mutex<HashMap<Echo, Instant>>,
    timeout: Duration,
}

impl PendingRequests {
    /// Create an empty table with the given expiry window.
    pub fn new(timeout: Duration) -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// The expiry window.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start tracking `echo` from now.
    pub fn track(&self, echo: Echo) {
        self.inflight.lock().insert(echo, Instant::now());
    }

    /// Stop tracking `echo`. Returns whether it was tracked.
    pub fn resolve(&self, echo: Echo) -> bool {
        self.inflight.lock().remove(&echo).is_some()
    }

    /// Whether `echo` is still awaiting acknowledgement.
    pub fn contains(&self, echo: Echo) -> bool {
        self.inflight.lock().contains_key(&echo)
    }

    /// Number of outstanding actions.
    pub fn len(&self) -> usize {
        self.inflight.lock().len()
    }

    /// Whether nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.inflight.lock().is_empty()
    }

    /// Remove and return every entry older than the timeout as of `now`.
    ///
    /// An entry exactly at the timeout is kept.
    pub fn sweep_expired_at(&self, now: Instant) -> Vec<Echo> {
        let mut expired = Vec::new();
        self.inflight.lock().retain(|&echo, sent| {
            let alive = now.saturating_duration_since(*sent) <= self.timeout;
            if !alive {
                expired.push(echo);
            }
            alive
        });
        expired.sort_unstable();
        expired
    }

    /// [`sweep_expired_at`](Self::sweep_expired_at) the current instant.
    pub fn sweep_expired(&self) -> Vec<Echo> {
        self.sweep_expired_at(Instant::now())
    }

    /// Sweep every `period` until `cancel` fires, logging each expiry.
    ///
    /// The first sweep happens immediately.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        period: Duration,
        log: Arc<dyn LogSink>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let pending = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        for echo in pending.sweep_expired() {
                            tracing::warn!(echo, "action was never acknowledged");
                            log.add_log(
                                LogKind::Error,
                                &format!(
                                    "request {echo} timed out after {}s",
                                    pending.timeout.as_secs()
                                ),
                            );
                        }
                    }
                }
            }
            tracing::debug!("pending request sweeper stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_strictly_increasing() {
        let seq = EchoSequence::starting_at(100);
        assert_eq!(seq.next(), 100);
        assert_eq!(seq.next(), 101);
        assert!(EchoSequence::new().next() > 1_600_000_000_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_strict() {
        let pending = PendingRequests::new(Duration::from_secs(30));
        pending.track(1);
        let start = Instant::now();

        assert!(pending.sweep_expired_at(start + Duration::from_secs(30)).is_empty());
        assert!(pending.contains(1));

        assert_eq!(
            pending.sweep_expired_at(start + Duration::from_secs(31)),
            vec![1]
        );
        assert!(pending.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_removes_entry() {
        let pending = PendingRequests::new(Duration::from_secs(30));
        pending.track(7);
        assert!(pending.resolve(7));
        assert!(!pending.resolve(7));
        assert!(!pending.resolve(8));
        assert!(pending.sweep_expired_at(Instant::now() + Duration::from_secs(120)).is_empty());
    }
}
