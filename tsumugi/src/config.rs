//! Client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for a [`GatewayClient`](crate::GatewayClient).
///
/// Every field has a default, so a partial document deserializes:
///
/// ```rust,ignore
/// let config: GatewayConfig = serde_json::from_str(r#"{"request_timeout_secs": 10}"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Name of the action connection, used in logs.
    pub api_name: String,
    /// Name of the event connection, used in logs.
    pub event_name: String,
    /// Age after which an unacknowledged action is reported as timed out.
    pub request_timeout_secs: u64,
    /// How often the pending table is swept.
    pub sweep_interval_secs: u64,
    /// Reconnect backoff of both connections.
    pub reconnect: ReconnectPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_name: "api".to_string(),
            event_name: "event".to_string(),
            request_timeout_secs: 30,
            sweep_interval_secs: 30,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl GatewayConfig {
    /// [`request_timeout_secs`](Self::request_timeout_secs) as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// [`sweep_interval_secs`](Self::sweep_interval_secs) as a duration.
    ///
    /// Never zero.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Exponential reconnect backoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub initial_backoff_ms: u64,
    /// Upper bound on the delay.
    pub max_backoff_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 1_000,
            max_backoff_ms: 5_000,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the first retry.
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// The delay following `current`: doubled, capped at the maximum.
    pub fn next_backoff(&self, current: Duration) -> Duration {
        current
            .saturating_mul(2)
            .min(Duration::from_millis(self.max_backoff_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_uses_defaults() {
        let raw = r#"{"request_timeout_secs": 10, "reconnect": {"max_backoff_ms": 8000}}"#;
        let config: GatewayConfig = serde_json::from_str(raw).unwrap();

        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.sweep_interval(), Duration::from_secs(30));
        assert_eq!(config.api_name, "api");
        assert_eq!(config.reconnect.initial_backoff_ms, 1_000);
        assert_eq!(config.reconnect.max_backoff_ms, 8_000);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = ReconnectPolicy::default();
        let mut delay = policy.initial_backoff();
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(delay.as_millis());
            delay = policy.next_backoff(delay);
        }
        assert_eq!(seen, vec![1_000, 2_000, 4_000, 5_000, 5_000]);
    }

    #[test]
    fn test_zero_sweep_interval_is_clamped() {
        let config = GatewayConfig {
            sweep_interval_secs: 0,
            ..GatewayConfig::default()
        };
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }
}
