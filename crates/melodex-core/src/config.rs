// ── Runtime engine configuration ──
//
// These types describe how the engine talks to the backend and how
// aggressively it reconciles. They never touch disk: the CLI (via
// melodex-config) constructs an `EngineConfig` and hands it in.

use std::time::Duration;

use url::Url;

use melodex_api::TlsMode;

/// Bounded follow-up check run after a committed toggle or an adopted
/// external event.
///
/// Attempt `n` (0-based) waits `initial_delay * backoff_factor^n` before
/// refetching. A mismatch on the final attempt adopts the backend value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilePolicy {
    pub initial_delay: Duration,
    /// 0 disables reconciliation.
    pub max_attempts: u32,
    pub backoff_factor: u32,
}

impl ReconcilePolicy {
    pub const fn disabled() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_attempts: 0,
            backoff_factor: 1,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Delay before attempt `attempt` (0-based). Saturates instead of
    /// overflowing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(1).saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor)
    }
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_attempts: 3,
            backoff_factor: 2,
        }
    }
}

/// Configuration for one `RelationshipEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// API root, e.g. `https://catalog.example.com/api`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    pub tls: TlsMode,
    pub reconcile: ReconcilePolicy,
    /// Events a slow bus subscriber may fall behind before it lags.
    pub bus_capacity: usize,
    /// Focus/visibility bursts within this window collapse into one refresh.
    pub focus_debounce: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api"
                .parse()
                .expect("default base URL is valid"),
            timeout: Duration::from_secs(15),
            tls: TlsMode::default(),
            reconcile: ReconcilePolicy::default(),
            bus_capacity: 256,
            focus_debounce: Duration::from_millis(500),
        }
    }
}
