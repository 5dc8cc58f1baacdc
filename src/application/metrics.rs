//! Observability metrics for call shaping.
//!
//! Provides counters describing how incoming calls were resolved, for
//! monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking call-shaping decisions.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same underlying counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Calls whose target actually ran, immediately or on timer fire
    calls_admitted: AtomicU64,
    /// Calls dropped outright (throttle cooldown, exhausted limit)
    calls_suppressed: AtomicU64,
    /// Calls absorbed into a pending window (debounce supersession,
    /// deduplicate merge)
    calls_coalesced: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                calls_admitted: AtomicU64::new(0),
                calls_suppressed: AtomicU64::new(0),
                calls_coalesced: AtomicU64::new(0),
            }),
        }
    }

    /// Record an admitted call (the target ran).
    pub(crate) fn record_admitted(&self) {
        self.inner.calls_admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped call.
    pub(crate) fn record_suppressed(&self) {
        self.inner.calls_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a call merged into an open window.
    pub(crate) fn record_coalesced(&self) {
        self.inner.calls_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    /// Total number of calls whose target ran.
    pub fn calls_admitted(&self) -> u64 {
        self.inner.calls_admitted.load(Ordering::Relaxed)
    }

    /// Total number of calls dropped outright.
    pub fn calls_suppressed(&self) -> u64 {
        self.inner.calls_suppressed.load(Ordering::Relaxed)
    }

    /// Total number of calls merged into pending windows.
    pub fn calls_coalesced(&self) -> u64 {
        self.inner.calls_coalesced.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls_admitted: self.calls_admitted(),
            calls_suppressed: self.calls_suppressed(),
            calls_coalesced: self.calls_coalesced(),
        }
    }

    /// Reset all metrics to zero.
    ///
    /// Useful for testing or when starting a new monitoring period.
    pub fn reset(&self) {
        self.inner.calls_admitted.store(0, Ordering::Relaxed);
        self.inner.calls_suppressed.store(0, Ordering::Relaxed);
        self.inner.calls_coalesced.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
    /// Calls whose target actually ran
    pub calls_admitted: u64,
    /// Calls dropped outright
    pub calls_suppressed: u64,
    /// Calls absorbed into a pending window
    pub calls_coalesced: u64,
}

impl MetricsSnapshot {
    /// Total calls observed (admitted + suppressed + coalesced).
    pub fn total_calls(&self) -> u64 {
        self.calls_admitted
            .saturating_add(self.calls_suppressed)
            .saturating_add(self.calls_coalesced)
    }

    /// Ratio of calls that did not run their target (0.0 to 1.0).
    ///
    /// Returns 0.0 if no calls have been observed.
    pub fn shaping_rate(&self) -> f64 {
        let total = self.total_calls();
        if total == 0 {
            0.0
        } else {
            let shaped = self.calls_suppressed.saturating_add(self.calls_coalesced);
            shaped as f64 / total as f64
        }
    }
}
