//! Limit strategy: cap the lifetime number of admitted calls per target.
//!
//! Unlike the windowed strategies this one never touches a timer. Every
//! call attempt increments the target's counter, admitted or not, and the
//! counter is never reset: once a target exhausts its budget it never runs
//! again for the life of the registry.

use crate::application::metrics::Metrics;
use crate::domain::target::Target;
use crate::domain::value::ArgValue;
use crate::infrastructure::storage::ShardedStorage;
use std::sync::Arc;
use tracing::trace;

/// Limit invoker bound to an effective maximum.
///
/// `None` means unbounded - an explicit absent value, not a numeric
/// sentinel. Clones share the counters; [`Limit::configure`] returns a
/// clone bound to a different maximum without touching the default one.
#[derive(Debug, Clone)]
pub struct Limit {
    counters: Arc<ShardedStorage<Target, u64>>,
    metrics: Metrics,
    max: Option<u64>,
}

impl Limit {
    pub(crate) fn new(metrics: Metrics, max: Option<u64>) -> Self {
        Self {
            counters: Arc::new(ShardedStorage::new()),
            metrics,
            max,
        }
    }

    /// Run `target` with `arguments` unless its budget is exhausted.
    pub fn call(&self, target: &Target, arguments: Vec<ArgValue>) {
        let admitted = self.counters.with_entry_mut(
            target.clone(),
            || 0,
            |count| {
                let admitted = match self.max {
                    None => true,
                    Some(max) => *count < max,
                };
                // Attempts count whether or not they are admitted.
                *count += 1;
                admitted
            },
        );

        if admitted {
            self.metrics.record_admitted();
            target.invoke(&arguments);
        } else {
            self.metrics.record_suppressed();
            trace!(callee = ?target, "limit exhausted, dropping call");
        }
    }

    /// Bound invoker using `max` instead of the default; `None` disables
    /// limiting.
    ///
    /// The returned invoker shares the counters, so attempts made through
    /// it and through the plain invoker accumulate on the same budget.
    pub fn configure(&self, max: Option<u64>) -> Limit {
        Limit {
            max,
            ..self.clone()
        }
    }

    /// Effective maximum of this invoker; `None` is unbounded.
    pub fn max(&self) -> Option<u64> {
        self.max
    }

    /// Total call attempts recorded for `target`, admitted or not.
    pub fn attempts(&self, target: &Target) -> u64 {
        self.counters.with_entry(target, |count| *count).unwrap_or(0)
    }
}
