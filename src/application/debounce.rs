//! Debounce strategy: coalesce a burst of calls into the last one.
//!
//! Each call to the same target cancels the outstanding timer and starts a
//! fresh window carrying that call's arguments. The target runs once, with
//! the most recent arguments, when a full window elapses with no further
//! call. An unbroken stream of calls spaced closer than the interval
//! therefore postpones execution indefinitely.

use crate::application::config::{validate_interval, ConfigError};
use crate::application::metrics::Metrics;
use crate::application::ports::{TimerHandle, TimerService};
use crate::domain::target::Target;
use crate::domain::value::ArgValue;
use crate::infrastructure::storage::ShardedStorage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Outstanding debounce state for one target.
///
/// An entry exists exactly while a timer is pending; the fire path removes
/// it before the target is invoked.
#[derive(Debug)]
struct DebounceEntry {
    /// Sequence of the call that owns the pending timer. A fire whose
    /// sequence no longer matches was superseded while in flight and is
    /// ignored.
    seq: u64,
    timer: Option<TimerHandle>,
}

/// Debounce invoker bound to an effective interval.
///
/// Clones share the registry and metrics; [`Debounce::configure`] returns
/// a clone bound to a different interval without touching the default one.
#[derive(Debug, Clone)]
pub struct Debounce {
    entries: Arc<ShardedStorage<Target, DebounceEntry>>,
    timer: Arc<dyn TimerService>,
    metrics: Metrics,
    ticket: Arc<AtomicU64>,
    interval: Duration,
}

impl Debounce {
    pub(crate) fn new(timer: Arc<dyn TimerService>, metrics: Metrics, interval: Duration) -> Self {
        Self {
            entries: Arc::new(ShardedStorage::new()),
            timer,
            metrics,
            ticket: Arc::new(AtomicU64::new(0)),
            interval,
        }
    }

    /// Debounce a call to `target` with `arguments`.
    pub fn call(&self, target: &Target, arguments: Vec<ArgValue>) {
        let seq = self.ticket.fetch_add(1, Ordering::Relaxed) + 1;

        let entries = Arc::clone(&self.entries);
        let metrics = self.metrics.clone();
        let fire_target = target.clone();
        let callback = Box::new(move || {
            // Remove-before-invoke: a panicking target cannot leave a
            // stale entry, and reentrant calls observe a clean registry.
            let removed = entries.remove_if(&fire_target, |_, entry| entry.seq == seq);
            if removed.is_some() {
                metrics.record_admitted();
                trace!(callee = ?fire_target, "debounce window elapsed, invoking");
                fire_target.invoke(&arguments);
            }
        });

        self.entries.with_entry_mut(
            target.clone(),
            || DebounceEntry {
                seq: 0,
                timer: None,
            },
            |entry| {
                if let Some(handle) = entry.timer.take() {
                    self.timer.cancel(handle);
                    self.metrics.record_coalesced();
                    trace!(callee = ?target, "debounce window restarted");
                }
                entry.seq = seq;
                entry.timer = Some(self.timer.schedule(self.interval, callback));
            },
        );
    }

    /// Bound invoker using `interval` instead of the default.
    ///
    /// The returned invoker shares the registry, so configured and plain
    /// calls to the same target still coalesce with each other.
    pub fn configure(&self, interval: Duration) -> Result<Debounce, ConfigError> {
        validate_interval("debounce", interval)?;
        Ok(Debounce {
            interval,
            ..self.clone()
        })
    }

    /// Effective interval of this invoker.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a window is currently open for `target`.
    pub fn is_pending(&self, target: &Target) -> bool {
        self.entries.contains_key(target)
    }

    /// Number of targets with an open window.
    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }
}
