//! Throttle strategy: admit at most one call per cooldown window.
//!
//! The first call to a target is invoked synchronously and puts the target
//! into cooldown. Calls arriving during cooldown are dropped, arguments
//! included - nothing is queued. When the cooldown timer fires the target
//! leaves the set and the next call is admitted immediately, restarting
//! the cooldown.

use crate::application::config::{validate_interval, ConfigError};
use crate::application::metrics::Metrics;
use crate::application::ports::{TimerHandle, TimerService};
use crate::domain::target::Target;
use crate::domain::value::ArgValue;
use crate::infrastructure::storage::ShardedStorage;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Throttle invoker bound to an effective cooldown interval.
///
/// Clones share the cooldown membership; [`Throttle::configure`] returns a
/// clone bound to a different interval without touching the default one.
///
/// Membership is function-scoped: the value stored per target is just the
/// pending cooldown timer, there is no argument dimension.
#[derive(Debug, Clone)]
pub struct Throttle {
    cooldown: Arc<ShardedStorage<Target, Option<TimerHandle>>>,
    timer: Arc<dyn TimerService>,
    metrics: Metrics,
    interval: Duration,
}

impl Throttle {
    pub(crate) fn new(timer: Arc<dyn TimerService>, metrics: Metrics, interval: Duration) -> Self {
        Self {
            cooldown: Arc::new(ShardedStorage::new()),
            timer,
            metrics,
            interval,
        }
    }

    /// Throttle a call to `target` with `arguments`.
    pub fn call(&self, target: &Target, arguments: Vec<ArgValue>) {
        // Membership is entered before the target runs so that a reentrant
        // call from inside the target lands in the cooldown instead of
        // recursing.
        let admitted = self.cooldown.with_entry_mut(
            target.clone(),
            || None,
            |slot| {
                if slot.is_some() {
                    return false;
                }
                let cooldown = Arc::clone(&self.cooldown);
                let fire_target = target.clone();
                *slot = Some(self.timer.schedule(
                    self.interval,
                    Box::new(move || {
                        cooldown.remove(&fire_target);
                        trace!(callee = ?fire_target, "throttle cooldown elapsed");
                    }),
                ));
                true
            },
        );

        if admitted {
            self.metrics.record_admitted();
            trace!(callee = ?target, "throttle admitted call");
            target.invoke(&arguments);
        } else {
            self.metrics.record_suppressed();
            trace!(callee = ?target, "throttle dropped call in cooldown");
        }
    }

    /// Bound invoker using `interval` instead of the default.
    ///
    /// The returned invoker shares the membership set, so a cooldown
    /// entered through it also suppresses plain calls to the same target.
    pub fn configure(&self, interval: Duration) -> Result<Throttle, ConfigError> {
        validate_interval("throttle", interval)?;
        Ok(Throttle {
            interval,
            ..self.clone()
        })
    }

    /// Effective cooldown interval of this invoker.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether `target` is currently in cooldown.
    pub fn in_cooldown(&self, target: &Target) -> bool {
        self.cooldown.contains_key(target)
    }

    /// Number of targets currently in cooldown.
    pub fn cooldown_count(&self) -> usize {
        self.cooldown.len()
    }
}
