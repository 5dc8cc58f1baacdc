//! Deduplicate strategy: merge argument-identical calls within a window.
//!
//! Calls to the same target are grouped by deep equality of their argument
//! lists. While a group's sliding window is open, every matching call
//! increments its repeat count and restarts the window - a debounce scoped
//! to the equality group. When the window finally elapses the target runs
//! once, with the repeat count prepended as its first argument.
//!
//! The arguments forwarded on fire are those of the most recent merged
//! call. Merged calls are deep-equal by construction, so this is only
//! observable through object identity, never through value comparison.
//!
//! # Unbounded growth hazard
//!
//! Groups are evicted only by their own timer. A target fed an
//! ever-changing stream of distinct argument lists faster than the window
//! elapses grows its group list without bound; there is deliberately no
//! eviction policy here. Callers exposed to adversarial input should keep
//! argument cardinality in check.

use crate::application::config::{validate_interval, ConfigError};
use crate::application::metrics::Metrics;
use crate::application::ports::{TimerCallback, TimerHandle, TimerService};
use crate::domain::target::Target;
use crate::domain::value::{args_eq, ArgValue};
use crate::infrastructure::storage::ShardedStorage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// One open equality group.
///
/// A target owns an ordered list of these, at most one per distinct (by
/// deep equality) argument list. The list is scanned linearly; groups are
/// not otherwise ordered.
#[derive(Debug)]
struct DedupGroup {
    /// Stable identity of the group, used by the fire path to find it.
    id: u64,
    /// Sequence of the call that owns the pending timer; stale fires
    /// carry an older sequence and are ignored.
    seq: u64,
    /// Calls merged into this group so far.
    count: u64,
    /// Representative argument list; replaced on every merge so the most
    /// recent call's values are forwarded.
    arguments: Vec<ArgValue>,
    timer: Option<TimerHandle>,
}

/// Deduplicate invoker bound to an effective window interval.
///
/// Clones share the group registry and metrics; [`Deduplicate::configure`]
/// returns a clone bound to a different interval without touching the
/// default one.
#[derive(Debug, Clone)]
pub struct Deduplicate {
    groups: Arc<ShardedStorage<Target, Vec<DedupGroup>>>,
    timer: Arc<dyn TimerService>,
    metrics: Metrics,
    ticket: Arc<AtomicU64>,
    interval: Duration,
}

impl Deduplicate {
    pub(crate) fn new(timer: Arc<dyn TimerService>, metrics: Metrics, interval: Duration) -> Self {
        Self {
            groups: Arc::new(ShardedStorage::new()),
            timer,
            metrics,
            ticket: Arc::new(AtomicU64::new(0)),
            interval,
        }
    }

    /// Deduplicate a call to `target` with `arguments`.
    pub fn call(&self, target: &Target, arguments: Vec<ArgValue>) {
        let seq = self.next_ticket();

        self.groups
            .with_entry_mut(target.clone(), Vec::new, |groups| {
                if let Some(group) = groups
                    .iter_mut()
                    .find(|group| args_eq(&group.arguments, &arguments))
                {
                    group.count += 1;
                    group.arguments = arguments;
                    if let Some(handle) = group.timer.take() {
                        self.timer.cancel(handle);
                    }
                    group.seq = seq;
                    let callback = self.fire_callback(target.clone(), group.id, seq);
                    group.timer = Some(self.timer.schedule(self.interval, callback));
                    self.metrics.record_coalesced();
                    trace!(callee = ?target, count = group.count, "deduplication window restarted");
                } else {
                    let id = self.next_ticket();
                    let callback = self.fire_callback(target.clone(), id, seq);
                    let handle = self.timer.schedule(self.interval, callback);
                    groups.push(DedupGroup {
                        id,
                        seq,
                        count: 1,
                        arguments,
                        timer: Some(handle),
                    });
                    trace!(callee = ?target, "deduplication group opened");
                }
            });
    }

    fn fire_callback(&self, target: Target, id: u64, seq: u64) -> TimerCallback {
        let groups = Arc::clone(&self.groups);
        let metrics = self.metrics.clone();
        Box::new(move || {
            // Remove the group before invoking, and drop the shard guard
            // before the target runs.
            let fired = groups
                .with_existing_entry_mut(&target, |list| {
                    list.iter()
                        .position(|group| group.id == id && group.seq == seq)
                        .map(|index| {
                            let group = list.remove(index);
                            (group.count, group.arguments)
                        })
                })
                .flatten();

            // Quiescent targets do not linger in the registry.
            groups.remove_if(&target, |_, list| list.is_empty());

            if let Some((count, mut arguments)) = fired {
                metrics.record_admitted();
                trace!(callee = ?target, count, "deduplication window elapsed, invoking");
                arguments.insert(0, ArgValue::Int(count as i64));
                target.invoke(&arguments);
            }
        })
    }

    fn next_ticket(&self) -> u64 {
        self.ticket.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Bound invoker using `interval` instead of the default.
    ///
    /// The returned invoker shares the group registry, so configured and
    /// plain calls to the same target merge with each other.
    pub fn configure(&self, interval: Duration) -> Result<Deduplicate, ConfigError> {
        validate_interval("deduplicate", interval)?;
        Ok(Deduplicate {
            interval,
            ..self.clone()
        })
    }

    /// Effective window interval of this invoker.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of open groups for `target`.
    pub fn open_groups(&self, target: &Target) -> usize {
        self.groups.with_entry(target, Vec::len).unwrap_or(0)
    }

    /// Number of targets with at least one open group.
    pub fn tracked_targets(&self) -> usize {
        self.groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::infrastructure::mocks::{MockTimer, Recorder};

    fn deduplicate(interval_ms: u64) -> (Deduplicate, MockTimer) {
        let timer = MockTimer::new();
        let strategy = Deduplicate::new(
            Arc::new(timer.clone()),
            Metrics::new(),
            Duration::from_millis(interval_ms),
        );
        (strategy, timer)
    }

    #[test]
    fn test_single_call_fires_with_count_one() {
        let (strategy, timer) = deduplicate(100);
        let recorder = Recorder::new();
        let target = recorder.target();

        strategy.call(&target, args!["job"]);
        assert_eq!(strategy.open_groups(&target), 1);

        timer.advance(Duration::from_millis(100));
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.calls()[0], args![1, "job"]);
        assert_eq!(strategy.open_groups(&target), 0);
    }

    #[test]
    fn test_equal_calls_merge_and_restart_window() {
        let (strategy, timer) = deduplicate(100);
        let recorder = Recorder::new();
        let target = recorder.target();

        strategy.call(&target, args![1]);
        timer.advance(Duration::from_millis(10));
        strategy.call(&target, args![1]);

        // Window restarted at t=10; nothing fires at t=100.
        timer.advance(Duration::from_millis(90));
        assert_eq!(recorder.count(), 0);

        timer.advance(Duration::from_millis(10));
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.calls()[0], args![2, 1]);
    }

    #[test]
    fn test_distinct_arguments_form_independent_groups() {
        let (strategy, timer) = deduplicate(100);
        let recorder = Recorder::new();
        let target = recorder.target();

        strategy.call(&target, args![1]);
        timer.advance(Duration::from_millis(5));
        strategy.call(&target, args![2]);
        timer.advance(Duration::from_millis(5));
        strategy.call(&target, args![1]);

        assert_eq!(strategy.open_groups(&target), 2);

        // args=[2] group fires at t=105, untouched by the [1] merges.
        timer.advance(Duration::from_millis(95));
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.calls()[0], args![1, 2]);

        // args=[1] group was restarted at t=10, fires at t=110.
        timer.advance(Duration::from_millis(5));
        assert_eq!(recorder.count(), 2);
        assert_eq!(recorder.calls()[1], args![2, 1]);
        assert_eq!(strategy.tracked_targets(), 0);
    }

    #[test]
    fn test_deep_equality_over_nested_arguments() {
        let (strategy, timer) = deduplicate(50);
        let recorder = Recorder::new();
        let target = recorder.target();

        let nested = || args![vec![ArgValue::Int(1), ArgValue::Str("x".into())], "tail"];
        strategy.call(&target, nested());
        strategy.call(&target, nested());
        strategy.call(&target, args![vec![ArgValue::Int(2)], "tail"]);

        assert_eq!(strategy.open_groups(&target), 2);

        timer.advance(Duration::from_millis(50));
        assert_eq!(recorder.count(), 2);

        let counts: Vec<ArgValue> = recorder.calls().iter().map(|c| c[0].clone()).collect();
        assert!(counts.contains(&ArgValue::Int(2)));
        assert!(counts.contains(&ArgValue::Int(1)));
    }

    #[test]
    fn test_count_resets_after_quiescence() {
        let (strategy, timer) = deduplicate(50);
        let recorder = Recorder::new();
        let target = recorder.target();

        strategy.call(&target, args!["x"]);
        strategy.call(&target, args!["x"]);
        timer.advance(Duration::from_millis(50));
        assert_eq!(recorder.calls()[0], args![2, "x"]);

        // A fresh group after the fire counts from one again.
        strategy.call(&target, args!["x"]);
        timer.advance(Duration::from_millis(50));
        assert_eq!(recorder.calls()[1], args![1, "x"]);
    }

    #[test]
    fn test_targets_are_independent() {
        let (strategy, timer) = deduplicate(100);
        let first = Recorder::new();
        let second = Recorder::new();
        let target_a = first.target();
        let target_b = second.target();

        strategy.call(&target_a, args![1]);
        strategy.call(&target_b, args![1]);
        assert_eq!(strategy.tracked_targets(), 2);

        timer.advance(Duration::from_millis(100));
        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 1);
    }

    #[test]
    fn test_configure_shares_groups() {
        let (strategy, timer) = deduplicate(100);
        let fast = strategy.configure(Duration::from_millis(10)).unwrap();
        let recorder = Recorder::new();
        let target = recorder.target();

        strategy.call(&target, args![1]);
        fast.call(&target, args![1]);

        // Merged into one group, rescheduled with the override interval.
        timer.advance(Duration::from_millis(10));
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.calls()[0], args![2, 1]);
        assert_eq!(strategy.interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_metrics_account_for_merges() {
        let (strategy, timer) = deduplicate(100);
        let metrics = strategy.metrics.clone();
        let recorder = Recorder::new();
        let target = recorder.target();

        strategy.call(&target, args![1]);
        strategy.call(&target, args![1]);
        strategy.call(&target, args![2]);
        timer.advance(Duration::from_millis(100));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.calls_admitted, 2);
        assert_eq!(snapshot.calls_coalesced, 1);
    }
}
