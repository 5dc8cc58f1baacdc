//! Mock timer for testing.

use crate::application::ports::{TimerCallback, TimerHandle, TimerService};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct PendingTimer {
    id: u64,
    deadline: Duration,
    callback: TimerCallback,
}

struct MockTimerState {
    now: Duration,
    next_id: u64,
    pending: Vec<PendingTimer>,
}

/// Mock timer service driven by a virtual clock.
///
/// Allows tests to control time progression explicitly, enabling
/// deterministic reproduction of timing scenarios at millisecond
/// resolution.
///
/// Time starts at zero and only moves through [`MockTimer::advance`],
/// which fires every callback whose deadline falls within the advanced
/// span, in deadline order (ties in schedule order), with
/// run-to-completion semantics: a callback that schedules a new timer due
/// within the same span gets that timer fired too, before `advance`
/// returns. `advance(Duration::ZERO)` fires timers scheduled with zero
/// delay.
///
/// # Examples
///
/// ```
/// use performer::{MockTimer, TimerService};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let timer = MockTimer::new();
/// let fired = Arc::new(AtomicUsize::new(0));
/// let fired_clone = Arc::clone(&fired);
///
/// timer.schedule(Duration::from_millis(100), Box::new(move || {
///     fired_clone.fetch_add(1, Ordering::SeqCst);
/// }));
///
/// timer.advance(Duration::from_millis(99));
/// assert_eq!(fired.load(Ordering::SeqCst), 0);
///
/// timer.advance(Duration::from_millis(1));
/// assert_eq!(fired.load(Ordering::SeqCst), 1);
/// ```
///
/// # Thread Safety
///
/// `MockTimer` is thread-safe and can be cloned; all clones share the
/// same underlying clock and pending timers.
#[derive(Clone)]
pub struct MockTimer {
    state: Arc<Mutex<MockTimerState>>,
}

impl MockTimer {
    /// Create a mock timer with its clock at zero.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockTimerState {
                now: Duration::ZERO,
                next_id: 0,
                pending: Vec::new(),
            })),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MockTimerState> {
        self.state
            .lock()
            .expect("MockTimer mutex poisoned - a test thread panicked while holding the lock")
    }

    /// Current virtual time since the timer was created.
    pub fn now(&self) -> Duration {
        self.lock_state().now
    }

    /// Number of timers currently pending.
    pub fn pending_count(&self) -> usize {
        self.lock_state().pending.len()
    }

    /// Advance the virtual clock, firing due callbacks along the way.
    ///
    /// The lock is not held while a callback runs, so callbacks may
    /// schedule or cancel timers; a panic inside a callback propagates to
    /// the caller without poisoning the timer.
    pub fn advance(&self, duration: Duration) {
        let target_time = self.lock_state().now.saturating_add(duration);

        loop {
            let callback = {
                let mut state = self.lock_state();
                let due = state
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.deadline <= target_time)
                    .min_by_key(|(_, timer)| (timer.deadline, timer.id))
                    .map(|(index, _)| index);

                match due {
                    Some(index) => {
                        let timer = state.pending.remove(index);
                        // Virtual time is exactly the fire deadline while
                        // the callback runs.
                        state.now = state.now.max(timer.deadline);
                        timer.callback
                    }
                    None => {
                        state.now = target_time;
                        break;
                    }
                }
            };

            callback();
        }
    }
}

impl Default for MockTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService for MockTimer {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let mut state = self.lock_state();
        state.next_id += 1;
        let id = state.next_id;
        let deadline = state.now.saturating_add(delay);
        state.pending.push(PendingTimer {
            id,
            deadline,
            callback,
        });
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        self.lock_state().pending.retain(|timer| timer.id != handle.0);
    }
}

impl fmt::Debug for MockTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("MockTimer")
            .field("now", &state.now)
            .field("pending", &state.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> TimerCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let make = move || -> TimerCallback {
            let count = Arc::clone(&count_clone);
            Box::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, make)
    }

    #[test]
    fn test_fires_exactly_at_deadline() {
        let timer = MockTimer::new();
        let (count, make) = counter();

        timer.schedule(Duration::from_millis(100), make());
        timer.advance(Duration::from_millis(99));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        timer.advance(Duration::from_millis(1));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(timer.pending_count(), 0);
    }

    #[test]
    fn test_zero_delay_fires_on_zero_advance() {
        let timer = MockTimer::new();
        let (count, make) = counter();

        timer.schedule(Duration::ZERO, make());
        assert_eq!(count.load(Ordering::SeqCst), 0);

        timer.advance(Duration::ZERO);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_removes_pending() {
        let timer = MockTimer::new();
        let (count, make) = counter();

        let handle = timer.schedule(Duration::from_millis(50), make());
        timer.cancel(handle);
        timer.advance(Duration::from_millis(100));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(timer.pending_count(), 0);
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let timer = MockTimer::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for (delay, label) in [(30u64, "c"), (10, "a"), (20, "b")] {
            let order_clone = Arc::clone(&order);
            timer.schedule(
                Duration::from_millis(delay),
                Box::new(move || {
                    order_clone.lock().unwrap().push(label);
                }),
            );
        }

        timer.advance(Duration::from_millis(30));
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_equal_deadlines_fire_in_schedule_order() {
        let timer = MockTimer::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order_clone = Arc::clone(&order);
            timer.schedule(
                Duration::from_millis(10),
                Box::new(move || {
                    order_clone.lock().unwrap().push(label);
                }),
            );
        }

        timer.advance(Duration::from_millis(10));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_callback_scheduling_within_span_fires_same_advance() {
        let timer = MockTimer::new();
        let (count, make) = counter();

        let timer_clone = timer.clone();
        let chained = make();
        timer.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                timer_clone.schedule(Duration::from_millis(10), chained);
            }),
        );

        // Inner timer's deadline (t=20) falls inside the advanced span.
        timer.advance(Duration::from_millis(25));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(timer.now(), Duration::from_millis(25));
    }

    #[test]
    fn test_clock_stops_at_fire_time_during_callback() {
        let timer = MockTimer::new();
        let observed = Arc::new(Mutex::new(Duration::ZERO));

        let timer_clone = timer.clone();
        let observed_clone = Arc::clone(&observed);
        timer.schedule(
            Duration::from_millis(40),
            Box::new(move || {
                *observed_clone.lock().unwrap() = timer_clone.now();
            }),
        );

        timer.advance(Duration::from_millis(100));
        assert_eq!(*observed.lock().unwrap(), Duration::from_millis(40));
        assert_eq!(timer.now(), Duration::from_millis(100));
    }
}
