//! Thread-backed timer service for production use.
//!
//! A single worker thread sleeps until the earliest deadline, fires the
//! callback, and goes back to sleep. Cancellation is lazy: cancelled
//! timers stay in the heap and are discarded when they surface.
//!
//! # Testing
//!
//! See `MockTimer` (in `crate::infrastructure::mocks`) for a controllable
//! virtual-clock timer service.

use crate::application::ports::{TimerCallback, TimerHandle, TimerService, MAX_DELAY};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::error;

struct ScheduledTimer {
    deadline: Instant,
    id: u64,
    callback: TimerCallback,
}

// Heap order is by (deadline, id); equal deadlines fire in schedule order.
impl PartialEq for ScheduledTimer {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl Eq for ScheduledTimer {}

impl PartialOrd for ScheduledTimer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTimer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then(self.id.cmp(&other.id))
    }
}

struct TimerQueue {
    heap: BinaryHeap<Reverse<ScheduledTimer>>,
    /// Ids currently in the heap; distinguishes cancel-before-fire from
    /// cancel-after-fire so the cancelled set cannot grow stale entries.
    active: HashSet<u64>,
    cancelled: HashSet<u64>,
    next_id: u64,
    shutdown: bool,
}

struct Shared {
    queue: Mutex<TimerQueue>,
    signal: Condvar,
}

impl Shared {
    // The lock is never held while a callback runs, so a poisoned lock
    // only means a scheduling thread panicked mid-update; the queue itself
    // is still structurally sound.
    fn lock_queue(&self) -> MutexGuard<'_, TimerQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Timer service backed by a dedicated worker thread.
///
/// Callbacks run on the worker thread. A panicking callback is caught and
/// reported via `tracing`; the worker keeps serving later timers.
/// Dropping the service cancels all pending timers and joins the worker.
pub struct ThreadTimer {
    shared: Arc<Shared>,
    worker: Option<thread::JoinHandle<()>>,
}

impl ThreadTimer {
    /// Spawn the worker thread and return the service.
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(TimerQueue {
                heap: BinaryHeap::new(),
                active: HashSet::new(),
                cancelled: HashSet::new(),
                next_id: 0,
                shutdown: false,
            }),
            signal: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("performer-timer".to_string())
            .spawn(move || run_worker(&worker_shared))
            .expect("failed to spawn timer worker thread");

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Number of timers currently pending.
    pub fn pending_count(&self) -> usize {
        self.shared.lock_queue().active.len()
    }
}

impl Default for ThreadTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService for ThreadTimer {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let now = Instant::now();
        let deadline = now.checked_add(delay).unwrap_or(now + MAX_DELAY);

        let mut queue = self.shared.lock_queue();
        queue.next_id += 1;
        let id = queue.next_id;
        queue.active.insert(id);
        queue.heap.push(Reverse(ScheduledTimer {
            deadline,
            id,
            callback,
        }));
        drop(queue);

        // The new deadline may be earlier than what the worker sleeps on.
        self.shared.signal.notify_all();
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut queue = self.shared.lock_queue();
        if queue.active.remove(&handle.0) {
            queue.cancelled.insert(handle.0);
        }
        drop(queue);
        self.shared.signal.notify_all();
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        self.shared.lock_queue().shutdown = true;
        self.shared.signal.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl fmt::Debug for ThreadTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadTimer")
            .field("pending", &self.pending_count())
            .finish()
    }
}

fn run_worker(shared: &Shared) {
    loop {
        let callback = {
            let mut queue = shared.lock_queue();
            loop {
                if queue.shutdown {
                    return;
                }

                // Discard cancelled timers as they surface.
                {
                    let TimerQueue {
                        heap, cancelled, ..
                    } = &mut *queue;
                    while let Some(Reverse(front)) = heap.peek() {
                        if cancelled.remove(&front.id) {
                            heap.pop();
                        } else {
                            break;
                        }
                    }
                }

                let wait = match queue.heap.peek() {
                    None => None,
                    Some(Reverse(front)) => {
                        let now = Instant::now();
                        if front.deadline <= now {
                            break;
                        }
                        Some(front.deadline - now)
                    }
                };

                queue = match wait {
                    None => shared
                        .signal
                        .wait(queue)
                        .unwrap_or_else(PoisonError::into_inner),
                    Some(timeout) => {
                        shared
                            .signal
                            .wait_timeout(queue, timeout)
                            .unwrap_or_else(PoisonError::into_inner)
                            .0
                    }
                };
            }

            match queue.heap.pop() {
                Some(Reverse(timer)) => {
                    queue.active.remove(&timer.id);
                    timer.callback
                }
                None => continue,
            }
        };

        // Run outside the lock so callbacks can reschedule or cancel.
        if catch_unwind(AssertUnwindSafe(callback)).is_err() {
            error!("timer callback panicked; worker continues");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::sync::mpsc;

    #[test]
    fn test_schedule_fires() {
        let timer = ThreadTimer::new();
        let (tx, rx) = mpsc::channel();

        timer.schedule(
            Duration::from_millis(20),
            Box::new(move || {
                tx.send(42).unwrap();
            }),
        );

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 42);
    }

    #[test]
    fn test_cancel_prevents_fire() {
        let timer = ThreadTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);

        let handle = timer.schedule(
            Duration::from_millis(50),
            Box::new(move || {
                fired_clone.fetch_add(1, AtomicOrdering::SeqCst);
            }),
        );
        timer.cancel(handle);

        thread::sleep(Duration::from_millis(150));
        assert_eq!(fired.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(timer.pending_count(), 0);
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let timer = ThreadTimer::new();
        let (tx, rx) = mpsc::channel();

        let tx_late = tx.clone();
        timer.schedule(
            Duration::from_millis(80),
            Box::new(move || {
                tx_late.send("late").unwrap();
            }),
        );
        timer.schedule(
            Duration::from_millis(20),
            Box::new(move || {
                tx.send("early").unwrap();
            }),
        );

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "early");
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "late");
    }

    #[test]
    fn test_panicking_callback_does_not_kill_worker() {
        let timer = ThreadTimer::new();
        let (tx, rx) = mpsc::channel();

        timer.schedule(
            Duration::from_millis(10),
            Box::new(|| panic!("deliberate test panic")),
        );
        timer.schedule(
            Duration::from_millis(30),
            Box::new(move || {
                tx.send("survived").unwrap();
            }),
        );

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "survived");
    }

    #[test]
    fn test_callback_can_reschedule() {
        let timer = Arc::new(ThreadTimer::new());
        let (tx, rx) = mpsc::channel();

        let timer_clone = Arc::clone(&timer);
        timer.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                timer_clone.schedule(
                    Duration::from_millis(10),
                    Box::new(move || {
                        tx.send("chained").unwrap();
                    }),
                );
            }),
        );

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "chained");
    }

    #[test]
    fn test_cancel_after_fire_is_noop() {
        let timer = ThreadTimer::new();
        let (tx, rx) = mpsc::channel();

        let handle = timer.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                tx.send(()).unwrap();
            }),
        );
        rx.recv_timeout(Duration::from_secs(2)).unwrap();

        timer.cancel(handle);
        assert_eq!(timer.pending_count(), 0);
    }
}
