//! Tokio-backed timer service, available with the `async` feature.
//!
//! Each scheduled timer is a spawned task sleeping until its deadline;
//! cancellation aborts the task. Must be used from within a Tokio runtime
//! context (`schedule` panics outside one, as `tokio::spawn` does).

use crate::application::ports::{TimerCallback, TimerHandle, TimerService};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Timer service backed by Tokio tasks.
///
/// Callbacks run on the runtime's worker threads. A panicking callback
/// faults only its own task, per Tokio's panic policy.
pub struct TokioTimer {
    tasks: Mutex<HashMap<u64, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl TokioTimer {
    /// Create a new Tokio-backed timer service.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, HashMap<u64, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of timers not yet fired or cancelled.
    pub fn pending_count(&self) -> usize {
        self.lock_tasks()
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }
}

impl Default for TokioTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService for TokioTimer {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });

        let mut tasks = self.lock_tasks();
        // Completed tasks are pruned opportunistically; the map stays
        // bounded by the number of timers scheduled between fires.
        tasks.retain(|_, task| !task.is_finished());
        tasks.insert(id, task);
        TimerHandle(id)
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(task) = self.lock_tasks().remove(&handle.0) {
            task.abort();
        }
    }
}

impl fmt::Debug for TokioTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioTimer")
            .field("pending", &self.pending_count())
            .finish()
    }
}
