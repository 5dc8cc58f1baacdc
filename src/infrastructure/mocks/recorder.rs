//! Call recorder for testing.

use crate::domain::target::Target;
use crate::domain::value::ArgValue;
use std::sync::{Arc, Mutex};

/// Records every invocation a shaped [`Target`] receives.
///
/// Each [`Recorder::target`] call mints a fresh target with its own
/// identity; all targets from one recorder append to the same call log.
///
/// # Examples
///
/// ```
/// use performer::{args, Recorder};
///
/// let recorder = Recorder::new();
/// let target = recorder.target();
///
/// target.invoke(&args![1, "a"]);
/// assert_eq!(recorder.count(), 1);
/// assert_eq!(recorder.last(), Some(args![1, "a"]));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Vec<ArgValue>>>>,
}

impl Recorder {
    /// Create a recorder with an empty call log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a target that appends its received arguments to the log.
    pub fn target(&self) -> Target {
        let calls = Arc::clone(&self.calls);
        Target::new(move |arguments: &[ArgValue]| {
            calls
                .lock()
                .expect("Recorder mutex poisoned - a test thread panicked while holding the lock")
                .push(arguments.to_vec());
        })
    }

    /// Number of recorded invocations.
    pub fn count(&self) -> usize {
        self.lock_calls().len()
    }

    /// All recorded invocations, oldest first.
    pub fn calls(&self) -> Vec<Vec<ArgValue>> {
        self.lock_calls().clone()
    }

    /// Arguments of the most recent invocation, if any.
    pub fn last(&self) -> Option<Vec<ArgValue>> {
        self.lock_calls().last().cloned()
    }

    /// Forget all recorded invocations.
    pub fn clear(&self) {
        self.lock_calls().clear();
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<Vec<ArgValue>>> {
        self.calls
            .lock()
            .expect("Recorder mutex poisoned - a test thread panicked while holding the lock")
    }
}
