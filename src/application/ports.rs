//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the
//! application layer needs. Infrastructure adapters implement these ports.

use std::fmt::Debug;
use std::time::Duration;

/// One-shot deferred work scheduled through a [`TimerService`].
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handle for a scheduled timer, used to cancel it before it fires.
///
/// Handles are unique within a single timer service instance. Cancelling
/// a handle whose timer already fired is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub(crate) u64);

impl TimerHandle {
    /// Raw handle id, mainly useful for logging.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Upper bound on a single timer delay.
///
/// Real backends add the delay to `Instant::now()`; capping it keeps that
/// arithmetic in range. Configuration with longer intervals is rejected at
/// build/configure time rather than producing undefined scheduling.
pub const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Port for one-shot timer scheduling.
///
/// This abstraction is the only time source of the system: strategies
/// never read a clock, they only schedule and cancel timers. Infrastructure
/// provides concrete implementations (`ThreadTimer`, `TokioTimer`) and a
/// controllable `MockTimer` for deterministic tests.
///
/// Implementations must not hold internal locks while running a callback,
/// so that callbacks may reenter the service to schedule or cancel.
pub trait TimerService: Send + Sync + Debug {
    /// Schedule `callback` to run once after `delay`.
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    /// Cancel a pending timer. No-op if it already fired or was cancelled.
    fn cancel(&self, handle: TimerHandle);
}
