//! Facade over the four call-shaping strategies.
//!
//! A [`Performer`] owns one registry per strategy, all backed by one timer
//! service. The plain operations use the defaults fixed at construction;
//! each strategy accessor additionally exposes `configure`, which returns
//! a bound invoker using an override without mutating the shared default.

use crate::application::config::{validate_interval, ConfigError};
use crate::application::debounce::Debounce;
use crate::application::deduplicate::Deduplicate;
use crate::application::limit::Limit;
use crate::application::metrics::Metrics;
use crate::application::ports::TimerService;
use crate::application::throttle::Throttle;
use crate::domain::target::Target;
use crate::domain::value::ArgValue;
use crate::infrastructure::timer::ThreadTimer;
use std::sync::Arc;
use std::time::Duration;

/// Call-shaping facade.
///
/// # Examples
///
/// ```
/// use performer::{args, MockTimer, Performer, Recorder};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let timer = MockTimer::new();
/// let performer = Performer::builder()
///     .with_debounce_interval(Duration::from_millis(100))
///     .with_timer(Arc::new(timer.clone()))
///     .build()
///     .unwrap();
///
/// let recorder = Recorder::new();
/// let target = recorder.target();
///
/// performer.debounce(&target, args!["first"]);
/// performer.debounce(&target, args!["last"]);
/// timer.advance(Duration::from_millis(100));
///
/// assert_eq!(recorder.calls(), vec![args!["last"]]);
/// ```
#[derive(Debug)]
pub struct Performer {
    debounce: Debounce,
    throttle: Throttle,
    deduplicate: Deduplicate,
    limit: Limit,
    metrics: Metrics,
}

impl Performer {
    /// Create a performer with default configuration: all intervals zero,
    /// no call limit, timers backed by a dedicated thread.
    pub fn new() -> Self {
        PerformerBuilder::default().build_unchecked()
    }

    /// Start building a performer with custom configuration.
    pub fn builder() -> PerformerBuilder {
        PerformerBuilder::default()
    }

    /// Debounce a call: run `target` with the latest arguments once no
    /// further call arrives within the debounce interval.
    pub fn debounce(&self, target: &Target, arguments: Vec<ArgValue>) {
        self.debounce.call(target, arguments);
    }

    /// Throttle a call: run `target` now unless it is in cooldown, in
    /// which case the call is dropped.
    pub fn throttle(&self, target: &Target, arguments: Vec<ArgValue>) {
        self.throttle.call(target, arguments);
    }

    /// Deduplicate a call: merge with argument-identical calls in the open
    /// window; `target` later receives the repeat count as its first
    /// argument.
    pub fn deduplicate(&self, target: &Target, arguments: Vec<ArgValue>) {
        self.deduplicate.call(target, arguments);
    }

    /// Limit a call: run `target` unless its lifetime budget is spent.
    pub fn limit(&self, target: &Target, arguments: Vec<ArgValue>) {
        self.limit.call(target, arguments);
    }

    /// Debounce strategy handle, for `configure` and introspection.
    pub fn debouncer(&self) -> &Debounce {
        &self.debounce
    }

    /// Throttle strategy handle, for `configure` and introspection.
    pub fn throttler(&self) -> &Throttle {
        &self.throttle
    }

    /// Deduplicate strategy handle, for `configure` and introspection.
    pub fn deduplicator(&self) -> &Deduplicate {
        &self.deduplicate
    }

    /// Limit strategy handle, for `configure` and introspection.
    pub fn limiter(&self) -> &Limit {
        &self.limit
    }

    /// Metrics shared by all four strategies.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

impl Default for Performer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Performer`].
pub struct PerformerBuilder {
    debounce_interval: Duration,
    throttle_interval: Duration,
    deduplicate_interval: Duration,
    limit_max: Option<u64>,
    timer: Option<Arc<dyn TimerService>>,
}

impl Default for PerformerBuilder {
    fn default() -> Self {
        Self {
            debounce_interval: Duration::ZERO,
            throttle_interval: Duration::ZERO,
            deduplicate_interval: Duration::ZERO,
            limit_max: None,
            timer: None,
        }
    }
}

impl PerformerBuilder {
    /// Default debounce window (default: zero).
    pub fn with_debounce_interval(mut self, interval: Duration) -> Self {
        self.debounce_interval = interval;
        self
    }

    /// Default throttle cooldown (default: zero).
    pub fn with_throttle_interval(mut self, interval: Duration) -> Self {
        self.throttle_interval = interval;
        self
    }

    /// Default deduplication window (default: zero).
    pub fn with_deduplicate_interval(mut self, interval: Duration) -> Self {
        self.deduplicate_interval = interval;
        self
    }

    /// Default per-target call budget (default: unbounded).
    pub fn with_limit_max(mut self, max: u64) -> Self {
        self.limit_max = Some(max);
        self
    }

    /// Timer service backing all scheduled windows (default: a dedicated
    /// [`ThreadTimer`]). Inject a `MockTimer` for deterministic tests.
    pub fn with_timer(mut self, timer: Arc<dyn TimerService>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Validate the configuration and build the performer.
    ///
    /// # Errors
    /// Returns [`ConfigError::IntervalTooLong`] if any interval exceeds
    /// the timer delay cap.
    pub fn build(self) -> Result<Performer, ConfigError> {
        validate_interval("debounce", self.debounce_interval)?;
        validate_interval("throttle", self.throttle_interval)?;
        validate_interval("deduplicate", self.deduplicate_interval)?;
        Ok(self.build_unchecked())
    }

    // Defaults are valid by construction, so `Performer::new` can skip
    // validation.
    fn build_unchecked(self) -> Performer {
        let timer: Arc<dyn TimerService> = self
            .timer
            .unwrap_or_else(|| Arc::new(ThreadTimer::new()));
        let metrics = Metrics::new();

        Performer {
            debounce: Debounce::new(
                Arc::clone(&timer),
                metrics.clone(),
                self.debounce_interval,
            ),
            throttle: Throttle::new(
                Arc::clone(&timer),
                metrics.clone(),
                self.throttle_interval,
            ),
            deduplicate: Deduplicate::new(
                Arc::clone(&timer),
                metrics.clone(),
                self.deduplicate_interval,
            ),
            limit: Limit::new(metrics.clone(), self.limit_max),
            metrics,
        }
    }
}

impl std::fmt::Debug for PerformerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformerBuilder")
            .field("debounce_interval", &self.debounce_interval)
            .field("throttle_interval", &self.throttle_interval)
            .field("deduplicate_interval", &self.deduplicate_interval)
            .field("limit_max", &self.limit_max)
            .field("timer", &self.timer.as_ref().map(|_| "<custom>"))
            .finish()
    }
}
