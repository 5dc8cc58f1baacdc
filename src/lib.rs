//! # performer
//!
//! Call-shaping strategies for over-eager callers: debounce, throttle,
//! deduplicate, and limit, keyed by callable identity.
//!
//! Each strategy decides, per target function, whether an incoming call
//! runs now, runs later, merges into an earlier call, or is dropped.
//! Strategies are independent registries sharing one timer service and one
//! metrics sink, tied together by the [`Performer`] facade.
//!
//! ## Quick Start
//!
//! ```rust
//! use performer::{args, MockTimer, Performer, Recorder};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! // A MockTimer makes timing deterministic; drop `.with_timer(..)` in
//! // production to get a thread-backed timer.
//! let timer = MockTimer::new();
//! let performer = Performer::builder()
//!     .with_debounce_interval(Duration::from_millis(100))
//!     .with_throttle_interval(Duration::from_millis(100))
//!     .with_timer(Arc::new(timer.clone()))
//!     .build()
//!     .unwrap();
//!
//! let recorder = Recorder::new();
//! let target = recorder.target();
//!
//! // Debounce: a burst collapses to the last call, fired after the
//! // interval of quiet.
//! performer.debounce(&target, args!["draft 1"]);
//! performer.debounce(&target, args!["draft 2"]);
//! performer.debounce(&target, args!["final"]);
//! timer.advance(Duration::from_millis(100));
//! assert_eq!(recorder.calls(), vec![args!["final"]]);
//!
//! // Throttle: first call runs immediately, the rest of the window drops.
//! performer.throttle(&target, args!["click"]);
//! performer.throttle(&target, args!["click again"]);
//! assert_eq!(recorder.count(), 2);
//! assert_eq!(recorder.last(), Some(args!["click"]));
//! ```
//!
//! ## Strategies
//!
//! - **Debounce**: coalesce a burst into one trailing-edge call carrying
//!   the most recent arguments.
//! - **Throttle**: run the first call of each cooldown window, drop the
//!   rest.
//! - **Deduplicate**: merge calls with deeply equal arguments inside a
//!   window into one call, with the repeat count prepended as the first
//!   argument.
//! - **Limit**: admit at most N calls per target over its lifetime.
//!
//! ## Target Identity
//!
//! All per-callable state is keyed by [`Target`] identity, which is the
//! identity of the shared allocation, not the code: two targets built from
//! byte-identical closures are shaped independently, while clones of one
//! target share state. See [`Target`] for details.
//!
//! ## Reconfiguration
//!
//! Every strategy handle exposes `configure`, returning a new handle over
//! an override interval (or budget) that shares the same registry and
//! metrics. Defaults fixed at build time are never mutated:
//!
//! ```rust
//! use performer::{args, MockTimer, Performer, Recorder};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let timer = MockTimer::new();
//! let performer = Performer::builder()
//!     .with_debounce_interval(Duration::from_millis(100))
//!     .with_timer(Arc::new(timer.clone()))
//!     .build()
//!     .unwrap();
//!
//! let slow = performer.debouncer().configure(Duration::from_millis(500)).unwrap();
//! let recorder = Recorder::new();
//! let target = recorder.target();
//!
//! slow.call(&target, args![1]);
//! timer.advance(Duration::from_millis(100));
//! assert_eq!(recorder.count(), 0); // override window still open
//! timer.advance(Duration::from_millis(400));
//! assert_eq!(recorder.count(), 1);
//! ```
//!
//! ## Features
//!
//! - `async`: [`TokioTimer`], a timer service running windows as Tokio
//!   tasks instead of on a dedicated thread.
//! - `serde`: `Serialize`/`Deserialize` for [`ArgValue`] and
//!   [`MetricsSnapshot`].

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::config::ConfigError;
pub use application::debounce::Debounce;
pub use application::deduplicate::Deduplicate;
pub use application::limit::Limit;
pub use application::metrics::{Metrics, MetricsSnapshot};
pub use application::performer::{Performer, PerformerBuilder};
pub use application::ports::{TimerCallback, TimerHandle, TimerService, MAX_DELAY};
pub use application::throttle::Throttle;
pub use domain::target::{Target, TargetFn};
pub use domain::value::{args_eq, ArgValue};
pub use infrastructure::mocks::{MockTimer, Recorder};
pub use infrastructure::storage::ShardedStorage;
pub use infrastructure::timer::ThreadTimer;

#[cfg(feature = "async")]
pub use infrastructure::async_timer::TokioTimer;
