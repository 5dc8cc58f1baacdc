//! Mock implementations for testing.
//!
//! These are compiled into the library proper (not gated behind a test
//! feature) so downstream crates and this crate's integration tests can
//! drive the strategies deterministically.

pub mod recorder;
pub mod timer;

pub use recorder::Recorder;
pub use timer::MockTimer;
