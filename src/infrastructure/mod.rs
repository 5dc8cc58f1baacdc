//! Infrastructure layer - adapters and concrete backends.
//!
//! Holds the sharded storage backing the strategy registries, the timer
//! services implementing the application layer's timer port, and mock
//! adapters for testing.

pub mod mocks;
pub mod storage;
pub mod timer;

#[cfg(feature = "async")]
pub mod async_timer;
