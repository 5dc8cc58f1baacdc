//! Application layer - orchestration of domain logic.
//!
//! This layer holds the per-strategy registries and their state-transition
//! logic, the facade tying them together, and the metrics they report.
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details; the only port here is the timer service,
//! which is also the system's only time source.

pub mod config;
pub mod debounce;
pub mod deduplicate;
pub mod limit;
pub mod metrics;
pub mod performer;
pub mod ports;
pub mod throttle;
