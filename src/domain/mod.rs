//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts of call shaping:
//! - Argument values and deep structural equality
//! - Callable identity used to key all per-target state
//!
//! All types in this layer are pure and easily testable.

pub mod target;
pub mod value;
