//! Strategy configuration validation.
//!
//! Intervals are `Duration`s and limits are `Option<u64>`, so negative and
//! NaN configurations are simply unrepresentable. What remains checkable -
//! delays beyond what timer backends can schedule - is rejected when a
//! `Performer` is built or a strategy is reconfigured, never at call time.

use crate::application::ports::MAX_DELAY;
use std::time::Duration;

/// Error returned when a strategy configuration is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Interval exceeds the maximum delay timer backends support.
    IntervalTooLong {
        /// Name of the strategy being configured
        strategy: &'static str,
        /// The rejected interval
        interval: Duration,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IntervalTooLong { strategy, interval } => {
                write!(
                    f,
                    "{} interval {:?} exceeds the maximum supported delay of {:?}",
                    strategy, interval, MAX_DELAY
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Check an interval against the timer delay cap.
pub(crate) fn validate_interval(
    strategy: &'static str,
    interval: Duration,
) -> Result<(), ConfigError> {
    if interval > MAX_DELAY {
        return Err(ConfigError::IntervalTooLong { strategy, interval });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_is_valid() {
        assert!(validate_interval("debounce", Duration::ZERO).is_ok());
    }

    #[test]
    fn test_max_delay_is_valid() {
        assert!(validate_interval("throttle", MAX_DELAY).is_ok());
    }

    #[test]
    fn test_over_cap_rejected() {
        let interval = MAX_DELAY + Duration::from_secs(1);
        let err = validate_interval("deduplicate", interval).unwrap_err();
        assert_eq!(
            err,
            ConfigError::IntervalTooLong {
                strategy: "deduplicate",
                interval,
            }
        );
        assert!(err.to_string().contains("deduplicate"));
    }
}
