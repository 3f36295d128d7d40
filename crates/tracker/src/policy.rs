//! Tunable policy values.
//!
//! Centralizes the timing constants and sentinel values the engines use.

use crate::retry::RetryPolicy;
use std::time::Duration;

/// Retry used to resolve a freshly launched application's reaper.
pub const RESOLVE_RETRY: RetryPolicy = RetryPolicy::fixed(6, Duration::from_millis(100));

/// One focus decision per window; only the latest event in a window counts.
pub const FOCUS_THROTTLE_WINDOW: Duration = Duration::from_millis(500);

/// Delay between a stop notification and reconciling against the process list.
pub const STOP_GRACE_DELAY: Duration = Duration::from_millis(500);

/// App id the host reports when its own overlay has focus.
pub const OVERLAY_APP_ID: &str = "769";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(RESOLVE_RETRY.max_attempts, 6);
        assert_eq!(RESOLVE_RETRY.interval, Duration::from_millis(100));
        assert!(FOCUS_THROTTLE_WINDOW.as_millis() > 0);
        assert!(STOP_GRACE_DELAY.as_millis() > 0);
    }
}
