//! Poll interval and deadline

use std::time::Duration;

/// Default interval between checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default deadline for a resource to become Running
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default deadline for each teardown wait
pub const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Fixed-interval poll bounded by a deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl WaitPolicy {
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Policy for waiting on provisioning
    pub const fn readiness() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_READINESS_TIMEOUT)
    }

    /// Policy for waiting on teardown steps
    pub const fn teardown() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_TEARDOWN_TIMEOUT)
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::readiness()
    }
}
