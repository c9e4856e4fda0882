//! Wait observation and logging
//!
//! `WaitObserver` receives a callback for every poll outcome.
//! `TracingObserver` is what the providers use.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Observer trait for poll events
pub trait WaitObserver: Send + Sync {
    /// A check ran and the condition does not hold yet
    ///
    /// # Arguments
    ///
    /// * `what` - Description of the awaited condition
    /// * `attempt` - The check number (1-indexed)
    /// * `error` - The check's error, when it failed rather than reported false
    fn on_not_ready(&self, what: &str, attempt: u32, error: Option<&str>);

    /// The condition holds
    fn on_ready(&self, what: &str, attempts: u32, elapsed: Duration);

    /// The deadline passed
    fn on_timeout(&self, what: &str, attempts: u32, timeout: Duration);
}

/// Observer that logs through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl WaitObserver for TracingObserver {
    fn on_not_ready(&self, what: &str, attempt: u32, error: Option<&str>) {
        match error {
            Some(err) => debug!("Waiting for {} (check {} failed: {})", what, attempt, err),
            None => debug!("Waiting for {} (check {})", what, attempt),
        }
    }

    fn on_ready(&self, what: &str, attempts: u32, elapsed: Duration) {
        debug!(
            "Done waiting for {} after {} checks in {:.1}s",
            what,
            attempts,
            elapsed.as_secs_f64()
        );
    }

    fn on_timeout(&self, what: &str, attempts: u32, timeout: Duration) {
        warn!(
            "Gave up waiting for {} after {} checks ({}s)",
            what,
            attempts,
            timeout.as_secs()
        );
    }
}

/// Observer that counts events
#[derive(Debug, Default)]
pub struct StatsObserver {
    not_ready: AtomicU32,
    failed_checks: AtomicU32,
    ready: AtomicU32,
    timeouts: AtomicU32,
}

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that did not find the condition (including failed ones)
    pub fn not_ready(&self) -> u32 {
        self.not_ready.load(Ordering::SeqCst)
    }

    /// Checks that returned an error
    pub fn failed_checks(&self) -> u32 {
        self.failed_checks.load(Ordering::SeqCst)
    }

    pub fn ready(&self) -> u32 {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn timeouts(&self) -> u32 {
        self.timeouts.load(Ordering::SeqCst)
    }
}

impl WaitObserver for StatsObserver {
    fn on_not_ready(&self, _what: &str, _attempt: u32, error: Option<&str>) {
        self.not_ready.fetch_add(1, Ordering::SeqCst);
        if error.is_some() {
            self.failed_checks.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn on_ready(&self, _what: &str, _attempts: u32, _elapsed: Duration) {
        self.ready.fetch_add(1, Ordering::SeqCst);
    }

    fn on_timeout(&self, _what: &str, _attempts: u32, _timeout: Duration) {
        self.timeouts.fetch_add(1, Ordering::SeqCst);
    }
}
