//! Reconciliation waiter
//!
//! The resource-management API never pushes readiness, so every provider
//! blocks on the same bounded poll: fetch, evaluate, sleep a fixed interval,
//! repeat until the check succeeds or the deadline passes.
//!
//! Errors returned by a check count as "not ready yet". The only failure a
//! caller ever sees is `Error::ReadinessTimeout`.
//!
//! # Example
//!
//! ```rust,no_run
//! use dbroker_core::waiter::{poll_until, WaitPolicy};
//!
//! async fn example() -> dbroker_core::Result<()> {
//!     let policy = WaitPolicy::readiness();
//!     poll_until(&policy, "redis to be Running", || async {
//!         Ok::<_, std::io::Error>(true)
//!     })
//!     .await
//! }
//! ```

mod observer;
mod policy;

pub use observer::{StatsObserver, TracingObserver, WaitObserver};
pub use policy::WaitPolicy;

use crate::error::{Error, Result};
use std::fmt::Display;
use std::future::Future;
use tokio::time::Instant;

/// Poll until `check` yields a value, returning it
pub async fn poll_for<T, E, F, Fut>(policy: &WaitPolicy, what: &str, check: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Option<T>, E>>,
    E: Display,
{
    poll_for_observed(policy, what, &TracingObserver, check).await
}

/// Poll until `check` reports true
pub async fn poll_until<E, F, Fut>(policy: &WaitPolicy, what: &str, mut check: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<bool, E>>,
    E: Display,
{
    poll_for(policy, what, || {
        let fut = check();
        async move { fut.await.map(|ready| ready.then_some(())) }
    })
    .await
}

/// `poll_for` with an explicit observer
pub async fn poll_for_observed<T, E, F, Fut>(
    policy: &WaitPolicy,
    what: &str,
    observer: &dyn WaitObserver,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Option<T>, E>>,
    E: Display,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;

    let outcome = tokio::time::timeout(policy.timeout, async {
        loop {
            attempts += 1;
            let failure = match check().await {
                Ok(Some(value)) => return value,
                Ok(None) => None,
                Err(err) => Some(err.to_string()),
            };
            observer.on_not_ready(what, attempts, failure.as_deref());
            tokio::time::sleep(policy.interval).await;
        }
    })
    .await;

    match outcome {
        Ok(value) => {
            observer.on_ready(what, attempts, start.elapsed());
            Ok(value)
        }
        Err(_) => {
            observer.on_timeout(what, attempts, policy.timeout);
            Err(Error::ReadinessTimeout {
                what: what.to_string(),
                timeout: policy.timeout,
            })
        }
    }
}
