//! Retrying failed creates and completes with exponential backoff.
//!
//! Only [`SyncError::is_transient`] errors are retried; a rejected action
//! fails on the first attempt.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use super::{Applier, SyncError, SyncResult};
use crate::model::{DesiredItem, ObservedItem};

/// Backoff schedule for applying changes.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = never retry)
    pub max_attempts: u32,
    /// Wait before the first retry; doubled for each one after
    pub initial_delay: Duration,
    /// Upper bound on any single wait
    pub max_delay: Duration,
    /// Stretch each wait by up to a quarter
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Wait before retry number `retry`, counting from 1.
    pub fn backoff(&self, retry: u32) -> Duration {
        let doublings = retry.saturating_sub(1).min(31);
        let delay = self.initial_delay.saturating_mul(1 << doublings).min(self.max_delay);

        if self.jitter {
            delay.mul_f64(1.0 + clock_jitter() * 0.25)
        } else {
            delay
        }
    }
}

/// A value in `0.0..1.0` taken from the clock's sub-second nanos.
fn clock_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    f64::from(nanos % 1000) / 1000.0
}

/// Run `operation` until it succeeds, fails with a permanent error, or the
/// retries run out. Returns the last result and the number of attempts.
pub async fn retry_async<T, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> (SyncResult<T>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SyncResult<T>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match operation().await {
            Err(error) if error.is_transient() && attempts <= config.max_attempts => {
                let wait = config.backoff(attempts);
                tracing::debug!(attempt = attempts, error = %error, ?wait, "Retrying");
                tokio::time::sleep(wait).await;
            }
            result => return (result, attempts),
        }
    }
}

/// Wraps an [`Applier`] so transient failures are retried before they are
/// reported.
pub struct RetryingApplier<A> {
    inner: A,
    config: RetryConfig,
}

impl<A: Applier> RetryingApplier<A> {
    pub fn new(inner: A, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: Applier> Applier for RetryingApplier<A> {
    async fn create(&self, item: &DesiredItem) -> SyncResult<ObservedItem> {
        let (result, attempts) = retry_async(&self.config, || self.inner.create(item)).await;
        if attempts > 1 {
            tracing::debug!(item = %item, attempts, ok = result.is_ok(), "Retried create");
        }
        result
    }

    async fn complete(&self, item: &ObservedItem) -> SyncResult<()> {
        let (result, attempts) = retry_async(&self.config, || self.inner.complete(item)).await;
        if attempts > 1 {
            tracing::debug!(item = %item, attempts, ok = result.is_ok(), "Retried complete");
        }
        result
    }
}
