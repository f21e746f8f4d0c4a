//! Bounded retry around another sink.

use crate::core::summary::Summary;
use crate::error::SinkError;
use crate::sink::SummarySink;
use std::time::Duration;

/// How many times to try a write and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait before the second attempt
    pub initial_backoff: Duration,
    /// Growth factor applied to the wait after every failure (1.0 = fixed)
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Fixed delay between attempts.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff: delay,
            multiplier: 1.0,
        }
    }

    /// Wait before attempt number `attempt` (1-based; the first attempt never waits).
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = self.multiplier.max(1.0).powi(attempt as i32 - 2);
        self.initial_backoff.mul_f64(factor)
    }
}

/// Retries failed writes according to a [`RetryPolicy`].
///
/// The error of the last attempt is surfaced wrapped in
/// [`SinkError::RetriesExhausted`].
pub struct RetryingSink<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: SummarySink> RetryingSink<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: SummarySink> SummarySink for RetryingSink<S> {
    fn write(&mut self, summary: &Summary) -> Result<(), SinkError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.inner.write(summary) {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= attempts => {
                    return Err(SinkError::RetriesExhausted {
                        attempts,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    attempt += 1;
                    let wait = self.policy.backoff(attempt);
                    tracing::warn!(
                        "Sink write for summary {} failed ({}), retrying in {:?}",
                        summary.sequence,
                        e,
                        wait
                    );
                    std::thread::sleep(wait);
                }
            }
        }
    }
}
