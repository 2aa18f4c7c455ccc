// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Retry policies for read-only fetches.
//!
//! Appends and contract binds never go through here: a retried append can
//! store the record twice.

use std::time::Duration;

use crate::errors::AnchorError;

pub trait RetryPolicy: Send + Sync {
    /// Delay before the next attempt after `attempt` (1-based) failed with
    /// `error`, or `None` to give up.
    fn next_delay(&self, attempt: u32, error: &AnchorError) -> Option<Duration>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn next_delay(&self, _attempt: u32, _error: &AnchorError) -> Option<Duration> {
        None
    }
}

/// Retry transient errors up to `max_attempts` total, sleeping `delay`
/// between attempts.
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl FixedBackoff {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

impl RetryPolicy for FixedBackoff {
    fn next_delay(&self, attempt: u32, error: &AnchorError) -> Option<Duration> {
        if error.is_transient() && attempt < self.max_attempts {
            Some(self.delay)
        } else {
            None
        }
    }
}

/// Run `op` until it succeeds or `policy` gives up.
pub fn with_retry<T, F>(policy: &dyn RetryPolicy, what: &str, mut op: F) -> Result<T, AnchorError>
where
    F: FnMut() -> Result<T, AnchorError>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => match policy.next_delay(attempt, &e) {
                Some(delay) => {
                    tracing::warn!(attempt, ?delay, "{} failed, retrying: {}", what, e);
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                None => return Err(e),
            },
        }
    }
}
