//! Connection retry with exponential backoff

use std::time::Duration;

use backoff::ExponentialBackoffBuilder;

use crate::{Error, Result};

/// How long to keep retrying a connection.
///
/// Only errors reporting [`Error::is_transient`] are retried; anything
/// else (bad credentials, unknown host key) fails immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            max_elapsed: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            max_elapsed: Duration::ZERO,
        }
    }
}

pub fn connect_with_retry<B, F>(policy: &RetryPolicy, mut connect: F) -> Result<B>
where
    F: FnMut() -> Result<B>,
{
    let schedule = ExponentialBackoffBuilder::new()
        .with_initial_interval(policy.initial_interval)
        .with_max_interval(policy.max_interval)
        .with_max_elapsed_time(Some(policy.max_elapsed))
        .build();

    let mut attempt = 0u32;
    backoff::retry(schedule, || {
        attempt += 1;
        connect().map_err(|e| {
            if e.is_transient() {
                tracing::warn!(attempt, error = %e, "Connection attempt failed, retrying");
                backoff::Error::transient(e)
            } else {
                backoff::Error::permanent(e)
            }
        })
    })
    .map_err(|e| match e {
        backoff::Error::Permanent(err) => err,
        backoff::Error::Transient { err, .. } => err,
    })
}
