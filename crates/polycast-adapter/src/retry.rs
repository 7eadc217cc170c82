// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry of transient hook failures.

use std::future::Future;
use std::time::Duration;

use polycast_config::{Backoff, RetryConfig};
use polycast_core::PolycastError;
use tracing::debug;

/// How often and how patiently a failed hook call is repeated.
///
/// Only errors for which [`PolycastError::is_transient`] holds are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            attempts: 0,
            delay: Duration::ZERO,
            backoff: Backoff::Fixed,
        }
    }

    pub fn from_config(config: Option<&RetryConfig>) -> Self {
        match config {
            Some(c) => Self {
                attempts: c.attempts,
                delay: Duration::from_millis(c.delay_ms),
                backoff: c.backoff,
            },
            None => Self::none(),
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let retry = retry.max(1);
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Linear => self.delay.saturating_mul(retry),
            Backoff::Exponential => {
                let factor = 2u32.checked_pow(retry - 1).unwrap_or(u32::MAX);
                self.delay.saturating_mul(factor)
            }
        }
    }

    /// Run `call`, repeating it while it fails transiently and retries remain.
    pub async fn run<F, Fut, T>(&self, mut call: F) -> Result<T, PolycastError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PolycastError>>,
    {
        let mut retry = 0;
        loop {
            match call().await {
                Err(err) if err.is_transient() && retry < self.attempts => {
                    retry += 1;
                    let delay = self.delay_for(retry);
                    debug!(retry, ?delay, error = %err, "retrying transient failure");
                    tokio::time::sleep(delay).await;
                }
                outcome => return outcome,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
