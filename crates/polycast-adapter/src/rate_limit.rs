// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window request budget for a single adapter.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use polycast_config::RateLimitConfig;
use polycast_core::RateLimitInfo;
use tokio::time::Instant;
use tracing::debug;

struct Window {
    started: Instant,
    used: u32,
}

/// Admits at most `limit` calls per `window`.
///
/// Check and consume happen under one lock, so two concurrent callers can
/// never both take the last slot.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    state: Mutex<Window>,
    last_rejection: Mutex<Option<RateLimitInfo>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(Window {
                started: Instant::now(),
                used: 0,
            }),
            last_rejection: Mutex::new(None),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests, config.window())
    }

    /// Take one slot, or describe when the next one frees up.
    pub fn try_acquire(&self) -> Result<(), RateLimitInfo> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        let elapsed = now.duration_since(state.started);
        if elapsed >= self.window {
            state.started = now;
            state.used = 0;
        }

        if state.used < self.limit {
            state.used += 1;
            return Ok(());
        }

        let retry_after = self
            .window
            .saturating_sub(now.duration_since(state.started));
        let info = RateLimitInfo {
            limit: self.limit,
            remaining: 0,
            reset_at: Utc::now()
                + chrono::Duration::from_std(retry_after).unwrap_or_else(|_| chrono::Duration::zero()),
            retry_after,
        };
        debug!(limit = self.limit, ?retry_after, "rate limit exceeded");
        drop(state);

        *self
            .last_rejection
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(info.clone());
        Err(info)
    }

    /// Slots left in the current window.
    pub fn remaining(&self) -> u32 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.started.elapsed() >= self.window {
            self.limit
        } else {
            self.limit.saturating_sub(state.used)
        }
    }

    /// The snapshot captured by the most recent rejection.
    pub fn last_rejection(&self) -> Option<RateLimitInfo> {
        self.last_rejection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("remaining", &self.remaining())
            .finish()
    }
}
