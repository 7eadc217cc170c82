// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter lifecycle and operation pipeline.
//!
//! An [`Adapter`] wraps a platform collaborator's [`PlatformHooks`] and owns
//! everything the collaborator should not have to care about: lifecycle
//! state, the local rate limiter, the capability gate, content validation,
//! retry of transient failures, and event emission.
//!
//! [`PlatformHooks`]: polycast_core::PlatformHooks

pub mod adapter;
pub mod rate_limit;
pub mod retry;
pub mod state;
pub mod validation;

pub use adapter::{Adapter, DEFAULT_AUTH_TIMEOUT};
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
pub use state::{AdapterStatus, LifecycleState};
