// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Polycast adapters and the adapter manager.

use std::time::Duration;

use thiserror::Error;

use crate::capability::Operation;
use crate::types::PlatformType;

/// The error type shared by hooks, adapters, the factory, and the manager.
#[derive(Debug, Error)]
pub enum PolycastError {
    /// Malformed or incomplete adapter configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The operation's capability flag is false for this platform.
    #[error("{platform} does not permit {operation} (capability `{}` is disabled)", .operation.capability_flag())]
    CapabilityViolation {
        platform: PlatformType,
        operation: Operation,
    },

    /// The platform deliberately has no equivalent of this operation.
    #[error("{operation} is not supported by {platform}")]
    Unsupported {
        platform: PlatformType,
        operation: String,
    },

    /// Structurally invalid input, such as an empty content item.
    #[error("validation error: {0}")]
    Validation(String),

    /// The service call itself failed.
    #[error("platform error: {message}")]
    Platform {
        message: String,
        /// Retrying may succeed (throttling, 5xx, connection reset).
        transient: bool,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The adapter's local rate limiter rejected the call.
    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimitExceeded { retry_after: Duration },

    #[error("adapter not found: {name}")]
    AdapterNotFound { name: String },

    #[error("adapter already registered: {name}")]
    DuplicateAdapter { name: String },

    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("internal error: {0}")]
    Internal(String),
}

impl PolycastError {
    pub fn unsupported(platform: PlatformType, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            platform,
            operation: operation.into(),
        }
    }

    /// A permanent service failure.
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
            transient: false,
            source: None,
        }
    }

    /// A service failure worth retrying.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
            transient: true,
            source: None,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Platform { transient: true, .. })
    }

    /// Errors that a single-adapter write operation surfaces to its caller
    /// instead of folding into a failed [`ActionResult`](crate::ActionResult).
    pub fn escapes_pipeline(&self) -> bool {
        matches!(
            self,
            Self::CapabilityViolation { .. }
                | Self::Unsupported { .. }
                | Self::Validation(_)
                | Self::RateLimitExceeded { .. }
        )
    }
}
