// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter lifecycle state and status snapshots.

use polycast_core::{PlatformType, RateLimitInfo};
use serde::Serialize;
use strum::Display;

/// Where an adapter is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum LifecycleState {
    Uninitialized = 0,
    Initialized = 1,
    Authenticated = 2,
    Disconnected = 3,
}

impl LifecycleState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => LifecycleState::Initialized,
            2 => LifecycleState::Authenticated,
            3 => LifecycleState::Disconnected,
            _ => LifecycleState::Uninitialized,
        }
    }

    /// Initialized or authenticated.
    pub fn is_ready(self) -> bool {
        matches!(
            self,
            LifecycleState::Initialized | LifecycleState::Authenticated
        )
    }
}

/// Point-in-time view of one adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterStatus {
    pub name: String,
    pub platform: PlatformType,
    pub state: LifecycleState,
    pub enabled: bool,
    pub authenticated: bool,
    pub monitoring: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_rate_limit: Option<RateLimitInfo>,
}
