// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Polycast integration tests.
//!
//! Provides spy hooks and config builders for fast, deterministic tests
//! without external services.
//!
//! # Components
//!
//! - [`SpyHooks`] - `PlatformHooks` implementation with call counting and fault injection
//! - [`spy_config`] / [`spy_config_without_credentials`] - minimal valid adapter configs

pub mod spy_hooks;

pub use spy_hooks::{SpyHandle, SpyHooks};

use polycast_config::{AdapterConfig, AuthKind};
use polycast_core::PlatformType;

/// A valid bearer-token config named `name`.
pub fn spy_config(platform: PlatformType, name: &str) -> AdapterConfig {
    AdapterConfig::new(platform, name, AuthKind::Bearer).with_credential("token", "test-token")
}

/// Like [`spy_config`] but with an empty credential map, so the manager skips
/// authentication.
pub fn spy_config_without_credentials(platform: PlatformType, name: &str) -> AdapterConfig {
    AdapterConfig::new(platform, name, AuthKind::Bearer)
}
