// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter factory: turns configuration into ready-to-register adapters.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use polycast_adapter::{Adapter, DEFAULT_AUTH_TIMEOUT};
use polycast_config::{AdapterConfig, AuthKind, Backoff, RateLimitConfig, RetryConfig};
use polycast_core::{CapabilityDescriptor, PlatformType, PolycastError};
use tracing::{debug, info, warn};

/// Request budget applied when a platform publishes none.
pub const DEFAULT_RATE_LIMIT: RateLimitConfig = RateLimitConfig {
    requests: 100,
    window_ms: 60_000,
};

pub const DEFAULT_RETRY: RetryConfig = RetryConfig {
    attempts: 3,
    delay_ms: 1000,
    backoff: Backoff::Exponential,
};

/// Outcome of [`AdapterFactory::create_adapters_from_config`].
#[derive(Default)]
pub struct BuildReport {
    /// Adapters that were built, keyed by registry name.
    pub adapters: Vec<(String, Adapter)>,
    /// Entries that could not be built.
    pub failures: Vec<(String, PolycastError)>,
    /// Entries with `enabled = false`.
    pub disabled: Vec<String>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl std::fmt::Debug for BuildReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildReport")
            .field(
                "adapters",
                &self.adapters.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("failures", &self.failures)
            .field("disabled", &self.disabled)
            .finish()
    }
}

/// Builds adapters for the closed set of built-in platforms.
#[derive(Debug, Clone, Copy)]
pub struct AdapterFactory {
    auth_timeout: Duration,
}

impl Default for AdapterFactory {
    fn default() -> Self {
        Self {
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
        }
    }
}

impl AdapterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound authentication of every adapter built by this factory.
    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Construct the adapter for `platform` from `config`. Performs no I/O.
    ///
    /// A config without a platform tag is bound to `platform`; one naming a
    /// different platform is rejected.
    pub fn create_adapter(
        &self,
        platform: PlatformType,
        mut config: AdapterConfig,
    ) -> Result<Adapter, PolycastError> {
        match config.platform {
            Some(configured) if configured != platform => {
                return Err(PolycastError::Config(format!(
                    "adapter `{}` is configured for {configured}, not {platform}",
                    config.name
                )));
            }
            Some(_) => {}
            None => config.platform = Some(platform),
        }
        let hooks = polycast_platforms::build_hooks(platform, &config)?;
        let adapter = Adapter::new(config, hooks)?.with_auth_timeout(self.auth_timeout);
        debug!(adapter = %adapter.name(), %platform, "adapter constructed");
        Ok(adapter)
    }

    /// [`create_adapter`](Self::create_adapter) for a platform given by name.
    pub fn create_adapter_named(
        &self,
        platform: &str,
        config: AdapterConfig,
    ) -> Result<Adapter, PolycastError> {
        let platform = PlatformType::from_str(platform)
            .map_err(|_| PolycastError::Config(format!("unknown platform `{platform}`")))?;
        self.create_adapter(platform, config)
    }

    /// Generic defaults overlaid with the platform's auth kind and published
    /// rate limit. Credentials are left empty.
    pub fn default_config(platform: PlatformType) -> AdapterConfig {
        let profile = polycast_platforms::profile(platform);
        let auth = profile.map_or(AuthKind::Bearer, |p| p.auth);
        let mut config = AdapterConfig::new(platform, platform.to_string(), auth);
        config.rate_limit = Some(profile.map_or(DEFAULT_RATE_LIMIT, |p| RateLimitConfig {
            requests: p.rate_limit_requests,
            window_ms: p.rate_limit_window_ms,
        }));
        config.retry = Some(DEFAULT_RETRY);
        config
    }

    /// Whether `config` names a built-in platform, has every mandatory field,
    /// and carries the credentials that platform needs. Each problem is
    /// logged at debug level.
    pub fn validate_config(config: &AdapterConfig) -> bool {
        let mut valid = true;
        for field in config.missing_fields() {
            debug!(adapter = %config.name, field, "mandatory field missing");
            valid = false;
        }
        let Some(platform) = config.platform else {
            return false;
        };
        if !platform.is_builtin() {
            debug!(adapter = %config.name, %platform, "platform has no built-in collaborator");
            return false;
        }
        for key in polycast_platforms::missing_credentials(platform, config) {
            debug!(adapter = %config.name, %platform, credential = key, "credential missing");
            valid = false;
        }
        valid
    }

    /// Validate, then construct.
    pub fn create_validated_adapter(&self, config: AdapterConfig) -> Result<Adapter, PolycastError> {
        let Some(platform) = config.platform.filter(|_| Self::validate_config(&config)) else {
            let platform = config
                .platform
                .map_or_else(|| "unknown platform".to_string(), |p| p.to_string());
            return Err(PolycastError::Config(format!(
                "invalid {platform} configuration for adapter `{}`",
                config.name
            )));
        };
        self.create_adapter(platform, config)
    }

    /// Build every enabled adapter in `adapters`, keyed by registry name.
    ///
    /// Failures do not stop the batch; they are logged and reported.
    pub fn create_adapters_from_config(
        &self,
        adapters: &BTreeMap<String, AdapterConfig>,
    ) -> BuildReport {
        let mut report = BuildReport::default();
        for (key, config) in adapters {
            if !config.enabled {
                debug!(adapter = %key, "adapter disabled, skipping");
                report.disabled.push(key.clone());
                continue;
            }
            let mut config = config.clone();
            if config.name.trim().is_empty() {
                config.name = key.clone();
            }
            match self.create_validated_adapter(config) {
                Ok(adapter) => report.adapters.push((key.clone(), adapter)),
                Err(err) => {
                    warn!(adapter = %key, error = %err, "skipping adapter");
                    report.failures.push((key.clone(), err));
                }
            }
        }
        info!(
            built = report.adapters.len(),
            failed = report.failures.len(),
            disabled = report.disabled.len(),
            "adapters built from configuration"
        );
        report
    }

    /// Capability descriptor of `platform`, read from a throwaway instance
    /// with empty credentials.
    pub fn platform_capabilities(platform: PlatformType) -> Result<CapabilityDescriptor, PolycastError> {
        let config = Self::default_config(platform);
        let hooks = polycast_platforms::build_hooks(platform, &config)?;
        Ok(hooks.capabilities())
    }
}
