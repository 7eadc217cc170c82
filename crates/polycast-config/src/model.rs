// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Polycast.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;
use std::time::Duration;

use polycast_core::PlatformType;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Polycast configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolycastConfig {
    /// Manager-wide settings.
    #[serde(default)]
    pub manager: ManagerConfig,

    /// Adapters keyed by registry name, from `[adapters.<name>]` tables.
    #[serde(default)]
    pub adapters: BTreeMap<String, AdapterConfig>,
}

/// Manager-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ManagerConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on a single authentication attempt.
    #[serde(default = "default_auth_timeout_ms")]
    pub auth_timeout_ms: u64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            auth_timeout_ms: default_auth_timeout_ms(),
        }
    }
}

impl ManagerConfig {
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_auth_timeout_ms() -> u64 {
    30_000
}

/// How an adapter authenticates against its service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    Oauth1,
    Oauth2,
    Bearer,
    ApiKey,
    Basic,
}

/// Credentials block of an adapter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(rename = "type", default)]
    pub kind: Option<AuthKind>,

    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
}

/// Client-side request budget for one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Requests admitted per window.
    pub requests: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Delay growth between retries.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    Fixed,
    Linear,
    #[default]
    Exponential,
}

/// Retry policy for transient service failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the first attempt. Zero disables retrying.
    pub attempts: u32,
    /// Base delay in milliseconds.
    pub delay_ms: u64,
    #[serde(default)]
    pub backoff: Backoff,
}

/// Construction-time configuration of one adapter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterConfig {
    #[serde(default)]
    pub platform: Option<PlatformType>,

    /// Display name.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,

    #[serde(default)]
    pub retry: Option<RetryConfig>,

    /// Free-form collaborator settings (`base_url`, `subreddit`, ...).
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            platform: None,
            name: String::new(),
            version: String::new(),
            enabled: default_enabled(),
            auth: AuthConfig::default(),
            rate_limit: None,
            retry: None,
            settings: BTreeMap::new(),
        }
    }
}

impl AdapterConfig {
    /// A config with the mandatory identity fields filled in.
    pub fn new(platform: PlatformType, name: impl Into<String>, auth: AuthKind) -> Self {
        Self {
            platform: Some(platform),
            name: name.into(),
            version: "1.0.0".to_string(),
            auth: AuthConfig {
                kind: Some(auth),
                credentials: BTreeMap::new(),
            },
            ..Self::default()
        }
    }

    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth.credentials.insert(key.into(), value.into());
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    pub fn credential(&self, key: &str) -> Option<&str> {
        self.auth
            .credentials
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(serde_json::Value::as_str)
    }

    /// Whether any credential has a non-blank value.
    pub fn has_credentials(&self) -> bool {
        self.auth.credentials.values().any(|v| !v.trim().is_empty())
    }

    /// Mandatory fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.platform.is_none() {
            missing.push("platform");
        }
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.version.trim().is_empty() {
            missing.push("version");
        }
        if self.auth.kind.is_none() {
            missing.push("auth.type");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_defaults() {
        let config = PolycastConfig::default();
        assert_eq!(config.manager.log_level, "info");
        assert_eq!(config.manager.auth_timeout(), Duration::from_secs(30));
        assert!(config.adapters.is_empty());
    }

    #[test]
    fn adapter_table_deserializes() {
        let toml_str = r#"
[adapters.main]
platform = "twitter"
name = "Main account"
version = "1.0.0"

[adapters.main.auth]
type = "oauth1"
credentials = { api_key = "k", api_secret = "s", access_token = "t", access_token_secret = "ts" }

[adapters.main.rate_limit]
requests = 300
window_ms = 900000

[adapters.main.retry]
attempts = 2
delay_ms = 500
backoff = "linear"

[adapters.main.settings]
base_url = "http://localhost:9000"
"#;
        let config: PolycastConfig = toml::from_str(toml_str).unwrap();
        let main = &config.adapters["main"];
        assert_eq!(main.platform, Some(PlatformType::Twitter));
        assert_eq!(main.auth.kind, Some(AuthKind::Oauth1));
        assert_eq!(main.credential("api_key"), Some("k"));
        assert!(main.enabled);
        assert_eq!(main.rate_limit.unwrap().window(), Duration::from_secs(900));
        assert_eq!(main.retry.unwrap().backoff, Backoff::Linear);
        assert_eq!(main.setting_str("base_url"), Some("http://localhost:9000"));
    }

    #[test]
    fn adapter_deny_unknown_fields() {
        let toml_str = r#"
[adapters.main]
platfrom = "twitter"
"#;
        assert!(toml::from_str::<PolycastConfig>(toml_str).is_err());
    }

    #[test]
    fn missing_fields_lists_every_gap() {
        let config = AdapterConfig::default();
        assert_eq!(
            config.missing_fields(),
            vec!["platform", "name", "version", "auth.type"]
        );
        let complete = AdapterConfig::new(PlatformType::Github, "gh", AuthKind::Bearer);
        assert!(complete.missing_fields().is_empty());
    }

    #[test]
    fn blank_credentials_are_absent() {
        let config = AdapterConfig::new(PlatformType::Slack, "s", AuthKind::Bearer)
            .with_credential("token", "");
        assert_eq!(config.credential("token"), None);
        assert!(!config.has_credentials());

        let config = config.with_credential("signing_secret", "  ").with_credential("app", "x");
        assert!(config.has_credentials());
    }

    #[test]
    fn auth_kind_uses_snake_case() {
        let kind: AuthKind = serde_json::from_str("\"api_key\"").unwrap();
        assert_eq!(kind, AuthKind::ApiKey);
        assert_eq!(AuthKind::Oauth2.to_string(), "oauth2");
    }
}
