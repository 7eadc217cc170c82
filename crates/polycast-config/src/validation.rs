// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express: mandatory adapter
//! identity fields, positive rate-limit windows, and well-formed base URLs.

use crate::diagnostic::ConfigError;
use crate::model::{AdapterConfig, PolycastConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or every collected error.
pub fn validate_config(config: &PolycastConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.manager.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "manager.log_level `{}` must be one of {}",
                config.manager.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.manager.auth_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "manager.auth_timeout_ms must be greater than 0".to_string(),
        });
    }

    for (key, adapter) in &config.adapters {
        validate_adapter(key, adapter, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one `[adapters.<key>]` table, appending to `errors`.
pub fn validate_adapter(key: &str, adapter: &AdapterConfig, errors: &mut Vec<ConfigError>) {
    if key.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "adapter registry names must not be empty".to_string(),
        });
    }

    for field in adapter.missing_fields() {
        errors.push(ConfigError::Validation {
            message: format!("adapters.{key}.{field} is required"),
        });
    }

    if let Some(limit) = adapter.rate_limit {
        if limit.requests == 0 {
            errors.push(ConfigError::Validation {
                message: format!("adapters.{key}.rate_limit.requests must be greater than 0"),
            });
        }
        if limit.window_ms == 0 {
            errors.push(ConfigError::Validation {
                message: format!("adapters.{key}.rate_limit.window_ms must be greater than 0"),
            });
        }
    }

    if let Some(base_url) = adapter.settings.get("base_url") {
        let valid = base_url
            .as_str()
            .is_some_and(|url| url.starts_with("http://") || url.starts_with("https://"));
        if !valid {
            errors.push(ConfigError::Validation {
                message: format!(
                    "adapters.{key}.settings.base_url must be an http(s) URL, got {base_url}"
                ),
            });
        }
    }
}
