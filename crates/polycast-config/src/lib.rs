// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Polycast.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use polycast_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! for (name, adapter) in &config.adapters {
//!     println!("{name}: {:?}", adapter.platform);
//! }
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AdapterConfig, AuthConfig, AuthKind, Backoff, ManagerConfig, PolycastConfig,
    RateLimitConfig, RetryConfig,
};

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<PolycastConfig, Vec<ConfigError>> {
    checked(loader::load_config(), existing_sources)
}

/// Load configuration from a specific TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<PolycastConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<PolycastConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Run semantic validation on a parsed config, or turn a parse failure into
/// diagnostics. Sources are only read when there is something to point at.
fn checked(
    parsed: Result<PolycastConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<PolycastConfig, Vec<ConfigError>> {
    let config = parsed.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    tracing::debug!(adapters = config.adapters.len(), "configuration loaded");
    Ok(config)
}

/// Contents of every standard config file that exists, keyed the way figment
/// names it in error metadata.
fn existing_sources() -> Vec<(String, String)> {
    loader::config_files()
        .iter()
        .filter_map(|file| {
            let resolved = if file.is_relative() {
                std::env::current_dir().ok()?.join(file)
            } else {
                file.clone()
            };
            read_source(&resolved)
        })
        .collect()
}

fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    Some((path.display().to_string(), content))
}
