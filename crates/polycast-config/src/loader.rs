// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./polycast.toml` > `~/.config/polycast/polycast.toml`
//! > `/etc/polycast/polycast.toml` with environment variable overrides via the
//! `POLYCAST_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PolycastConfig;

pub(crate) const LOCAL_CONFIG: &str = "polycast.toml";
pub(crate) const SYSTEM_CONFIG: &str = "/etc/polycast/polycast.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/polycast/polycast.toml` (system-wide)
/// 3. `~/.config/polycast/polycast.toml` (user XDG config)
/// 4. `./polycast.toml` (local directory)
/// 5. `POLYCAST_*` environment variables
pub fn load_config() -> Result<PolycastConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PolycastConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PolycastConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PolycastConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PolycastConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Config files in merge order: system, per-user, then the working directory.
pub(crate) fn config_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from(SYSTEM_CONFIG)];
    if let Some(dir) = dirs::config_dir() {
        files.push(dir.join("polycast").join(LOCAL_CONFIG));
    }
    files.push(PathBuf::from(LOCAL_CONFIG));
    files
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    let base = Figment::new().merge(Serialized::defaults(PolycastConfig::default()));
    config_files()
        .into_iter()
        .fold(base, |figment, file| figment.merge(Toml::file(file)))
        .merge(env_provider())
}

/// Environment provider splitting nested keys on a double underscore.
///
/// Single underscores belong to key names, so `POLYCAST_MANAGER__AUTH_TIMEOUT_MS`
/// maps to `manager.auth_timeout_ms` and
/// `POLYCAST_ADAPTERS__MAIN__AUTH__CREDENTIALS__API_KEY` to
/// `adapters.main.auth.credentials.api_key`. `POLYCAST_LOG` is the log
/// filter, not a configuration key.
fn env_provider() -> Env {
    Env::prefixed("POLYCAST_").ignore(&["LOG"]).split("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn local_file_and_env_are_layered() {
        Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG,
                r#"
[manager]
log_level = "debug"

[adapters.gh]
platform = "github"
name = "GitHub"
version = "1.0.0"
"#,
            )?;
            jail.set_env("POLYCAST_MANAGER__AUTH_TIMEOUT_MS", "5000");
            jail.set_env("POLYCAST_ADAPTERS__GH__AUTH__TYPE", "bearer");
            jail.set_env("POLYCAST_ADAPTERS__GH__AUTH__CREDENTIALS__TOKEN", "ghp_x");

            let config = load_config()?;
            assert_eq!(config.manager.log_level, "debug");
            assert_eq!(config.manager.auth_timeout_ms, 5000);
            let gh = &config.adapters["gh"];
            assert_eq!(gh.credential("token"), Some("ghp_x"));
            Ok(())
        });
    }

    #[test]
    fn from_path_reads_only_that_file() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[manager]\nlog_level = \"warn\"\n")?;
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.manager.log_level, "warn");
            Ok(())
        });
    }

    #[test]
    fn log_filter_variable_is_not_a_key() {
        Jail::expect_with(|jail| {
            jail.set_env("POLYCAST_LOG", "polycast=trace");
            let config = load_config()?;
            assert_eq!(config.manager.log_level, "info");
            Ok(())
        });
    }
}
