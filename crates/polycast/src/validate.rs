// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `polycast validate` command implementation.
//!
//! The configuration has already been loaded and structurally validated by
//! the time this runs; here each adapter entry is checked against the
//! factory's rules without contacting any service.

use colored::Colorize;
use polycast_config::{AdapterConfig, PolycastConfig};
use polycast_core::PolycastError;
use polycast_plugin::AdapterFactory;
use serde::Serialize;

/// Validation outcome for one adapter entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterCheck {
    pub name: String,
    pub platform: Option<String>,
    pub enabled: bool,
    pub valid: bool,
    /// Mandatory fields and credentials that are absent.
    pub missing: Vec<&'static str>,
}

pub fn check_adapters(config: &PolycastConfig) -> Vec<AdapterCheck> {
    config
        .adapters
        .iter()
        .map(|(key, adapter)| check_adapter(key, adapter))
        .collect()
}

fn check_adapter(key: &str, adapter: &AdapterConfig) -> AdapterCheck {
    let mut adapter = adapter.clone();
    if adapter.name.trim().is_empty() {
        adapter.name = key.to_string();
    }
    let mut missing = adapter.missing_fields();
    if let Some(platform) = adapter.platform {
        missing.extend(polycast_platforms::missing_credentials(platform, &adapter));
    }
    AdapterCheck {
        name: key.to_string(),
        platform: adapter.platform.map(|p| p.to_string()),
        enabled: adapter.enabled,
        valid: AdapterFactory::validate_config(&adapter),
        missing,
    }
}

/// Print per-adapter validity. Fails when any enabled adapter is invalid.
pub fn run_validate(config: &PolycastConfig, json: bool, color: bool) -> Result<(), PolycastError> {
    let checks = check_adapters(config);

    if json {
        let rendered = serde_json::to_string_pretty(&checks)
            .map_err(|e| PolycastError::Internal(format!("failed to serialize checks: {e}")))?;
        println!("{rendered}");
    } else {
        println!();
        println!("  polycast validate");
        println!("  {}", "-".repeat(50));
        if checks.is_empty() {
            println!("    no adapters configured");
        }
        for check in &checks {
            println!("{}", check_line(check, color));
        }
        println!();
    }

    let invalid = checks.iter().filter(|c| c.enabled && !c.valid).count();
    if invalid > 0 {
        let word = if invalid == 1 { "adapter" } else { "adapters" };
        return Err(PolycastError::Config(format!("{invalid} {word} failed validation")));
    }
    Ok(())
}

fn check_line(check: &AdapterCheck, color: bool) -> String {
    let platform = check.platform.as_deref().unwrap_or("?");
    let label = format!("{} ({platform})", check.name);
    if !check.enabled {
        return format!("    [OFF]  {label:<28} disabled");
    }
    if check.valid {
        return if color {
            format!("    {} {label:<28}", "✓".green())
        } else {
            format!("    [OK]   {label:<28}")
        };
    }
    let detail = format!("missing {}", check.missing.join(", "));
    if color {
        format!("    {} {label:<28} {}", "✗".red(), detail.red())
    } else {
        format!("    [FAIL] {label:<28} {detail}")
    }
}
