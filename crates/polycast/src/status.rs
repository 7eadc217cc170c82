// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `polycast status` command implementation.
//!
//! Builds and registers every configured adapter (initialize, then
//! authenticate when credentials are present), prints the manager's status
//! snapshot, and disconnects.

use std::collections::BTreeMap;

use colored::Colorize;
use polycast_adapter::AdapterStatus;
use polycast_config::PolycastConfig;
use polycast_core::PolycastError;
use serde::Serialize;

use crate::connect::connect;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub adapters: BTreeMap<String, AdapterStatus>,
    pub skipped: BTreeMap<String, String>,
}

pub async fn run_status(config: &PolycastConfig, json: bool, color: bool) -> Result<(), PolycastError> {
    let connected = connect(config).await;
    let response = StatusResponse {
        adapters: connected.manager.status(),
        skipped: connected.skipped.into_iter().collect(),
    };
    connected.manager.disconnect_all().await;

    if json {
        let rendered = serde_json::to_string_pretty(&response)
            .map_err(|e| PolycastError::Internal(format!("failed to serialize status: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    println!();
    println!("  polycast status");
    println!("  {}", "-".repeat(50));
    if response.adapters.is_empty() && response.skipped.is_empty() {
        println!("    no adapters configured");
    }
    for (name, status) in &response.adapters {
        println!("{}", status_line(name, status, color));
    }
    for (name, reason) in &response.skipped {
        println!("    [SKIP] {name:<20} {reason}");
    }
    println!();
    Ok(())
}

fn status_line(name: &str, status: &AdapterStatus, color: bool) -> String {
    let auth = if status.authenticated {
        "authenticated"
    } else {
        "not authenticated"
    };
    let label = format!("{name} ({})", status.platform);
    let line = format!("{label:<28} {:<14} {auth}", status.state.to_string());
    match (status.authenticated, color) {
        (true, true) => format!("    {} {line}", "●".green()),
        (false, true) => format!("    {} {line}", "●".yellow()),
        (_, false) => format!("    {line}"),
    }
}
