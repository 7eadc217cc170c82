// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `polycast platforms` command implementation.

use colored::Colorize;
use polycast_core::{Operation, PolycastError};
use polycast_plugin::{CatalogEntry, search_catalog};

/// Print the built-in platform catalog, optionally filtered by `query`.
pub fn run_platforms(query: Option<&str>, json: bool, color: bool) -> Result<(), PolycastError> {
    let entries = search_catalog(query.unwrap_or_default());

    if json {
        let rendered = serde_json::to_string_pretty(&entries)
            .map_err(|e| PolycastError::Internal(format!("failed to serialize catalog: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("  no platform matches `{}`", query.unwrap_or_default());
        return Ok(());
    }

    println!();
    println!("  built-in platforms");
    println!("  {}", "-".repeat(60));
    for entry in &entries {
        for line in describe(entry, color) {
            println!("{line}");
        }
    }
    println!();
    Ok(())
}

fn describe(entry: &CatalogEntry, color: bool) -> Vec<String> {
    let name = if color {
        entry.platform.to_string().bold().to_string()
    } else {
        entry.platform.to_string()
    };
    let operations = operation_list(&entry.capabilities.allowed_operations());
    let window_secs = entry.rate_limit.window_ms / 1000;
    vec![
        format!("  {name:<10} auth: {}", entry.auth),
        format!("             credentials: {}", entry.credentials.join(", ")),
        format!(
            "             max length: {}  rate limit: {}/{window_secs}s",
            entry.capabilities.max_content_length, entry.rate_limit.requests
        ),
        format!("             operations: {operations}"),
    ]
}

fn operation_list(operations: &[Operation]) -> String {
    if operations.is_empty() {
        return "none".to_string();
    }
    operations
        .iter()
        .map(Operation::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycast_core::PlatformType;
    use polycast_plugin::builtin_catalog;

    #[test]
    fn plain_description_lists_operations() {
        let medium = builtin_catalog()
            .into_iter()
            .find(|e| e.platform == PlatformType::Medium)
            .unwrap();
        let lines = describe(&medium, false);
        assert!(lines[0].starts_with("  medium"));
        assert!(lines[3].contains("post"));
        assert!(!lines[3].contains("follow"));
    }

    #[test]
    fn empty_operation_list_reads_none() {
        assert_eq!(operation_list(&[]), "none");
        assert_eq!(
            operation_list(&[Operation::Post, Operation::Like]),
            "post, like"
        );
    }
}
