// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `polycast post` command implementation.

use std::collections::BTreeMap;

use colored::Colorize;
use polycast_config::PolycastConfig;
use polycast_core::{ActionResult, ContentItem, PolycastError};
use serde::Serialize;
use serde_json::Value;

use crate::connect::connect;

/// What to post and where.
#[derive(Debug, Clone, Default)]
pub struct PostRequest {
    pub text: String,
    /// Registry names to restrict the post to; empty means every adapter.
    pub only: Vec<String>,
    pub title: Option<String>,
    pub tags: Vec<String>,
}

impl PostRequest {
    fn content(&self) -> ContentItem {
        let item = ContentItem::text(self.text.as_str()).with_tags(self.tags.iter().cloned());
        match &self.title {
            Some(title) => item.with_metadata("title", Value::from(title.as_str())),
            None => item,
        }
    }
}

#[derive(Debug, Serialize)]
struct PostOutput<'a> {
    results: &'a BTreeMap<String, ActionResult>,
    skipped: BTreeMap<&'a str, &'a str>,
}

/// Post to the configured adapters and print one line per adapter.
///
/// Fails when no adapter accepted the post.
pub async fn run_post(
    config: &PolycastConfig,
    request: &PostRequest,
    json: bool,
    color: bool,
) -> Result<(), PolycastError> {
    if request.text.trim().is_empty() {
        return Err(PolycastError::Validation("post text is empty".to_string()));
    }

    let connected = connect(config).await;
    let manager = &connected.manager;
    let content = request.content();
    let results = if request.only.is_empty() {
        manager.post_to_all(&content).await
    } else {
        let names: Vec<&str> = request.only.iter().map(String::as_str).collect();
        manager.post_to_adapters(&names, &content).await
    };
    manager.disconnect_all().await;

    if json {
        let output = PostOutput {
            results: &results,
            skipped: connected
                .skipped
                .iter()
                .map(|(name, reason)| (name.as_str(), reason.as_str()))
                .collect(),
        };
        let rendered = serde_json::to_string_pretty(&output)
            .map_err(|e| PolycastError::Internal(format!("failed to serialize results: {e}")))?;
        println!("{rendered}");
    } else {
        println!();
        for (name, result) in &results {
            println!("{}", result_line(name, result, color));
        }
        for (name, reason) in &connected.skipped {
            let mark = if color { "-".dimmed().to_string() } else { "[SKIP]".to_string() };
            println!("    {mark} {name:<20} {reason}");
        }
        println!();
    }

    let succeeded = results.values().filter(|r| r.is_success()).count();
    if succeeded == 0 {
        return Err(PolycastError::platform(format!(
            "post failed on all {} target(s)",
            results.len()
        )));
    }
    Ok(())
}

fn result_line(name: &str, result: &ActionResult, color: bool) -> String {
    let detail = match result.data() {
        Some(data) => data
            .get("url")
            .or_else(|| data.get("id"))
            .and_then(Value::as_str)
            .unwrap_or("posted")
            .to_string(),
        None => result.error().unwrap_or("unknown error").to_string(),
    };
    match (result.is_success(), color) {
        (true, true) => format!("    {} {name:<20} {detail}", "✓".green()),
        (true, false) => format!("    [OK]   {name:<20} {detail}"),
        (false, true) => format!("    {} {name:<20} {}", "✗".red(), detail.red()),
        (false, false) => format!("    [FAIL] {name:<20} {detail}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_carries_title_and_tags() {
        let request = PostRequest {
            text: "release".to_string(),
            title: Some("v1.0".to_string()),
            tags: vec!["rust".to_string()],
            ..PostRequest::default()
        };
        let item = request.content();
        assert_eq!(item.body, "release");
        assert_eq!(item.tags, vec!["rust".to_string()]);
        assert_eq!(item.metadata["title"], "v1.0");
    }

    #[test]
    fn result_line_prefers_url() {
        let ok = ActionResult::success(json!({"id": "1", "url": "https://x.test/1"}));
        assert_eq!(
            result_line("main", &ok, false),
            format!("    [OK]   {:<20} https://x.test/1", "main")
        );
        let failed = ActionResult::failure("boom");
        assert!(result_line("main", &failed, false).ends_with("boom"));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_connecting() {
        let request = PostRequest {
            text: "   ".to_string(),
            ..PostRequest::default()
        };
        let err = run_post(&PolycastConfig::default(), &request, false, false)
            .await
            .unwrap_err();
        assert!(matches!(err, PolycastError::Validation(_)));
    }

    #[tokio::test]
    async fn no_adapters_means_failure() {
        let request = PostRequest {
            text: "hello".to_string(),
            ..PostRequest::default()
        };
        assert!(run_post(&PolycastConfig::default(), &request, true, false)
            .await
            .is_err());
    }
}
