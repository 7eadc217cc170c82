// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common value types exchanged between adapters, hooks, and the manager.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The external services Polycast knows how to talk to.
///
/// `Custom` is reserved for services without a built-in collaborator; the
/// factory refuses to construct it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum PlatformType {
    Twitter,
    Linkedin,
    Github,
    Discord,
    Slack,
    Reddit,
    Medium,
    Custom,
}

impl PlatformType {
    /// Platforms with a built-in collaborator.
    pub const BUILTIN: [PlatformType; 7] = [
        PlatformType::Twitter,
        PlatformType::Linkedin,
        PlatformType::Github,
        PlatformType::Discord,
        PlatformType::Slack,
        PlatformType::Reddit,
        PlatformType::Medium,
    ];

    pub fn is_builtin(self) -> bool {
        self != PlatformType::Custom
    }
}

/// Kind of content carried by a [`ContentItem`] or a [`MediaItem`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    Video,
    Document,
    Audio,
    Link,
}

/// A media attachment referenced by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub media_type: ContentType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Size in bytes, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl MediaItem {
    pub fn new(media_type: ContentType, url: impl Into<String>) -> Self {
        Self {
            media_type,
            url: url.into(),
            filename: None,
            size: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// A piece of content to publish, or content read back from a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Service-assigned identifier. Empty for content not yet published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content_type: ContentType,
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ContentMetrics>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ContentItem {
    /// Plain text content.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(ContentType::Text, body)
    }

    pub fn new(content_type: ContentType, body: impl Into<String>) -> Self {
        Self {
            id: None,
            content_type,
            body: body.into(),
            media: Vec::new(),
            tags: Vec::new(),
            mentions: Vec::new(),
            author: None,
            url: None,
            created_at: None,
            metrics: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_media(mut self, media: MediaItem) -> Self {
        self.media.push(media);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_mentions<I, S>(mut self, mentions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mentions.extend(mentions.into_iter().map(Into::into));
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Body length in characters, the unit services count limits in.
    pub fn body_len(&self) -> usize {
        self.body.chars().count()
    }
}

/// Uniform outcome of a platform operation.
///
/// A failed result always carries a non-empty error message and never a
/// payload. Construct with [`ActionResult::success`] or [`ActionResult::failure`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    timestamp: DateTime<Utc>,
}

impl ActionResult {
    /// A successful outcome carrying the service's response payload.
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// A successful outcome with no payload.
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// A failed outcome. An empty message is replaced with `"unknown error"`.
    pub fn failure(error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown error".to_string();
        }
        Self {
            success: false,
            data: None,
            error: Some(error),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Snapshot captured when a rate-limit check rejects a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    pub retry_after: Duration,
}

/// A user account on an external service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<u64>,
    #[serde(default)]
    pub verified: bool,
}

/// Engagement counters for a piece of content.
///
/// `ContentMetrics::default()` is the empty value reported for adapters
/// without analytics support.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clicks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impressions: Option<u64>,
}

impl ContentMetrics {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Options for [`search`](crate::traits::PlatformHooks::search).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl SearchOptions {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn platform_type_parses_case_insensitively() {
        assert_eq!(PlatformType::from_str("Twitter").unwrap(), PlatformType::Twitter);
        assert_eq!(PlatformType::from_str("linkedin").unwrap(), PlatformType::Linkedin);
        assert!(PlatformType::from_str("myspace").is_err());
    }

    #[test]
    fn platform_type_display_round_trips() {
        for platform in PlatformType::iter() {
            let parsed = PlatformType::from_str(&platform.to_string()).unwrap();
            assert_eq!(platform, parsed);
        }
    }

    #[test]
    fn builtin_excludes_custom() {
        assert!(!PlatformType::BUILTIN.contains(&PlatformType::Custom));
        assert!(!PlatformType::Custom.is_builtin());
        assert!(PlatformType::Medium.is_builtin());
    }

    #[test]
    fn failure_always_has_message_and_no_payload() {
        let result = ActionResult::failure("");
        assert!(!result.is_success());
        assert_eq!(result.error(), Some("unknown error"));
        assert!(result.data().is_none());
    }

    #[test]
    fn success_carries_payload() {
        let result = ActionResult::success(serde_json::json!({ "id": "42" }));
        assert!(result.is_success());
        assert!(result.error().is_none());
        assert_eq!(result.data().unwrap()["id"], "42");
    }

    #[test]
    fn body_len_counts_characters() {
        let item = ContentItem::text("héllo");
        assert_eq!(item.body_len(), 5);
    }

    #[test]
    fn content_item_deserializes_with_defaults() {
        let item: ContentItem =
            serde_json::from_str(r#"{"content_type":"text","body":"hi"}"#).unwrap();
        assert!(item.media.is_empty());
        assert!(item.metadata.is_empty());
        assert_eq!(item.content_type, ContentType::Text);
    }

    #[test]
    fn default_metrics_are_empty() {
        assert!(ContentMetrics::default().is_empty());
        let metrics = ContentMetrics {
            likes: Some(3),
            ..ContentMetrics::default()
        };
        assert!(!metrics.is_empty());
    }
}
