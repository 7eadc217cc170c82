// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call-counting platform hooks for deterministic testing.
//!
//! `SpyHooks` implements `PlatformHooks` without any I/O. Every hook call is
//! recorded, and individual hooks can be told to fail, fail transiently,
//! panic, or stall.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use polycast_core::{
    ActionResult, CapabilityDescriptor, ContentItem, ContentMetrics, ContentType, EventSink,
    Operation, PlatformHooks, PlatformType, PolycastError, SearchOptions, UserProfile,
};
use serde_json::json;

#[derive(Default)]
struct SpyState {
    calls: Mutex<HashMap<&'static str, usize>>,
    transient: Mutex<HashMap<&'static str, u32>>,
    sink: Mutex<Option<EventSink>>,
}

/// Shared view of a [`SpyHooks`] that stays usable after the hooks are boxed
/// into an adapter.
#[derive(Clone, Default)]
pub struct SpyHandle {
    state: Arc<SpyState>,
}

impl SpyHandle {
    /// Number of times `hook` (e.g. `"do_post"`) was invoked.
    pub fn count(&self, hook: &str) -> usize {
        self.state
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(hook)
            .copied()
            .unwrap_or(0)
    }

    /// Total hook invocations across every hook.
    pub fn total(&self) -> usize {
        self.state
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    /// The sink passed to the most recent `do_start_monitoring`, if any.
    pub fn sink(&self) -> Option<EventSink> {
        self.state
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, hook: &'static str) {
        *self
            .state
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(hook)
            .or_insert(0) += 1;
    }

    fn take_transient(&self, hook: &'static str) -> bool {
        let mut transient = self
            .state
            .transient
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match transient.get_mut(hook) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Configurable `PlatformHooks` implementation that records every call.
pub struct SpyHooks {
    platform: PlatformType,
    capabilities: CapabilityDescriptor,
    handle: SpyHandle,
    failing: HashSet<&'static str>,
    panicking: HashSet<&'static str>,
    auth_result: bool,
    auth_delay: Option<Duration>,
    hook_delay: Option<Duration>,
    reject_content: bool,
    metrics: ContentMetrics,
}

impl SpyHooks {
    /// A spy for `platform` with every capability enabled.
    pub fn new(platform: PlatformType) -> Self {
        Self {
            platform,
            capabilities: Self::full_capabilities(),
            handle: SpyHandle::default(),
            failing: HashSet::new(),
            panicking: HashSet::new(),
            auth_result: true,
            auth_delay: None,
            hook_delay: None,
            reject_content: false,
            metrics: ContentMetrics::default(),
        }
    }

    /// Every flag on, every content type, generous limits.
    pub fn full_capabilities() -> CapabilityDescriptor {
        CapabilityDescriptor {
            can_post: true,
            can_comment: true,
            can_share: true,
            can_delete: true,
            can_edit: true,
            can_like: true,
            can_follow: true,
            can_message: true,
            can_mention: true,
            supports_webhooks: true,
            supports_analytics: true,
            supports_scheduling: true,
            supports_polls: true,
            content_types: [
                ContentType::Text,
                ContentType::Image,
                ContentType::Video,
                ContentType::Document,
                ContentType::Audio,
                ContentType::Link,
            ]
            .into_iter()
            .collect(),
            max_content_length: 10_000,
            max_media_size: Some(10 * 1024 * 1024),
        }
    }

    /// Handle for inspecting calls after the spy has been moved.
    pub fn handle(&self) -> SpyHandle {
        self.handle.clone()
    }

    pub fn with_capabilities(mut self, capabilities: CapabilityDescriptor) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Clear the capability flag behind `operation`.
    pub fn deny(mut self, operation: Operation) -> Self {
        let caps = &mut self.capabilities;
        match operation {
            Operation::Post => caps.can_post = false,
            Operation::Comment => caps.can_comment = false,
            Operation::Share => caps.can_share = false,
            Operation::Delete => caps.can_delete = false,
            Operation::Like | Operation::Unlike => caps.can_like = false,
            Operation::Follow | Operation::Unfollow => caps.can_follow = false,
        }
        self
    }

    pub fn without_analytics(mut self) -> Self {
        self.capabilities.supports_analytics = false;
        self
    }

    /// Make `hook` return a permanent platform error.
    pub fn fail_on(mut self, hook: &'static str) -> Self {
        self.failing.insert(hook);
        self
    }

    /// Make `hook` panic.
    pub fn panic_on(mut self, hook: &'static str) -> Self {
        self.panicking.insert(hook);
        self
    }

    /// Make the next `times` calls of `hook` fail transiently.
    pub fn fail_transiently(self, hook: &'static str, times: u32) -> Self {
        self.handle
            .state
            .transient
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hook, times);
        self
    }

    pub fn with_auth_result(mut self, authenticated: bool) -> Self {
        self.auth_result = authenticated;
        self
    }

    /// Delay `do_authenticate` by `delay`.
    pub fn with_auth_delay(mut self, delay: Duration) -> Self {
        self.auth_delay = Some(delay);
        self
    }

    /// Delay every write, read, and monitoring hook by `delay`.
    pub fn with_hook_delay(mut self, delay: Duration) -> Self {
        self.hook_delay = Some(delay);
        self
    }

    /// Make `do_validate_content` return `false`.
    pub fn rejecting_content(mut self) -> Self {
        self.reject_content = true;
        self
    }

    pub fn with_metrics(mut self, metrics: ContentMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    async fn behave(&self, hook: &'static str) -> Result<(), PolycastError> {
        self.handle.record(hook);
        if let Some(delay) = self.hook_delay {
            tokio::time::sleep(delay).await;
        }
        if self.panicking.contains(hook) {
            panic!("spy hook {hook} panicked");
        }
        if self.failing.contains(hook) {
            return Err(PolycastError::platform(format!("{hook} failed")));
        }
        if self.handle.take_transient(hook) {
            return Err(PolycastError::transient(format!("{hook} temporarily unavailable")));
        }
        Ok(())
    }

    fn result(&self, hook: &'static str, target: &str) -> ActionResult {
        ActionResult::success(json!({
            "id": uuid::Uuid::new_v4().to_string(),
            "platform": self.platform.to_string(),
            "hook": hook,
            "target": target,
        }))
    }
}

#[async_trait]
impl PlatformHooks for SpyHooks {
    fn platform(&self) -> PlatformType {
        self.platform
    }

    fn capabilities(&self) -> CapabilityDescriptor {
        self.capabilities.clone()
    }

    async fn do_initialize(&self) -> Result<(), PolycastError> {
        self.behave("do_initialize").await
    }

    async fn do_authenticate(&self) -> Result<bool, PolycastError> {
        if let Some(delay) = self.auth_delay {
            tokio::time::sleep(delay).await;
        }
        self.behave("do_authenticate").await?;
        Ok(self.auth_result)
    }

    async fn do_disconnect(&self) -> Result<(), PolycastError> {
        self.behave("do_disconnect").await
    }

    async fn do_post(&self, content: &ContentItem) -> Result<ActionResult, PolycastError> {
        self.behave("do_post").await?;
        Ok(self.result("do_post", &content.body))
    }

    async fn do_comment(&self, post_id: &str, _text: &str) -> Result<ActionResult, PolycastError> {
        self.behave("do_comment").await?;
        Ok(self.result("do_comment", post_id))
    }

    async fn do_share(
        &self,
        post_id: &str,
        _comment: Option<&str>,
    ) -> Result<ActionResult, PolycastError> {
        self.behave("do_share").await?;
        Ok(self.result("do_share", post_id))
    }

    async fn do_delete(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        self.behave("do_delete").await?;
        Ok(self.result("do_delete", post_id))
    }

    async fn do_like(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        self.behave("do_like").await?;
        Ok(self.result("do_like", post_id))
    }

    async fn do_unlike(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        self.behave("do_unlike").await?;
        Ok(self.result("do_unlike", post_id))
    }

    async fn do_follow(&self, user_id: &str) -> Result<ActionResult, PolycastError> {
        self.behave("do_follow").await?;
        Ok(self.result("do_follow", user_id))
    }

    async fn do_unfollow(&self, user_id: &str) -> Result<ActionResult, PolycastError> {
        self.behave("do_unfollow").await?;
        Ok(self.result("do_unfollow", user_id))
    }

    async fn get_profile(&self, user_id: Option<&str>) -> Result<UserProfile, PolycastError> {
        self.behave("get_profile").await?;
        let id = user_id.unwrap_or("me").to_string();
        Ok(UserProfile {
            username: format!("{id}-handle"),
            id,
            ..UserProfile::default()
        })
    }

    async fn get_content(&self, post_id: &str) -> Result<ContentItem, PolycastError> {
        self.behave("get_content").await?;
        Ok(ContentItem::text(format!("content {post_id}")).with_id(post_id))
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ContentItem>, PolycastError> {
        self.behave("search").await?;
        let limit = options.limit.unwrap_or(2) as usize;
        Ok((0..limit)
            .map(|i| ContentItem::text(format!("{query} #{i}")).with_id(i.to_string()))
            .collect())
    }

    async fn get_analytics(&self, _post_id: &str) -> Result<ContentMetrics, PolycastError> {
        self.behave("get_analytics").await?;
        Ok(self.metrics.clone())
    }

    async fn setup_webhook(&self, _url: &str, _events: &[String]) -> Result<bool, PolycastError> {
        self.behave("setup_webhook").await?;
        Ok(true)
    }

    async fn remove_webhook(&self, _webhook_id: &str) -> Result<bool, PolycastError> {
        self.behave("remove_webhook").await?;
        Ok(true)
    }

    async fn do_start_monitoring(&self, sink: EventSink) -> Result<(), PolycastError> {
        self.behave("do_start_monitoring").await?;
        *self
            .handle
            .state
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(sink);
        Ok(())
    }

    async fn do_stop_monitoring(&self) -> Result<(), PolycastError> {
        self.behave("do_stop_monitoring").await?;
        self.handle
            .state
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }

    async fn do_validate_content(&self, _content: &ContentItem) -> Result<bool, PolycastError> {
        self.behave("do_validate_content").await?;
        Ok(!self.reject_content)
    }
}
