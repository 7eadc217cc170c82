// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel through which monitoring hooks report inbound traffic.

use std::sync::Arc;

use crate::events::AdapterEvent;
use crate::types::ContentItem;

/// Handed to [`PlatformHooks::do_start_monitoring`](super::PlatformHooks::do_start_monitoring).
///
/// Cloning is cheap; every clone reports to the same adapter.
#[derive(Clone)]
pub struct EventSink {
    emit: Arc<dyn Fn(AdapterEvent) + Send + Sync>,
}

impl EventSink {
    pub fn new<F>(emit: F) -> Self
    where
        F: Fn(AdapterEvent) + Send + Sync + 'static,
    {
        Self {
            emit: Arc::new(emit),
        }
    }

    /// A sink that discards everything.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn webhook_received(&self, payload: serde_json::Value) {
        (self.emit)(AdapterEvent::WebhookReceived(payload));
    }

    pub fn mention_received(&self, item: ContentItem) {
        (self.emit)(AdapterEvent::MentionReceived(item));
    }

    pub fn message_received(&self, item: ContentItem) {
        (self.emit)(AdapterEvent::MessageReceived(item));
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}
