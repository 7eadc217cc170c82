// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events emitted by adapters.

use polycast_bus::NamedEvent;

use crate::types::{ActionResult, ContentItem, RateLimitInfo};

/// Every event name an adapter can emit, in declaration order.
///
/// The manager subscribes to exactly this list when forwarding adapter events.
pub const ADAPTER_EVENT_NAMES: [&str; 15] = [
    "ready",
    "error",
    "ratelimit",
    "content:posted",
    "content:commented",
    "content:liked",
    "content:shared",
    "authenticated",
    "authentication-failed",
    "disconnected",
    "monitoring-started",
    "monitoring-stopped",
    "webhook-received",
    "mention-received",
    "message-received",
];

/// Something that happened on an adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    Ready,
    Error { message: String },
    RateLimit(RateLimitInfo),
    ContentPosted(ActionResult),
    ContentCommented(ActionResult),
    ContentLiked(ActionResult),
    ContentShared(ActionResult),
    Authenticated,
    AuthenticationFailed { reason: Option<String> },
    Disconnected,
    MonitoringStarted,
    MonitoringStopped,
    WebhookReceived(serde_json::Value),
    MentionReceived(ContentItem),
    MessageReceived(ContentItem),
}

impl AdapterEvent {
    /// Stable public name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            AdapterEvent::Ready => "ready",
            AdapterEvent::Error { .. } => "error",
            AdapterEvent::RateLimit(_) => "ratelimit",
            AdapterEvent::ContentPosted(_) => "content:posted",
            AdapterEvent::ContentCommented(_) => "content:commented",
            AdapterEvent::ContentLiked(_) => "content:liked",
            AdapterEvent::ContentShared(_) => "content:shared",
            AdapterEvent::Authenticated => "authenticated",
            AdapterEvent::AuthenticationFailed { .. } => "authentication-failed",
            AdapterEvent::Disconnected => "disconnected",
            AdapterEvent::MonitoringStarted => "monitoring-started",
            AdapterEvent::MonitoringStopped => "monitoring-stopped",
            AdapterEvent::WebhookReceived(_) => "webhook-received",
            AdapterEvent::MentionReceived(_) => "mention-received",
            AdapterEvent::MessageReceived(_) => "message-received",
        }
    }
}

impl NamedEvent for AdapterEvent {
    fn event_name(&self) -> &str {
        self.name()
    }
}
