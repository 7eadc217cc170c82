// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured publish/subscribe over a Tokio broadcast channel.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{trace, warn};
use uuid::Uuid;

use crate::DEFAULT_CHANNEL_CAPACITY;

/// A published event together with its routing metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<P> {
    pub id: Uuid,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    /// Identity of the publisher (adapter name, `"manager"`, ...).
    pub source: String,
    pub payload: P,
}

impl<P> Envelope<P> {
    /// Wrap `payload` in a fresh envelope stamped with the current time.
    pub fn new(event_type: impl Into<String>, source: impl Into<String>, payload: P) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Selects which envelopes a [`Subscription`] yields.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    event_types: Option<HashSet<String>>,
    source: Option<String>,
}

impl EventFilter {
    /// Accept every envelope.
    pub fn all() -> Self {
        Self::default()
    }

    /// Accept only the given event types.
    pub fn types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            event_types: Some(types.into_iter().map(Into::into).collect()),
            source: None,
        }
    }

    /// Additionally require the envelope to come from `source`.
    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns true if `envelope` passes this filter.
    pub fn matches<P>(&self, envelope: &Envelope<P>) -> bool {
        let type_ok = self
            .event_types
            .as_ref()
            .is_none_or(|types| types.contains(&envelope.event_type));
        let source_ok = self
            .source
            .as_ref()
            .is_none_or(|source| *source == envelope.source);
        type_ok && source_ok
    }
}

/// In-process event bus.
///
/// Publishing never blocks. Subscribers that fall more than the channel
/// capacity behind skip the oldest envelopes.
pub struct EventBus<P> {
    sender: broadcast::Sender<Envelope<P>>,
    published: AtomicU64,
    capacity: usize,
}

impl<P: Clone + Send + 'static> EventBus<P> {
    /// Create a bus with [`DEFAULT_CHANNEL_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with the given channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Publish an envelope. Returns the number of subscribers that received it.
    pub fn publish(&self, envelope: Envelope<P>) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let event_type = envelope.event_type.clone();
        match self.sender.send(envelope) {
            Ok(receivers) => {
                trace!(event_type = %event_type, receivers, "envelope published");
                receivers
            }
            // No subscribers is the normal case for most adapters.
            Err(_) => 0,
        }
    }

    /// Wrap `payload` in an [`Envelope`] and publish it.
    pub fn publish_event(
        &self,
        source: impl Into<String>,
        event_type: impl Into<String>,
        payload: P,
    ) -> usize {
        self.publish(Envelope::new(event_type, source, payload))
    }

    /// Subscribe to envelopes published from now on that match `filter`.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription<P> {
        Subscription {
            receiver: self.sender.subscribe(),
            filter,
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total envelopes published, including those nobody received.
    pub fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Channel capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<P: Clone + Send + 'static> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .field("published", &self.published.load(Ordering::Relaxed))
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// A filtered receiving handle on an [`EventBus`].
pub struct Subscription<P> {
    receiver: broadcast::Receiver<Envelope<P>>,
    filter: EventFilter,
}

impl<P: Clone> Subscription<P> {
    /// Wait for the next matching envelope.
    ///
    /// Returns `None` once the bus has been dropped.
    pub async fn recv(&mut self) -> Option<Envelope<P>> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) if self.filter.matches(&envelope) => return Some(envelope),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagged, envelopes dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Return the next matching envelope if one is already queued.
    pub fn try_recv(&mut self) -> Option<Envelope<P>> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) if self.filter.matches(&envelope) => return Some(envelope),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagged, envelopes dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}
