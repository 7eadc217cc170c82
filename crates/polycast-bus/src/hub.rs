// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pairing of a listener notifier and a broadcast bus.

use crate::bus::EventBus;
use crate::notifier::EventNotifier;
use crate::NamedEvent;

/// Owns one [`EventNotifier`] and one [`EventBus`] for the same event type.
#[derive(Debug)]
pub struct EventHub<E: Clone + Send + 'static> {
    notifier: EventNotifier<E>,
    bus: EventBus<E>,
}

impl<E: Clone + Send + 'static> EventHub<E> {
    pub fn new() -> Self {
        Self {
            notifier: EventNotifier::new(),
            bus: EventBus::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            notifier: EventNotifier::new(),
            bus: EventBus::with_capacity(capacity),
        }
    }

    /// Synchronous listener registry.
    pub fn notifier(&self) -> &EventNotifier<E> {
        &self.notifier
    }

    /// Structured publish/subscribe channel.
    pub fn bus(&self) -> &EventBus<E> {
        &self.bus
    }
}

impl<E: NamedEvent + Clone + Send + 'static> EventHub<E> {
    /// Notify listeners, then publish the same event on the bus.
    ///
    /// Returns `(listeners_reached, subscribers_reached)`.
    pub fn emit_and_publish(&self, source: &str, event: E) -> (usize, usize) {
        let listeners = self.notifier.emit_event(&event);
        let event_type = event.event_name().to_string();
        let subscribers = self.bus.publish_event(source, event_type, event);
        (listeners, subscribers)
    }
}

impl<E: Clone + Send + 'static> Default for EventHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventFilter;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Ping(&'static str);

    impl NamedEvent for Ping {
        fn event_name(&self) -> &str {
            self.0
        }
    }

    #[tokio::test]
    async fn emit_and_publish_reaches_both_paths() {
        let hub = EventHub::<Ping>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        hub.notifier().on("ready", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let mut sub = hub.bus().subscribe(EventFilter::types(["ready"]));

        assert_eq!(hub.emit_and_publish("primary", Ping("ready")), (1, 1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let envelope = sub.recv().await.unwrap();
        assert_eq!(envelope.source, "primary");
        assert_eq!(envelope.event_type, "ready");
        assert_eq!(envelope.payload, Ping("ready"));
    }

    #[test]
    fn notifier_and_bus_are_independent() {
        let hub = EventHub::<Ping>::new();
        hub.notifier().on("x", |_| {});
        assert_eq!(hub.bus().subscriber_count(), 0);

        assert_eq!(hub.notifier().emit("x", &Ping("x")), 1);
        assert_eq!(hub.bus().events_published(), 0);
    }
}
