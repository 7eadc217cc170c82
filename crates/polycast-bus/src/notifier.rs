// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronous multi-listener notification keyed by event name.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{error, trace};

use crate::NamedEvent;

/// Handle returned by [`EventNotifier::on`], used to detach a listener.
pub type ListenerId = u64;

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Registry of listeners invoked in registration order on every emit.
pub struct EventNotifier<E> {
    listeners: RwLock<HashMap<String, Vec<(ListenerId, Listener<E>)>>>,
    next_id: AtomicU64,
}

impl<E> EventNotifier<E> {
    /// Create a notifier with no listeners.
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `listener` for events named `event`.
    pub fn on<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Detach a listener. Returns `false` if it was not registered under `event`.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(list) = listeners.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    /// Remove every listener for `event`, or every listener when `event` is `None`.
    pub fn clear(&self, event: Option<&str>) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match event {
            Some(name) => {
                listeners.remove(name);
            }
            None => listeners.clear(),
        }
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Deliver `payload` to every listener registered under `event`.
    ///
    /// Listeners run on the caller's thread. The listener list is snapshotted
    /// first, so listeners may register or detach listeners while running.
    /// Returns the number of listeners that completed without panicking.
    pub fn emit(&self, event: &str, payload: &E) -> usize {
        let snapshot: Vec<(ListenerId, Listener<E>)> = {
            let listeners = self
                .listeners
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match listeners.get(event) {
                Some(list) => list.clone(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for (id, listener) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(payload))) {
                Ok(()) => delivered += 1,
                Err(cause) => {
                    error!(
                        event,
                        listener = id,
                        panic = %panic_message(cause.as_ref()),
                        "event listener panicked"
                    );
                }
            }
        }
        trace!(event, delivered, "event emitted");
        delivered
    }
}

impl<E: NamedEvent> EventNotifier<E> {
    /// Deliver `payload` under its own [`NamedEvent::event_name`].
    pub fn emit_event(&self, payload: &E) -> usize {
        self.emit(payload.event_name(), payload)
    }
}

impl<E> Default for EventNotifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventNotifier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        f.debug_struct("EventNotifier")
            .field("listeners", &counts)
            .finish()
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(s) = cause.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
