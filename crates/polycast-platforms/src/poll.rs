// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling-based monitoring for services without a push channel.
//!
//! A [`Poller`] runs a fetch function on an interval in a background task and
//! reports every item it has not seen before through the adapter's
//! [`EventSink`]. The first fetch only records the backlog.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use polycast_config::AdapterConfig;
use polycast_core::{ContentItem, EventSink, PolycastError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Deduplication keys remembered per poller. Must exceed one fetch's page.
const SEEN_CAPACITY: usize = 1024;

/// An inbound item and how it should be reported.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Mention(ContentItem),
    Message(ContentItem),
}

impl Inbound {
    /// Deduplication key: the service id, or the body for id-less items.
    fn key(&self) -> String {
        let (Inbound::Mention(item) | Inbound::Message(item)) = self;
        item.id.clone().unwrap_or_else(|| item.body.clone())
    }
}

/// `poll_interval_secs` setting, or the default.
pub fn poll_interval(config: &AdapterConfig) -> Duration {
    config
        .settings
        .get("poll_interval_secs")
        .and_then(serde_json::Value::as_u64)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_POLL_INTERVAL)
}

/// Bounded set of recently seen keys; the oldest is forgotten first.
struct SeenKeys {
    keys: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl SeenKeys {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `key`, returning `false` if it was already known.
    fn insert(&mut self, key: String) -> bool {
        if self.keys.contains(&key) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.keys.remove(&oldest);
            }
        }
        self.keys.insert(key.clone());
        self.order.push_back(key);
        true
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// At most one background polling task.
#[derive(Default)]
pub struct Poller {
    running: Mutex<Option<Running>>,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Start polling `fetch` every `interval`. Replaces any running task.
    pub fn start<F, Fut>(&self, interval: Duration, sink: EventSink, fetch: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Inbound>, PolycastError>> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut seen = SeenKeys::with_capacity(SEEN_CAPACITY);
            let mut baseline = true;
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                match fetch().await {
                    Ok(items) => {
                        for item in items {
                            if !seen.insert(item.key()) || baseline {
                                continue;
                            }
                            match item {
                                Inbound::Mention(content) => sink.mention_received(content),
                                Inbound::Message(content) => sink.message_received(content),
                            }
                        }
                        baseline = false;
                        debug!(remembered = seen.len(), "poll complete");
                    }
                    Err(err) => warn!(error = %err, "monitoring poll failed"),
                }
            }
            debug!("monitoring poller stopped");
        });

        let previous = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Running { cancel, handle });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
    }

    /// Cancel the task and wait for it to finish.
    pub async fn stop(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(running) = running {
            running.cancel.cancel();
            if let Err(err) = running.handle.await {
                warn!(error = %err, "monitoring poller task failed");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(running) = self
            .running
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            running.cancel.cancel();
        }
    }
}
