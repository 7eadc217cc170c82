// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named adapter registry with event forwarding and concurrent fan-out.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use futures::FutureExt;
use polycast_adapter::{Adapter, AdapterStatus};
use polycast_bus::{EventHub, ListenerId};
use polycast_core::{
    ActionResult, ContentItem, ContentMetrics, Operation, PlatformType, PolycastError,
    SearchOptions, ADAPTER_EVENT_NAMES,
};
use polycast_plugin::AdapterFactory;
use tracing::{debug, info, warn};

use crate::events::ManagerEvent;

/// Name the manager publishes its own events under on the bus.
const MANAGER_SOURCE: &str = "manager";

struct Registered {
    adapter: Arc<Adapter>,
    /// Forwarding listeners attached to the adapter, detached on removal.
    listeners: Vec<(&'static str, ListenerId)>,
}

impl Registered {
    fn detach(&self) {
        for (event, id) in &self.listeners {
            self.adapter.off(event, *id);
        }
    }
}

/// Outcome of [`AdapterManager::disconnect_all`].
#[derive(Debug, Default)]
pub struct DisconnectReport {
    pub disconnected: Vec<String>,
    pub failures: Vec<(String, PolycastError)>,
}

impl DisconnectReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

type Target = (String, Option<Arc<Adapter>>);

/// Owns every registered adapter.
///
/// Adapter events are re-emitted on the manager's hub as
/// [`ManagerEvent::Adapter`] under their original name. Fan-out calls never
/// fail: each target's outcome lands in its own entry of the returned map,
/// and a single `bulk-complete` event follows once every leg has settled.
pub struct AdapterManager {
    adapters: DashMap<String, Registered>,
    events: Arc<EventHub<ManagerEvent>>,
}

impl Default for AdapterManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterManager {
    pub fn new() -> Self {
        Self {
            adapters: DashMap::new(),
            events: Arc::new(EventHub::new()),
        }
    }

    pub fn events(&self) -> &Arc<EventHub<ManagerEvent>> {
        &self.events
    }

    /// Register a listener for the manager event named `event`.
    pub fn on<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&ManagerEvent) + Send + Sync + 'static,
    {
        self.events.notifier().on(event, listener)
    }

    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.events.notifier().off(event, id)
    }

    fn emit(&self, source: &str, event: ManagerEvent) {
        self.events.emit_and_publish(source, event);
    }

    fn emit_error(&self, name: &str, err: &PolycastError) {
        self.emit(
            name,
            ManagerEvent::AdapterError {
                name: name.to_string(),
                message: err.to_string(),
            },
        );
    }

    // --- registry ---

    /// Initialize `adapter`, authenticate it when it carries credentials, and
    /// register it under `name`.
    ///
    /// Failed authentication is logged but does not prevent registration.
    pub async fn add_adapter(
        &self,
        name: impl Into<String>,
        adapter: Adapter,
    ) -> Result<Arc<Adapter>, PolycastError> {
        let name = name.into();
        if self.adapters.contains_key(&name) {
            let err = PolycastError::DuplicateAdapter { name: name.clone() };
            self.emit_error(&name, &err);
            return Err(err);
        }

        let adapter = Arc::new(adapter);
        if let Err(err) = adapter.initialize().await {
            warn!(adapter = %name, error = %err, "adapter failed to initialize");
            self.emit_error(&name, &err);
            return Err(err);
        }
        if adapter.config().has_credentials() && !adapter.authenticate().await {
            warn!(adapter = %name, platform = %adapter.platform(), "registered without authentication");
        }

        let registered = Registered {
            listeners: self.forward_events(&name, &adapter),
            adapter: Arc::clone(&adapter),
        };
        let rejected = match self.adapters.entry(name.clone()) {
            Entry::Occupied(_) => Some(registered),
            Entry::Vacant(slot) => {
                slot.insert(registered);
                None
            }
        };
        if let Some(registered) = rejected {
            registered.detach();
            if let Err(err) = adapter.disconnect().await {
                warn!(adapter = %name, error = %err, "failed to disconnect duplicate adapter");
            }
            let err = PolycastError::DuplicateAdapter { name: name.clone() };
            self.emit_error(&name, &err);
            return Err(err);
        }

        info!(adapter = %name, platform = %adapter.platform(), "adapter registered");
        self.emit(
            &name,
            ManagerEvent::AdapterAdded {
                name: name.clone(),
                platform: adapter.platform(),
            },
        );
        Ok(adapter)
    }

    fn forward_events(&self, name: &str, adapter: &Adapter) -> Vec<(&'static str, ListenerId)> {
        ADAPTER_EVENT_NAMES
            .iter()
            .map(|&event| {
                let hub = Arc::clone(&self.events);
                let source = name.to_string();
                // Re-emitted under the registry name, which may differ from
                // the adapter's configured name.
                let id = adapter.on(event, move |_, payload| {
                    hub.emit_and_publish(
                        &source,
                        ManagerEvent::Adapter {
                            adapter: source.clone(),
                            event: payload.clone(),
                        },
                    );
                });
                (event, id)
            })
            .collect()
    }

    /// Stop, disconnect, and unregister the adapter called `name`.
    ///
    /// Returns `false` when no such adapter is registered. Disconnect
    /// failures are logged; the adapter is removed regardless.
    pub async fn remove_adapter(&self, name: &str) -> bool {
        let Some(adapter) = self.get_adapter(name) else {
            debug!(adapter = %name, "remove requested for unknown adapter");
            return false;
        };

        if let Err(err) = adapter.stop_monitoring().await {
            warn!(adapter = %name, error = %err, "failed to stop monitoring before removal");
        }
        if let Err(err) = adapter.disconnect().await {
            warn!(adapter = %name, error = %err, "disconnect failed, removing anyway");
        }

        let Some((_, registered)) = self.adapters.remove(name) else {
            return false;
        };
        registered.detach();
        info!(adapter = %name, "adapter removed");
        self.emit(
            name,
            ManagerEvent::AdapterRemoved {
                name: name.to_string(),
            },
        );
        true
    }

    /// Disconnect every adapter and empty the registry.
    pub async fn disconnect_all(&self) -> DisconnectReport {
        let names = self.adapter_names();
        let registered: Vec<(String, Registered)> = names
            .into_iter()
            .filter_map(|name| self.adapters.remove(&name))
            .collect();

        let outcomes = join_all(registered.iter().map(|(name, entry)| async move {
            (name.clone(), entry.adapter.disconnect().await)
        }))
        .await;

        let mut report = DisconnectReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(()) => report.disconnected.push(name),
                Err(err) => {
                    warn!(adapter = %name, error = %err, "disconnect failed");
                    report.failures.push((name, err));
                }
            }
        }
        for (_, entry) in &registered {
            entry.detach();
        }
        info!(
            disconnected = report.disconnected.len(),
            failed = report.failures.len(),
            "all adapters disconnected"
        );
        report
    }

    // --- projections ---

    pub fn get_adapter(&self, name: &str) -> Option<Arc<Adapter>> {
        self.adapters
            .get(name)
            .map(|entry| Arc::clone(&entry.adapter))
    }

    /// Registered names, sorted.
    pub fn adapter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.adapters.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn adapters_by_platform(&self, platform: PlatformType) -> Vec<(String, Arc<Adapter>)> {
        let mut found: Vec<(String, Arc<Adapter>)> = self
            .adapters
            .iter()
            .filter(|e| e.adapter.platform() == platform)
            .map(|e| (e.key().clone(), Arc::clone(&e.adapter)))
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));
        found
    }

    /// Status snapshot of every adapter, keyed by registry name.
    pub fn status(&self) -> BTreeMap<String, AdapterStatus> {
        self.adapters
            .iter()
            .map(|e| (e.key().clone(), e.adapter.status()))
            .collect()
    }

    pub fn platform_counts(&self) -> BTreeMap<PlatformType, usize> {
        let mut counts = BTreeMap::new();
        for entry in self.adapters.iter() {
            *counts.entry(entry.adapter.platform()).or_insert(0) += 1;
        }
        counts
    }

    pub fn authenticated_adapters(&self) -> Vec<String> {
        self.names_where(|adapter| adapter.is_authenticated())
    }

    /// Adapters whose configuration passes factory validation.
    pub fn adapters_with_valid_config(&self) -> Vec<String> {
        self.names_where(|adapter| AdapterFactory::validate_config(adapter.config()))
    }

    fn names_where(&self, keep: impl Fn(&Adapter) -> bool) -> Vec<String> {
        let mut names: Vec<String> = self
            .adapters
            .iter()
            .filter(|e| keep(&e.adapter))
            .map(|e| e.key().clone())
            .collect();
        names.sort();
        names
    }

    // --- fan-out ---

    fn all_targets(&self) -> Vec<Target> {
        self.adapters
            .iter()
            .map(|e| (e.key().clone(), Some(Arc::clone(&e.adapter))))
            .collect()
    }

    /// Post `content` on every registered adapter.
    pub async fn post_to_all(&self, content: &ContentItem) -> BTreeMap<String, ActionResult> {
        let targets = self.all_targets();
        self.post_to(targets, content).await
    }

    /// Post `content` on the named adapters only. Unknown names get a failed
    /// entry.
    pub async fn post_to_adapters(
        &self,
        names: &[&str],
        content: &ContentItem,
    ) -> BTreeMap<String, ActionResult> {
        let targets = names
            .iter()
            .map(|name| (name.to_string(), self.get_adapter(name)))
            .collect();
        self.post_to(targets, content).await
    }

    async fn post_to(
        &self,
        targets: Vec<Target>,
        content: &ContentItem,
    ) -> BTreeMap<String, ActionResult> {
        let outcomes = run_legs("post", targets, |_, adapter| async move {
            require(&adapter, Operation::Post)?;
            adapter.post(content).await
        })
        .await;
        self.complete("post", flatten(outcomes))
    }

    pub async fn follow_on_all(&self, user_id: &str) -> BTreeMap<String, ActionResult> {
        let outcomes = run_legs("follow", self.all_targets(), |_, adapter| async move {
            require(&adapter, Operation::Follow)?;
            adapter.follow(user_id).await
        })
        .await;
        self.complete("follow", flatten(outcomes))
    }

    /// Search every adapter. A successful entry carries the matching items as
    /// a JSON array.
    pub async fn search_all(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> BTreeMap<String, ActionResult> {
        let outcomes = run_legs("search", self.all_targets(), |_, adapter| async move {
            let items = adapter.search(query, options).await?;
            let data = serde_json::to_value(items)
                .map_err(|e| PolycastError::Internal(format!("search results: {e}")))?;
            Ok(ActionResult::success(data))
        })
        .await;
        self.complete("search", flatten(outcomes))
    }

    /// Fetch metrics for one post per adapter, keyed by registry name.
    ///
    /// Adapters without analytics, and adapters whose call fails, report
    /// empty metrics; the failure is still visible in `bulk-complete`.
    pub async fn aggregated_analytics(
        &self,
        post_ids: &BTreeMap<String, String>,
    ) -> BTreeMap<String, ContentMetrics> {
        let targets: Vec<Target> = post_ids
            .keys()
            .map(|name| (name.clone(), self.get_adapter(name)))
            .collect();
        let outcomes = run_legs("analytics", targets, |name, adapter| {
            let post_id = post_ids.get(&name).cloned().unwrap_or_default();
            async move {
                if !adapter.capabilities().supports_analytics {
                    return Err(PolycastError::unsupported(adapter.platform(), "get_analytics"));
                }
                adapter.get_analytics(&post_id).await
            }
        })
        .await;

        let mut metrics = BTreeMap::new();
        let mut results = BTreeMap::new();
        for (name, outcome) in outcomes {
            let (value, result) = match outcome {
                Ok(value) => {
                    let data = serde_json::to_value(&value).unwrap_or_default();
                    (value, ActionResult::success(data))
                }
                Err(message) => (ContentMetrics::default(), ActionResult::failure(message)),
            };
            metrics.insert(name.clone(), value);
            results.insert(name, result);
        }
        self.complete("analytics", results);
        metrics
    }

    pub async fn start_monitoring_all(&self) -> BTreeMap<String, ActionResult> {
        let outcomes = run_legs("start_monitoring", self.all_targets(), |_, adapter| async move {
            adapter.start_monitoring().await.map(|()| ActionResult::ok())
        })
        .await;
        self.complete("start_monitoring", flatten(outcomes))
    }

    pub async fn stop_monitoring_all(&self) -> BTreeMap<String, ActionResult> {
        let outcomes = run_legs("stop_monitoring", self.all_targets(), |_, adapter| async move {
            adapter.stop_monitoring().await.map(|()| ActionResult::ok())
        })
        .await;
        self.complete("stop_monitoring", flatten(outcomes))
    }

    fn complete(
        &self,
        operation: &str,
        results: BTreeMap<String, ActionResult>,
    ) -> BTreeMap<String, ActionResult> {
        let failed = results.values().filter(|r| !r.is_success()).count();
        debug!(%operation, targets = results.len(), failed, "fan-out complete");
        self.emit(
            MANAGER_SOURCE,
            ManagerEvent::BulkComplete {
                operation: operation.to_string(),
                results: results.clone(),
            },
        );
        results
    }
}

impl std::fmt::Debug for AdapterManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterManager")
            .field("adapters", &self.adapter_names())
            .finish()
    }
}

/// Fan-out legs see a capability gap as "unsupported" rather than a violation.
fn require(adapter: &Adapter, operation: Operation) -> Result<(), PolycastError> {
    if adapter.capabilities().allows(operation) {
        Ok(())
    } else {
        Err(PolycastError::unsupported(adapter.platform(), operation.to_string()))
    }
}

/// Run `leg` against every target concurrently and collect each outcome.
///
/// Errors, panics, and missing adapters all become `Err(message)` entries.
async fn run_legs<T, F, Fut>(
    operation: &str,
    targets: Vec<Target>,
    leg: F,
) -> BTreeMap<String, Result<T, String>>
where
    F: Fn(String, Arc<Adapter>) -> Fut,
    Fut: Future<Output = Result<T, PolycastError>>,
{
    let legs = targets.into_iter().map(|(name, adapter)| {
        let call = adapter.map(|adapter| leg(name.clone(), adapter));
        async move {
            let outcome = match call {
                None => Err(PolycastError::AdapterNotFound { name: name.clone() }.to_string()),
                Some(call) => match AssertUnwindSafe(call).catch_unwind().await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => Err(err.to_string()),
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        warn!(adapter = %name, %operation, %message, "fan-out leg panicked");
                        Err(format!("{operation} panicked: {message}"))
                    }
                },
            };
            (name, outcome)
        }
    });
    join_all(legs).await.into_iter().collect()
}

fn flatten(outcomes: BTreeMap<String, Result<ActionResult, String>>) -> BTreeMap<String, ActionResult> {
    outcomes
        .into_iter()
        .map(|(name, outcome)| (name, outcome.unwrap_or_else(ActionResult::failure)))
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
