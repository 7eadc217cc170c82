// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The adapter: lifecycle state, the operation pipeline, and event emission
//! around a boxed [`PlatformHooks`] implementation.

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use polycast_bus::{EventHub, ListenerId};
use polycast_config::AdapterConfig;
use polycast_core::{
    ActionResult, AdapterEvent, CapabilityDescriptor, ContentItem, ContentMetrics, EventSink,
    Operation, PlatformHooks, PlatformType, PolycastError, RateLimitInfo, SearchOptions,
    UserProfile,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;
use crate::state::{AdapterStatus, LifecycleState};
use crate::validation::check_content;

/// Default bound on a single authentication attempt.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(30);

/// A write request flowing through the pipeline.
enum Request<'a> {
    Post(&'a ContentItem),
    Comment { post_id: &'a str, text: &'a str },
    Share { post_id: &'a str, comment: Option<&'a str> },
    Delete(&'a str),
    Like(&'a str),
    Unlike(&'a str),
    Follow(&'a str),
    Unfollow(&'a str),
}

impl Request<'_> {
    fn operation(&self) -> Operation {
        match self {
            Request::Post(_) => Operation::Post,
            Request::Comment { .. } => Operation::Comment,
            Request::Share { .. } => Operation::Share,
            Request::Delete(_) => Operation::Delete,
            Request::Like(_) => Operation::Like,
            Request::Unlike(_) => Operation::Unlike,
            Request::Follow(_) => Operation::Follow,
            Request::Unfollow(_) => Operation::Unfollow,
        }
    }

    /// User-authored content that must pass validation, if any.
    ///
    /// Comment and share text is tagged with a `reply_to` metadata entry so
    /// platform validation can tell replies from top-level posts.
    fn content(&self) -> Option<Cow<'_, ContentItem>> {
        let reply = |post_id: &str, text: &str| {
            ContentItem::text(text).with_metadata("reply_to", serde_json::Value::from(post_id))
        };
        match self {
            Request::Post(item) => Some(Cow::Borrowed(*item)),
            Request::Comment { post_id, text } => Some(Cow::Owned(reply(*post_id, *text))),
            Request::Share {
                post_id,
                comment: Some(text),
            } => Some(Cow::Owned(reply(*post_id, *text))),
            _ => None,
        }
    }
}

/// Domain event announced after a successful write.
fn success_event(operation: Operation, result: &ActionResult) -> Option<AdapterEvent> {
    match operation {
        Operation::Post => Some(AdapterEvent::ContentPosted(result.clone())),
        Operation::Comment => Some(AdapterEvent::ContentCommented(result.clone())),
        Operation::Share => Some(AdapterEvent::ContentShared(result.clone())),
        Operation::Like => Some(AdapterEvent::ContentLiked(result.clone())),
        _ => None,
    }
}

/// One configured connection to an external service.
///
/// Write operations run the same pipeline: rate-limit check, capability
/// gate, content validation, hook call with retry, then event emission.
/// Ordinary service failures come back as a failed [`ActionResult`]; only
/// rate-limit rejections, capability violations, unsupported operations, and
/// malformed input are returned as errors.
pub struct Adapter {
    name: String,
    platform: PlatformType,
    config: AdapterConfig,
    capabilities: CapabilityDescriptor,
    hooks: Box<dyn PlatformHooks>,
    events: Arc<EventHub<AdapterEvent>>,
    rate_limiter: Option<RateLimiter>,
    retry: RetryPolicy,
    auth_timeout: Duration,
    state: AtomicU8,
    authenticated: AtomicBool,
    /// Serializes initialize/authenticate/disconnect.
    lifecycle: Mutex<()>,
    /// Held across monitoring hooks so they never run twice concurrently.
    monitoring: Mutex<bool>,
    monitoring_active: AtomicBool,
}

impl Adapter {
    /// Build an adapter around `hooks`.
    ///
    /// The capability descriptor is read from the hooks once, here. Fails with
    /// [`PolycastError::Config`] when the config names no platform or a
    /// different platform than the hooks serve.
    pub fn new(config: AdapterConfig, hooks: Box<dyn PlatformHooks>) -> Result<Self, PolycastError> {
        let platform = config.platform.ok_or_else(|| {
            PolycastError::Config(format!("adapter `{}` has no platform", config.name))
        })?;
        if platform != hooks.platform() {
            return Err(PolycastError::Config(format!(
                "adapter `{}` is configured for {platform} but its hooks serve {}",
                config.name,
                hooks.platform()
            )));
        }

        let capabilities = hooks.capabilities();
        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::from_config);
        let retry = RetryPolicy::from_config(config.retry.as_ref());

        Ok(Self {
            name: config.name.clone(),
            platform,
            config,
            capabilities,
            hooks,
            events: Arc::new(EventHub::new()),
            rate_limiter,
            retry,
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
            state: AtomicU8::new(LifecycleState::Uninitialized as u8),
            authenticated: AtomicBool::new(false),
            lifecycle: Mutex::new(()),
            monitoring: Mutex::new(false),
            monitoring_active: AtomicBool::new(false),
        })
    }

    /// Bound authentication attempts by `timeout` instead of the default.
    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn platform(&self) -> PlatformType {
        self.platform
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &CapabilityDescriptor {
        &self.capabilities
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Acquire)
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring_active.load(Ordering::Acquire)
    }

    /// Snapshot from the most recent rate-limit rejection.
    pub fn last_rate_limit(&self) -> Option<RateLimitInfo> {
        self.rate_limiter.as_ref().and_then(RateLimiter::last_rejection)
    }

    pub fn status(&self) -> AdapterStatus {
        AdapterStatus {
            name: self.name.clone(),
            platform: self.platform,
            state: self.state(),
            enabled: self.config.enabled,
            authenticated: self.is_authenticated(),
            monitoring: self.is_monitoring(),
            last_rate_limit: self.last_rate_limit(),
        }
    }

    /// Event hub for this adapter.
    pub fn events(&self) -> &Arc<EventHub<AdapterEvent>> {
        &self.events
    }

    /// Register a listener for the event named `event`.
    ///
    /// The listener is called with this adapter's name and the event.
    pub fn on<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&str, &AdapterEvent) + Send + Sync + 'static,
    {
        let name = self.name.clone();
        self.events
            .notifier()
            .on(event, move |payload| listener(&name, payload))
    }

    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.events.notifier().off(event, id)
    }

    fn emit(&self, event: AdapterEvent) {
        self.events.emit_and_publish(&self.name, event);
    }

    fn emit_error(&self, err: &PolycastError) {
        self.emit(AdapterEvent::Error {
            message: err.to_string(),
        });
    }

    // --- lifecycle ---

    /// Run the platform's initialization hook.
    ///
    /// A no-op when already initialized or authenticated. On failure the
    /// adapter keeps its previous state.
    pub async fn initialize(&self) -> Result<(), PolycastError> {
        let _guard = self.lifecycle.lock().await;
        if self.state().is_ready() {
            debug!(adapter = %self.name, "already initialized");
            return Ok(());
        }

        match self.hooks.do_initialize().await {
            Ok(()) => {
                self.set_state(LifecycleState::Initialized);
                info!(adapter = %self.name, platform = %self.platform, "adapter initialized");
                self.emit(AdapterEvent::Ready);
                Ok(())
            }
            Err(err) => {
                warn!(adapter = %self.name, platform = %self.platform, error = %err, "initialization failed");
                self.emit_error(&err);
                Err(err)
            }
        }
    }

    /// Verify credentials with the service. Never fails.
    ///
    /// Only an initialized adapter may authenticate. A hook error, a
    /// rejection, or exceeding the authentication timeout all count as
    /// failure.
    pub async fn authenticate(&self) -> bool {
        let _guard = self.lifecycle.lock().await;

        if !self.state().is_ready() {
            let reason = format!("adapter is {}, not initialized", self.state());
            warn!(adapter = %self.name, platform = %self.platform, %reason, "authentication refused");
            self.emit(AdapterEvent::AuthenticationFailed {
                reason: Some(reason),
            });
            return false;
        }

        let outcome = tokio::time::timeout(self.auth_timeout, self.hooks.do_authenticate()).await;
        let failure = match outcome {
            Ok(Ok(true)) => None,
            Ok(Ok(false)) => Some("credentials rejected".to_string()),
            Ok(Err(err)) => Some(err.to_string()),
            Err(_) => Some(format!(
                "authentication timed out after {:?}",
                self.auth_timeout
            )),
        };

        match failure {
            None => {
                self.authenticated.store(true, Ordering::Release);
                self.set_state(LifecycleState::Authenticated);
                info!(adapter = %self.name, platform = %self.platform, "authenticated");
                self.emit(AdapterEvent::Authenticated);
                true
            }
            Some(reason) => {
                self.authenticated.store(false, Ordering::Release);
                if self.state() == LifecycleState::Authenticated {
                    self.set_state(LifecycleState::Initialized);
                }
                warn!(adapter = %self.name, platform = %self.platform, %reason, "authentication failed");
                self.emit(AdapterEvent::AuthenticationFailed {
                    reason: Some(reason),
                });
                false
            }
        }
    }

    /// Stop monitoring, then release the service connection.
    ///
    /// A monitoring hook that fails to stop is abandoned: the adapter no
    /// longer reports itself as monitoring either way.
    pub async fn disconnect(&self) -> Result<(), PolycastError> {
        if let Err(err) = self.stop_monitoring().await {
            warn!(adapter = %self.name, error = %err, "failed to stop monitoring during disconnect");
            let mut active = self.monitoring.lock().await;
            *active = false;
            self.monitoring_active.store(false, Ordering::Release);
        }

        let _guard = self.lifecycle.lock().await;
        match self.hooks.do_disconnect().await {
            Ok(()) => {
                self.authenticated.store(false, Ordering::Release);
                self.set_state(LifecycleState::Disconnected);
                info!(adapter = %self.name, "adapter disconnected");
                self.emit(AdapterEvent::Disconnected);
                Ok(())
            }
            Err(err) => {
                warn!(adapter = %self.name, error = %err, "disconnect failed");
                self.emit_error(&err);
                Err(err)
            }
        }
    }

    /// Sink handed to monitoring hooks; reports through this adapter's hub.
    pub fn event_sink(&self) -> EventSink {
        let events = Arc::clone(&self.events);
        let source = self.name.clone();
        EventSink::new(move |event| {
            events.emit_and_publish(&source, event);
        })
    }

    /// Begin monitoring. Calling this while already monitoring does nothing.
    pub async fn start_monitoring(&self) -> Result<(), PolycastError> {
        let mut active = self.monitoring.lock().await;
        if *active {
            return Ok(());
        }
        if let Err(err) = self.hooks.do_start_monitoring(self.event_sink()).await {
            warn!(adapter = %self.name, error = %err, "failed to start monitoring");
            self.emit_error(&err);
            return Err(err);
        }
        *active = true;
        self.monitoring_active.store(true, Ordering::Release);
        debug!(adapter = %self.name, "monitoring started");
        self.emit(AdapterEvent::MonitoringStarted);
        Ok(())
    }

    /// Stop monitoring. Calling this while not monitoring does nothing.
    pub async fn stop_monitoring(&self) -> Result<(), PolycastError> {
        let mut active = self.monitoring.lock().await;
        if !*active {
            return Ok(());
        }
        if let Err(err) = self.hooks.do_stop_monitoring().await {
            warn!(adapter = %self.name, error = %err, "failed to stop monitoring");
            self.emit_error(&err);
            return Err(err);
        }
        *active = false;
        self.monitoring_active.store(false, Ordering::Release);
        debug!(adapter = %self.name, "monitoring stopped");
        self.emit(AdapterEvent::MonitoringStopped);
        Ok(())
    }

    // --- write operations ---

    pub async fn post(&self, content: &ContentItem) -> Result<ActionResult, PolycastError> {
        self.dispatch(Request::Post(content)).await
    }

    pub async fn comment(&self, post_id: &str, text: &str) -> Result<ActionResult, PolycastError> {
        self.dispatch(Request::Comment { post_id, text }).await
    }

    pub async fn share(
        &self,
        post_id: &str,
        comment: Option<&str>,
    ) -> Result<ActionResult, PolycastError> {
        self.dispatch(Request::Share { post_id, comment }).await
    }

    pub async fn delete(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        self.dispatch(Request::Delete(post_id)).await
    }

    pub async fn like(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        self.dispatch(Request::Like(post_id)).await
    }

    pub async fn unlike(&self, post_id: &str) -> Result<ActionResult, PolycastError> {
        self.dispatch(Request::Unlike(post_id)).await
    }

    pub async fn follow(&self, user_id: &str) -> Result<ActionResult, PolycastError> {
        self.dispatch(Request::Follow(user_id)).await
    }

    pub async fn unfollow(&self, user_id: &str) -> Result<ActionResult, PolycastError> {
        self.dispatch(Request::Unfollow(user_id)).await
    }

    /// Check content against this adapter's limits and the platform's own rules.
    ///
    /// Returns `Ok(false)` for limit violations and
    /// `Err(PolycastError::Validation)` for structurally invalid content.
    pub async fn validate_content(&self, content: &ContentItem) -> Result<bool, PolycastError> {
        if !check_content(&self.capabilities, content)? {
            return Ok(false);
        }
        self.hooks.do_validate_content(content).await
    }

    fn check_rate_limit(&self) -> Result<(), PolycastError> {
        let Some(limiter) = &self.rate_limiter else {
            return Ok(());
        };
        limiter.try_acquire().map_err(|info| {
            let retry_after = info.retry_after;
            warn!(adapter = %self.name, ?retry_after, "rate limit exceeded");
            self.emit(AdapterEvent::RateLimit(info));
            PolycastError::RateLimitExceeded { retry_after }
        })
    }

    async fn invoke(&self, request: &Request<'_>) -> Result<ActionResult, PolycastError> {
        match *request {
            Request::Post(content) => self.hooks.do_post(content).await,
            Request::Comment { post_id, text } => self.hooks.do_comment(post_id, text).await,
            Request::Share { post_id, comment } => self.hooks.do_share(post_id, comment).await,
            Request::Delete(id) => self.hooks.do_delete(id).await,
            Request::Like(id) => self.hooks.do_like(id).await,
            Request::Unlike(id) => self.hooks.do_unlike(id).await,
            Request::Follow(id) => self.hooks.do_follow(id).await,
            Request::Unfollow(id) => self.hooks.do_unfollow(id).await,
        }
    }

    async fn dispatch(&self, request: Request<'_>) -> Result<ActionResult, PolycastError> {
        let operation = request.operation();

        self.check_rate_limit()?;

        if !self.capabilities.allows(operation) {
            debug!(adapter = %self.name, %operation, "blocked by capability gate");
            return Err(PolycastError::CapabilityViolation {
                platform: self.platform,
                operation,
            });
        }

        if let Some(content) = request.content() {
            if !self.validate_content(&content).await? {
                debug!(adapter = %self.name, %operation, "content failed validation");
                return Ok(ActionResult::failure(format!(
                    "content failed {} validation for {operation}",
                    self.platform
                )));
            }
        }

        match self.retry.run(|| self.invoke(&request)).await {
            Ok(result) if result.is_success() => {
                debug!(adapter = %self.name, %operation, "operation succeeded");
                if let Some(event) = success_event(operation, &result) {
                    self.emit(event);
                }
                Ok(result)
            }
            Ok(result) => {
                let message = result.error().unwrap_or("unknown error").to_string();
                warn!(adapter = %self.name, %operation, error = %message, "operation failed");
                self.emit(AdapterEvent::Error { message });
                Ok(result)
            }
            Err(err) if err.escapes_pipeline() => Err(err),
            Err(err) => {
                warn!(adapter = %self.name, %operation, error = %err, "operation failed");
                self.emit_error(&err);
                Ok(ActionResult::failure(err.to_string()))
            }
        }
    }

    // --- read operations ---

    pub async fn get_profile(&self, user_id: Option<&str>) -> Result<UserProfile, PolycastError> {
        self.check_rate_limit()?;
        self.hooks.get_profile(user_id).await
    }

    pub async fn get_content(&self, post_id: &str) -> Result<ContentItem, PolycastError> {
        self.check_rate_limit()?;
        self.hooks.get_content(post_id).await
    }

    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<ContentItem>, PolycastError> {
        self.check_rate_limit()?;
        self.hooks.search(query, options).await
    }

    pub async fn get_analytics(&self, post_id: &str) -> Result<ContentMetrics, PolycastError> {
        self.check_rate_limit()?;
        if !self.capabilities.supports_analytics {
            return Err(PolycastError::unsupported(self.platform, "get_analytics"));
        }
        self.hooks.get_analytics(post_id).await
    }

    pub async fn setup_webhook(&self, url: &str, events: &[String]) -> Result<bool, PolycastError> {
        self.check_rate_limit()?;
        if !self.capabilities.supports_webhooks {
            return Err(PolycastError::unsupported(self.platform, "setup_webhook"));
        }
        self.hooks.setup_webhook(url, events).await
    }

    pub async fn remove_webhook(&self, webhook_id: &str) -> Result<bool, PolycastError> {
        self.check_rate_limit()?;
        if !self.capabilities.supports_webhooks {
            return Err(PolycastError::unsupported(self.platform, "remove_webhook"));
        }
        self.hooks.remove_webhook(webhook_id).await
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("name", &self.name)
            .field("platform", &self.platform)
            .field("state", &self.state())
            .field("authenticated", &self.is_authenticated())
            .field("monitoring", &self.is_monitoring())
            .finish_non_exhaustive()
    }
}
