// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The hook surface a platform collaborator implements.

use async_trait::async_trait;

use crate::capability::CapabilityDescriptor;
use crate::error::PolycastError;
use crate::traits::sink::EventSink;
use crate::types::{ActionResult, ContentItem, ContentMetrics, PlatformType, SearchOptions, UserProfile};

/// Platform-specific behaviour behind an adapter.
///
/// The adapter runs rate limiting, capability gating, and content validation
/// before any `do_*` write hook is called, so implementations only talk to
/// their service. Hooks a service has no equivalent for keep their default,
/// which returns [`PolycastError::Unsupported`].
///
/// Only [`do_initialize`](Self::do_initialize) and later hooks may perform
/// I/O. [`platform`](Self::platform) and [`capabilities`](Self::capabilities)
/// must be cheap and side-effect free.
#[async_trait]
pub trait PlatformHooks: Send + Sync + 'static {
    /// The service this collaborator talks to.
    fn platform(&self) -> PlatformType;

    /// Static capability descriptor for this service.
    fn capabilities(&self) -> CapabilityDescriptor;

    /// Prepare clients and exchange any bootstrap tokens.
    async fn do_initialize(&self) -> Result<(), PolycastError>;

    /// Verify credentials. `Ok(false)` means the service rejected them.
    async fn do_authenticate(&self) -> Result<bool, PolycastError>;

    /// Release clients and cached state.
    async fn do_disconnect(&self) -> Result<(), PolycastError> {
        Ok(())
    }

    async fn do_post(&self, _content: &ContentItem) -> Result<ActionResult, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "post"))
    }

    async fn do_comment(&self, _post_id: &str, _text: &str) -> Result<ActionResult, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "comment"))
    }

    async fn do_share(
        &self,
        _post_id: &str,
        _comment: Option<&str>,
    ) -> Result<ActionResult, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "share"))
    }

    async fn do_delete(&self, _post_id: &str) -> Result<ActionResult, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "delete"))
    }

    async fn do_like(&self, _post_id: &str) -> Result<ActionResult, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "like"))
    }

    async fn do_unlike(&self, _post_id: &str) -> Result<ActionResult, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "unlike"))
    }

    async fn do_follow(&self, _user_id: &str) -> Result<ActionResult, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "follow"))
    }

    async fn do_unfollow(&self, _user_id: &str) -> Result<ActionResult, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "unfollow"))
    }

    /// Fetch a profile. `None` means the authenticated account.
    async fn get_profile(&self, _user_id: Option<&str>) -> Result<UserProfile, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "get_profile"))
    }

    async fn get_content(&self, _post_id: &str) -> Result<ContentItem, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "get_content"))
    }

    async fn search(
        &self,
        _query: &str,
        _options: &SearchOptions,
    ) -> Result<Vec<ContentItem>, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "search"))
    }

    async fn get_analytics(&self, _post_id: &str) -> Result<ContentMetrics, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "get_analytics"))
    }

    /// Register a webhook for `events` delivering to `url`.
    async fn setup_webhook(&self, _url: &str, _events: &[String]) -> Result<bool, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "setup_webhook"))
    }

    async fn remove_webhook(&self, _webhook_id: &str) -> Result<bool, PolycastError> {
        Err(PolycastError::unsupported(self.platform(), "remove_webhook"))
    }

    /// Begin watching for inbound traffic, reporting it through `sink`.
    async fn do_start_monitoring(&self, _sink: EventSink) -> Result<(), PolycastError> {
        Ok(())
    }

    async fn do_stop_monitoring(&self) -> Result<(), PolycastError> {
        Ok(())
    }

    /// Service-specific soft validation run after the generic limit checks.
    async fn do_validate_content(&self, _content: &ContentItem) -> Result<bool, PolycastError> {
        Ok(true)
    }
}
