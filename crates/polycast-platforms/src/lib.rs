// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST platform collaborators for Polycast.
//!
//! One [`PlatformHooks`] implementation per supported service, all sharing
//! [`http::RestClient`]. Constructing hooks never performs I/O and tolerates
//! missing credentials; credentials are checked in `do_initialize`.
//!
//! Every collaborator honours a `base_url` setting that replaces the service
//! host, which is how the tests point them at a mock server.

pub mod discord;
pub mod github;
pub mod http;
pub mod linkedin;
pub mod medium;
pub mod oauth1;
pub mod poll;
pub mod reddit;
pub mod slack;
pub mod twitter;

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};

use polycast_config::{AdapterConfig, AuthKind};
use polycast_core::{ContentItem, ContentType, PlatformHooks, PlatformType, PolycastError};

pub use discord::DiscordHooks;
pub use github::GithubHooks;
pub use linkedin::LinkedinHooks;
pub use medium::MediumHooks;
pub use reddit::RedditHooks;
pub use slack::SlackHooks;
pub use twitter::TwitterHooks;

/// Static facts about a supported service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    pub platform: PlatformType,
    pub auth: AuthKind,
    /// Credential keys `do_initialize` requires.
    pub credentials: &'static [&'static str],
    /// The service's published request budget.
    pub rate_limit_requests: u32,
    pub rate_limit_window_ms: u64,
    pub base_url: &'static str,
}

const PROFILES: [PlatformProfile; 7] = [
    PlatformProfile {
        platform: PlatformType::Twitter,
        auth: AuthKind::Oauth1,
        credentials: &["api_key", "api_secret", "access_token", "access_token_secret"],
        rate_limit_requests: 300,
        rate_limit_window_ms: 15 * 60 * 1000,
        base_url: twitter::BASE_URL,
    },
    PlatformProfile {
        platform: PlatformType::Linkedin,
        auth: AuthKind::Oauth2,
        credentials: &["client_id", "client_secret", "access_token"],
        rate_limit_requests: 100,
        rate_limit_window_ms: 24 * 60 * 60 * 1000,
        base_url: linkedin::BASE_URL,
    },
    PlatformProfile {
        platform: PlatformType::Github,
        auth: AuthKind::Bearer,
        credentials: &["token"],
        rate_limit_requests: 5000,
        rate_limit_window_ms: 60 * 60 * 1000,
        base_url: github::BASE_URL,
    },
    PlatformProfile {
        platform: PlatformType::Discord,
        auth: AuthKind::Bearer,
        credentials: &["token"],
        rate_limit_requests: 50,
        rate_limit_window_ms: 1000,
        base_url: discord::BASE_URL,
    },
    PlatformProfile {
        platform: PlatformType::Slack,
        auth: AuthKind::Bearer,
        credentials: &["token"],
        rate_limit_requests: 50,
        rate_limit_window_ms: 60 * 1000,
        base_url: slack::BASE_URL,
    },
    PlatformProfile {
        platform: PlatformType::Reddit,
        auth: AuthKind::Oauth2,
        credentials: &["client_id", "client_secret", "username", "password"],
        rate_limit_requests: 60,
        rate_limit_window_ms: 60 * 1000,
        base_url: reddit::BASE_URL,
    },
    PlatformProfile {
        platform: PlatformType::Medium,
        auth: AuthKind::Bearer,
        credentials: &["token"],
        rate_limit_requests: 100,
        rate_limit_window_ms: 60 * 60 * 1000,
        base_url: medium::BASE_URL,
    },
];

/// Profile of a built-in platform. `None` for [`PlatformType::Custom`].
pub fn profile(platform: PlatformType) -> Option<&'static PlatformProfile> {
    PROFILES.iter().find(|p| p.platform == platform)
}

/// Profiles of every built-in platform, in declaration order.
pub fn profiles() -> &'static [PlatformProfile] {
    &PROFILES
}

/// Construct the collaborator for `platform`. Performs no I/O.
pub fn build_hooks(
    platform: PlatformType,
    config: &AdapterConfig,
) -> Result<Box<dyn PlatformHooks>, PolycastError> {
    Ok(match platform {
        PlatformType::Twitter => Box::new(TwitterHooks::new(config)?),
        PlatformType::Linkedin => Box::new(LinkedinHooks::new(config)?),
        PlatformType::Github => Box::new(GithubHooks::new(config)?),
        PlatformType::Discord => Box::new(DiscordHooks::new(config)?),
        PlatformType::Slack => Box::new(SlackHooks::new(config)?),
        PlatformType::Reddit => Box::new(RedditHooks::new(config)?),
        PlatformType::Medium => Box::new(MediumHooks::new(config)?),
        PlatformType::Custom => {
            return Err(PolycastError::Config(
                "custom platforms are not yet implemented".to_string(),
            ));
        }
    })
}

/// Credential keys of `platform` that `config` leaves blank.
pub fn missing_credentials(platform: PlatformType, config: &AdapterConfig) -> Vec<&'static str> {
    profile(platform)
        .map(|p| {
            p.credentials
                .iter()
                .copied()
                .filter(|key| config.credential(key).is_none())
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn require_credentials(
    platform: PlatformType,
    config: &AdapterConfig,
) -> Result<(), PolycastError> {
    let missing = missing_credentials(platform, config);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PolycastError::Config(format!(
            "{platform} adapter `{}` is missing credentials: {}",
            config.name,
            missing.join(", ")
        )))
    }
}

/// A credential value, or the empty string.
pub(crate) fn credential(config: &AdapterConfig, key: &str) -> String {
    config.credential(key).unwrap_or_default().to_string()
}

pub(crate) fn content_types(types: &[ContentType]) -> BTreeSet<ContentType> {
    types.iter().copied().collect()
}

pub(crate) fn metadata_str<'a>(content: &'a ContentItem, key: &str) -> Option<&'a str> {
    content.metadata.get(key).and_then(serde_json::Value::as_str)
}

/// Set by the adapter on comment and share text.
pub(crate) fn is_reply(content: &ContentItem) -> bool {
    content.metadata.contains_key("reply_to")
}

/// Account identifier resolved lazily from the service and cached.
#[derive(Debug, Default)]
pub(crate) struct Identity(RwLock<Option<String>>);

impl Identity {
    pub(crate) fn get(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn set(&self, id: String) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(id);
    }

    pub(crate) fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

pub(crate) fn malformed(platform: PlatformType, what: &str) -> PolycastError {
    PolycastError::platform(format!("unexpected {platform} response: missing {what}"))
}
