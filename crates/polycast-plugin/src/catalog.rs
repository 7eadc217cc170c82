// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in platform catalog.
//!
//! Static facts about every compiled-in platform: how it authenticates, which
//! credentials it needs, its published request budget, and its capability
//! descriptor. No network calls are made.

use polycast_config::{AuthKind, RateLimitConfig};
use polycast_core::{CapabilityDescriptor, PlatformType};
use serde::Serialize;

use crate::factory::AdapterFactory;

/// One built-in platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub platform: PlatformType,
    pub auth: AuthKind,
    pub credentials: Vec<&'static str>,
    pub rate_limit: RateLimitConfig,
    pub base_url: &'static str,
    pub capabilities: CapabilityDescriptor,
}

/// Catalog entries for every built-in platform, in declaration order.
pub fn builtin_catalog() -> Vec<CatalogEntry> {
    polycast_platforms::profiles()
        .iter()
        .filter_map(|profile| {
            let capabilities = AdapterFactory::platform_capabilities(profile.platform).ok()?;
            Some(CatalogEntry {
                platform: profile.platform,
                auth: profile.auth,
                credentials: profile.credentials.to_vec(),
                rate_limit: RateLimitConfig {
                    requests: profile.rate_limit_requests,
                    window_ms: profile.rate_limit_window_ms,
                },
                base_url: profile.base_url,
                capabilities,
            })
        })
        .collect()
}

/// Entries whose platform name contains `query` (case-insensitive).
///
/// An empty query returns the whole catalog.
pub fn search_catalog(query: &str) -> Vec<CatalogEntry> {
    let query = query.trim().to_lowercase();
    builtin_catalog()
        .into_iter()
        .filter(|entry| query.is_empty() || entry.platform.to_string().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycast_core::Operation;

    #[test]
    fn catalog_lists_every_builtin_platform() {
        let catalog = builtin_catalog();
        let platforms: Vec<PlatformType> = catalog.iter().map(|e| e.platform).collect();
        assert_eq!(platforms, PlatformType::BUILTIN.to_vec());
    }

    #[test]
    fn twitter_entry_matches_published_limits() {
        let twitter = builtin_catalog()
            .into_iter()
            .find(|e| e.platform == PlatformType::Twitter)
            .unwrap();
        assert_eq!(twitter.auth, AuthKind::Oauth1);
        assert_eq!(twitter.capabilities.max_content_length, 280);
        assert_eq!(twitter.rate_limit.requests, 300);
        assert!(twitter.credentials.contains(&"access_token_secret"));
    }

    #[test]
    fn medium_is_publish_only() {
        let medium = search_catalog("medium");
        assert_eq!(medium.len(), 1);
        let caps = &medium[0].capabilities;
        assert!(caps.allows(Operation::Post));
        for op in [Operation::Comment, Operation::Like, Operation::Follow, Operation::Share] {
            assert!(!caps.allows(op), "{op:?} should be disabled");
        }
    }

    #[test]
    fn search_is_case_insensitive() {
        assert_eq!(search_catalog("GitHub").len(), 1);
        assert_eq!(search_catalog("").len(), PlatformType::BUILTIN.len());
        assert!(search_catalog("myspace").is_empty());
    }

    #[test]
    fn entries_serialize_for_json_output() {
        let value = serde_json::to_value(builtin_catalog()).unwrap();
        assert_eq!(value[0]["platform"], "twitter");
        assert_eq!(value[0]["auth"], "oauth1");
        assert_eq!(value[0]["capabilities"]["max_content_length"], 280);
    }
}
