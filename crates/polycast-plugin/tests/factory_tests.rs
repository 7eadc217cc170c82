// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for validated adapter construction.

use std::collections::BTreeMap;

use polycast_adapter::LifecycleState;
use polycast_config::{AdapterConfig, AuthKind};
use polycast_core::{PlatformType, PolycastError};
use polycast_plugin::AdapterFactory;

fn github(name: &str) -> AdapterConfig {
    AdapterConfig::new(PlatformType::Github, name, AuthKind::Bearer).with_credential("token", "ghp_x")
}

#[test]
fn validated_construction_accepts_complete_config() {
    let adapter = AdapterFactory::new()
        .create_validated_adapter(github("gh"))
        .unwrap();
    assert_eq!(adapter.name(), "gh");
    assert_eq!(adapter.platform(), PlatformType::Github);
    assert_eq!(adapter.state(), LifecycleState::Uninitialized);
}

#[test]
fn validated_construction_rejects_missing_credentials() {
    let config = AdapterConfig::new(PlatformType::Twitter, "tw", AuthKind::Oauth1)
        .with_credential("api_key", "k")
        .with_credential("api_secret", "s");
    assert!(!AdapterFactory::validate_config(&config));

    let err = AdapterFactory::new()
        .create_validated_adapter(config)
        .err()
        .unwrap();
    assert!(matches!(err, PolycastError::Config(ref m) if m.contains("twitter")));
}

#[test]
fn validated_construction_rejects_missing_identity() {
    let mut config = github("gh");
    config.version = " ".to_string();
    assert!(!AdapterFactory::validate_config(&config));

    config = github("gh");
    config.platform = None;
    assert!(!AdapterFactory::validate_config(&config));
    assert!(AdapterFactory::new().create_validated_adapter(config).is_err());
}

fn twitter() -> AdapterConfig {
    AdapterConfig::new(PlatformType::Twitter, "tw", AuthKind::Oauth1)
        .with_credential("api_key", "k")
        .with_credential("api_secret", "s")
        .with_credential("access_token", "t")
        .with_credential("access_token_secret", "ts")
}

#[test]
fn every_oauth1_key_is_required() {
    let factory = AdapterFactory::new();
    assert!(factory.create_validated_adapter(twitter()).is_ok());

    for key in ["api_key", "api_secret", "access_token", "access_token_secret"] {
        let mut config = twitter();
        config.auth.credentials.remove(key);
        assert!(!AdapterFactory::validate_config(&config), "{key} removed");
        assert!(factory.create_validated_adapter(config).is_err(), "{key} removed");

        let blank = twitter().with_credential(key, "");
        assert!(!AdapterFactory::validate_config(&blank), "{key} blank");
    }
}

#[test]
fn blank_name_or_missing_auth_kind_is_rejected() {
    let factory = AdapterFactory::new();

    let mut config = github("gh");
    config.name = String::new();
    assert!(!AdapterFactory::validate_config(&config));
    assert!(matches!(
        factory.create_validated_adapter(config),
        Err(PolycastError::Config(_))
    ));

    let mut config = github("gh");
    config.auth.kind = None;
    assert!(!AdapterFactory::validate_config(&config));
    assert!(matches!(
        factory.create_validated_adapter(config),
        Err(PolycastError::Config(_))
    ));
}

#[test]
fn reddit_uses_password_grant_credentials() {
    let base = AdapterConfig::new(PlatformType::Reddit, "rd", AuthKind::Oauth2)
        .with_credential("client_id", "id")
        .with_credential("client_secret", "secret");
    assert!(!AdapterFactory::validate_config(&base.clone().with_credential("access_token", "t")));
    assert!(AdapterFactory::validate_config(
        &base.with_credential("username", "u").with_credential("password", "p")
    ));
}

#[test]
fn platform_mismatch_is_rejected() {
    let err = AdapterFactory::new()
        .create_adapter(PlatformType::Slack, github("gh"))
        .err()
        .unwrap();
    assert!(matches!(err, PolycastError::Config(_)));
}

#[test]
fn untagged_config_is_bound_to_requested_platform() {
    let mut config = github("gh");
    config.platform = None;
    let adapter = AdapterFactory::new()
        .create_adapter(PlatformType::Github, config)
        .unwrap();
    assert_eq!(adapter.config().platform, Some(PlatformType::Github));
}

#[test]
fn custom_platform_is_not_implemented() {
    let config = AdapterConfig::new(PlatformType::Custom, "mine", AuthKind::ApiKey);
    let err = AdapterFactory::new()
        .create_adapter(PlatformType::Custom, config)
        .err()
        .unwrap();
    assert!(matches!(err, PolycastError::Config(ref m) if m.contains("not yet implemented")));
}

#[test]
fn batch_build_skips_failures_and_disabled_entries() {
    let mut adapters = BTreeMap::new();
    adapters.insert("good".to_string(), github("good"));
    adapters.insert(
        "no-token".to_string(),
        AdapterConfig::new(PlatformType::Slack, "no-token", AuthKind::Bearer),
    );
    let mut off = github("off");
    off.enabled = false;
    adapters.insert("off".to_string(), off);
    let mut unnamed = github("");
    unnamed.name = String::new();
    adapters.insert("unnamed".to_string(), unnamed);

    let report = AdapterFactory::new().create_adapters_from_config(&adapters);

    let built: Vec<&str> = report.adapters.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(built, vec!["good", "unnamed"]);
    assert_eq!(report.adapters[1].1.name(), "unnamed");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "no-token");
    assert_eq!(report.disabled, vec!["off".to_string()]);
    assert!(!report.is_clean());
}
