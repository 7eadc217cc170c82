// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the adapter operation pipeline.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use polycast_adapter::Adapter;
use polycast_bus::EventFilter;
use polycast_config::{Backoff, RateLimitConfig, RetryConfig};
use polycast_core::{
    ADAPTER_EVENT_NAMES, ContentItem, MediaItem, ContentType, Operation, PlatformType,
    PolycastError, SearchOptions,
};
use polycast_test_utils::{SpyHooks, spy_config};

fn adapter_with(spy: SpyHooks) -> Adapter {
    let platform = polycast_core::PlatformHooks::platform(&spy);
    Adapter::new(spy_config(platform, "spy"), Box::new(spy)).unwrap()
}

fn record_events(adapter: &Adapter) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for name in ADAPTER_EVENT_NAMES {
        let seen = Arc::clone(&seen);
        adapter.on(name, move |_, event| {
            seen.lock().unwrap().push(event.name().to_string());
        });
    }
    seen
}

/// A disabled capability blocks the call before the hook runs.
#[tokio::test]
async fn capability_gate_blocks_before_hook() {
    let spy = SpyHooks::new(PlatformType::Medium).deny(Operation::Follow);
    let handle = spy.handle();
    let adapter = adapter_with(spy);

    let err = adapter.follow("someone").await.unwrap_err();
    assert!(matches!(
        err,
        PolycastError::CapabilityViolation {
            operation: Operation::Follow,
            ..
        }
    ));
    let err = adapter.unfollow("someone").await.unwrap_err();
    assert!(matches!(err, PolycastError::CapabilityViolation { .. }));
    assert_eq!(handle.count("do_follow"), 0);
    assert_eq!(handle.count("do_unfollow"), 0);
}

/// A successful post returns the hook's result and announces it.
#[tokio::test]
async fn successful_post_emits_content_posted() {
    let adapter = adapter_with(SpyHooks::new(PlatformType::Twitter));
    let seen = record_events(&adapter);

    let result = adapter.post(&ContentItem::text("hello")).await.unwrap();

    assert!(result.is_success());
    assert_eq!(result.data().unwrap()["hook"], "do_post");
    assert_eq!(*seen.lock().unwrap(), vec!["content:posted"]);
}

#[tokio::test]
async fn delete_and_follow_emit_no_domain_event() {
    let adapter = adapter_with(SpyHooks::new(PlatformType::Twitter));
    let seen = record_events(&adapter);

    assert!(adapter.delete("p1").await.unwrap().is_success());
    assert!(adapter.follow("u1").await.unwrap().is_success());
    assert!(adapter.like("p1").await.unwrap().is_success());

    assert_eq!(*seen.lock().unwrap(), vec!["content:liked"]);
}

/// Over-length content fails softly without reaching the service.
#[tokio::test]
async fn over_length_content_is_a_failed_result() {
    let caps = polycast_core::CapabilityDescriptor {
        max_content_length: 10,
        ..SpyHooks::full_capabilities()
    };
    let spy = SpyHooks::new(PlatformType::Twitter).with_capabilities(caps);
    let handle = spy.handle();
    let adapter = adapter_with(spy);

    let result = adapter.post(&ContentItem::text("x".repeat(20))).await.unwrap();

    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("validation"));
    assert_eq!(handle.count("do_post"), 0);
}

#[tokio::test]
async fn empty_content_is_a_validation_error() {
    let spy = SpyHooks::new(PlatformType::Discord);
    let handle = spy.handle();
    let adapter = adapter_with(spy);

    let err = adapter.post(&ContentItem::text("")).await.unwrap_err();

    assert!(matches!(err, PolycastError::Validation(_)));
    assert_eq!(handle.count("do_post"), 0);
}

#[tokio::test]
async fn media_only_post_passes_validation() {
    let adapter = adapter_with(SpyHooks::new(PlatformType::Discord));
    let item = ContentItem::new(ContentType::Image, "")
        .with_media(MediaItem::new(ContentType::Image, "https://cdn.example/a.png").with_size(1024));

    assert!(adapter.post(&item).await.unwrap().is_success());
}

#[tokio::test]
async fn platform_rejection_is_a_failed_result() {
    let spy = SpyHooks::new(PlatformType::Reddit).rejecting_content();
    let handle = spy.handle();
    let adapter = adapter_with(spy);

    let result = adapter.comment("p1", "nice post").await.unwrap();

    assert!(!result.is_success());
    assert_eq!(handle.count("do_validate_content"), 1);
    assert_eq!(handle.count("do_comment"), 0);
}

/// Comment text runs through validation too.
#[tokio::test]
async fn comment_text_is_validated() {
    let spy = SpyHooks::new(PlatformType::Github);
    let handle = spy.handle();
    let adapter = adapter_with(spy);

    let err = adapter.comment("issue-1", "").await.unwrap_err();
    assert!(matches!(err, PolycastError::Validation(_)));

    assert!(adapter.share("p1", None).await.unwrap().is_success());
    assert_eq!(handle.count("do_validate_content"), 0);
}

#[tokio::test]
async fn permanent_hook_failure_is_reported_and_announced() {
    let spy = SpyHooks::new(PlatformType::Slack).fail_on("do_post");
    let handle = spy.handle();
    let adapter = adapter_with(spy);
    let seen = record_events(&adapter);

    let result = adapter.post(&ContentItem::text("hi")).await.unwrap();

    assert!(!result.is_success());
    assert!(result.error().unwrap().contains("do_post failed"));
    assert_eq!(handle.count("do_post"), 1);
    assert_eq!(*seen.lock().unwrap(), vec!["error"]);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried() {
    let spy = SpyHooks::new(PlatformType::Linkedin).fail_transiently("do_post", 2);
    let handle = spy.handle();
    let mut config = spy_config(PlatformType::Linkedin, "li");
    config.retry = Some(RetryConfig {
        attempts: 3,
        delay_ms: 100,
        backoff: Backoff::Exponential,
    });
    let adapter = Adapter::new(config, Box::new(spy)).unwrap();

    let result = adapter.post(&ContentItem::text("hi")).await.unwrap();

    assert!(result.is_success());
    assert_eq!(handle.count("do_post"), 3);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_yield_failed_result() {
    let spy = SpyHooks::new(PlatformType::Linkedin).fail_transiently("do_like", 5);
    let handle = spy.handle();
    let mut config = spy_config(PlatformType::Linkedin, "li");
    config.retry = Some(RetryConfig {
        attempts: 1,
        delay_ms: 50,
        backoff: Backoff::Fixed,
    });
    let adapter = Adapter::new(config, Box::new(spy)).unwrap();

    let result = adapter.like("p1").await.unwrap();

    assert!(!result.is_success());
    assert_eq!(handle.count("do_like"), 2);
}

#[tokio::test]
async fn rate_limit_rejection_emits_event() {
    let spy = SpyHooks::new(PlatformType::Twitter);
    let handle = spy.handle();
    let mut config = spy_config(PlatformType::Twitter, "tw");
    config.rate_limit = Some(RateLimitConfig {
        requests: 1,
        window_ms: 60_000,
    });
    let adapter = Adapter::new(config, Box::new(spy)).unwrap();
    let seen = record_events(&adapter);

    assert!(adapter.post(&ContentItem::text("one")).await.unwrap().is_success());
    let err = adapter.post(&ContentItem::text("two")).await.unwrap_err();

    assert!(matches!(err, PolycastError::RateLimitExceeded { .. }));
    assert_eq!(handle.count("do_post"), 1);
    assert_eq!(*seen.lock().unwrap(), vec!["content:posted", "ratelimit"]);
    let info = adapter.last_rate_limit().unwrap();
    assert_eq!(info.limit, 1);
    assert_eq!(info.remaining, 0);
    assert!(adapter.status().last_rate_limit.is_some());
}

#[tokio::test]
async fn reads_share_the_rate_limit() {
    let mut config = spy_config(PlatformType::Github, "gh");
    config.rate_limit = Some(RateLimitConfig {
        requests: 2,
        window_ms: 60_000,
    });
    let adapter = Adapter::new(config, Box::new(SpyHooks::new(PlatformType::Github))).unwrap();

    let profile = adapter.get_profile(Some("octo")).await.unwrap();
    assert_eq!(profile.id, "octo");
    let found = adapter.search("rust", &SearchOptions::limit(3)).await.unwrap();
    assert_eq!(found.len(), 3);

    let err = adapter.get_content("1").await.unwrap_err();
    assert!(matches!(err, PolycastError::RateLimitExceeded { .. }));
}

#[tokio::test]
async fn analytics_without_support_is_unsupported() {
    let spy = SpyHooks::new(PlatformType::Medium).without_analytics();
    let handle = spy.handle();
    let adapter = adapter_with(spy);

    let err = adapter.get_analytics("p1").await.unwrap_err();

    assert!(matches!(err, PolycastError::Unsupported { .. }));
    assert_eq!(handle.count("get_analytics"), 0);
}

#[tokio::test]
async fn posted_event_reaches_bus_subscribers() {
    let adapter = adapter_with(SpyHooks::new(PlatformType::Slack));
    let mut sub = adapter
        .events()
        .bus()
        .subscribe(EventFilter::types(["content:posted"]));

    adapter.like("p1").await.unwrap();
    adapter.post(&ContentItem::text("to the bus")).await.unwrap();

    let envelope = sub.try_recv().unwrap();
    assert_eq!(envelope.event_type, "content:posted");
    assert_eq!(envelope.source, "spy");
    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn hooks_for_other_platform_are_rejected() {
    let err = Adapter::new(
        spy_config(PlatformType::Twitter, "tw"),
        Box::new(SpyHooks::new(PlatformType::Slack)),
    )
    .unwrap_err();
    assert!(matches!(err, PolycastError::Config(_)));
}

#[tokio::test(start_paused = true)]
async fn slow_hooks_do_not_block_other_operations() {
    let adapter = Arc::new(adapter_with(
        SpyHooks::new(PlatformType::Discord).with_hook_delay(Duration::from_millis(200)),
    ));

    let a = {
        let adapter = Arc::clone(&adapter);
        tokio::spawn(async move { adapter.like("p1").await })
    };
    let b = {
        let adapter = Arc::clone(&adapter);
        tokio::spawn(async move { adapter.follow("u1").await })
    };

    assert!(a.await.unwrap().unwrap().is_success());
    assert!(b.await.unwrap().unwrap().is_success());
}

#[tokio::test]
async fn webhooks_pass_through_when_supported() {
    let spy = SpyHooks::new(PlatformType::Github);
    let handle = spy.handle();
    let adapter = adapter_with(spy);

    let events = vec!["issues".to_string()];
    assert!(adapter.setup_webhook("https://hooks.test/in", &events).await.unwrap());
    assert!(adapter.remove_webhook("42").await.unwrap());
    assert_eq!(handle.count("setup_webhook"), 1);
    assert_eq!(handle.count("remove_webhook"), 1);

    let mut caps = SpyHooks::full_capabilities();
    caps.supports_webhooks = false;
    let spy = SpyHooks::new(PlatformType::Github).with_capabilities(caps);
    let handle = spy.handle();
    let adapter = adapter_with(spy);
    let err = adapter.setup_webhook("https://hooks.test/in", &events).await.unwrap_err();
    assert!(matches!(err, PolycastError::Unsupported { .. }));
    assert_eq!(handle.count("setup_webhook"), 0);
}
