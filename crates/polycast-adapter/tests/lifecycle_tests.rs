// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for adapter lifecycle and monitoring.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use polycast_adapter::{Adapter, LifecycleState};
use polycast_core::{AdapterEvent, ContentItem, PlatformType};
use polycast_test_utils::{SpyHooks, spy_config};

fn adapter_with(spy: SpyHooks) -> Adapter {
    Adapter::new(spy_config(PlatformType::Slack, "spy"), Box::new(spy)).unwrap()
}

fn capture(adapter: &Adapter, event: &str) -> Arc<Mutex<Vec<AdapterEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    adapter.on(event, move |_, e| sink.lock().unwrap().push(e.clone()));
    seen
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let spy = SpyHooks::new(PlatformType::Slack);
    let handle = spy.handle();
    let adapter = adapter_with(spy);
    let ready = capture(&adapter, "ready");

    assert_eq!(adapter.state(), LifecycleState::Uninitialized);
    adapter.initialize().await.unwrap();
    adapter.initialize().await.unwrap();

    assert_eq!(adapter.state(), LifecycleState::Initialized);
    assert_eq!(handle.count("do_initialize"), 1);
    assert_eq!(ready.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_initialize_keeps_state_and_emits_error() {
    let adapter = adapter_with(SpyHooks::new(PlatformType::Slack).fail_on("do_initialize"));
    let errors = capture(&adapter, "error");

    assert!(adapter.initialize().await.is_err());

    assert_eq!(adapter.state(), LifecycleState::Uninitialized);
    assert_eq!(errors.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn authenticate_success_and_rejection() {
    let adapter = adapter_with(SpyHooks::new(PlatformType::Slack));
    adapter.initialize().await.unwrap();
    assert!(adapter.authenticate().await);
    assert!(adapter.is_authenticated());
    assert_eq!(adapter.state(), LifecycleState::Authenticated);

    let rejected = adapter_with(SpyHooks::new(PlatformType::Slack).with_auth_result(false));
    let failures = capture(&rejected, "authentication-failed");
    rejected.initialize().await.unwrap();
    assert!(!rejected.authenticate().await);
    assert!(!rejected.is_authenticated());
    assert_eq!(
        *failures.lock().unwrap(),
        vec![AdapterEvent::AuthenticationFailed {
            reason: Some("credentials rejected".to_string())
        }]
    );
}

#[tokio::test]
async fn authentication_error_reports_reason() {
    let adapter = adapter_with(SpyHooks::new(PlatformType::Slack).fail_on("do_authenticate"));
    let failures = capture(&adapter, "authentication-failed");

    adapter.initialize().await.unwrap();
    assert!(!adapter.authenticate().await);

    let events = failures.lock().unwrap();
    let AdapterEvent::AuthenticationFailed { reason: Some(reason) } = &events[0] else {
        panic!("expected a reason, got {:?}", events[0]);
    };
    assert!(reason.contains("do_authenticate failed"));
}

#[tokio::test(start_paused = true)]
async fn slow_authentication_times_out() {
    let adapter = adapter_with(
        SpyHooks::new(PlatformType::Slack).with_auth_delay(Duration::from_secs(120)),
    )
    .with_auth_timeout(Duration::from_secs(5));
    let failures = capture(&adapter, "authentication-failed");

    adapter.initialize().await.unwrap();
    assert!(!adapter.authenticate().await);

    let events = failures.lock().unwrap();
    let AdapterEvent::AuthenticationFailed { reason: Some(reason) } = &events[0] else {
        panic!("expected a reason, got {:?}", events[0]);
    };
    assert!(reason.contains("timed out"));
}

#[tokio::test]
async fn authenticate_before_initialize_is_refused() {
    let spy = SpyHooks::new(PlatformType::Slack);
    let handle = spy.handle();
    let adapter = adapter_with(spy);
    let failures = capture(&adapter, "authentication-failed");

    assert!(!adapter.authenticate().await);
    assert_eq!(adapter.state(), LifecycleState::Uninitialized);
    assert!(!adapter.is_authenticated());
    assert_eq!(handle.count("do_authenticate"), 0);
    {
        let events = failures.lock().unwrap();
        let AdapterEvent::AuthenticationFailed { reason: Some(reason) } = &events[0] else {
            panic!("expected a reason, got {:?}", events[0]);
        };
        assert!(reason.contains("not initialized"));
    }

    // The refused attempt must not short-circuit the real bootstrap.
    adapter.initialize().await.unwrap();
    assert_eq!(handle.count("do_initialize"), 1);
    assert!(adapter.authenticate().await);
    assert_eq!(adapter.state(), LifecycleState::Authenticated);
}

#[tokio::test]
async fn authenticate_after_disconnect_is_refused() {
    let adapter = adapter_with(SpyHooks::new(PlatformType::Slack));
    adapter.initialize().await.unwrap();
    assert!(adapter.authenticate().await);
    adapter.disconnect().await.unwrap();

    assert!(!adapter.authenticate().await);
    assert_eq!(adapter.state(), LifecycleState::Disconnected);
}

#[tokio::test]
async fn listeners_receive_the_adapter_name() {
    let adapter = adapter_with(SpyHooks::new(PlatformType::Slack));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    adapter.on("ready", move |name, e| {
        sink.lock().unwrap().push((name.to_string(), e.clone()))
    });

    adapter.initialize().await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![("spy".to_string(), AdapterEvent::Ready)]
    );
}

/// Two concurrent starts run the hook once.
#[tokio::test(start_paused = true)]
async fn concurrent_start_monitoring_runs_hook_once() {
    let spy = SpyHooks::new(PlatformType::Slack).with_hook_delay(Duration::from_millis(100));
    let handle = spy.handle();
    let adapter = adapter_with(spy);
    let started = capture(&adapter, "monitoring-started");

    let (a, b) = tokio::join!(adapter.start_monitoring(), adapter.start_monitoring());
    a.unwrap();
    b.unwrap();

    assert!(adapter.is_monitoring());
    assert_eq!(handle.count("do_start_monitoring"), 1);
    assert_eq!(started.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn stop_monitoring_when_idle_is_a_no_op() {
    let spy = SpyHooks::new(PlatformType::Slack);
    let handle = spy.handle();
    let adapter = adapter_with(spy);

    adapter.stop_monitoring().await.unwrap();
    assert_eq!(handle.count("do_stop_monitoring"), 0);

    adapter.start_monitoring().await.unwrap();
    adapter.stop_monitoring().await.unwrap();
    adapter.stop_monitoring().await.unwrap();
    assert_eq!(handle.count("do_stop_monitoring"), 1);
    assert!(!adapter.is_monitoring());
}

#[tokio::test]
async fn monitoring_sink_reports_inbound_traffic() {
    let spy = SpyHooks::new(PlatformType::Slack);
    let handle = spy.handle();
    let adapter = adapter_with(spy);
    let mentions = capture(&adapter, "mention-received");

    adapter.start_monitoring().await.unwrap();
    let sink = handle.sink().unwrap();
    sink.mention_received(ContentItem::text("@spy hello").with_id("m1"));

    let events = mentions.lock().unwrap();
    assert_eq!(events.len(), 1);
    let AdapterEvent::MentionReceived(item) = &events[0] else {
        panic!("unexpected event {:?}", events[0]);
    };
    assert_eq!(item.id.as_deref(), Some("m1"));
}

#[tokio::test]
async fn disconnect_stops_monitoring_first() {
    let spy = SpyHooks::new(PlatformType::Slack);
    let handle = spy.handle();
    let adapter = adapter_with(spy);
    let disconnected = capture(&adapter, "disconnected");

    adapter.initialize().await.unwrap();
    adapter.authenticate().await;
    adapter.start_monitoring().await.unwrap();
    adapter.disconnect().await.unwrap();

    assert_eq!(handle.count("do_stop_monitoring"), 1);
    assert_eq!(handle.count("do_disconnect"), 1);
    assert!(!adapter.is_monitoring());
    assert!(!adapter.is_authenticated());
    assert_eq!(adapter.state(), LifecycleState::Disconnected);
    assert_eq!(disconnected.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn disconnect_clears_monitoring_even_when_stop_fails() {
    let spy = SpyHooks::new(PlatformType::Slack).fail_on("do_stop_monitoring");
    let handle = spy.handle();
    let adapter = adapter_with(spy);

    adapter.initialize().await.unwrap();
    adapter.start_monitoring().await.unwrap();
    adapter.disconnect().await.unwrap();

    assert_eq!(handle.count("do_stop_monitoring"), 1);
    assert_eq!(adapter.state(), LifecycleState::Disconnected);
    assert!(!adapter.is_monitoring());
    assert!(!adapter.status().monitoring);

    // Monitoring can be started again after reconnecting.
    adapter.initialize().await.unwrap();
    adapter.start_monitoring().await.unwrap();
    assert_eq!(handle.count("do_start_monitoring"), 2);
}

#[tokio::test]
async fn failed_disconnect_leaves_state_unchanged() {
    let adapter = adapter_with(SpyHooks::new(PlatformType::Slack).fail_on("do_disconnect"));
    adapter.initialize().await.unwrap();

    assert!(adapter.disconnect().await.is_err());
    assert_eq!(adapter.state(), LifecycleState::Initialized);
}

#[tokio::test]
async fn reinitialize_after_disconnect() {
    let spy = SpyHooks::new(PlatformType::Slack);
    let handle = spy.handle();
    let adapter = adapter_with(spy);

    adapter.initialize().await.unwrap();
    adapter.disconnect().await.unwrap();
    adapter.initialize().await.unwrap();

    assert_eq!(handle.count("do_initialize"), 2);
    assert_eq!(adapter.state(), LifecycleState::Initialized);
}

#[tokio::test]
async fn status_reflects_lifecycle() {
    let adapter = adapter_with(SpyHooks::new(PlatformType::Slack));
    adapter.initialize().await.unwrap();
    adapter.authenticate().await;

    let status = adapter.status();
    assert_eq!(status.name, "spy");
    assert_eq!(status.platform, PlatformType::Slack);
    assert_eq!(status.state, LifecycleState::Authenticated);
    assert!(status.enabled);
    assert!(status.authenticated);
    assert!(!status.monitoring);
    assert!(status.last_rate_limit.is_none());
}
