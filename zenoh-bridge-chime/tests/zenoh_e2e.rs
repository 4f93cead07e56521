//! End-to-end tests with a live Zenoh session.
//!
//! Note: Zenoh requires multi-thread tokio runtime.
//! Each test uses a unique key prefix to avoid interference.

use std::sync::Arc;
use std::time::Duration;

use chimelink_bridge_framework::{BridgeError, DisplayContent, Graphic, Publisher};
use chimelink_common::decode_auto;
use serde_json::json;
use tokio::sync::watch;

use zenoh_bridge_chime::config::{ChimeConfig, SourceConfig};
use zenoh_bridge_chime::format::FormatRule;
use zenoh_bridge_chime::{
    DisplayPublisher, DisplaySubscriber, Dispatcher, SelectionPolicy, SourceRegistry,
};

/// Generate a unique test prefix to avoid test interference.
fn unique_prefix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test_{}", nanos)
}

/// A sensor update on a source key becomes a display command.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sensor_update_publishes_display_command() {
    let prefix = unique_prefix();

    let session = Arc::new(
        zenoh::open(zenoh::Config::default())
            .await
            .expect("Failed to open Zenoh session"),
    );

    let command_key = format!("{}/display/command", prefix);
    let outside_key = format!("{}/sensor/outside/state", prefix);
    let chime = ChimeConfig {
        command_key: command_key.clone(),
        sources: vec![
            SourceConfig::new(
                "airmonitor",
                format!("{}/sensor/air/state", prefix),
                FormatRule::AirMonitor,
            ),
            SourceConfig::new("outside_temp", outside_key.clone(), FormatRule::OutsideTemp),
        ],
        ..ChimeConfig::default()
    };

    let display = session
        .declare_subscriber(&command_key)
        .await
        .expect("Failed to create display subscriber");

    let registry = SourceRegistry::from_config(&chime);
    let policy = SelectionPolicy::new(chime.min_display(), chime.stale_threshold());
    let sink = DisplayPublisher::new(Publisher::new(session.clone(), ""), &command_key, false);
    let subscriber = DisplaySubscriber::declare(&session, Dispatcher::new(registry, policy, sink))
        .await
        .expect("Failed to declare subscribers");
    assert_eq!(subscriber.len(), 2);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(subscriber.run(shutdown_rx));

    // Give subscribers time to set up
    tokio::time::sleep(Duration::from_millis(200)).await;

    let payload = serde_json::to_vec(&json!({ "temperature_C": 4.5, "humidity": 71 })).unwrap();
    session
        .put(&outside_key, payload)
        .await
        .expect("Failed to publish sensor update");

    let received = tokio::time::timeout(Duration::from_secs(5), display.recv_async())
        .await
        .expect("Timeout waiting for display command")
        .expect("Failed to receive display command");

    let command: DisplayContent =
        decode_auto(&received.payload().to_bytes()).expect("Failed to decode command");
    assert_eq!(
        command,
        DisplayContent::new("Outside\n\n4.5 C\n71 RH%\n", Graphic::LargeText)
    );

    shutdown_tx.send(true).unwrap();
    let dispatcher = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("Subscriber did not stop")
        .expect("Subscriber task panicked");

    assert_eq!(dispatcher.selected_id(), Some("outside_temp"));
    assert_eq!(dispatcher.stats().published, 1);
}

/// Dry run logs the command and keeps the display key silent.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dry_run_publishes_nothing() {
    let prefix = unique_prefix();

    let session = Arc::new(
        zenoh::open(zenoh::Config::default())
            .await
            .expect("Failed to open Zenoh session"),
    );

    let command_key = format!("{}/display/command", prefix);
    let air_key = format!("{}/sensor/air/state", prefix);
    let chime = ChimeConfig {
        command_key: command_key.clone(),
        dry_run: true,
        sources: vec![SourceConfig::new("airmonitor", air_key.clone(), FormatRule::AirMonitor)],
        ..ChimeConfig::default()
    };

    let display = session
        .declare_subscriber(&command_key)
        .await
        .expect("Failed to create display subscriber");

    let registry = SourceRegistry::from_config(&chime);
    let policy = SelectionPolicy::new(chime.min_display(), chime.stale_threshold());
    let sink = DisplayPublisher::new(
        Publisher::new(session.clone(), ""),
        &command_key,
        chime.dry_run,
    );
    let subscriber = DisplaySubscriber::declare(&session, Dispatcher::new(registry, policy, sink))
        .await
        .expect("Failed to declare subscribers");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(subscriber.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(200)).await;

    session
        .put(&air_key, r#"{"temperature": 20}"#)
        .await
        .expect("Failed to publish sensor update");

    let received = tokio::time::timeout(Duration::from_millis(500), display.recv_async()).await;
    assert!(received.is_err(), "dry run must not publish");

    shutdown_tx.send(true).unwrap();
    let dispatcher = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("Subscriber did not stop")
        .expect("Subscriber task panicked");

    assert_eq!(dispatcher.stats().events, 1);
    assert_eq!(dispatcher.stats().published, 1);
}

/// A key expression Zenoh refuses fails declaration before anything runs.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_declare_fails_on_invalid_key_expr() {
    let prefix = unique_prefix();

    let session = Arc::new(
        zenoh::open(zenoh::Config::default())
            .await
            .expect("Failed to open Zenoh session"),
    );

    // Built without validation, as a registry from unchecked input would be.
    let chime = ChimeConfig {
        command_key: format!("{}/display/command", prefix),
        sources: vec![
            SourceConfig::new(
                "airmonitor",
                format!("{}/sensor/air/state", prefix),
                FormatRule::AirMonitor,
            ),
            SourceConfig::new(
                "broken",
                format!("{}//state", prefix),
                FormatRule::OutsideTemp,
            ),
        ],
        ..ChimeConfig::default()
    };

    let registry = SourceRegistry::from_config(&chime);
    let policy = SelectionPolicy::new(chime.min_display(), chime.stale_threshold());
    let sink = DisplayPublisher::new(
        Publisher::new(session.clone(), ""),
        &chime.command_key,
        false,
    );

    let result =
        DisplaySubscriber::declare(&session, Dispatcher::new(registry, policy, sink)).await;

    match result {
        Err(BridgeError::Subscribe { key, .. }) => assert_eq!(key, format!("{}//state", prefix)),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("declaring an invalid key expression must fail"),
    }
}
