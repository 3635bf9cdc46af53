//! Daemon wiring tests

use std::time::Duration;

use reolink_gateway::{StateStore, StateValue};
use serde_json::json;
use tokio::sync::oneshot;

mod common;
use common::harness;

#[tokio::test(start_paused = true)]
async fn startup_publishes_endpoint_and_health() {
    let (_transport, daemon) = harness(10);
    daemon.publish_startup().await;

    let store = daemon.store();
    assert_eq!(store.get("network.ip").await, Some("cam.test".into()));
    assert_eq!(store.get("network.channel").await, Some(StateValue::Int(0)));
    assert_eq!(store.get("network.connected").await, Some(false.into()));
    assert_eq!(store.get("info.connection").await, Some(false.into()));
}

#[tokio::test(start_paused = true)]
async fn host_write_is_dispatched_and_acknowledged() {
    let (transport, daemon) = harness(10);
    let store = daemon.store();
    let (stop, stopped) = oneshot::channel::<()>();

    let running = tokio::spawn(daemon.run_until(async move {
        stopped.await.ok();
    }));

    // Let the first poll cycle run
    tokio::time::sleep(Duration::from_millis(100)).await;
    transport.clear();

    store.write("settings.ledMode", StateValue::Int(3)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let request = transport.last("SetWhiteLed").unwrap();
    assert_eq!(
        request.body.unwrap()[0]["param"],
        json!({ "WhiteLed": { "channel": 0, "mode": 3 } })
    );
    let entry = store.entry("settings.ledMode").await.unwrap();
    assert_eq!(entry.value, StateValue::Int(3));
    assert!(entry.ack);

    stop.send(()).unwrap();
    running.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn acknowledged_writes_are_not_dispatched() {
    let (transport, daemon) = harness(10);
    let store = daemon.store();
    let (stop, stopped) = oneshot::channel::<()>();

    let running = tokio::spawn(daemon.run_until(async move {
        stopped.await.ok();
    }));
    tokio::time::sleep(Duration::from_millis(100)).await;
    transport.clear();

    store.publish("settings.ledMode", StateValue::Int(1)).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(transport.count("SetWhiteLed"), 0);

    stop.send(()).unwrap();
    running.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn host_write_survives_publish_burst() {
    let (transport, daemon) = harness(10);
    let store = daemon.store();

    store.write("settings.switchLed", StateValue::Bool(true)).await;
    for i in 0..1000 {
        store.publish("sensor.motion", StateValue::Int(i)).await;
    }

    let (stop, stopped) = oneshot::channel::<()>();
    let running = tokio::spawn(daemon.run_until(async move {
        stopped.await.ok();
    }));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(transport.count("SetWhiteLed"), 1);
    assert!(store.entry("settings.switchLed").await.unwrap().ack);

    stop.send(()).unwrap();
    running.await.unwrap().unwrap();
}
