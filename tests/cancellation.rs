//! Context cancellation and deadline behavior of client operations.

mod common;

use serde_json::{json, Value};
use std::time::{Duration, Instant};

use common::memory_client;
use surreal_link::{ClientError, MemoryDriver, OpContext};

const LATENCY: Duration = Duration::from_millis(300);

#[tokio::test]
async fn test_past_deadline_fails_fast_without_driver_call() {
    let (driver, client) = memory_client(MemoryDriver::new()).await;
    let calls = driver.call_count();

    let start = Instant::now();
    let ctx = OpContext::with_timeout(Duration::ZERO);
    let err = client.read_many::<Value>(&ctx, "item").await.unwrap_err();

    assert!(matches!(err, ClientError::Timeout { operation: "read", .. }));
    assert!(err.is_cancellation());
    assert!(start.elapsed() < Duration::from_millis(200));
    assert_eq!(driver.call_count(), calls);
}

#[tokio::test]
async fn test_cancelled_context_blocks_every_operation() {
    let (driver, client) = memory_client(MemoryDriver::new()).await;
    let calls = driver.call_count();
    let ctx = OpContext::background();
    ctx.cancel();

    let results = vec![
        client.create(&ctx, "item:1", &json!({ "name": "a" })).await.map(|_| ()),
        client.read_one::<Value>(&ctx, "item:1").await.map(|_| ()),
        client.update(&ctx, "item:1", &json!({ "name": "b" })).await.map(|_| ()),
        client.delete(&ctx, "item:1").await,
        client.relate(&ctx, "item:1", "item:2", "links").await.map(|_| ()),
        client.query(&ctx, "select * from item").await.map(|_| ()),
    ];

    for result in results {
        let err = result.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled { .. }), "got {err:?}");
    }
    assert_eq!(driver.call_count(), calls);
}

#[tokio::test]
async fn test_deadline_beats_slow_driver() {
    let (_, client) = memory_client(MemoryDriver::new().with_latency(LATENCY)).await;

    let start = Instant::now();
    let ctx = OpContext::with_timeout(Duration::from_millis(50));
    let err = client.read_many::<Value>(&ctx, "item").await.unwrap_err();

    assert!(matches!(err, ClientError::Timeout { .. }));
    assert!(start.elapsed() < LATENCY);
}

#[tokio::test]
async fn test_cancel_while_in_flight() {
    let (_, client) = memory_client(MemoryDriver::new().with_latency(LATENCY)).await;

    let ctx = OpContext::background();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let err = client.read_many::<Value>(&ctx, "item").await.unwrap_err();
    assert!(matches!(err, ClientError::Cancelled { operation: "read" }));
    assert!(start.elapsed() < LATENCY);
}

#[tokio::test]
async fn test_driver_error_does_not_wait_for_context() {
    let (driver, client) = memory_client(MemoryDriver::new()).await;
    driver.fail_next(1);

    let ctx = OpContext::background();
    let result = tokio::time::timeout(
        Duration::from_secs(1),
        client.read_many::<Value>(&ctx, "item"),
    )
    .await
    .expect("driver error must not hang the caller");

    let err = result.unwrap_err();
    assert!(err.is_driver_error());
    assert!(!err.is_cancellation());
}

#[tokio::test]
async fn test_abandoned_call_still_completes() {
    let (_, client) = memory_client(MemoryDriver::new().with_latency(LATENCY)).await;

    let ctx = OpContext::with_timeout(Duration::from_millis(30));
    let err = client
        .create(&ctx, "item:1", &json!({ "name": "late" }))
        .await
        .unwrap_err();
    assert!(err.is_cancellation());

    tokio::time::sleep(LATENCY * 2).await;
    let stored: Option<Value> = client
        .read_one(&OpContext::background(), "item:1")
        .await
        .unwrap();
    assert_eq!(stored.map(|v| v["name"].clone()), Some(json!("late")));
}
