//! Tests for the rate-limiting transform

use super::*;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::time::{Duration, timeout};

use loghub_protocol::Entry;

#[tokio::test]
async fn test_preserves_order() {
    let (tx, rx) = crossfire::mpmc::bounded_async(16);
    let out = throttle(rx, 100_000);

    for i in 0..5u32 {
        tx.send(i).await.unwrap();
    }

    for i in 0..5u32 {
        let item = timeout(Duration::from_secs(1), out.recv())
            .await
            .expect("timed out")
            .expect("output closed early");
        assert_eq!(item, i);
    }
}

#[tokio::test]
async fn test_output_closes_when_input_exhausted() {
    let (tx, rx) = crossfire::mpmc::bounded_async(16);
    let out = throttle::<u32>(rx, 100_000);

    tx.send(1).await.unwrap();
    drop(tx);

    assert_eq!(out.recv().await.unwrap(), 1);
    assert!(out.recv().await.is_err());
}

#[tokio::test]
async fn test_forwards_shared_entries() {
    // The stream path runs the limiter over Arc'd entries.
    let (tx, rx) = crossfire::mpmc::bounded_async(4);
    let out = throttle(rx, 100_000);

    let entry = Arc::new(Entry::with_timestamp(1, "api", Bytes::from_static(b"x")));
    tx.send(entry).await.unwrap();
    drop(tx);

    let got = timeout(Duration::from_secs(1), out.recv())
        .await
        .expect("timed out")
        .expect("output closed early");
    assert_eq!(got.timestamp(), 1);
    assert!(out.recv().await.is_err());
}

#[tokio::test]
async fn test_paces_delivery() {
    let (tx, rx) = crossfire::mpmc::bounded_async(16);
    // 20/sec -> 50ms between items
    let out = throttle(rx, 20);

    for i in 0..4u32 {
        tx.send(i).await.unwrap();
    }
    drop(tx);

    let start = Instant::now();
    while out.recv().await.is_ok() {}
    // First tick fires immediately; three more gaps of ~50ms follow.
    assert!(start.elapsed() >= Duration::from_millis(100));
}
