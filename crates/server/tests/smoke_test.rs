//! End-to-end smoke test: TCP producer -> hub -> subscribers
//!
//! Exercises the full path a deployment uses: a logger connection
//! streaming framed entries into the ingest listener, fan-out to a
//! filtered listener and a drain, and an export stream writing
//! payloads to a sink.

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::{Duration, sleep, timeout};
use tokio_util::sync::CancellationToken;

use loghub_protocol::{Entry, write_entry, write_token};
use loghub_server::{
    Drain, EntryFilter, HANDSHAKE_LOGGER, Hub, HubConfig, HubHandle, IngestConfig, IngestServer,
    Listener, StreamConfig,
};

async fn start_stack() -> (HubHandle, std::net::SocketAddr, CancellationToken) {
    let (hub, handle) = Hub::new(HubConfig::default());
    hub.spawn();

    let config = IngestConfig {
        address: "127.0.0.1".into(),
        port: 0,
    };
    let server = IngestServer::bind(&config, handle.clone())
        .await
        .expect("bind failed");
    let addr = server.local_addr().unwrap();
    let cancel = CancellationToken::new();
    server.spawn(cancel.clone());

    (handle, addr, cancel)
}

async fn wait_received(hub: &HubHandle, n: u64) {
    let give_up = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        if hub.stats().await.unwrap().entries_received >= n {
            return;
        }
        assert!(tokio::time::Instant::now() < give_up, "ingest never delivered");
        sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_producer_to_listener_and_drain() {
    let (hub, addr, _cancel) = start_stack().await;

    // A plain listener for api entries, and a drain wrapping a
    // match-all listener registered on its behalf.
    let (api_listener, api_rx) = Listener::new(EntryFilter::new().with_sources(["api"]), 0, 32);
    hub.add_listener(api_listener).await.unwrap();

    let (all_listener, all_rx) = Listener::new(EntryFilter::new(), 0, 32);
    let drain = Drain::new(all_listener);
    let drain_id = drain.id();
    hub.add_drain(drain).await.unwrap();

    // Producer streams entries from two sources
    let mut conn = TcpStream::connect(addr).await.unwrap();
    write_token(&mut conn, HANDSHAKE_LOGGER).await.unwrap();
    for ts in 1..=4u64 {
        let source = if ts % 2 == 0 { "api" } else { "web" };
        let entry = Entry::with_timestamp(ts, source, Bytes::from(format!("e{ts}")));
        write_entry(&mut conn, &entry).await.unwrap();
    }
    wait_received(&hub, 4).await;

    // The filtered listener sees only api entries (t2, t4)
    for expected in [2u64, 4] {
        let entry = timeout(Duration::from_secs(2), api_rx.recv())
            .await
            .expect("timed out")
            .unwrap();
        assert_eq!(entry.timestamp(), expected);
    }

    // The drain's listener sees everything, in ingestion order
    for expected in 1..=4u64 {
        let entry = timeout(Duration::from_secs(2), all_rx.recv())
            .await
            .expect("timed out")
            .unwrap();
        assert_eq!(entry.timestamp(), expected);
    }

    // Removing the drain unregisters its listener
    hub.remove_drain(drain_id).await.unwrap();
    let stats = hub.stats().await.unwrap();
    assert_eq!(stats.drains, 0);
    assert_eq!(stats.listeners, 1);
}

#[tokio::test]
async fn test_export_stream_tails_a_producer() {
    let (hub, addr, _cancel) = start_stack().await;

    // Backlog before the tail is attached
    let mut conn = TcpStream::connect(addr).await.unwrap();
    write_token(&mut conn, HANDSHAKE_LOGGER).await.unwrap();
    let entry = Entry::with_timestamp(1, "api", Bytes::from_static(b"old"));
    write_entry(&mut conn, &entry).await.unwrap();
    wait_received(&hub, 1).await;

    let (mut tail, mut sink) = tokio::io::duplex(4096);
    let stream_hub = hub.clone();
    tokio::spawn(async move {
        let config = StreamConfig::default()
            .with_max_per_sec(10_000)
            .with_queue_capacity(16);
        let _ = stream_hub
            .stream_with(&mut sink, EntryFilter::new(), config)
            .await;
    });

    // Backlog payload first
    let mut buf = [0u8; 3];
    timeout(Duration::from_secs(2), tail.read_exact(&mut buf))
        .await
        .expect("timed out on backlog")
        .unwrap();
    assert_eq!(&buf, b"old");

    // Then live payloads from the producer
    let entry = Entry::with_timestamp(2, "api", Bytes::from_static(b"new"));
    write_entry(&mut conn, &entry).await.unwrap();
    let mut buf = [0u8; 3];
    timeout(Duration::from_secs(2), tail.read_exact(&mut buf))
        .await
        .expect("timed out on live entry")
        .unwrap();
    assert_eq!(&buf, b"new");
}
