//! End-to-end replay tests.
//!
//! Starts a real collector on an ephemeral port and replays CSV files into
//! it over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use geotrace_api::build_router;
use geotrace_replay::{
    wait_ready, Backoff, HttpSink, Pacer, ProbeResult, RecordSource, ReplayError, probe,
};
use geotrace_store::EventStore;

async fn start_collector(store: EventStore) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(store)).await.unwrap();
    });
    addr
}

fn write_csv(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("ip_addresses.csv");
    std::fs::write(&path, body).unwrap();
    path
}

fn sink_for(addr: SocketAddr) -> HttpSink {
    HttpSink::new(
        &format!("http://{addr}/api/packages"),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn replayed_rows_reach_the_snapshot() {
    let store = EventStore::default();
    let addr = start_collector(store.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "Timestamp,ip address,Latitude,Longitude\n\
         100,1.2.3.4,10.5,20.5\n\
         100,5.6.7.8,11.5,21.5\n\
         99,9.9.9.9,12.5,22.5\n",
    );

    let sink = sink_for(addr);
    wait_ready(sink.address(), "/healthz", 3, Backoff::default())
        .await
        .unwrap();

    let mut pacer = Pacer::new(sink);
    let summary = pacer.run(RecordSource::open(&path).unwrap()).await.unwrap();
    assert_eq!(summary.sent, 3);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.skipped, 0);
    let ips: Vec<&str> = snapshot.points.iter().map(|p| p.ip.as_str()).collect();
    assert_eq!(ips, vec!["1.2.3.4", "5.6.7.8", "9.9.9.9"]);
    assert_eq!(snapshot.points[0].latitude, 10.5);
    assert_eq!(snapshot.points[2].timestamp, 99);
}

#[tokio::test]
async fn replay_waits_for_recorded_gap() {
    let store = EventStore::default();
    let addr = start_collector(store.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "Timestamp,ip address,Latitude,Longitude\n0,a,1,1\n1,b,1,1\n",
    );

    // 1s recorded gap at 4x speed.
    let mut pacer = Pacer::new(sink_for(addr)).with_speed(4.0);
    let started = Instant::now();
    pacer.run(RecordSource::open(&path).unwrap()).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(250));
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn extra_columns_are_forwarded() {
    let store = EventStore::default();
    let addr = start_collector(store.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "Timestamp,ip address,Latitude,Longitude,Country\n5,1.2.3.4,1,2,NZ\n",
    );

    Pacer::new(sink_for(addr))
        .run(RecordSource::open(&path).unwrap())
        .await
        .unwrap();

    let stored = store.recent(1);
    assert_eq!(stored[0].get("Country").and_then(|v| v.as_str()), Some("NZ"));
}

#[tokio::test]
async fn collector_down_aborts_replay() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "Timestamp,ip address,Latitude,Longitude\n1,a,1,1\n");

    let mut pacer = Pacer::new(sink_for(addr));
    let err = pacer
        .run(RecordSource::open(&path).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ReplayError::Connect { .. } | ReplayError::Timeout(_)));
}

#[tokio::test]
async fn collector_down_with_continue_on_error_completes() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        &dir,
        "Timestamp,ip address,Latitude,Longitude\n1,a,1,1\n1,b,1,1\n",
    );

    let mut pacer = Pacer::new(sink_for(addr)).continue_on_error(true);
    let summary = pacer.run(RecordSource::open(&path).unwrap()).await.unwrap();
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.failed, 2);
}

#[tokio::test]
async fn wrong_path_is_a_status_error() {
    let addr = start_collector(EventStore::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "Timestamp,ip address,Latitude,Longitude\n1,a,1,1\n");

    let sink = HttpSink::new(&format!("http://{addr}/nowhere"), Duration::from_secs(5)).unwrap();
    let err = Pacer::new(sink)
        .run(RecordSource::open(&path).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ReplayError::Status(s) if s.as_u16() == 404));
}

#[tokio::test]
async fn probe_reports_healthy_collector() {
    let addr = start_collector(EventStore::default()).await;
    let result = probe(&addr.to_string(), "/healthz", Duration::from_secs(2)).await;
    assert_eq!(result, ProbeResult::Healthy);

    let result = probe(&addr.to_string(), "/missing", Duration::from_secs(2)).await;
    assert_eq!(result, ProbeResult::Unhealthy);
}
