//! Collector mode — event store plus REST API.
//!
//! In this mode, the daemon:
//! 1. Creates the bounded event store
//! 2. Binds the API listener
//! 3. Optionally spawns a replay task aimed at its own ingestion endpoint
//! 4. Serves until Ctrl-C, then shuts down gracefully

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tracing::{error, info, warn};

use geotrace_core::config::INGEST_PATH;
use geotrace_core::GeotraceConfig;
use geotrace_store::EventStore;

use crate::replay::run_replay;

/// Address a local client should use to reach a listener bound to `addr`.
fn loopback_for(addr: SocketAddr) -> SocketAddr {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, addr.port())
}

/// Run the collector until Ctrl-C.
pub async fn run_collector(mut config: GeotraceConfig, with_replay: bool) -> anyhow::Result<()> {
    info!("geotrace collector starting");

    // ── Event store ────────────────────────────────────────────
    let store = EventStore::new(config.collector.capacity, config.collector.window);
    info!(
        capacity = store.capacity(),
        window = store.window(),
        "event store initialized"
    );

    // ── API listener ───────────────────────────────────────────
    let router = geotrace_api::build_router(store.clone());
    let listener =
        tokio::net::TcpListener::bind((config.collector.bind.as_str(), config.collector.port))
            .await?;
    let addr = listener.local_addr()?;
    info!(%addr, "API server listening");

    // ── In-process replay ──────────────────────────────────────
    let replay_handle = if with_replay {
        config.replay.endpoint = format!("http://{}{INGEST_PATH}", loopback_for(addr));
        let replay_config = config.replay.clone();
        Some(tokio::spawn(async move {
            match run_replay(&replay_config).await {
                Ok(summary) => info!(sent = summary.sent, failed = summary.failed, "replay task done"),
                Err(e) => error!(error = %e, "replay task failed"),
            }
        }))
    } else {
        None
    };

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C, running until killed");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    if let Some(handle) = replay_handle {
        handle.abort();
    }

    info!(
        stored = store.len(),
        total_appended = store.total_appended(),
        "geotrace collector stopped"
    );
    Ok(())
}
