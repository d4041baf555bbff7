//! geotrace-api — REST API for the geotrace collector.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/packages` | Ingest one event record |
//! | GET | `/api/visualization-data` | Newest events as visualization points |
//! | GET | `/healthz` | Liveness probe |

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};
use geotrace_core::config::{HEALTH_PATH, INGEST_PATH, SNAPSHOT_PATH};
use geotrace_store::EventStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: EventStore,
}

/// Build the collector router over a shared event store.
pub fn build_router(store: EventStore) -> Router {
    let state = ApiState { store };

    Router::new()
        .route(INGEST_PATH, post(handlers::receive_event))
        .route(SNAPSHOT_PATH, get(handlers::visualization_data))
        .route(HEALTH_PATH, get(handlers::healthz))
        .with_state(state)
}
