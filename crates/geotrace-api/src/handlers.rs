//! REST API handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use tracing::debug;

use geotrace_core::EventRecord;

use crate::ApiState;

/// Acknowledgement returned for every accepted record.
#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Ack {
    pub status: String,
}

impl Ack {
    fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

/// POST /api/packages
///
/// The record is stored as-is; field checks are deferred to snapshot time.
pub async fn receive_event(
    State(state): State<ApiState>,
    Json(record): Json<EventRecord>,
) -> Json<Ack> {
    let evicted = state.store.append(record);
    debug!(evicted, "event ingested");
    Json(Ack::success())
}

/// GET /api/visualization-data
pub async fn visualization_data(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.store.snapshot();
    Json(snapshot.points)
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
