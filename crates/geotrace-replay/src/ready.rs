//! Collector readiness probing.
//!
//! Before the first record is sent the replayer can poll the collector's
//! liveness endpoint, backing off exponentially between attempts, so a
//! replayer started alongside the collector does not fail its first send.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use tracing::{debug, info, warn};

use crate::client::{request_builder, send_request};
use crate::error::{ReplayError, ReplayResult};

/// Result of a single readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// The endpoint returned 2xx.
    Healthy,
    /// The endpoint answered with a non-2xx status.
    Unhealthy,
    /// The probe could not be executed (connection error or timeout).
    Failed,
}

/// Exponential backoff between probe attempts.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            current: base,
            base,
            max: max.max(base),
        }
    }

    /// Delay to wait now; doubles the following one up to the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

impl Default for Backoff {
    /// 1s doubling up to 30s.
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

/// GET `path` on `address` and classify the response.
pub async fn probe(address: &str, path: &str, timeout: Duration) -> ProbeResult {
    let req = match request_builder(http::Method::GET, address, path).body(Full::new(Bytes::new())) {
        Ok(req) => req,
        Err(e) => {
            debug!(error = %e, %address, path, "readiness probe request invalid");
            return ProbeResult::Failed;
        }
    };

    match send_request(address, req, timeout).await {
        Ok(resp) if resp.status().is_success() => ProbeResult::Healthy,
        Ok(resp) => {
            debug!(status = %resp.status(), %address, path, "readiness probe non-2xx");
            ProbeResult::Unhealthy
        }
        Err(e) => {
            debug!(error = %e, %address, path, "readiness probe failed");
            ProbeResult::Failed
        }
    }
}

/// Probe until the collector answers 2xx or `attempts` probes have failed.
pub async fn wait_ready(
    address: &str,
    path: &str,
    attempts: u32,
    mut backoff: Backoff,
) -> ReplayResult<()> {
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        let result = probe(address, path, Duration::from_secs(2)).await;
        if result == ProbeResult::Healthy {
            info!(%address, attempt, "collector is ready");
            return Ok(());
        }
        if attempt < attempts {
            let delay = backoff.next_delay();
            warn!(%address, attempt, ?result, ?delay, "collector not ready, retrying");
            tokio::time::sleep(delay).await;
        }
    }
    Err(ReplayError::NotReady {
        address: address.to_string(),
        attempts,
    })
}
