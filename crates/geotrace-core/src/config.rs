//! geotrace.toml configuration parser.
//!
//! Every field has a default, so an absent file or an empty table yields a
//! working local setup. Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// Default Event Store capacity.
pub const DEFAULT_CAPACITY: usize = 2000;
/// Default number of records in a visualization snapshot.
pub const DEFAULT_WINDOW: usize = 100;
/// Ingestion path on the collector.
pub const INGEST_PATH: &str = "/api/packages";
/// Snapshot path on the collector.
pub const SNAPSHOT_PATH: &str = "/api/visualization-data";
/// Liveness path on the collector.
pub const HEALTH_PATH: &str = "/healthz";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeotraceConfig {
    pub collector: CollectorConfig,
    pub replay: ReplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub bind: String,
    pub port: u16,
    pub capacity: usize,
    pub window: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
            capacity: DEFAULT_CAPACITY,
            window: DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub source: PathBuf,
    pub endpoint: String,
    pub speed: f64,
    pub continue_on_error: bool,
    pub request_timeout: String,
    pub wait_ready: bool,
    pub ready_path: String,
    pub ready_attempts: u32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("ip_addresses.csv"),
            endpoint: format!("http://127.0.0.1:5000{INGEST_PATH}"),
            speed: 1.0,
            continue_on_error: false,
            request_timeout: "10s".to_string(),
            wait_ready: true,
            ready_path: HEALTH_PATH.to_string(),
            ready_attempts: 10,
        }
    }
}

impl ReplayConfig {
    /// Per-request timeout, falling back to 10s if the string is unparseable.
    pub fn request_timeout(&self) -> Duration {
        parse_duration(&self.request_timeout).unwrap_or(Duration::from_secs(10))
    }
}

impl GeotraceConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: GeotraceConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let c = &self.collector;
        if c.capacity == 0 {
            bail!("collector.capacity must be at least 1");
        }
        if c.window == 0 {
            bail!("collector.window must be at least 1");
        }
        if c.window > c.capacity {
            bail!(
                "collector.window ({}) exceeds collector.capacity ({})",
                c.window,
                c.capacity
            );
        }

        let r = &self.replay;
        if !r.speed.is_finite() || r.speed <= 0.0 {
            bail!("replay.speed must be a positive number, got {}", r.speed);
        }
        if !r.endpoint.starts_with("http://") {
            bail!("replay.endpoint must be an http:// URL, got {}", r.endpoint);
        }
        if parse_duration(&r.request_timeout).is_none() {
            bail!("replay.request_timeout is not a duration: {}", r.request_timeout);
        }
        Ok(())
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
