//! Replay mode — paced emission of a recorded CSV file.

use anyhow::Context;
use tracing::info;

use geotrace_core::config::ReplayConfig;
use geotrace_replay::{wait_ready, Backoff, HttpSink, Pacer, RecordSource, ReplaySummary};

/// Replay `config.source` into `config.endpoint` once.
pub async fn run_replay(config: &ReplayConfig) -> anyhow::Result<ReplaySummary> {
    let sink = HttpSink::new(&config.endpoint, config.request_timeout())?;
    info!(
        source = %config.source.display(),
        endpoint = %config.endpoint,
        speed = config.speed,
        "replay starting"
    );

    if config.wait_ready {
        wait_ready(
            sink.address(),
            &config.ready_path,
            config.ready_attempts,
            Backoff::default(),
        )
        .await?;
    }

    let source = RecordSource::open(&config.source)?;
    let mut pacer = Pacer::new(sink)
        .with_speed(config.speed)
        .continue_on_error(config.continue_on_error);

    let summary = pacer
        .run(source)
        .await
        .with_context(|| format!("replaying {}", config.source.display()))?;
    Ok(summary)
}
