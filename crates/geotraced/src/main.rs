//! geotraced — the geotrace daemon.
//!
//! One binary, two roles:
//! - `serve`: the collector (bounded event store + REST API), optionally
//!   replaying a CSV file into itself from a background task
//! - `replay`: the emitter, which posts a CSV file's rows to a collector at
//!   their recorded pace and exits
//!
//! # Usage
//!
//! ```text
//! geotraced serve --port 5000
//! geotraced replay --source ip_addresses.csv --endpoint http://web:5000/api/packages
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use geotrace_core::GeotraceConfig;

mod collector;
mod replay;

#[derive(Parser)]
#[command(name = "geotraced", about = "Geolocated event collector and replayer", version)]
struct Cli {
    /// Path to a geotrace.toml file. Flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the collector: ingest events and serve visualization snapshots.
    Serve {
        /// Address to bind.
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on.
        #[arg(long)]
        port: Option<u16>,

        /// Maximum number of events kept in memory.
        #[arg(long)]
        capacity: Option<usize>,

        /// Number of newest events returned per snapshot.
        #[arg(long)]
        window: Option<usize>,

        /// Also replay this CSV file into the collector.
        #[arg(long)]
        replay: Option<PathBuf>,
    },
    /// Replay a recorded CSV file to a collector at its original pace.
    Replay {
        /// CSV file with Timestamp, ip address, Latitude, Longitude columns.
        #[arg(long)]
        source: Option<PathBuf>,

        /// Collector ingestion URL.
        #[arg(long)]
        endpoint: Option<String>,

        /// Replay speed multiplier (2.0 halves every gap).
        #[arg(long)]
        speed: Option<f64>,

        /// Log failed sends and keep going instead of aborting.
        #[arg(long)]
        continue_on_error: bool,

        /// Skip the collector readiness probe.
        #[arg(long)]
        no_wait: bool,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,geotraced=debug"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut config = GeotraceConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve {
            bind,
            port,
            capacity,
            window,
            replay,
        } => {
            let c = &mut config.collector;
            if let Some(bind) = bind {
                c.bind = bind;
            }
            if let Some(port) = port {
                c.port = port;
            }
            if let Some(capacity) = capacity {
                c.capacity = capacity;
            }
            if let Some(window) = window {
                c.window = window;
            }
            if let Some(source) = &replay {
                config.replay.source = source.clone();
            }
            config.validate()?;
            collector::run_collector(config, replay.is_some()).await
        }
        Command::Replay {
            source,
            endpoint,
            speed,
            continue_on_error,
            no_wait,
        } => {
            let r = &mut config.replay;
            if let Some(source) = source {
                r.source = source;
            }
            if let Some(endpoint) = endpoint {
                r.endpoint = endpoint;
            }
            if let Some(speed) = speed {
                r.speed = speed;
            }
            if continue_on_error {
                r.continue_on_error = true;
            }
            if no_wait {
                r.wait_ready = false;
            }
            config.validate()?;
            replay::run_replay(&config.replay).await.map(|_| ())
        }
    }
}
