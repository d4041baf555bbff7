//! geotrace-core — shared types for the geotrace collector and replayer.
//!
//! An [`EventRecord`] is kept exactly as it arrived on the wire. Typed
//! parsing happens late, when a [`VisualizationPoint`] is derived from it
//! or when the replayer needs the record's timestamp for pacing.

pub mod config;
pub mod error;
pub mod types;

pub use config::GeotraceConfig;
pub use error::{RecordError, RecordResult};
pub use types::*;
