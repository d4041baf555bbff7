//! geotrace-replay — re-emits recorded events at their original pace.
//!
//! # Architecture
//!
//! ```text
//! RecordSource (CSV rows → EventRecord)
//!   └── Pacer::run()
//!         ├── sleep(Timestamp[i+1] - Timestamp[i]) on the tokio timer
//!         └── RecordSink::send()  ← HttpSink POSTs to the collector
//!
//! wait_ready() → probe() with exponential Backoff before the first send
//! ```
//!
//! The pacing reference is the previous record's timestamp, so each gap is
//! replayed on its own and scheduling jitter does not accumulate. Records
//! that are out of order or share a timestamp are sent back to back.

pub mod client;
pub mod error;
pub mod pacer;
pub mod ready;
pub mod source;

pub use client::HttpSink;
pub use error::{ReplayError, ReplayResult};
pub use pacer::{Pacer, RecordSink, ReplaySummary};
pub use ready::{probe, wait_ready, Backoff, ProbeResult};
pub use source::RecordSource;
