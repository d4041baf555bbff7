//! geotrace-store — bounded in-memory window of recently ingested events.
//!
//! # Architecture
//!
//! ```text
//! EventStore (Clone, Arc<Mutex<VecDeque<EventRecord>>>)
//!   ├── append()   ← one call per ingested record, evicts the oldest at capacity
//!   ├── recent(n)  → copy of the newest n records, taken under one lock
//!   └── snapshot() → recent(window) parsed into VisualizationPoints
//! ```
//!
//! Records are stored exactly as received. Parsing happens in
//! [`EventStore::snapshot`] outside the lock; records that fail to parse are
//! skipped and counted rather than failing the whole snapshot.

pub mod store;

pub use store::{EventStore, Snapshot};
