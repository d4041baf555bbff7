//! EventStore — fixed-capacity FIFO of raw event records.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use geotrace_core::config::{DEFAULT_CAPACITY, DEFAULT_WINDOW};
use geotrace_core::{EventRecord, VisualizationPoint};

struct Inner {
    records: Mutex<VecDeque<EventRecord>>,
    capacity: usize,
    window: usize,
    /// Records appended since creation (or the last `clear`).
    total_appended: AtomicU64,
}

/// Thread-safe bounded event store shared by all request handlers.
#[derive(Clone)]
pub struct EventStore {
    inner: Arc<Inner>,
}

/// Result of a snapshot: the parsed points plus how many records were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub points: Vec<VisualizationPoint>,
    pub skipped: usize,
}

impl EventStore {
    /// Create an empty store holding at most `capacity` records and
    /// snapshotting the newest `window` of them.
    pub fn new(capacity: usize, window: usize) -> Self {
        let capacity = capacity.max(1);
        let window = window.clamp(1, capacity);
        Self {
            inner: Arc::new(Inner {
                records: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
                window,
                total_appended: AtomicU64::new(0),
            }),
        }
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<EventRecord>> {
        self.inner
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record at the tail, evicting from the head at capacity.
    ///
    /// Returns the number of records evicted.
    pub fn append(&self, record: EventRecord) -> usize {
        let mut evicted = 0;
        let len = {
            let mut records = self.lock();
            records.push_back(record);
            while records.len() > self.inner.capacity {
                records.pop_front();
                evicted += 1;
            }
            records.len()
        };
        let total = self.inner.total_appended.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(len, evicted, total, "event appended");
        evicted
    }

    /// Copy of the newest `min(n, len)` records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<EventRecord> {
        let records = self.lock();
        let start = records.len().saturating_sub(n);
        records.range(start..).cloned().collect()
    }

    /// Parse the newest `window` records into visualization points.
    ///
    /// Malformed records are skipped and logged; order is preserved.
    pub fn snapshot(&self) -> Snapshot {
        let recent = self.recent(self.inner.window);
        let mut snapshot = Snapshot {
            points: Vec::with_capacity(recent.len()),
            skipped: 0,
        };

        for (index, record) in recent.iter().enumerate() {
            match record.to_point() {
                Ok(point) => snapshot.points.push(point),
                Err(e) => {
                    warn!(index, error = %e, "skipping malformed record in snapshot");
                    snapshot.skipped += 1;
                }
            }
        }

        debug!(
            points = snapshot.points.len(),
            skipped = snapshot.skipped,
            "snapshot built"
        );
        snapshot
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn window(&self) -> usize {
        self.inner.window
    }

    pub fn total_appended(&self) -> u64 {
        self.inner.total_appended.load(Ordering::Relaxed)
    }

    /// Drop every stored record and reset the append counter.
    pub fn clear(&self) {
        let mut records = self.lock();
        records.clear();
        self.inner.total_appended.store(0, Ordering::Relaxed);
        debug!("event store cleared");
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_WINDOW)
    }
}
