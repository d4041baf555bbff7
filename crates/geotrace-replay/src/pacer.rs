//! Pacer — sends records with the same gaps as their original timestamps.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use geotrace_core::EventRecord;

use crate::error::{ReplayError, ReplayResult};

/// Destination for paced records.
pub trait RecordSink {
    fn send(&mut self, record: &EventRecord) -> impl Future<Output = ReplayResult<()>> + Send;
}

/// Outcome of a completed replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Records delivered successfully.
    pub sent: u64,
    /// Records whose send failed (only non-zero with `continue_on_error`).
    pub failed: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Replays a record sequence into a sink at its recorded pace.
pub struct Pacer<S> {
    sink: S,
    speed: f64,
    continue_on_error: bool,
}

impl<S: RecordSink> Pacer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            speed: 1.0,
            continue_on_error: false,
        }
    }

    /// Divide every gap by `speed`. Non-positive or non-finite values are ignored.
    pub fn with_speed(mut self, speed: f64) -> Self {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        } else {
            warn!(speed, "ignoring invalid replay speed");
        }
        self
    }

    /// Log and count failed sends instead of aborting the run.
    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Real-time delay for a positive timestamp gap in seconds.
    fn delay_for(&self, delta_secs: i64) -> Duration {
        Duration::try_from_secs_f64(delta_secs as f64 / self.speed).unwrap_or(Duration::MAX)
    }

    /// Send every record, sleeping between sends for the gap between the
    /// previous record's timestamp and this one's.
    ///
    /// An empty sequence returns immediately. Source errors and unparseable
    /// timestamps always abort the run; send errors abort it unless
    /// `continue_on_error` is set.
    pub async fn run<I>(&mut self, records: I) -> ReplayResult<ReplaySummary>
    where
        I: IntoIterator<Item = ReplayResult<EventRecord>>,
    {
        let started = Instant::now();
        let mut summary = ReplaySummary::default();
        let mut reference: Option<i64> = None;

        for (index, record) in records.into_iter().enumerate() {
            let record = record?;
            let timestamp = record
                .timestamp()
                .map_err(|source| ReplayError::Timestamp { index, source })?;

            if let Some(previous) = reference {
                let delta = timestamp.saturating_sub(previous);
                if delta > 0 {
                    let delay = self.delay_for(delta);
                    debug!(index, delta, ?delay, "pacing before send");
                    tokio::time::sleep(delay).await;
                }
            }

            match self.sink.send(&record).await {
                Ok(()) => {
                    summary.sent += 1;
                    debug!(index, timestamp, "record sent");
                }
                Err(e) if self.continue_on_error => {
                    summary.failed += 1;
                    warn!(index, timestamp, error = %e, "send failed, continuing");
                }
                Err(e) => {
                    error!(index, timestamp, error = %e, "send failed, aborting replay");
                    return Err(e);
                }
            }
            reference = Some(timestamp);
        }

        summary.elapsed = started.elapsed();
        info!(
            sent = summary.sent,
            failed = summary.failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "replay finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Records the (paused) clock at every send.
    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<(Instant, EventRecord)>,
        fail_on: Vec<usize>,
        calls: usize,
    }

    impl RecordSink for RecordingSink {
        async fn send(&mut self, record: &EventRecord) -> ReplayResult<()> {
            let call = self.calls;
            self.calls += 1;
            if self.fail_on.contains(&call) {
                return Err(ReplayError::Status(http::StatusCode::SERVICE_UNAVAILABLE));
            }
            self.sent.push((Instant::now(), record.clone()));
            Ok(())
        }
    }

    fn rows(timestamps: &[i64]) -> Vec<ReplayResult<EventRecord>> {
        timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| {
                Ok(EventRecord::from_fields(
                    &format!("10.0.0.{i}"),
                    "1.0",
                    "2.0",
                    &ts.to_string(),
                ))
            })
            .collect()
    }

    fn gaps(sink: &RecordingSink) -> Vec<Duration> {
        sink.sent
            .windows(2)
            .map(|pair| pair[1].0 - pair[0].0)
            .collect()
    }

    fn assert_gaps(actual: &[Duration], expected_secs: &[f64]) {
        assert_eq!(actual.len(), expected_secs.len(), "gaps: {actual:?}");
        for (gap, want) in actual.iter().zip(expected_secs) {
            let want = Duration::from_secs_f64(*want);
            assert!(*gap >= want, "gap {gap:?} shorter than {want:?}");
            assert!(*gap < want + Duration::from_millis(50), "gap {gap:?} longer than {want:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replays_original_gaps() {
        let mut pacer = Pacer::new(RecordingSink::default());
        let summary = pacer.run(rows(&[0, 3, 3, 10])).await.unwrap();

        assert_eq!(summary.sent, 4);
        assert_eq!(summary.failed, 0);
        assert_gaps(&gaps(pacer.sink()), &[3.0, 0.0, 7.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn first_record_is_sent_immediately() {
        let start = Instant::now();
        let mut pacer = Pacer::new(RecordingSink::default());
        pacer.run(rows(&[1_700_000_000, 1_700_000_002])).await.unwrap();

        let sink = pacer.into_sink();
        assert_eq!(sink.sent[0].0, start);
        assert_gaps(&gaps(&sink), &[2.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_source_is_a_no_op() {
        let mut pacer = Pacer::new(RecordingSink::default());
        let summary = pacer.run(Vec::<ReplayResult<EventRecord>>::new()).await.unwrap();

        assert_eq!(summary.sent, 0);
        assert_eq!(summary.elapsed, Duration::ZERO);
        assert_eq!(pacer.sink().calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn backwards_timestamps_send_without_waiting() {
        let mut pacer = Pacer::new(RecordingSink::default());
        pacer.run(rows(&[50, 40, 45])).await.unwrap();

        // The reference moves back to 40, so 45 waits 5s rather than 0.
        assert_gaps(&gaps(pacer.sink()), &[0.0, 5.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn records_pass_through_unmodified() {
        let mut pacer = Pacer::new(RecordingSink::default());
        let input = rows(&[1, 2]);
        let expected: Vec<EventRecord> = input.iter().map(|r| r.as_ref().unwrap().clone()).collect();
        pacer.run(input).await.unwrap();

        let sent: Vec<EventRecord> = pacer.sink().sent.iter().map(|(_, r)| r.clone()).collect();
        assert_eq!(sent, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn speed_scales_gaps() {
        let mut pacer = Pacer::new(RecordingSink::default()).with_speed(4.0);
        pacer.run(rows(&[0, 8, 10])).await.unwrap();
        assert_gaps(&gaps(pacer.sink()), &[2.0, 0.5]);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_speed_is_ignored() {
        let mut pacer = Pacer::new(RecordingSink::default()).with_speed(0.0);
        pacer.run(rows(&[0, 2])).await.unwrap();
        assert_gaps(&gaps(pacer.sink()), &[2.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn send_failure_aborts_run() {
        let sink = RecordingSink {
            fail_on: vec![1],
            ..Default::default()
        };
        let mut pacer = Pacer::new(sink);
        let err = pacer.run(rows(&[0, 1, 2])).await.unwrap_err();

        assert!(matches!(err, ReplayError::Status(_)));
        assert_eq!(pacer.sink().sent.len(), 1);
        assert_eq!(pacer.sink().calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn continue_on_error_counts_failures_and_keeps_pace() {
        let sink = RecordingSink {
            fail_on: vec![1],
            ..Default::default()
        };
        let mut pacer = Pacer::new(sink).continue_on_error(true);
        let summary = pacer.run(rows(&[0, 1, 4])).await.unwrap();

        assert_eq!(summary.sent, 2);
        assert_eq!(summary.failed, 1);
        // Reference advanced past the failed record: 0 -> 4 spans 1s + 3s.
        assert_gaps(&gaps(pacer.sink()), &[4.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn bad_timestamp_aborts_run() {
        let mut records = rows(&[0]);
        records.push(Ok(EventRecord::new(json!({
            "ip address": "x",
            "Latitude": "0",
            "Longitude": "0",
            "Timestamp": "yesterday",
        }))));
        let mut pacer = Pacer::new(RecordingSink::default());
        let err = pacer.run(records).await.unwrap_err();

        assert!(matches!(err, ReplayError::Timestamp { index: 1, .. }));
        assert_eq!(pacer.sink().sent.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn source_error_aborts_before_sending() {
        let records = vec![Err(ReplayError::MissingColumn("Timestamp"))];
        let mut pacer = Pacer::new(RecordingSink::default());
        assert!(pacer.run(records).await.is_err());
        assert_eq!(pacer.sink().calls, 0);
    }
}
