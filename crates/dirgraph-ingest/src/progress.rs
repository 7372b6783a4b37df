//! Ingestion counters and progress reporting.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Snapshot of the pipeline's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestCounters {
    /// File events taken by workers.
    pub files_processed: u64,
    /// Directory events handled by the dispatcher.
    pub directories_processed: u64,
    /// Files taken since the last progress line.
    pub recent_files: u64,
}

impl IngestCounters {
    /// Total items processed (files + directories).
    pub fn total_items(&self) -> u64 {
        self.files_processed + self.directories_processed
    }

    /// Recent file rate over `elapsed`.
    pub fn files_per_second(&self, elapsed: Duration) -> f64 {
        if elapsed.as_secs_f64() > 0.0 {
            self.recent_files as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Counters shared by the dispatcher and all workers, behind one lock.
#[derive(Debug, Default)]
pub(crate) struct SharedCounters {
    inner: Mutex<IngestCounters>,
}

impl SharedCounters {
    fn lock(&self) -> MutexGuard<'_, IngestCounters> {
        // Plain integers stay consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record_file(&self) {
        let mut counters = self.lock();
        counters.files_processed += 1;
        counters.recent_files += 1;
    }

    pub(crate) fn record_directory(&self) {
        self.lock().directories_processed += 1;
    }

    pub(crate) fn snapshot(&self) -> IngestCounters {
        *self.lock()
    }

    /// Snapshot, then reset the recent-throughput counter.
    pub(crate) fn take_recent(&self) -> IngestCounters {
        let mut counters = self.lock();
        let snapshot = *counters;
        counters.recent_files = 0;
        snapshot
    }
}

/// Rate-limited progress logging driven off the shared counters.
#[derive(Debug)]
pub(crate) struct ProgressReporter {
    interval: Duration,
    last_emitted: Instant,
}

impl ProgressReporter {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emitted: Instant::now(),
        }
    }

    /// Log a progress line if the interval has passed since the last one.
    ///
    /// Returns the snapshot that was logged.
    pub(crate) fn maybe_report(
        &mut self,
        counters: &SharedCounters,
        backlog: usize,
        current: &str,
    ) -> Option<IngestCounters> {
        let elapsed = self.last_emitted.elapsed();
        if elapsed < self.interval {
            return None;
        }

        let snapshot = counters.take_recent();
        tracing::info!(
            backlog,
            files = snapshot.files_processed,
            directories = snapshot.directories_processed,
            files_per_sec = snapshot.files_per_second(elapsed),
            path = current,
            "ingest progress"
        );
        self.last_emitted = Instant::now();
        Some(snapshot)
    }
}
