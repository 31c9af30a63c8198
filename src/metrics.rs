// Retrieval metrics module
//
// Provides lightweight counters for monitoring base peak retrieval

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters shared by retrieval tasks
///
/// Uses atomic operations so the worker thread can record without locks while
/// the UI thread reads. Collected over the application lifetime and logged on
/// shutdown.
#[derive(Debug)]
pub struct RetrievalMetrics {
    /// Scans read and appended to a series
    pub scans_retrieved: AtomicUsize,

    /// Appends that notified the chart
    pub redraws_requested: AtomicU64,

    /// Appends held back by the redraw throttle
    pub redraws_throttled: AtomicU64,

    /// Failed scan lookups
    pub fetch_failures: AtomicU64,

    pub tasks_finished: AtomicUsize,
    pub tasks_failed: AtomicUsize,
    pub tasks_canceled: AtomicUsize,

    /// Time spent in completed retrieval loops, in milliseconds
    pub total_retrieval_time_ms: AtomicU64,

    start_time: Instant,
}

impl RetrievalMetrics {
    pub fn new() -> Self {
        Self {
            scans_retrieved: AtomicUsize::new(0),
            redraws_requested: AtomicU64::new(0),
            redraws_throttled: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            tasks_finished: AtomicUsize::new(0),
            tasks_failed: AtomicUsize::new(0),
            tasks_canceled: AtomicUsize::new(0),
            total_retrieval_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one appended point and whether it notified the chart
    pub fn record_scan_retrieved(&self, notified: bool) {
        self.scans_retrieved.fetch_add(1, Ordering::Relaxed);
        if notified {
            self.redraws_requested.fetch_add(1, Ordering::Relaxed);
        } else {
            self.redraws_throttled.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_finished(&self) {
        self.tasks_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_canceled(&self) {
        self.tasks_canceled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retrieval_time(&self, duration: Duration) {
        self.total_retrieval_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Share of appends that notified the chart, 0.0 when nothing was appended
    pub fn redraw_ratio(&self) -> f64 {
        let requested = self.redraws_requested.load(Ordering::Relaxed);
        let throttled = self.redraws_throttled.load(Ordering::Relaxed);
        let total = requested + throttled;
        if total > 0 {
            requested as f64 / total as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Retrieval Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Tasks: {} finished, {} failed, {} canceled",
            self.tasks_finished.load(Ordering::Relaxed),
            self.tasks_failed.load(Ordering::Relaxed),
            self.tasks_canceled.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Scans retrieved: {} in {:.2}s, fetch failures: {}",
            self.scans_retrieved.load(Ordering::Relaxed),
            self.total_retrieval_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.fetch_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Redraws: {} requested, {} throttled ({:.1}% notified)",
            self.redraws_requested.load(Ordering::Relaxed),
            self.redraws_throttled.load(Ordering::Relaxed),
            self.redraw_ratio() * 100.0
        );
    }
}

impl Default for RetrievalMetrics {
    fn default() -> Self {
        Self::new()
    }
}
