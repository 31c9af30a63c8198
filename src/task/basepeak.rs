use crate::dataset::BasePeakDataSet;
use crate::metrics::RetrievalMetrics;
use crate::models::{AtomicTaskStatus, RetrievalOptions, ScanNumber, TaskStatus};
use crate::services::{RawDataError, RawDataFile};
use crate::task::{CancelHandle, RedrawThrottle, Task};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Fills a base peak chromatogram series from a raw data file.
///
/// For each requested scan, in order, the task reads the scan and appends
/// `(retention_time * scale, base_peak_intensity)` to the data set with the
/// base peak m/z in the side channel. Redraws are throttled by a
/// [`RedrawThrottle`]; the final point always triggers one.
///
/// The first failed scan lookup ends the run with [`TaskStatus::Error`]. Points
/// appended before the failure stay in the series.
pub struct BasePeakRetrievalTask {
    raw_data_file: Arc<dyn RawDataFile>,
    dataset: BasePeakDataSet,
    scan_numbers: Vec<ScanNumber>,
    options: RetrievalOptions,

    retrieved_scans: AtomicUsize,
    status: Arc<AtomicTaskStatus>,
    error_message: Mutex<Option<String>>,
    metrics: Option<Arc<RetrievalMetrics>>,
}

impl BasePeakRetrievalTask {
    pub fn new(
        raw_data_file: Arc<dyn RawDataFile>,
        scan_numbers: Vec<ScanNumber>,
        dataset: BasePeakDataSet,
        options: RetrievalOptions,
    ) -> Self {
        Self {
            raw_data_file,
            dataset,
            scan_numbers,
            options,
            retrieved_scans: AtomicUsize::new(0),
            status: Arc::new(AtomicTaskStatus::default()),
            error_message: Mutex::new(None),
            metrics: None,
        }
    }

    /// Record counters and timings into shared metrics
    pub fn with_metrics(mut self, metrics: Arc<RetrievalMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(Arc::clone(&self.status))
    }

    pub fn dataset(&self) -> &BasePeakDataSet {
        &self.dataset
    }

    pub fn retrieved_scans(&self) -> usize {
        self.retrieved_scans.load(Ordering::Acquire)
    }

    pub fn total_scans(&self) -> usize {
        self.scan_numbers.len()
    }

    fn is_canceled(&self) -> bool {
        self.status.load() == TaskStatus::Canceled
    }

    fn fail(&self, scan_number: ScanNumber, error: RawDataError) {
        tracing::error!(
            "Failed to read scan {} from {}: {}",
            scan_number,
            self.raw_data_file.name(),
            error
        );

        // Message goes in before the status so a poller seeing Error can read it
        *self
            .error_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(error.to_string());

        if let Some(metrics) = &self.metrics {
            metrics.record_fetch_failure();
        }

        if self.status.transition(TaskStatus::Processing, TaskStatus::Error) {
            if let Some(metrics) = &self.metrics {
                metrics.record_task_failed();
            }
        } else {
            // a cancel landed while the scan was being read
            self.record_canceled();
        }
    }

    fn record_canceled(&self) {
        tracing::info!(
            "Base peak retrieval for {} canceled after {} of {} scans",
            self.raw_data_file.name(),
            self.retrieved_scans(),
            self.total_scans()
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_task_canceled();
        }
    }
}

impl Task for BasePeakRetrievalTask {
    type Output = ();

    fn description(&self) -> String {
        format!("Updating base peak plot of {}", self.raw_data_file.name())
    }

    fn finished_fraction(&self) -> f32 {
        let total = self.total_scans();
        if total == 0 {
            return if self.status() == TaskStatus::Finished { 1.0 } else { 0.0 };
        }
        self.retrieved_scans() as f32 / total as f32
    }

    fn status(&self) -> TaskStatus {
        self.status.load()
    }

    fn error_message(&self) -> Option<String> {
        if self.status() != TaskStatus::Error {
            return None;
        }
        self.error_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// This task has no result; the data set is its product
    fn result(&self) -> Option<()> {
        None
    }

    fn cancel(&self) {
        if self.status.cancel() {
            tracing::debug!("Cancellation requested: {}", self.description());
        }
    }

    fn run(&self) {
        if !self.status.transition(TaskStatus::Waiting, TaskStatus::Processing) {
            match self.status() {
                TaskStatus::Canceled => self.record_canceled(),
                other => tracing::warn!("Not starting {}: task is {}", self.description(), other),
            }
            return;
        }

        let started = Instant::now();
        let total = self.total_scans();
        let scale = self.options.retention_time_scale;
        let mut throttle = RedrawThrottle::new(self.options.redraw_interval, started);

        tracing::info!("{} ({} scans)", self.description(), total);

        for (i, &scan_number) in self.scan_numbers.iter().enumerate() {
            if self.is_canceled() {
                self.record_canceled();
                return;
            }

            let scan = match self.raw_data_file.scan(scan_number) {
                Ok(scan) => scan,
                Err(e) => {
                    self.fail(scan_number, e);
                    return;
                }
            };

            let notify = throttle.should_notify(Instant::now(), i + 1 == total);
            if !notify {
                tracing::trace!("Redraw throttled at scan {}", scan_number);
            }

            self.dataset.add_with_mz(
                scan.retention_time * scale,
                scan.base_peak_intensity,
                scan.base_peak_mz,
                notify,
            );
            self.retrieved_scans.fetch_add(1, Ordering::AcqRel);

            if let Some(metrics) = &self.metrics {
                metrics.record_scan_retrieved(notify);
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_retrieval_time(started.elapsed());
        }

        if self.status.transition(TaskStatus::Processing, TaskStatus::Finished) {
            tracing::info!(
                "Base peak plot of {} updated: {} points in {:.2}s",
                self.raw_data_file.name(),
                total,
                started.elapsed().as_secs_f64()
            );
            if let Some(metrics) = &self.metrics {
                metrics.record_task_finished();
            }
        } else {
            // Canceled after the last append
            self.record_canceled();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scan;
    use crate::services::InMemoryRawDataFile;
    use std::time::Duration;

    fn sample_file() -> Arc<dyn RawDataFile> {
        Arc::new(InMemoryRawDataFile::from_scans(
            "sample.raw",
            [
                Scan::new(10, 1.0, 100.0, 50.0),
                Scan::new(11, 1.1, 101.0, 60.0),
                Scan::new(12, 1.2, 102.0, 40.0),
            ],
        ))
    }

    fn sample_task(scan_numbers: Vec<ScanNumber>) -> BasePeakRetrievalTask {
        BasePeakRetrievalTask::new(
            sample_file(),
            scan_numbers,
            BasePeakDataSet::new("Base peak"),
            RetrievalOptions::default(),
        )
    }

    #[test]
    fn test_initial_state() {
        let task = sample_task(vec![10, 11, 12]);

        assert_eq!(task.status(), TaskStatus::Waiting);
        assert_eq!(task.finished_fraction(), 0.0);
        assert_eq!(task.error_message(), None);
        assert_eq!(task.result(), None);
    }

    #[test]
    fn test_description_names_file() {
        let task = sample_task(vec![10]);
        assert_eq!(task.description(), "Updating base peak plot of sample.raw");
    }

    #[test]
    fn test_three_scan_run() {
        let task = sample_task(vec![10, 11, 12]);
        task.run();

        let series = task.dataset().snapshot();
        assert_eq!(series.item_count(), 3);
        for (actual, expected) in series.x_values().iter().zip([1000.0, 1100.0, 1200.0]) {
            assert!((actual - expected).abs() < 1e-9);
        }
        assert_eq!(series.y_values(), &[50.0, 60.0, 40.0]);
        assert_eq!(series.mz_values(), &[100.0, 101.0, 102.0]);
        assert_eq!(task.status(), TaskStatus::Finished);
        assert_eq!(task.finished_fraction(), 1.0);
    }

    #[test]
    fn test_scan_order_is_preserved() {
        let task = sample_task(vec![12, 10]);
        task.run();

        assert_eq!(task.dataset().snapshot().y_values(), &[40.0, 50.0]);
    }

    #[test]
    fn test_custom_retention_time_scale() {
        let task = BasePeakRetrievalTask::new(
            sample_file(),
            vec![10],
            BasePeakDataSet::new("bp"),
            RetrievalOptions {
                redraw_interval: Duration::from_millis(100),
                retention_time_scale: 60.0,
            },
        );
        task.run();

        assert_eq!(task.dataset().read(|s| s.x_value(0)), Some(60.0));
    }

    #[test]
    fn test_missing_scan_sets_error() {
        let task = sample_task(vec![10, 99, 12]);
        task.run();

        assert_eq!(task.status(), TaskStatus::Error);
        assert_eq!(task.dataset().item_count(), 1);
        assert_eq!(task.retrieved_scans(), 1);
        let message = task.error_message().unwrap();
        assert!(message.contains("99"), "unexpected message: {message}");
    }

    #[test]
    fn test_cancel_before_run() {
        let task = sample_task(vec![10, 11, 12]);
        task.cancel();
        task.run();

        assert_eq!(task.status(), TaskStatus::Canceled);
        assert_eq!(task.dataset().item_count(), 0);
        assert_eq!(task.error_message(), None);
    }

    #[test]
    fn test_cancel_after_finish_is_ignored() {
        let task = sample_task(vec![10]);
        task.run();
        task.cancel();

        assert_eq!(task.status(), TaskStatus::Finished);
    }

    #[test]
    fn test_second_run_does_nothing() {
        let task = sample_task(vec![10, 11]);
        task.run();
        task.run();

        assert_eq!(task.dataset().item_count(), 2);
        assert_eq!(task.status(), TaskStatus::Finished);
    }

    #[test]
    fn test_empty_scan_list() {
        let task = sample_task(Vec::new());
        assert_eq!(task.finished_fraction(), 0.0);

        task.run();

        assert_eq!(task.status(), TaskStatus::Finished);
        assert_eq!(task.finished_fraction(), 1.0);
        assert_eq!(task.dataset().item_count(), 0);
    }

    #[test]
    fn test_last_point_notifies() {
        let task = BasePeakRetrievalTask::new(
            sample_file(),
            vec![10, 11, 12],
            BasePeakDataSet::new("bp"),
            RetrievalOptions {
                redraw_interval: Duration::from_secs(3600),
                retention_time_scale: 1000.0,
            },
        );
        let mut rx = task.dataset().subscribe();
        task.run();

        // a one-hour window throttles everything but the final point
        assert_eq!(
            rx.try_recv().unwrap(),
            crate::dataset::SeriesChange::PointsAdded { item_count: 3 }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_metrics_recorded() {
        let metrics = Arc::new(RetrievalMetrics::new());
        let task = sample_task(vec![10, 11, 12]).with_metrics(Arc::clone(&metrics));
        task.run();

        assert_eq!(metrics.scans_retrieved.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.tasks_finished.load(Ordering::Relaxed), 1);
        assert!(metrics.redraws_requested.load(Ordering::Relaxed) >= 1);
    }

    /// Cancels its reader and then fails the same lookup
    struct CancelThenFailFile {
        handle: std::sync::OnceLock<CancelHandle>,
    }

    impl RawDataFile for CancelThenFailFile {
        fn name(&self) -> String {
            "racing.raw".to_string()
        }

        fn scan(&self, scan_number: ScanNumber) -> Result<Scan, RawDataError> {
            if let Some(handle) = self.handle.get() {
                handle.cancel();
            }
            Err(RawDataError::Parse(format!("scan {} is corrupt", scan_number)))
        }
    }

    #[test]
    fn test_cancel_during_failed_lookup_counts_as_canceled() {
        let file = Arc::new(CancelThenFailFile {
            handle: std::sync::OnceLock::new(),
        });
        let metrics = Arc::new(RetrievalMetrics::new());
        let task = BasePeakRetrievalTask::new(
            Arc::clone(&file) as Arc<dyn RawDataFile>,
            vec![1, 2, 3],
            BasePeakDataSet::new("bp"),
            RetrievalOptions::default(),
        )
        .with_metrics(Arc::clone(&metrics));
        file.handle.set(task.cancel_handle()).unwrap();

        task.run();

        assert_eq!(task.status(), TaskStatus::Canceled);
        assert_eq!(task.error_message(), None);
        assert_eq!(metrics.fetch_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.tasks_canceled.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.tasks_failed.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.tasks_finished.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_cancel_handle_reports_cancellation() {
        let task = sample_task(vec![10, 11, 12]);
        let handle = task.cancel_handle();

        assert!(!handle.is_canceled());
        assert!(handle.cancel());
        assert!(handle.is_canceled());
        // a second cancel changes nothing
        assert!(!handle.cancel());
    }

    #[test]
    fn test_cancel_handle_after_finish() {
        let task = sample_task(vec![10, 11, 12]);
        let handle = task.cancel_handle();
        task.run();

        assert!(!handle.cancel());
        assert!(!handle.is_canceled());
        assert_eq!(task.status(), TaskStatus::Finished);
    }
}
