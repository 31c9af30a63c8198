//! BasePeak - headless driver for the base peak retrieval task
//!
//! # Overview
//!
//! Runs one [`BasePeakRetrievalTask`] the way the chart view does, without the
//! chart. It initializes:
//! - Configuration ([`ConfigManager`], `BasePeak Data/BasePeak Settings.yaml`)
//! - Logging (file rotation + console output)
//! - Tokio runtime (blocking pool runs the task, async side polls it)
//!
//! # Usage
//!
//! ```text
//! basepeak [SCANS.yaml]
//! ```
//!
//! With a path, scans are read from a YAML scan table. Without one, a synthetic
//! chromatogram is generated. Ctrl-C cancels the retrieval.

use anyhow::{Result, bail};
use basepeak::{
    APP_NAME, BasePeakDataSet, BasePeakRetrievalTask, ConfigManager, InMemoryRawDataFile,
    RetrievalMetrics, RetrievalOptions, Scan, Task, TaskRunner, TaskStatus, VERSION,
    follow_redraws,
};
use camino::Utf8PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Interval at which progress is reported while the task runs
const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Scans in the synthetic chromatogram
const SYNTHETIC_SCANS: u32 = 3000;

fn main() -> Result<()> {
    let config_manager = ConfigManager::new("BasePeak Data")?;
    let user_config = config_manager.load_user_config()?;

    let _guard = basepeak::logging::setup_logging(&user_config.logging)?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    config_manager.log_loaded_config(&user_config);

    let raw_data_file = match std::env::args().nth(1) {
        Some(path) => InMemoryRawDataFile::load_yaml(&Utf8PathBuf::from(path))?,
        None => synthetic_file(SYNTHETIC_SCANS),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("basepeak-worker")
        .build()?;

    let metrics = Arc::new(RetrievalMetrics::new());
    let options = RetrievalOptions::from(&user_config.retrieval);

    let status = runtime.block_on(run_retrieval(raw_data_file, options, Arc::clone(&metrics)))?;

    metrics.log_summary();
    runtime.shutdown_timeout(Duration::from_secs(5));

    match status {
        TaskStatus::Finished | TaskStatus::Canceled => Ok(()),
        other => bail!("Retrieval ended with status {}", other),
    }
}

async fn run_retrieval(
    raw_data_file: InMemoryRawDataFile,
    options: RetrievalOptions,
    metrics: Arc<RetrievalMetrics>,
) -> Result<TaskStatus> {
    let dataset = BasePeakDataSet::new("Base peak");
    let scan_numbers = raw_data_file.scan_numbers();

    // Stand-in for the chart: re-render whenever the series says so
    let chart = dataset.reader();
    let listener = tokio::spawn(follow_redraws(dataset.subscribe(), move |item_count| {
        let last = chart.read(|series| series.points().last());
        tracing::debug!("Redraw: {} points, last {:?}", item_count, last);
    }));

    let task = Arc::new(
        BasePeakRetrievalTask::new(Arc::new(raw_data_file), scan_numbers, dataset, options)
            .with_metrics(metrics),
    );

    let cancel = task.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted - cancelling retrieval...");
            cancel.cancel();
        }
    });

    let runner = TaskRunner::new(tokio::runtime::Handle::current());
    let handle = runner.submit(Arc::clone(&task));

    let status = handle
        .wait_with_progress(PROGRESS_INTERVAL, |progress, status| {
            tracing::info!("{}: {:.0}% ({})", task.description(), progress * 100.0, status);
        })
        .await?;

    if let Some(message) = task.error_message() {
        tracing::error!("Retrieval failed: {}", message);
    }

    // The task holds the last data set handle; dropping it closes the channel
    // once the listener has drained every pending redraw.
    drop(task);
    listener.await?;

    Ok(status)
}

/// Chromatogram with a few gaussian peaks over a noisy baseline
fn synthetic_file(scan_count: u32) -> InMemoryRawDataFile {
    const PEAKS: [(f64, f64, f64, f64); 3] = [
        // (retention time s, width s, height, m/z)
        (180.0, 8.0, 2.0e6, 445.12),
        (420.0, 12.0, 8.5e5, 301.14),
        (610.0, 6.0, 1.3e6, 522.20),
    ];

    let scans = (1..=scan_count).map(|scan_number| {
        let retention_time = scan_number as f64 * 0.25;
        let baseline = 1.0e4 + 2.0e3 * (scan_number as f64 * 0.37).sin().abs();

        let (intensity, mz) = PEAKS.iter().fold((baseline, 371.10), |best, (rt, width, height, mz)| {
            let signal = height * (-(retention_time - rt).powi(2) / (2.0 * width * width)).exp();
            if signal > best.0 { (signal, *mz) } else { best }
        });

        Scan::new(scan_number, retention_time, mz, intensity)
    });

    InMemoryRawDataFile::from_scans("synthetic.raw", scans)
}
