//! Integration tests for BasePeakDataSet change events
//!
//! These tests verify that the data set correctly:
//! - Emits PointsAdded only for notified appends
//! - Delivers events to multiple subscribers
//! - Lets a chart thread read a consistent series while the task appends

use basepeak::{
    BasePeakDataSet, BasePeakRetrievalTask, InMemoryRawDataFile, RetrievalOptions, Scan,
    SeriesChange, TaskRunner, TaskStatus,
};
use std::sync::Arc;
use tokio::time::{Duration, timeout};

#[tokio::test]
async fn test_notified_append_reaches_subscribers() {
    let dataset = BasePeakDataSet::new("bp");
    let mut rx1 = dataset.subscribe();
    let mut rx2 = dataset.subscribe();

    dataset.add_with_mz(1000.0, 5.0, 300.0, false);
    dataset.add_with_mz(1100.0, 6.0, 301.0, true);

    for rx in [&mut rx1, &mut rx2] {
        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout waiting for event")
            .expect("Channel closed");

        assert_eq!(event, SeriesChange::PointsAdded { item_count: 2 });
    }
}

#[tokio::test]
async fn test_chart_reads_match_notifications() {
    let scans = (1..=300u32).map(|n| Scan::new(n, n as f64 * 0.5, 400.0, n as f64));
    let file = InMemoryRawDataFile::from_scans("chart.raw", scans);
    let scan_numbers = file.scan_numbers();

    let dataset = BasePeakDataSet::new("Base peak");
    let mut rx = dataset.subscribe();
    let chart = dataset.clone();

    let task = Arc::new(BasePeakRetrievalTask::new(
        Arc::new(file),
        scan_numbers,
        dataset,
        RetrievalOptions::default(),
    ));

    let runner = TaskRunner::new(tokio::runtime::Handle::current());
    let status = runner.submit(task).join().await.unwrap();
    assert_eq!(status, TaskStatus::Finished);

    let mut last_count = 0;
    while let Ok(Ok(change)) = timeout(Duration::from_millis(50), rx.recv()).await {
        if let SeriesChange::PointsAdded { item_count } = change {
            // the series never shrinks below what was announced
            assert!(chart.item_count() >= item_count);
            last_count = item_count;
        }
    }

    assert_eq!(last_count, 300);
    let series = chart.snapshot();
    assert_eq!(series.item_count(), 300);
    assert!(series.mz_values().iter().all(|mz| *mz == 400.0));
}

#[tokio::test]
async fn test_clear_event() {
    let dataset = BasePeakDataSet::new("bp");
    dataset.add(1.0, 1.0, false);
    let mut rx = dataset.subscribe();

    dataset.clear();

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout")
        .expect("Channel closed");
    assert_eq!(event, SeriesChange::Cleared);
    assert_eq!(dataset.item_count(), 0);
}
