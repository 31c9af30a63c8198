// Chart data set module
//
// This module provides the BasePeakDataSet which wraps the plotted series with
// thread-safe access using Arc<RwLock<T>> and emits change events so the chart
// knows when to redraw.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Change events emitted to chart observers
///
/// Appends made with `notify = false` emit nothing; the next notified append
/// reports the full item count so the chart catches up in one redraw.
#[derive(Clone, Debug, PartialEq)]
pub enum SeriesChange {
    /// Points were appended; `item_count` is the series length after the append
    PointsAdded { item_count: usize },

    /// A per-point m/z value was replaced
    MzValueChanged { index: usize },

    /// All points were removed
    Cleared,
}

#[derive(Error, Debug, PartialEq)]
pub enum DataSetError {
    #[error("Index {index} out of range for series with {item_count} items")]
    IndexOutOfRange { index: usize, item_count: usize },
}

/// Plotted points: x/y columns plus the m/z side channel, all the same length
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesData {
    x_values: Vec<f64>,
    y_values: Vec<f64>,
    mz_values: Vec<f64>,
}

impl SeriesData {
    pub fn item_count(&self) -> usize {
        self.x_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_values.is_empty()
    }

    pub fn x_value(&self, index: usize) -> Option<f64> {
        self.x_values.get(index).copied()
    }

    pub fn y_value(&self, index: usize) -> Option<f64> {
        self.y_values.get(index).copied()
    }

    pub fn mz_value(&self, index: usize) -> Option<f64> {
        self.mz_values.get(index).copied()
    }

    pub fn x_values(&self) -> &[f64] {
        &self.x_values
    }

    pub fn y_values(&self) -> &[f64] {
        &self.y_values
    }

    pub fn mz_values(&self) -> &[f64] {
        &self.mz_values
    }

    /// (x, y) pairs in insertion order, as a chart would plot them
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x_values.iter().copied().zip(self.y_values.iter().copied())
    }
}

/// Base peak chromatogram series shared between the retrieval worker and the chart
///
/// - The worker appends through [`add`](Self::add) / [`add_with_mz`](Self::add_with_mz)
/// - The chart reads through [`read`](Self::read) or [`snapshot`](Self::snapshot)
///   and redraws when a [`SeriesChange`] arrives on [`subscribe`](Self::subscribe)
///
/// Cloning is cheap and every clone refers to the same series.
pub struct BasePeakDataSet {
    /// Series key shown in the chart legend
    key: String,

    data: Arc<RwLock<SeriesData>>,

    /// Broadcast channel for notifying chart observers
    change_tx: broadcast::Sender<SeriesChange>,
}

impl BasePeakDataSet {
    /// Create an empty data set with a broadcast buffer of 100 events
    pub fn new(key: impl Into<String>) -> Self {
        let (change_tx, _) = broadcast::channel(100);
        Self {
            key: key.into(),
            data: Arc::new(RwLock::new(SeriesData::default())),
            change_tx,
        }
    }

    pub fn series_key(&self) -> &str {
        &self.key
    }

    /// Append a point with no m/z value (stored as NaN).
    ///
    /// Returns the index of the new point.
    pub fn add(&self, x: f64, y: f64, notify: bool) -> usize {
        self.add_with_mz(x, y, f64::NAN, notify)
    }

    /// Append a point together with its m/z value.
    ///
    /// The point and its m/z become visible to readers atomically, before any
    /// notification is sent. Returns the index of the new point.
    pub fn add_with_mz(&self, x: f64, y: f64, mz: f64, notify: bool) -> usize {
        let item_count = {
            let mut data = self.write_data();
            data.x_values.push(x);
            data.y_values.push(y);
            data.mz_values.push(mz);
            data.item_count()
        };

        if notify {
            self.emit(SeriesChange::PointsAdded { item_count });
        }

        item_count - 1
    }

    /// Replace the m/z value of an existing point
    pub fn set_mz_value(&self, index: usize, mz: f64) -> Result<(), DataSetError> {
        {
            let mut data = self.write_data();
            let item_count = data.item_count();
            let slot = data
                .mz_values
                .get_mut(index)
                .ok_or(DataSetError::IndexOutOfRange { index, item_count })?;
            *slot = mz;
        }

        self.emit(SeriesChange::MzValueChanged { index });
        Ok(())
    }

    /// Remove all points and notify observers
    pub fn clear(&self) {
        *self.write_data() = SeriesData::default();
        self.emit(SeriesChange::Cleared);
    }

    pub fn item_count(&self) -> usize {
        self.read(SeriesData::item_count)
    }

    pub fn mz_value(&self, index: usize) -> Option<f64> {
        self.read(|data| data.mz_value(index))
    }

    /// Execute a function with read access to the series
    ///
    /// # Example
    /// ```ignore
    /// let last_x = dataset.read(|series| series.x_values().last().copied());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SeriesData) -> R,
    {
        f(&self.read_data())
    }

    /// Clone the current series so it can be rendered without holding the lock
    pub fn snapshot(&self) -> SeriesData {
        self.read_data().clone()
    }

    /// Read-only view of the series for a chart.
    ///
    /// Unlike a clone, the view does not keep the change channel open, so a
    /// listener sees `Closed` once every data set handle is gone.
    pub fn reader(&self) -> SeriesReader {
        SeriesReader {
            data: Arc::clone(&self.data),
        }
    }

    /// Subscribe to change events
    ///
    /// Returns a receiver that will get notified of all future changes.
    pub fn subscribe(&self) -> broadcast::Receiver<SeriesChange> {
        self.change_tx.subscribe()
    }

    fn emit(&self, change: SeriesChange) {
        // Ignore send errors - it's OK if no chart is listening
        let _ = self.change_tx.send(change);
    }

    fn read_data(&self) -> RwLockReadGuard<'_, SeriesData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_data(&self) -> RwLockWriteGuard<'_, SeriesData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for BasePeakDataSet {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            data: Arc::clone(&self.data),
            change_tx: self.change_tx.clone(),
        }
    }
}

impl std::fmt::Debug for BasePeakDataSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasePeakDataSet")
            .field("key", &self.key)
            .field("item_count", &self.item_count())
            .finish()
    }
}

/// Shared read access to a [`BasePeakDataSet`] series
#[derive(Debug, Clone)]
pub struct SeriesReader {
    data: Arc<RwLock<SeriesData>>,
}

impl SeriesReader {
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SeriesData) -> R,
    {
        f(&self.data.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn snapshot(&self) -> SeriesData {
        self.read(SeriesData::clone)
    }

    pub fn item_count(&self) -> usize {
        self.read(SeriesData::item_count)
    }
}

/// Call `on_redraw(item_count)` for every `PointsAdded` until the channel closes.
///
/// A listener that falls more than the buffer size behind loses the oldest
/// events but keeps receiving, so the newest redraw (including the final
/// point's) is still delivered.
pub async fn follow_redraws<F>(mut changes: broadcast::Receiver<SeriesChange>, mut on_redraw: F)
where
    F: FnMut(usize),
{
    loop {
        match changes.recv().await {
            Ok(SeriesChange::PointsAdded { item_count }) => on_redraw(item_count),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Redraw listener lagged - {} change events were skipped", skipped);
            }
            Err(RecvError::Closed) => {
                tracing::debug!("Series change channel closed - redraw listener stopping");
                break;
            }
        }
    }
}
