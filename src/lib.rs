// BasePeak - base peak chromatogram retrieval for mass spectrometry chart views
//
// This is the library crate containing the retrieval task, the chart data set
// it feeds, and the supporting configuration and logging.
// The binary crate (main.rs) provides a headless driver.

pub mod config;
pub mod dataset;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod task;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use dataset::{BasePeakDataSet, SeriesChange, SeriesReader, follow_redraws};
pub use metrics::RetrievalMetrics;
pub use models::{RetrievalOptions, Scan, ScanNumber, TaskStatus, UserConfig};
pub use services::{InMemoryRawDataFile, RawDataError, RawDataFile};
pub use task::{BasePeakRetrievalTask, CancelHandle, Task, TaskRunner};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
