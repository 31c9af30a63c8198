//! Data models for the BasePeak crate.
//!
//! - [`Scan`]: one acquisition spectrum reduced to retention time and base peak
//! - [`TaskStatus`] / [`AtomicTaskStatus`]: task lifecycle, shareable across threads
//! - [`UserConfig`]: retrieval and logging settings loaded from `BasePeak Settings.yaml`
//! - [`RetrievalOptions`]: runtime form of the retrieval settings

pub mod config;
pub mod scan;
pub mod task_status;

pub use config::{LoggingSettings, RetrievalOptions, RetrievalSettings, SettingsError, UserConfig};
pub use scan::{Scan, ScanNumber};
pub use task_status::{AtomicTaskStatus, TaskStatus};
