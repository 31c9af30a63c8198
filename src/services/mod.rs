//! Services module - access to raw scan data.
//!
//! The services are framework-agnostic: nothing here knows about charts or
//! task runners.
//!
//! # Components
//!
//! - [`RawDataFile`]: the seam to whatever reads instrument data. The retrieval
//!   task only ever asks it for one scan at a time by scan number.
//! - [`InMemoryRawDataFile`]: a `RawDataFile` backed by an ordered map, loadable
//!   from a YAML scan table.
//! - [`RawDataError`]: failures of a scan lookup (missing scan, I/O, bad data).

pub mod raw_data;

pub use raw_data::{InMemoryRawDataFile, RawDataError, RawDataFile};
