use crate::models::{Scan, ScanNumber};
use camino::Utf8Path;
use std::collections::BTreeMap;
use std::fs;
use thiserror::Error;

/// Errors that can occur while reading scans from a raw data file
#[derive(Error, Debug)]
pub enum RawDataError {
    #[error("Scan {scan} not found in {file}")]
    ScanNotFound { file: String, scan: ScanNumber },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scan data: {0}")]
    Parse(String),
}

/// Source of scans for the base peak plot.
///
/// Implementations are shared with worker threads, so lookups take `&self`.
/// A lookup may block on disk I/O.
pub trait RawDataFile: Send + Sync {
    /// Name shown to the user (usually the file name)
    fn name(&self) -> String;

    fn scan(&self, scan_number: ScanNumber) -> Result<Scan, RawDataError>;
}

/// Raw data file held entirely in memory, ordered by scan number
#[derive(Debug, Clone, Default)]
pub struct InMemoryRawDataFile {
    name: String,
    scans: BTreeMap<ScanNumber, Scan>,
}

impl InMemoryRawDataFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scans: BTreeMap::new(),
        }
    }

    pub fn from_scans(name: impl Into<String>, scans: impl IntoIterator<Item = Scan>) -> Self {
        let mut file = Self::new(name);
        for scan in scans {
            file.insert_scan(scan);
        }
        file
    }

    /// Load a scan table (a YAML sequence of [`Scan`] records).
    ///
    /// The file name becomes the data file's display name.
    pub fn load_yaml(path: &Utf8Path) -> Result<Self, RawDataError> {
        let contents = fs::read_to_string(path)?;
        let scans: Vec<Scan> = serde_yaml_ng::from_str(&contents)
            .map_err(|e| RawDataError::Parse(format!("{}: {}", path, e)))?;

        let name = path.file_name().unwrap_or(path.as_str());
        tracing::info!("Loaded {} scans from {}", scans.len(), path);
        Ok(Self::from_scans(name, scans))
    }

    /// Insert or replace a scan, keyed by its scan number
    pub fn insert_scan(&mut self, scan: Scan) {
        self.scans.insert(scan.scan_number, scan);
    }

    /// All scan numbers in ascending order
    pub fn scan_numbers(&self) -> Vec<ScanNumber> {
        self.scans.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }
}

impl RawDataFile for InMemoryRawDataFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn scan(&self, scan_number: ScanNumber) -> Result<Scan, RawDataError> {
        self.scans
            .get(&scan_number)
            .copied()
            .ok_or_else(|| RawDataError::ScanNotFound {
                file: self.name.clone(),
                scan: scan_number,
            })
    }
}
