use serde::{Deserialize, Serialize};

/// Identifier of a scan within a raw data file.
pub type ScanNumber = u32;

/// A single acquisition spectrum, reduced to what the base peak plot needs.
///
/// Scans are read-only once produced by a [`RawDataFile`](crate::services::RawDataFile).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub scan_number: ScanNumber,

    /// Retention time in seconds
    pub retention_time: f64,

    /// m/z of the most intense signal
    pub base_peak_mz: f64,

    /// Intensity of the most intense signal
    pub base_peak_intensity: f64,
}

impl Scan {
    pub fn new(
        scan_number: ScanNumber,
        retention_time: f64,
        base_peak_mz: f64,
        base_peak_intensity: f64,
    ) -> Self {
        Self {
            scan_number,
            retention_time,
            base_peak_mz,
            base_peak_intensity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_from_yaml() {
        let yaml = "scan_number: 7\nretention_time: 1.5\nbase_peak_mz: 445.12\nbase_peak_intensity: 1.0e5\n";
        let scan: Scan = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(scan, Scan::new(7, 1.5, 445.12, 100_000.0));
    }
}
