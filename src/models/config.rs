use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// User configuration from `BasePeak Settings.yaml`
///
/// Every section falls back to its defaults, so a partial file (or no file at
/// all) is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub retrieval: RetrievalSettings,
    pub logging: LoggingSettings,
}

/// Settings for the base peak retrieval loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Minimum time between two redraw notifications, in milliseconds
    pub redraw_interval_ms: u64,

    /// Factor applied to retention times before they are plotted
    pub retention_time_scale: f64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            redraw_interval_ms: 100,
            retention_time_scale: 1000.0,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("Redraw interval must be greater than zero")]
    ZeroRedrawInterval,

    #[error("Retention time scale must be a positive finite number, got {0}")]
    InvalidRetentionTimeScale(f64),
}

impl RetrievalSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.redraw_interval_ms == 0 {
            return Err(SettingsError::ZeroRedrawInterval);
        }
        if !self.retention_time_scale.is_finite() || self.retention_time_scale <= 0.0 {
            return Err(SettingsError::InvalidRetentionTimeScale(
                self.retention_time_scale,
            ));
        }
        Ok(())
    }

    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.redraw_interval_ms)
    }
}

/// Settings for the tracing subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_dir: String,
    pub log_prefix: String,
    pub debug_mode: bool,
    pub console_output: bool,

    /// Write the log file as JSON lines instead of plain text
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            log_prefix: "basepeak".to_string(),
            debug_mode: false,
            console_output: true,
            json_format: false,
        }
    }
}

/// Runtime form of [`RetrievalSettings`] handed to the retrieval task
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalOptions {
    pub redraw_interval: Duration,
    pub retention_time_scale: f64,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self::from(&RetrievalSettings::default())
    }
}

impl From<&RetrievalSettings> for RetrievalOptions {
    fn from(settings: &RetrievalSettings) -> Self {
        Self {
            redraw_interval: settings.redraw_interval(),
            retention_time_scale: settings.retention_time_scale,
        }
    }
}
