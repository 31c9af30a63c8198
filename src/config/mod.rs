use crate::models::UserConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use ::config::{Config, Environment, File, FileFormat};
use std::fs;

/// Name of the settings file inside the configuration directory
pub const USER_CONFIG_FILE: &str = "BasePeak Settings.yaml";

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "BASEPEAK";

/// Configuration manager for loading and saving the YAML settings file.
///
/// Settings are layered: built-in defaults, then `BasePeak Settings.yaml`
/// (optional), then `BASEPEAK_*` environment variables. Nested keys use `__`,
/// e.g. `BASEPEAK_RETRIEVAL__REDRAW_INTERVAL_MS=250`.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating `config_dir` if it doesn't exist.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            user_config_path: config_dir.join(USER_CONFIG_FILE),
            config_dir,
        })
    }

    /// Environment source for `BASEPEAK_*` overrides
    pub fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Load the user configuration with process environment overrides.
    ///
    /// # Returns
    /// The merged UserConfig; defaults if neither file nor variables are present
    pub fn load_user_config(&self) -> Result<UserConfig> {
        self.load_user_config_with(Self::environment())
    }

    /// Load the user configuration with an explicit environment source.
    ///
    /// Nothing is logged here: loading happens before logging is set up, so
    /// callers report the result with [`log_loaded_config`](Self::log_loaded_config).
    pub fn load_user_config_with(&self, environment: Environment) -> Result<UserConfig> {
        let merged = Config::builder()
            .add_source(File::new(self.user_config_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to read user config: {}", self.user_config_path))?;

        let config: UserConfig = merged
            .try_deserialize()
            .with_context(|| format!("Failed to parse user config: {}", self.user_config_path))?;

        config
            .retrieval
            .validate()
            .with_context(|| format!("Invalid retrieval settings in {}", self.user_config_path))?;

        Ok(config)
    }

    /// Log where `config` came from and the settings in effect
    pub fn log_loaded_config(&self, config: &UserConfig) {
        if !self.user_config_exists() {
            tracing::warn!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
        }
        tracing::info!("{}", self.describe(config));
    }

    /// One-line summary of the resolved settings
    pub fn describe(&self, config: &UserConfig) -> String {
        let source = if self.user_config_exists() {
            self.user_config_path.as_str()
        } else {
            "defaults"
        };

        format!(
            "Loaded user config ({}): redraw_interval={}ms, retention_time_scale={}, log_dir={}",
            source,
            config.retrieval.redraw_interval_ms,
            config.retrieval.retention_time_scale,
            config.logging.log_dir
        )
    }

    pub fn user_config_exists(&self) -> bool {
        self.user_config_path.exists()
    }

    /// Save the user configuration file.
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn user_config_path(&self) -> &Utf8Path {
        &self.user_config_path
    }
}
