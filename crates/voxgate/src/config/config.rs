//! Configuration management for voxgate.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{
        BehaviourConfig, DetectorSettings, DeviceSettings, LoggingConfig, OutputConfig,
        SessionSettings,
    },
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Audio input parameters.
    #[serde(default)]
    pub device: DeviceSettings,
    /// Hotword models and tuning.
    #[serde(default)]
    pub detector: DetectorSettings,
    /// Upload session tuning.
    #[serde(default)]
    pub session: SessionSettings,
    /// Utterance limits.
    #[serde(default)]
    pub behaviour: BehaviourConfig,
    /// Utterance output location.
    #[serde(default)]
    pub output: OutputConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from `path`, or from the platform config directory
    /// when `None`. A missing file is created with defaults.
    ///
    /// Values are not validated here; call [`Config::validate`] before use.
    #[track_caller]
    #[instrument]
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to read config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to parse config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            info!(config_path = ?config_path, "Configuration loaded");

            Ok(config)
        } else {
            info!(config_path = ?config_path, "No config found, creating default");
            Self::create_default(&config_path)
        }
    }

    /// Checks device and detector settings the pipeline cannot run with.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn validate(&self) -> AppResult<()> {
        self.device.to_device_config().validate()?;
        self.detector.to_detector_config()?;

        if self.session.channel_capacity == 0 {
            return Err(AppError::ConfigError {
                reason: "session.channel_capacity must be at least 1".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if self.session.receive_timeout_ms == 0 {
            return Err(AppError::ConfigError {
                reason: "session.receive_timeout_ms must be non-zero".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        // A stopped session notices the stop within one receive timeout, so
        // deferred starts must keep retrying at least that long.
        let retry_budget_ms = self
            .session
            .start_retry_ms
            .saturating_mul(u64::from(self.session.start_retry_attempts));
        if retry_budget_ms <= self.session.receive_timeout_ms {
            return Err(AppError::ConfigError {
                reason: format!(
                    "session.start_retry_ms x start_retry_attempts ({} ms) must exceed \
                     session.receive_timeout_ms ({} ms)",
                    retry_budget_ms, self.session.receive_timeout_ms
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }

    /// Save configuration to `path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                debug!(config_dir = ?parent, "Created config directory");
            }
        }

        // Atomic write: write to temp file then rename
        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Directory utterance WAV files are written to.
    #[track_caller]
    pub fn utterance_dir(&self) -> AppResult<PathBuf> {
        match &self.output.utterance_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("utterances")),
        }
    }

    /// Directory for rolling log files.
    #[track_caller]
    pub fn log_dir(&self) -> AppResult<PathBuf> {
        match &self.logging.directory {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("logs")),
        }
    }

    /// `config.toml` in the platform config directory.
    #[track_caller]
    pub fn default_path() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "voxgate", "Voxgate").ok_or_else(|| AppError::ConfigError {
            reason: "Failed to get project directories".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    #[track_caller]
    fn create_default(config_path: &Path) -> AppResult<Self> {
        let mut config = Config::default();

        match Self::project_dirs() {
            Ok(dirs) => config.detector.resource_path = dirs.data_dir().join("resources"),
            Err(e) => warn!(error = %e, "No project directories, using relative resource path"),
        }

        config.save(config_path)?;

        warn!(
            resource_path = ?config.detector.resource_path,
            models = %config.detector.models,
            "Default config created. Hotword models must be installed before capture."
        );

        Ok(config)
    }
}
