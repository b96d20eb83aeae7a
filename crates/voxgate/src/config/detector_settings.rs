use crate::{
    AppResult,
    config::{default_audio_gain, default_models, default_resource_path, default_sensitivities},
};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use voxgate_core::DetectorConfig;

/// `[detector]` section: hotword models and tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSettings {
    /// Resource bundle directory; relative model paths resolve against it.
    #[serde(default = "default_resource_path")]
    pub resource_path: PathBuf,
    /// Comma-delimited model files, in trigger-index order.
    #[serde(default = "default_models")]
    pub models: String,
    /// Comma-delimited sensitivities, one per model.
    #[serde(default = "default_sensitivities")]
    pub sensitivities: String,
    /// Linear gain applied before detection.
    #[serde(default = "default_audio_gain")]
    pub audio_gain: f32,
    /// Enables the engine's front-end processing.
    #[serde(default)]
    pub apply_frontend: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            resource_path: default_resource_path(),
            models: default_models(),
            sensitivities: default_sensitivities(),
            audio_gain: default_audio_gain(),
            apply_frontend: false,
        }
    }
}

impl DetectorSettings {
    /// Parses the delimited lists into a validated core config.
    #[track_caller]
    pub fn to_detector_config(&self) -> AppResult<DetectorConfig> {
        Ok(DetectorConfig::from_delimited(
            self.resource_path.clone(),
            &self.models,
            &self.sensitivities,
            self.audio_gain,
            self.apply_frontend,
        )?)
    }

    /// Replaces the model list from the command line. Every model gets the
    /// first configured sensitivity.
    pub fn override_models(&mut self, models: &[impl AsRef<Path>]) {
        let sensitivity = self
            .sensitivities
            .split(',')
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(crate::config::DEFAULT_SENSITIVITIES)
            .to_string();

        self.models = models
            .iter()
            .map(|m| m.as_ref().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(",");
        self.sensitivities = vec![sensitivity; models.len()].join(",");
    }
}
