use crate::{CoreError, CoreResult};

use std::path::{Path, PathBuf};

/// Hotword engine configuration, immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Resource bundle directory. Relative model paths resolve against it.
    pub resource_path: PathBuf,
    /// Model files in the order that defines their [`crate::ModelIndex`].
    pub models: Vec<PathBuf>,
    /// One sensitivity in `[0, 1]` per model; higher triggers more readily.
    pub sensitivities: Vec<f32>,
    /// Linear gain applied to samples before detection.
    pub audio_gain: f32,
    /// Enables the engine's noise and gain front end.
    pub apply_frontend: bool,
}

impl DetectorConfig {
    /// Builds a config from the comma-delimited model and sensitivity lists
    /// used in configuration files, e.g. `"a.rpw,b.rpw"` and `"0.5,0.5"`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] when a sensitivity does not parse
    /// or the resulting config fails [`DetectorConfig::validate`].
    #[track_caller]
    pub fn from_delimited(
        resource_path: impl Into<PathBuf>,
        models: &str,
        sensitivities: &str,
        audio_gain: f32,
        apply_frontend: bool,
    ) -> CoreResult<Self> {
        let models = split_list(models).map(PathBuf::from).collect();
        let sensitivities = split_list(sensitivities)
            .map(|s| {
                s.parse::<f32>()
                    .map_err(|e| CoreError::invalid_config(format!("sensitivity {:?}: {}", s, e)))
            })
            .collect::<CoreResult<Vec<f32>>>()?;

        let config = Self {
            resource_path: resource_path.into(),
            models,
            sensitivities,
            audio_gain,
            apply_frontend,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks list lengths and value ranges.
    #[track_caller]
    pub fn validate(&self) -> CoreResult<()> {
        if self.models.is_empty() {
            return Err(CoreError::invalid_config("at least one hotword model is required"));
        }
        if self.sensitivities.len() != self.models.len() {
            return Err(CoreError::invalid_config(format!(
                "{} models but {} sensitivities",
                self.models.len(),
                self.sensitivities.len()
            )));
        }
        if let Some(bad) = self
            .sensitivities
            .iter()
            .find(|s| !(0.0..=1.0).contains(*s))
        {
            return Err(CoreError::invalid_config(format!(
                "sensitivity {} outside [0, 1]",
                bad
            )));
        }
        if !(self.audio_gain.is_finite() && self.audio_gain > 0.0) {
            return Err(CoreError::invalid_config(format!(
                "audio_gain must be positive, got {}",
                self.audio_gain
            )));
        }
        Ok(())
    }

    /// Model paths with relative entries joined onto the resource bundle.
    pub fn resolved_models(&self) -> Vec<PathBuf> {
        self.models.iter().map(|m| self.resolve(m)).collect()
    }

    fn resolve(&self, model: &Path) -> PathBuf {
        if model.is_absolute() || self.resource_path.as_os_str().is_empty() {
            model.to_path_buf()
        } else {
            self.resource_path.join(model)
        }
    }
}

/// Splits a comma-delimited list, trimming entries and skipping empty ones.
pub(crate) fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}
