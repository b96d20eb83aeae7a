use crate::{
    CoreError, CoreResult, DetectorConfig, DetectorFormat, HotwordDetector, ModelIndex,
    audio::pcm,
};

use std::panic::Location;

use error_location::ErrorLocation;
use rustpotter::{Rustpotter, RustpotterConfig, SampleFormat};
use tracing::{debug, info, instrument};

/// Format every model is trained on.
const ENGINE_FORMAT: DetectorFormat = DetectorFormat {
    sample_rate: 16_000,
    channels: 1,
    bits_per_sample: 16,
};

/// [`HotwordDetector`] backed by rustpotter wake-word models.
///
/// Pipeline frames are usually much shorter than an engine frame, so bytes
/// accumulate in `pending` until a whole engine frame is available.
pub struct RustpotterDetector {
    engine: Rustpotter,
    /// Engine key per model, in configuration order.
    keys: Vec<String>,
    /// Minimum score per model, derived from its sensitivity.
    thresholds: Vec<f32>,
    gain: f32,
    frame_len: usize,
    engine_frame_len: usize,
    pending: Vec<u8>,
}

impl RustpotterDetector {
    /// Loads every configured model. `frame_len` is the byte length of the
    /// frames the capture loop will pass to [`HotwordDetector::detect`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ModelNotFound`] for a missing model file and
    /// [`CoreError::Detector`] when the engine rejects a model.
    #[track_caller]
    #[instrument(skip(config))]
    pub fn new(config: &DetectorConfig, frame_len: usize) -> CoreResult<Self> {
        config.validate()?;

        let models = config.resolved_models();
        if let Some(missing) = models.iter().find(|p| !p.exists()) {
            return Err(CoreError::ModelNotFound {
                path: missing.clone(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let thresholds: Vec<f32> = config
            .sensitivities
            .iter()
            .map(|s| sensitivity_to_threshold(*s))
            .collect();
        let engine_threshold = thresholds.iter().copied().fold(1.0_f32, f32::min);

        let mut engine_config = RustpotterConfig::default();
        engine_config.fmt.sample_rate = ENGINE_FORMAT.sample_rate as usize;
        engine_config.fmt.channels = ENGINE_FORMAT.channels.into();
        engine_config.fmt.sample_format = SampleFormat::I16;
        engine_config.detector.threshold = engine_threshold;
        engine_config.filters.gain_normalizer.enabled = config.apply_frontend;
        engine_config.filters.band_pass.enabled = config.apply_frontend;

        let mut engine = Rustpotter::new(&engine_config)
            .map_err(|e| CoreError::detector(format!("Failed to create engine: {}", e)))?;

        let mut keys = Vec::with_capacity(models.len());
        for (position, path) in models.iter().enumerate() {
            let key = format!("model-{}", ModelIndex::from_position(position));
            let path_str = path.to_str().ok_or(CoreError::ModelNotFound {
                path: path.clone(),
                location: ErrorLocation::from(Location::caller()),
            })?;
            engine
                .add_wakeword_from_file(&key, path_str)
                .map_err(|e| CoreError::detector(format!("Failed to load {:?}: {}", path, e)))?;
            debug!(key = %key, model = ?path, "Hotword model loaded");
            keys.push(key);
        }

        let engine_frame_len = engine.get_bytes_per_frame();

        info!(
            models = keys.len(),
            sample_rate = ENGINE_FORMAT.sample_rate,
            channels = ENGINE_FORMAT.channels,
            bits = ENGINE_FORMAT.bits_per_sample,
            engine_frame_len,
            audio_gain = config.audio_gain,
            apply_frontend = config.apply_frontend,
            "Hotword detector initialized"
        );

        Ok(Self {
            engine,
            keys,
            thresholds,
            gain: config.audio_gain,
            frame_len,
            engine_frame_len,
            pending: Vec::with_capacity(engine_frame_len + frame_len),
        })
    }
}

impl HotwordDetector for RustpotterDetector {
    fn format(&self) -> DetectorFormat {
        ENGINE_FORMAT
    }

    #[track_caller]
    fn detect(&mut self, frame: &[u8]) -> CoreResult<Option<ModelIndex>> {
        if frame.len() != self.frame_len {
            return Err(CoreError::FrameSizeMismatch {
                expected: self.frame_len,
                actual: frame.len(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let start = self.pending.len();
        self.pending.extend_from_slice(frame);
        pcm::apply_gain_le(&mut self.pending[start..], self.gain);

        let mut matched = None;
        while self.pending.len() >= self.engine_frame_len {
            if let Some(detection) = self.engine.process_bytes(&self.pending[..self.engine_frame_len])
            {
                let position = self.keys.iter().position(|k| *k == detection.name);
                match position {
                    Some(p) if detection.score >= self.thresholds[p] => {
                        debug!(model = %detection.name, score = detection.score, "Engine detection");
                        matched = Some(ModelIndex::from_position(p));
                    }
                    Some(p) => debug!(
                        model = %detection.name,
                        score = detection.score,
                        threshold = self.thresholds[p],
                        "Detection below model threshold"
                    ),
                    None => debug!(model = %detection.name, "Detection for unknown model"),
                }
            }
            self.pending.drain(..self.engine_frame_len);
        }

        Ok(matched)
    }

    fn reset(&mut self) {
        self.pending.clear();
    }
}

/// Maps a sensitivity in `[0, 1]` to the minimum engine score that counts.
pub(crate) fn sensitivity_to_threshold(sensitivity: f32) -> f32 {
    (1.0 - sensitivity).clamp(0.0, 1.0)
}
