mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod detector_settings;
mod device_settings;
mod logging_config;
mod output_config;
mod session_settings;

pub(crate) use {
    behaviour_config::BehaviourConfig, config::Config, detector_settings::DetectorSettings,
    device_settings::DeviceSettings, logging_config::LoggingConfig, output_config::OutputConfig,
    session_settings::SessionSettings,
};

use voxgate_core::{DeviceConfig, SessionConfig};

pub(crate) const DEFAULT_MODELS: &str = "hotword.rpw";
pub(crate) const DEFAULT_SENSITIVITIES: &str = "0.5";
pub(crate) const DEFAULT_AUDIO_GAIN: f32 = 1.1;
pub(crate) const DEFAULT_START_RETRY_MS: u64 = 50;
pub(crate) const DEFAULT_START_RETRY_ATTEMPTS: u32 = 40;
pub(crate) const DEFAULT_MAX_UTTERANCE_SECS: u64 = 8;

pub(crate) fn default_sample_rate() -> u32 {
    DeviceConfig::default().sample_rate
}

pub(crate) fn default_channels() -> u16 {
    DeviceConfig::default().channels
}

pub(crate) fn default_bits_per_sample() -> u16 {
    DeviceConfig::default().bits_per_sample
}

pub(crate) fn default_period_frames() -> u32 {
    DeviceConfig::default().period_frames
}

pub(crate) fn default_resource_path() -> std::path::PathBuf {
    std::path::PathBuf::from("resources")
}

pub(crate) fn default_models() -> String {
    DEFAULT_MODELS.to_string()
}

pub(crate) fn default_sensitivities() -> String {
    DEFAULT_SENSITIVITIES.to_string()
}

pub(crate) fn default_audio_gain() -> f32 {
    DEFAULT_AUDIO_GAIN
}

pub(crate) fn default_upstream_sample_rate() -> u32 {
    SessionConfig::default().upstream_sample_rate
}

pub(crate) fn default_receive_timeout_ms() -> u64 {
    SessionConfig::default().receive_timeout.as_millis() as u64
}

pub(crate) fn default_channel_capacity() -> usize {
    SessionConfig::default().channel_capacity
}

pub(crate) fn default_start_retry_ms() -> u64 {
    DEFAULT_START_RETRY_MS
}

pub(crate) fn default_start_retry_attempts() -> u32 {
    DEFAULT_START_RETRY_ATTEMPTS
}

pub(crate) fn default_max_utterance_secs() -> u64 {
    DEFAULT_MAX_UTTERANCE_SECS
}

pub(crate) fn default_log_to_file() -> bool {
    true
}
