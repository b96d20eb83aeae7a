use crate::config::{
    default_bits_per_sample, default_channels, default_period_frames, default_sample_rate,
};

use serde::{Deserialize, Serialize};
use voxgate_core::DeviceConfig;

/// `[device]` section: audio input parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Samples per second.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Channel count.
    #[serde(default = "default_channels")]
    pub channels: u16,
    /// Bits per sample; only 16 is supported.
    #[serde(default = "default_bits_per_sample")]
    pub bits_per_sample: u16,
    /// Samples per channel in one frame.
    #[serde(default = "default_period_frames")]
    pub period_frames: u32,
    /// Input device name (None = default device).
    #[serde(default)]
    pub device_name: Option<String>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            bits_per_sample: default_bits_per_sample(),
            period_frames: default_period_frames(),
            device_name: None,
        }
    }
}

impl DeviceSettings {
    /// Requested device parameters for the capture source.
    pub fn to_device_config(&self) -> DeviceConfig {
        DeviceConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits_per_sample,
            period_frames: self.period_frames,
        }
    }
}
