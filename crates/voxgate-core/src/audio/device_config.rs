use crate::{CoreError, CoreResult};

/// Sample rate the upstream voice channel and the hotword engine expect.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Period size requested from the device before negotiation.
pub const DEFAULT_PERIOD_FRAMES: u32 = 16;

/// Audio input parameters.
///
/// A requested value is built from configuration; the [`crate::FrameSource`]
/// returns the negotiated value, which is immutable for the process lifetime
/// and is the only source of truth for buffer sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Bits per sample. Only signed 16-bit little-endian is supported.
    pub bits_per_sample: u16,
    /// Samples per channel in one period.
    pub period_frames: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            bits_per_sample: 16,
            period_frames: DEFAULT_PERIOD_FRAMES,
        }
    }
}

impl DeviceConfig {
    /// Bytes occupied by one sample of one channel.
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }

    /// Interleaved samples in one frame.
    pub fn samples_per_frame(&self) -> usize {
        self.period_frames as usize * usize::from(self.channels)
    }

    /// Byte length of one frame: `period_frames * bytes_per_sample * channels`.
    pub fn frame_len(&self) -> usize {
        self.samples_per_frame() * self.bytes_per_sample()
    }

    /// Copy of this config with a different period size.
    pub fn with_period_frames(self, period_frames: u32) -> Self {
        Self {
            period_frames,
            ..self
        }
    }

    /// Rejects configurations the pipeline cannot run with.
    #[track_caller]
    pub fn validate(&self) -> CoreResult<()> {
        if self.sample_rate == 0 {
            return Err(CoreError::invalid_config("sample_rate must be non-zero"));
        }
        if self.channels == 0 {
            return Err(CoreError::invalid_config("channels must be non-zero"));
        }
        if self.bits_per_sample != 16 {
            return Err(CoreError::invalid_config(format!(
                "bits_per_sample must be 16, got {}",
                self.bits_per_sample
            )));
        }
        if self.period_frames == 0 {
            return Err(CoreError::invalid_config("period_frames must be non-zero"));
        }
        Ok(())
    }
}
