use crate::{CoreError, CoreResult, DeviceConfig};

use std::{fmt, num::NonZeroUsize};

/// 1-based position of the model that matched, in configuration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelIndex(NonZeroUsize);

impl ModelIndex {
    /// Index for the model at 0-based `position` in the model list.
    pub fn from_position(position: usize) -> Self {
        Self(NonZeroUsize::MIN.saturating_add(position))
    }

    /// Builds an index from its 1-based value; `None` for zero.
    pub fn new(index: usize) -> Option<Self> {
        NonZeroUsize::new(index).map(Self)
    }

    /// 1-based value.
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for ModelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Audio format a detector consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorFormat {
    /// Samples per second.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
}

impl DetectorFormat {
    /// Fails unless the negotiated device delivers exactly this format.
    #[track_caller]
    pub fn check(&self, device: &DeviceConfig) -> CoreResult<()> {
        if self.sample_rate != device.sample_rate
            || self.channels != device.channels
            || self.bits_per_sample != device.bits_per_sample
        {
            return Err(CoreError::invalid_config(format!(
                "detector expects {} Hz / {} ch / {} bit, device delivers {} Hz / {} ch / {} bit",
                self.sample_rate,
                self.channels,
                self.bits_per_sample,
                device.sample_rate,
                device.channels,
                device.bits_per_sample
            )));
        }
        Ok(())
    }
}

/// Stateful wake-word engine fed one frame at a time.
///
/// Only ever driven from the capture thread; implementations may keep
/// internal buffers between calls.
pub trait HotwordDetector {
    /// Format the detector expects its frames in.
    fn format(&self) -> DetectorFormat;

    /// Runs detection over one frame of little-endian 16-bit samples.
    ///
    /// Returns the matched model, or `None`. Errors are per-frame and never
    /// fatal; the caller treats them as "no detection".
    fn detect(&mut self, frame: &[u8]) -> CoreResult<Option<ModelIndex>>;

    /// Drops any buffered audio.
    fn reset(&mut self) {}
}
