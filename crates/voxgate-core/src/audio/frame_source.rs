use crate::{CoreResult, DeviceConfig};

/// Producer of fixed-size PCM frames.
///
/// Implementations are driven from the capture thread only.
pub trait FrameSource {
    /// Negotiated device parameters.
    fn config(&self) -> &DeviceConfig;

    /// Byte length of every frame this source produces.
    fn frame_len(&self) -> usize {
        self.config().frame_len()
    }

    /// Blocks until exactly one period is available and writes it to `frame`.
    ///
    /// `frame` must be [`FrameSource::frame_len`] bytes long. An overrun is
    /// reported as [`crate::CoreError::Overrun`] after the source has already
    /// recovered, so the next call reads fresh audio.
    fn read_frame(&mut self, frame: &mut [u8]) -> CoreResult<()>;

    /// Drains and releases the device. Further reads fail.
    fn close(&mut self);
}
