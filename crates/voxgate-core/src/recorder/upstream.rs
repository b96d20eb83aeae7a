use crate::CoreResult;

/// External voice channel that utterances are streamed to.
///
/// Called only from the upload session thread, one session at a time.
pub trait VoiceUpstream: Send + Sync {
    /// Opens a new utterance carrying audio at `sample_rate`.
    fn begin_utterance(&self, sample_rate: u32) -> CoreResult<()>;

    /// Appends one frame of little-endian 16-bit samples.
    fn send(&self, frame: &[u8]) -> CoreResult<()>;

    /// Closes the current utterance.
    fn end_utterance(&self) -> CoreResult<()>;

    /// Tears the voice channel down so the next utterance starts fresh.
    fn terminate(&self) -> CoreResult<()>;
}
