//! Voxgate Core Library
//!
//! Hotword-gated audio capture: a capture thread reads fixed-size PCM frames,
//! runs a wake-word detector on each, and while a recording session is live
//! forwards frames over a bounded in-process channel to an upload session
//! that relays them to a voice upstream.
//!
//! # Example
//!
//! ```no_run
//! use voxgate_core::{
//!     CaptureLoop, CoreResult, CpalFrameSource, DetectorConfig, DeviceConfig, DialogControl,
//!     ModelIndex, Recorder, RustpotterDetector, SessionConfig, VoiceUpstream, loopback,
//! };
//!
//! use std::sync::Arc;
//!
//! struct Discard;
//!
//! impl VoiceUpstream for Discard {
//!     fn begin_utterance(&self, _sample_rate: u32) -> CoreResult<()> { Ok(()) }
//!     fn send(&self, _frame: &[u8]) -> CoreResult<()> { Ok(()) }
//!     fn end_utterance(&self) -> CoreResult<()> { Ok(()) }
//!     fn terminate(&self) -> CoreResult<()> { Ok(()) }
//! }
//!
//! struct StartOnHotword(Arc<Recorder>);
//!
//! impl DialogControl for StartOnHotword {
//!     fn cancel_dialog(&self) {}
//!     fn begin_session(&self, _model: ModelIndex) {
//!         let _ = self.0.start();
//!     }
//! }
//!
//! fn main() -> CoreResult<()> {
//!     let device = DeviceConfig::default();
//!     let session = SessionConfig::default();
//!     let (sender, receiver) = loopback::channel(device.frame_len(), session.channel_capacity);
//!
//!     let recorder = Arc::new(Recorder::new(receiver, Arc::new(Discard), session));
//!     let detector = DetectorConfig::from_delimited("models", "hey.rpw", "0.5", 1.0, false)?;
//!
//!     let capture = CaptureLoop::spawn(
//!         move || CpalFrameSource::open(device, None),
//!         move |negotiated| RustpotterDetector::new(&detector, negotiated.frame_len()),
//!         sender,
//!         recorder.tap(),
//!         Arc::new(StartOnHotword(Arc::clone(&recorder))),
//!     )?;
//!
//!     std::thread::sleep(std::time::Duration::from_secs(30));
//!     capture.stop()?;
//!     recorder.shutdown()?;
//!     Ok(())
//! }
//! ```

mod audio;
mod capture;
mod detector;
mod error;
pub mod loopback;
mod recorder;

pub use {
    audio::{CpalFrameSource, DeviceConfig, FrameSource},
    capture::{CaptureHandle, CaptureLoop, CaptureStats, DialogControl},
    detector::{DetectorConfig, DetectorFormat, HotwordDetector, ModelIndex},
    error::{CoreError, Result as CoreResult},
    loopback::{Delivery, LoopbackReceiver, LoopbackSender},
    recorder::{
        Recorder, RecorderState, RecorderTap, SessionConfig, SessionOutcome, SessionReport,
        SessionToken, Transition, VoiceUpstream,
    },
};

#[cfg(feature = "wake-word")]
pub use detector::RustpotterDetector;

#[cfg(test)]
mod tests;
