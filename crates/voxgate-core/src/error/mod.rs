use std::{panic::Location, path::PathBuf};

use error_location::ErrorLocation;
use thiserror::Error;

/// Capture pipeline errors with source location tracking.
#[derive(Error, Debug)]
pub enum CoreError {
    /// No audio input device found.
    #[error("No microphone found {location}")]
    NoInputDevice {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The audio device could not be opened or started.
    #[error("Failed to open audio device: {reason} {location}")]
    DeviceOpen {
        /// Description of the open failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio device failed while capturing.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The device cannot deliver the requested sample format.
    #[error("Unsupported audio format: {reason} {location}")]
    UnsupportedFormat {
        /// Description of the mismatch.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Capture queue overflowed; the queued audio was discarded.
    #[error("Capture overrun, {dropped_samples} samples dropped {location}")]
    Overrun {
        /// Samples discarded while recovering.
        dropped_samples: usize,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Fewer samples than one period arrived before the read deadline.
    #[error("Short read: expected {expected} samples, got {actual} {location}")]
    ShortRead {
        /// Samples in one period.
        expected: usize,
        /// Samples available when the read gave up.
        actual: usize,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Hotword model or resource file not found.
    #[error("Model not found at path: {path:?} {location}")]
    ModelNotFound {
        /// Path to the missing file.
        path: PathBuf,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Hotword engine failure.
    #[error("Detector error: {reason} {location}")]
    Detector {
        /// Description of the engine failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A frame did not have the negotiated byte length.
    #[error("Frame size mismatch: expected {expected} bytes, got {actual} {location}")]
    FrameSizeMismatch {
        /// Negotiated frame length in bytes.
        expected: usize,
        /// Length of the offending frame.
        actual: usize,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {reason} {location}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The previous upload session still holds the start gate.
    #[error("Session start deferred: previous session still tearing down {location}")]
    SessionStartDeferred {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The external voice interface rejected an operation.
    #[error("Upstream error: {reason} {location}")]
    Upstream {
        /// Description of the upstream failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A worker thread could not be spawned.
    #[error("Failed to spawn {thread} thread: {source} {location}")]
    ThreadSpawn {
        /// Name of the thread.
        thread: &'static str,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A worker thread panicked before returning its result.
    #[error("The {thread} thread panicked {location}")]
    ThreadPanicked {
        /// Name of the thread.
        thread: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl CoreError {
    /// Build an [`CoreError::Upstream`] at the caller's location.
    #[track_caller]
    pub fn upstream(reason: impl Into<String>) -> Self {
        CoreError::Upstream {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Build an [`CoreError::Detector`] at the caller's location.
    #[track_caller]
    pub fn detector(reason: impl Into<String>) -> Self {
        CoreError::Detector {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Build an [`CoreError::InvalidConfig`] at the caller's location.
    #[track_caller]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        CoreError::InvalidConfig {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether the pipeline keeps running after this error.
    ///
    /// Opening the device, finding models, configuration and thread
    /// plumbing failures are hard errors. Everything that can happen to a
    /// single frame or session is recovered from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::DeviceError { .. }
                | CoreError::Overrun { .. }
                | CoreError::ShortRead { .. }
                | CoreError::Detector { .. }
                | CoreError::FrameSizeMismatch { .. }
                | CoreError::SessionStartDeferred { .. }
                | CoreError::Upstream { .. }
        )
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
