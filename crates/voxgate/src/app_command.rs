use uuid::Uuid;
use voxgate_core::ModelIndex;

/// Commands sent from the capture thread and timers to the application.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// A hotword was detected; start a recording session.
    StartRecording {
        /// Unique ID for this recording.
        session_id: Uuid,
        /// Model that triggered.
        model: ModelIndex,
    },
    /// Retry a start that was deferred while the previous session tore down.
    RetryStart {
        /// Session ID the trigger was given.
        session_id: Uuid,
        /// Model that triggered.
        model: ModelIndex,
        /// Deferred attempts so far.
        attempt: u32,
    },
    /// Stop the recording with this ID, if it is still the current one.
    StopRecording {
        /// Session ID of the recording to stop.
        session_id: Uuid,
    },
    /// Request application shutdown.
    Shutdown,
}
