use crate::ModelIndex;

/// Dialog/session layer the capture loop signals on a hotword.
///
/// Called on the capture thread: implementations must return promptly and
/// never block on network or session work.
pub trait DialogControl: Send + Sync {
    /// Cancels whatever dialog is in progress.
    fn cancel_dialog(&self);

    /// Requests a new recording session for the matched model.
    fn begin_session(&self, model: ModelIndex);
}
