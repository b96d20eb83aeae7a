use crate::AppCommand;

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use uuid::Uuid;
use voxgate_core::{DialogControl, ModelIndex};

/// [`DialogControl`] that turns hotword triggers into [`AppCommand`]s.
///
/// Runs on the capture thread, so nothing here may block: a full command
/// channel drops the trigger.
pub struct ChannelDialog {
    command_tx: mpsc::Sender<AppCommand>,
    test_mode: bool,
    cancels: AtomicU64,
}

impl ChannelDialog {
    /// In test mode detections are logged and no session is requested.
    pub fn new(command_tx: mpsc::Sender<AppCommand>, test_mode: bool) -> Self {
        Self {
            command_tx,
            test_mode,
            cancels: AtomicU64::new(0),
        }
    }

    /// Dialogs cancelled so far.
    pub fn cancels(&self) -> u64 {
        self.cancels.load(Ordering::Relaxed)
    }
}

impl DialogControl for ChannelDialog {
    fn cancel_dialog(&self) {
        let n = self.cancels.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(cancels = n, "Dialog cancelled");
    }

    fn begin_session(&self, model: ModelIndex) {
        if self.test_mode {
            info!(model = %model, "Hotword detected (test mode, no session)");
            return;
        }

        let session_id = Uuid::new_v4();
        match self
            .command_tx
            .try_send(AppCommand::StartRecording { session_id, model })
        {
            Ok(()) => debug!(session_id = %session_id, model = %model, "Session requested"),
            Err(TrySendError::Full(_)) => {
                warn!(model = %model, "Command channel full, hotword trigger dropped")
            }
            Err(TrySendError::Closed(_)) => {
                warn!(model = %model, "Application loop gone, hotword trigger dropped")
            }
        }
    }
}
