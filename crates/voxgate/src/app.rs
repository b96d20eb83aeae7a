use crate::{
    AppCommand, AppResult,
    config::{BehaviourConfig, SessionSettings},
};

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use voxgate_core::{CaptureHandle, CoreError, CoreResult, ModelIndex, Recorder, Transition};

/// How often the loop checks that the capture thread is still running.
const CAPTURE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Main application state.
///
/// Runs on the async runtime. Hotword triggers arrive from the capture
/// thread as [`AppCommand::StartRecording`]; the utterance limit arrives as a
/// delayed [`AppCommand::StopRecording`] for the same session ID.
pub struct App {
    pub(crate) recorder: Arc<Recorder>,
    pub(crate) capture: Option<CaptureHandle>,
    pub(crate) behaviour: BehaviourConfig,
    pub(crate) session: SessionSettings,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) current_session: Option<Uuid>,
}

impl App {
    /// Run the main application event loop until shutdown or Ctrl-C.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Voxgate listening");
        let mut capture_check = tokio::time::interval(CAPTURE_CHECK_INTERVAL);

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    if !self.handle(cmd).await {
                        break;
                    }
                }

                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => info!("Ctrl-C received"),
                        Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
                    }
                    break;
                }

                _ = capture_check.tick() => {
                    if self.capture.as_ref().is_some_and(|c| !c.is_running()) {
                        error!("Capture thread exited, shutting down");
                        break;
                    }
                }

                else => {
                    info!("Command channel closed, shutting down");
                    break;
                }
            }
        }

        self.shutdown().await;
        info!("Voxgate shut down successfully");

        Ok(())
    }

    /// Applies one command. Returns `false` when the loop should exit.
    pub(crate) async fn handle(&mut self, cmd: AppCommand) -> bool {
        match cmd {
            AppCommand::StartRecording { session_id, model } => {
                self.try_start(session_id, model, 0);
                true
            }
            AppCommand::RetryStart {
                session_id,
                model,
                attempt,
            } => {
                self.try_start(session_id, model, attempt);
                true
            }
            AppCommand::StopRecording { session_id } => {
                self.stop_recording(session_id);
                true
            }
            AppCommand::Shutdown => {
                info!("Shutdown requested");
                false
            }
        }
    }

    fn try_start(&mut self, session_id: Uuid, model: ModelIndex, attempt: u32) {
        if let Err(e) = self.start_recording(session_id, model, attempt) {
            error!(
                session_id = %session_id,
                error = %e,
                recoverable = e.is_recoverable(),
                "Failed to start recording"
            );
        }
    }

    /// Starts a session. A start deferred by the previous session's teardown
    /// is retried through the command channel, so the loop keeps serving
    /// other commands in between.
    #[instrument(skip(self))]
    fn start_recording(
        &mut self,
        session_id: Uuid,
        model: ModelIndex,
        attempt: u32,
    ) -> CoreResult<()> {
        let transition = match self.recorder.start() {
            Ok(transition) => transition,
            Err(CoreError::SessionStartDeferred { .. })
                if attempt < self.session.start_retry_attempts =>
            {
                debug!(attempt, "Start deferred, retrying");
                self.schedule_retry(session_id, model, attempt + 1);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        match transition {
            Transition::Applied => {
                info!(session_id = %session_id, model = %model, "Recording started");
                self.current_session = Some(session_id);
                self.schedule_stop(session_id);
            }
            Transition::Ignored => {
                info!(model = %model, "Already recording, trigger ignored");
            }
        }

        Ok(())
    }

    fn schedule_retry(&self, session_id: Uuid, model: ModelIndex, attempt: u32) {
        let command_tx = self.command_tx.clone();
        let interval = self.session.start_retry_interval();

        tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let retry = AppCommand::RetryStart {
                session_id,
                model,
                attempt,
            };
            if command_tx.send(retry).await.is_err() {
                debug!(session_id = %session_id, "App gone before start retry");
            }
        });
    }

    fn schedule_stop(&self, session_id: Uuid) {
        let command_tx = self.command_tx.clone();
        let limit = self.behaviour.max_utterance();

        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            if command_tx
                .send(AppCommand::StopRecording { session_id })
                .await
                .is_err()
            {
                debug!(session_id = %session_id, "App gone before utterance limit");
            }
        });
    }

    #[instrument(skip(self))]
    fn stop_recording(&mut self, session_id: Uuid) {
        if self.current_session != Some(session_id) {
            debug!(session_id = %session_id, "Stop for a session that is not current, ignored");
            return;
        }
        self.current_session = None;

        let transition = if self.behaviour.suspend_on_timeout {
            self.recorder.suspend()
        } else {
            self.recorder.stop()
        };
        info!(session_id = %session_id, transition = ?transition, "Recording stopped");
    }

    async fn shutdown(&mut self) {
        if let Some(capture) = self.capture.take() {
            match tokio::task::spawn_blocking(move || capture.stop()).await {
                Ok(Ok(stats)) => info!(stats = ?stats, "Capture stopped"),
                Ok(Err(e)) => error!(error = %e, "Capture thread failed"),
                Err(e) => error!(error = %e, "Capture stop task panicked"),
            }
        }

        let recorder = Arc::clone(&self.recorder);
        match tokio::task::spawn_blocking(move || recorder.shutdown()).await {
            Ok(Ok(Some(report))) => info!(report = ?report, "Last session joined"),
            Ok(Ok(None)) => debug!("No session to join"),
            Ok(Err(e)) => error!(error = %e, "Recorder shutdown failed"),
            Err(e) => error!(error = %e, "Recorder shutdown task panicked"),
        }

        if self.recorder.is_upload_active() {
            warn!("Upload still active after shutdown");
        }
    }
}
