use crate::{
    CoreError, CoreResult, LoopbackReceiver, RecorderState, SessionConfig, SessionReport,
    SessionToken, Transition, VoiceUpstream,
    recorder::{StartGate, session::UploadSession, state::SharedState},
};

use std::{
    panic::Location,
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
};

use error_location::ErrorLocation;
use tracing::{error, info, instrument, warn};

/// Session state machine: Stopped ⇄ Started.
///
/// Every transition goes through one mutex-guarded record, and a
/// single-permit gate guarantees at most one upload session exists. Each
/// `start()` spawns an upload session thread whose handle is kept so the
/// session can be joined.
///
/// # Thread Safety
///
/// All methods take `&self` and may be called from any thread; share the
/// recorder behind an `Arc`.
pub struct Recorder {
    shared: Arc<SharedState>,
    gate: StartGate,
    receiver: LoopbackReceiver,
    upstream: Arc<dyn VoiceUpstream>,
    config: SessionConfig,
    session: Mutex<Option<JoinHandle<SessionReport>>>,
}

impl Recorder {
    /// Creates a stopped recorder reading from `receiver`.
    pub fn new(
        receiver: LoopbackReceiver,
        upstream: Arc<dyn VoiceUpstream>,
        config: SessionConfig,
    ) -> Self {
        Self {
            shared: Arc::new(SharedState::new()),
            gate: StartGate::new(),
            receiver,
            upstream,
            config,
            session: Mutex::new(None),
        }
    }

    /// Starts a session if none is running.
    ///
    /// Returns [`Transition::Ignored`] when already started.
    ///
    /// # Errors
    ///
    /// [`CoreError::SessionStartDeferred`] while the previous session is
    /// still tearing down; the caller should retry shortly.
    /// [`CoreError::ThreadSpawn`] if the session thread cannot be created;
    /// the recorder stays stopped.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start(&self) -> CoreResult<Transition> {
        let (token, permit) = {
            let mut record = self.shared.lock();
            if record.state == RecorderState::Started {
                info!(token = %record.token, "Recorder already started");
                return Ok(Transition::Ignored);
            }

            let Some(permit) = self.gate.try_acquire() else {
                info!("Previous session still tearing down, start deferred");
                return Err(CoreError::SessionStartDeferred {
                    location: ErrorLocation::from(Location::caller()),
                });
            };

            record.token = record.token.next();
            record.state = RecorderState::Started;
            record.upload_active = false;
            (record.token, permit)
        };

        self.reap_previous();

        let session = UploadSession {
            token,
            shared: Arc::clone(&self.shared),
            receiver: self.receiver.clone(),
            upstream: Arc::clone(&self.upstream),
            config: self.config,
            permit,
        };

        let spawned = thread::Builder::new()
            .name("upload-session".to_string())
            .spawn(move || session.run());

        match spawned {
            Ok(handle) => {
                *self.session_slot() = Some(handle);
                info!(token = %token, "Recorder started");
                Ok(Transition::Applied)
            }
            Err(source) => {
                // The closure, and with it the permit, was dropped.
                self.shared.finish(token);
                error!(error = %source, "Failed to spawn upload session");
                Err(CoreError::ThreadSpawn {
                    thread: "upload-session",
                    source,
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Stops the running session. The session notices within one receive
    /// timeout, closes the utterance and releases the gate on its own.
    #[instrument(skip(self))]
    pub fn stop(&self) -> Transition {
        let transition = self.shared.request_stop(false);
        match transition {
            Transition::Applied => info!("Recorder stopped"),
            Transition::Ignored => info!("Recorder stop ignored, not started"),
        }
        transition
    }

    /// Like [`Recorder::stop`], but the session also terminates the voice
    /// channel so the next start begins from a fresh one.
    #[instrument(skip(self))]
    pub fn suspend(&self) -> Transition {
        let transition = self.shared.request_stop(true);
        match transition {
            Transition::Applied => info!("Recorder suspended"),
            Transition::Ignored => info!("Recorder suspend ignored, not started"),
        }
        transition
    }

    /// Current state. No side effects.
    pub fn state(&self) -> RecorderState {
        self.shared.snapshot().state
    }

    /// Whether the running session has flushed and is relaying live audio.
    pub fn is_upload_active(&self) -> bool {
        self.shared.snapshot().upload_active
    }

    /// Token of the most recently started session.
    pub fn current_token(&self) -> SessionToken {
        self.shared.snapshot().token
    }

    /// Read-only view for the capture loop.
    pub fn tap(&self) -> RecorderTap {
        RecorderTap {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Waits for the most recent session thread to finish and returns its
    /// report. `Ok(None)` if no session was started since the last join.
    ///
    /// Blocks for up to one receive timeout after a stop.
    #[track_caller]
    pub fn join_session(&self) -> CoreResult<Option<SessionReport>> {
        let Some(handle) = self.session_slot().take() else {
            return Ok(None);
        };
        handle.join().map(Some).map_err(|_| CoreError::ThreadPanicked {
            thread: "upload-session",
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Stops any running session and joins it.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn shutdown(&self) -> CoreResult<Option<SessionReport>> {
        self.stop();
        let report = self.join_session()?;
        if self.gate.is_held() {
            warn!("Start gate still held after shutdown");
        }
        info!(report = ?report, "Recorder shut down");
        Ok(report)
    }

    /// Joins the previous session. Called only after the gate was acquired,
    /// so that session has already released its permit and is returning.
    fn reap_previous(&self) {
        let previous = self.session_slot().take();
        if let Some(handle) = previous {
            match handle.join() {
                Ok(report) => info!(report = ?report, "Previous session reaped"),
                Err(_) => error!("Previous upload session panicked"),
            }
        }
    }

    fn session_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<SessionReport>>> {
        self.session.lock().unwrap_or_else(|e| {
            error!("Session handle lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if self.state() == RecorderState::Started || self.session_slot().is_some() {
            if let Err(e) = self.shutdown() {
                error!(error = %e, "Recorder shutdown on drop failed");
            }
        }
    }
}

/// Read-only handle the capture loop uses to decide whether to forward
/// frames, and for which session.
#[derive(Clone)]
pub struct RecorderTap {
    shared: Arc<SharedState>,
}

impl RecorderTap {
    /// Token of the session relaying live audio, or `None` when frames
    /// should not be forwarded.
    pub fn streaming_token(&self) -> Option<SessionToken> {
        self.shared.streaming_token()
    }
}
