use std::{
    fmt,
    sync::{Mutex, MutexGuard},
};

use tracing::error;

/// Recording session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// No session; initial state and state at shutdown.
    Stopped,
    /// A session is running.
    Started,
}

/// Generation counter identifying one recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionToken(u64);

impl SessionToken {
    /// Raw generation number. The first session is 1.
    pub fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a state-machine request changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The request was applied.
    Applied,
    /// The machine was already in the requested state.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct StateRecord {
    pub(crate) state: RecorderState,
    /// Set once the stale-frame flush is done and live relay has begun.
    pub(crate) upload_active: bool,
    pub(crate) suspend_requested: bool,
    pub(crate) token: SessionToken,
}

/// The single synchronized record behind every state query and transition.
pub(crate) struct SharedState {
    record: Mutex<StateRecord>,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        Self {
            record: Mutex::new(StateRecord {
                state: RecorderState::Stopped,
                upload_active: false,
                suspend_requested: false,
                token: SessionToken::default(),
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, StateRecord> {
        self.record.lock().unwrap_or_else(|e| {
            error!("Recorder state lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    pub(crate) fn snapshot(&self) -> StateRecord {
        *self.lock()
    }

    /// True while `token` is the running session and no stop was requested.
    pub(crate) fn is_live(&self, token: SessionToken) -> bool {
        let record = self.lock();
        record.state == RecorderState::Started && record.token == token
    }

    /// Token of the session currently relaying live audio, if any.
    pub(crate) fn streaming_token(&self) -> Option<SessionToken> {
        let record = self.lock();
        (record.state == RecorderState::Started && record.upload_active).then_some(record.token)
    }

    /// Marks `token` as relaying. Fails if the session was stopped meanwhile.
    pub(crate) fn activate_upload(&self, token: SessionToken) -> bool {
        let mut record = self.lock();
        if record.state == RecorderState::Started && record.token == token {
            record.upload_active = true;
            true
        } else {
            false
        }
    }

    /// Stops the running session, optionally flagging a channel teardown.
    pub(crate) fn request_stop(&self, suspend: bool) -> Transition {
        let mut record = self.lock();
        if record.state != RecorderState::Started {
            return Transition::Ignored;
        }
        record.state = RecorderState::Stopped;
        record.upload_active = false;
        if suspend {
            record.suspend_requested = true;
        }
        Transition::Applied
    }

    /// Session-side teardown. Forces `Stopped` if `token` is still current
    /// (an aborted session) and returns whether a suspend was requested.
    pub(crate) fn finish(&self, token: SessionToken) -> bool {
        let mut record = self.lock();
        if record.token == token {
            record.state = RecorderState::Stopped;
            record.upload_active = false;
        }
        std::mem::take(&mut record.suspend_requested)
    }
}
