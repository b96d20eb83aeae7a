pub(crate) mod gate;
mod machine;
pub(crate) mod session;
pub(crate) mod state;
mod upstream;

pub(crate) use gate::StartGate;

pub use {
    machine::{Recorder, RecorderTap},
    session::{SessionConfig, SessionOutcome, SessionReport},
    state::{RecorderState, SessionToken, Transition},
    upstream::VoiceUpstream,
};
