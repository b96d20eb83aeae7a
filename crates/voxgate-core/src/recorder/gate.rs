use std::sync::{Arc, Mutex};

use tracing::{debug, error};

/// Single-permit gate serializing upload sessions.
///
/// The permit is held by the running session and released when it is
/// dropped at the end of that session's teardown, including on panic.
#[derive(Clone, Default)]
pub(crate) struct StartGate {
    held: Arc<Mutex<bool>>,
}

impl StartGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Takes the permit if it is free.
    pub(crate) fn try_acquire(&self) -> Option<GatePermit> {
        let mut held = self.held.lock().unwrap_or_else(|e| {
            error!("Start gate lock poisoned, recovering: {}", e);
            e.into_inner()
        });
        if *held {
            return None;
        }
        *held = true;
        debug!("Start gate acquired");
        Some(GatePermit {
            held: Arc::clone(&self.held),
        })
    }

    pub(crate) fn is_held(&self) -> bool {
        *self.held.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// RAII permit returned by [`StartGate::try_acquire`].
pub(crate) struct GatePermit {
    held: Arc<Mutex<bool>>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        *self.held.lock().unwrap_or_else(|e| e.into_inner()) = false;
        debug!("Start gate released");
    }
}
