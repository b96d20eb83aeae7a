use crate::{
    LoopbackReceiver, SessionToken, VoiceUpstream,
    recorder::{gate::GatePermit, state::SharedState},
};

use std::{sync::Arc, time::Duration};

use tracing::{debug, error, info, instrument, warn};

/// Default upstream sample rate announced when an utterance begins.
pub const DEFAULT_UPSTREAM_SAMPLE_RATE: u32 = 16_000;

/// Default wait for one frame before the relay loop re-checks its state.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default loopback capacity in frames.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Upload session parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Rate passed to [`VoiceUpstream::begin_utterance`].
    pub upstream_sample_rate: u32,
    /// Receive poll budget; also bounds how long a stop takes to be noticed.
    pub receive_timeout: Duration,
    /// Frames the loopback channel holds before the capture side drops.
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            upstream_sample_rate: DEFAULT_UPSTREAM_SAMPLE_RATE,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// How an upload session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Stopped normally; the utterance was closed.
    Completed,
    /// Stopped by a suspend; the voice channel was also terminated.
    Suspended,
    /// The upstream failed; the session ended on its own.
    Aborted,
}

/// Summary returned when an upload session's thread is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    /// Session the report belongs to.
    pub token: SessionToken,
    /// Stale frames discarded before the live phase.
    pub flushed: usize,
    /// Frames forwarded upstream.
    pub relayed: usize,
    /// Frames received during the live phase that belonged to an earlier
    /// session.
    pub discarded_stale: usize,
    /// How the session ended.
    pub outcome: SessionOutcome,
}

/// One detected utterance: flush, relay, tear down.
pub(crate) struct UploadSession {
    pub(crate) token: SessionToken,
    pub(crate) shared: Arc<SharedState>,
    pub(crate) receiver: LoopbackReceiver,
    pub(crate) upstream: Arc<dyn VoiceUpstream>,
    pub(crate) config: SessionConfig,
    pub(crate) permit: GatePermit,
}

impl UploadSession {
    #[instrument(skip(self), fields(token = %self.token))]
    pub(crate) fn run(self) -> SessionReport {
        let mut relay = vec![0u8; self.receiver.frame_len()];
        let mut report = SessionReport {
            token: self.token,
            flushed: 0,
            relayed: 0,
            discarded_stale: 0,
            outcome: SessionOutcome::Completed,
        };

        report.flushed = self.receiver.drain();
        info!(flushed = report.flushed, "Stale frames flushed");

        let opened = match self.upstream.begin_utterance(self.config.upstream_sample_rate) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to open upstream voice channel, aborting session");
                report.outcome = SessionOutcome::Aborted;
                false
            }
        };

        if opened && self.shared.activate_upload(self.token) {
            info!(
                sample_rate = self.config.upstream_sample_rate,
                "Relaying live audio"
            );
            self.relay(&mut relay, &mut report);
        }

        self.teardown(opened, report)
    }

    fn relay(&self, relay: &mut [u8], report: &mut SessionReport) {
        while self.shared.is_live(self.token) {
            let Some(delivery) = self
                .receiver
                .try_receive(self.config.receive_timeout, relay)
            else {
                debug!(
                    timeout_ms = self.config.receive_timeout.as_millis(),
                    "No audio within receive timeout"
                );
                continue;
            };

            if delivery.token != self.token {
                report.discarded_stale += 1;
                continue;
            }

            if let Err(e) = self.upstream.send(&relay[..delivery.len]) {
                error!(error = %e, relayed = report.relayed, "Upstream send failed, aborting session");
                report.outcome = SessionOutcome::Aborted;
                return;
            }
            report.relayed += 1;
        }
    }

    fn teardown(self, opened: bool, mut report: SessionReport) -> SessionReport {
        let suspended = self.shared.finish(self.token);

        if opened {
            if let Err(e) = self.upstream.end_utterance() {
                warn!(error = %e, "Failed to end utterance");
            }
        }

        if suspended {
            if let Err(e) = self.upstream.terminate() {
                warn!(error = %e, "Failed to terminate voice channel");
            }
            if report.outcome == SessionOutcome::Completed {
                report.outcome = SessionOutcome::Suspended;
            }
        }

        info!(
            relayed = report.relayed,
            discarded_stale = report.discarded_stale,
            outcome = ?report.outcome,
            "Upload session finished"
        );

        drop(self.permit);
        report
    }
}
