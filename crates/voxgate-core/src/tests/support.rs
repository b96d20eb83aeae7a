//! Test doubles for the capture pipeline and recorder.

use crate::{
    CoreError, CoreResult, DetectorFormat, DeviceConfig, DialogControl, FrameSource,
    HotwordDetector, LoopbackSender, ModelIndex, Recorder, SessionConfig, VoiceUpstream,
    loopback,
};

use std::{
    collections::VecDeque,
    panic::Location,
    sync::{
        Arc, Mutex, OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use error_location::ErrorLocation;

pub(crate) const TEST_RECEIVE_TIMEOUT: Duration = Duration::from_millis(20);
pub(crate) const WAIT_BUDGET: Duration = Duration::from_secs(5);

/// Polls `condition` until it holds or `timeout` elapses.
pub(crate) fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

pub(crate) fn fast_session_config(channel_capacity: usize) -> SessionConfig {
    SessionConfig {
        receive_timeout: TEST_RECEIVE_TIMEOUT,
        channel_capacity,
        ..SessionConfig::default()
    }
}

/// Recorder over a fresh loopback channel sized for the default device.
pub(crate) fn recorder_with(
    upstream: &Arc<RecordingUpstream>,
    channel_capacity: usize,
) -> (Arc<Recorder>, LoopbackSender) {
    let (sender, receiver) =
        loopback::channel(DeviceConfig::default().frame_len(), channel_capacity);
    let upstream: Arc<dyn VoiceUpstream> = upstream.clone();
    let recorder = Recorder::new(receiver, upstream, fast_session_config(channel_capacity));
    (Arc::new(recorder), sender)
}

/// One scripted outcome of [`ScriptedSource::read_frame`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    /// A frame with every byte set to the value.
    Frame(u8),
    Overrun,
    ShortRead,
    /// The device disappeared.
    Lost,
}

/// Frame source replaying a script, then producing silence.
pub(crate) struct ScriptedSource {
    config: DeviceConfig,
    script: VecDeque<Step>,
    pace: Duration,
    pub(crate) reads: Arc<AtomicUsize>,
    pub(crate) closed: Arc<AtomicBool>,
}

impl ScriptedSource {
    pub(crate) fn silent() -> Self {
        Self::new(DeviceConfig::default(), Vec::new())
    }

    pub(crate) fn new(config: DeviceConfig, script: Vec<Step>) -> Self {
        Self {
            config,
            script: script.into(),
            pace: Duration::ZERO,
            reads: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Sleeps this long per read, standing in for the device period.
    pub(crate) fn paced(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }
}

impl FrameSource for ScriptedSource {
    fn config(&self) -> &DeviceConfig {
        &self.config
    }

    #[track_caller]
    fn read_frame(&mut self, frame: &mut [u8]) -> CoreResult<()> {
        if !self.pace.is_zero() {
            thread::sleep(self.pace);
        }
        self.reads.fetch_add(1, Ordering::SeqCst);

        match self.script.pop_front().unwrap_or(Step::Frame(0)) {
            Step::Frame(fill) => {
                frame.fill(fill);
                Ok(())
            }
            Step::Overrun => Err(CoreError::Overrun {
                dropped_samples: 64,
                location: ErrorLocation::from(Location::caller()),
            }),
            Step::ShortRead => Err(CoreError::ShortRead {
                expected: self.config.samples_per_frame(),
                actual: 0,
                location: ErrorLocation::from(Location::caller()),
            }),
            Step::Lost => Err(CoreError::NoInputDevice {
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Detector that fires on chosen frame indexes (0-based, counting every
/// frame it is handed).
pub(crate) struct ScriptedDetector {
    format: DetectorFormat,
    triggers: Vec<(usize, ModelIndex)>,
    failures: Vec<usize>,
    pub(crate) frames_seen: Arc<AtomicUsize>,
    pub(crate) resets: Arc<AtomicUsize>,
}

impl ScriptedDetector {
    pub(crate) fn new(triggers: Vec<(usize, ModelIndex)>) -> Self {
        Self {
            format: DetectorFormat {
                sample_rate: 16_000,
                channels: 1,
                bits_per_sample: 16,
            },
            triggers,
            failures: Vec::new(),
            frames_seen: Arc::new(AtomicUsize::new(0)),
            resets: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn quiet() -> Self {
        Self::new(Vec::new())
    }

    pub(crate) fn failing_at(mut self, failures: Vec<usize>) -> Self {
        self.failures = failures;
        self
    }
}

impl HotwordDetector for ScriptedDetector {
    fn format(&self) -> DetectorFormat {
        self.format
    }

    fn detect(&mut self, _frame: &[u8]) -> CoreResult<Option<ModelIndex>> {
        let index = self.frames_seen.fetch_add(1, Ordering::SeqCst);
        if self.failures.contains(&index) {
            return Err(CoreError::detector("scripted failure"));
        }
        Ok(self
            .triggers
            .iter()
            .find(|(at, _)| *at == index)
            .map(|(_, model)| *model))
    }

    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// What the upload session asked the upstream to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpstreamEvent {
    Begin(u32),
    Send(usize),
    End,
    Terminate,
}

#[derive(Default)]
pub(crate) struct RecordingUpstream {
    pub(crate) events: Mutex<Vec<UpstreamEvent>>,
    /// Bytes of every frame handed to `send`, in call order.
    pub(crate) frames: Mutex<Vec<Vec<u8>>>,
    pub(crate) fail_begin: AtomicBool,
    pub(crate) fail_send: AtomicBool,
    pub(crate) send_delay: Mutex<Duration>,
    pub(crate) end_delay: Mutex<Duration>,
}

impl RecordingUpstream {
    pub(crate) fn events(&self) -> Vec<UpstreamEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn frames(&self) -> Vec<Vec<u8>> {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn sends(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, UpstreamEvent::Send(_)))
            .count()
    }

    fn record(&self, event: UpstreamEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }

    fn delay(slot: &Mutex<Duration>) {
        let delay = *slot.lock().unwrap_or_else(|e| e.into_inner());
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

impl VoiceUpstream for RecordingUpstream {
    fn begin_utterance(&self, sample_rate: u32) -> CoreResult<()> {
        if self.fail_begin.load(Ordering::SeqCst) {
            return Err(CoreError::upstream("voice channel refused"));
        }
        self.record(UpstreamEvent::Begin(sample_rate));
        Ok(())
    }

    fn send(&self, frame: &[u8]) -> CoreResult<()> {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(frame.to_vec());
        Self::delay(&self.send_delay);
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(CoreError::upstream("voice channel closed"));
        }
        self.record(UpstreamEvent::Send(frame.len()));
        Ok(())
    }

    fn end_utterance(&self) -> CoreResult<()> {
        Self::delay(&self.end_delay);
        self.record(UpstreamEvent::End);
        Ok(())
    }

    fn terminate(&self) -> CoreResult<()> {
        self.record(UpstreamEvent::Terminate);
        Ok(())
    }
}

/// Dialog layer that records calls and, once wired, starts the recorder.
#[derive(Default)]
pub(crate) struct RecordingDialog {
    pub(crate) cancels: AtomicUsize,
    pub(crate) sessions: Mutex<Vec<ModelIndex>>,
    pub(crate) recorder: OnceLock<Arc<Recorder>>,
}

impl RecordingDialog {
    pub(crate) fn starting(recorder: &Arc<Recorder>) -> Self {
        let dialog = Self::default();
        let _ = dialog.recorder.set(Arc::clone(recorder));
        dialog
    }

    pub(crate) fn sessions(&self) -> Vec<ModelIndex> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl DialogControl for RecordingDialog {
    fn cancel_dialog(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn begin_session(&self, model: ModelIndex) {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(model);
        if let Some(recorder) = self.recorder.get() {
            let _ = recorder.start();
        }
    }
}
