use crate::{
    CaptureStats, CoreError, CoreResult, DeviceConfig, DialogControl, FrameSource,
    HotwordDetector, LoopbackSender, RecorderTap,
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, trace, warn};

/// Pause after a failed read so a dead device cannot spin the thread.
pub(crate) const READ_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// The long-lived capture driver: read a frame, run the detector on it,
/// signal the dialog layer on a trigger, and forward the frame to the
/// upload session while one is relaying.
///
/// Nothing in a step blocks except the frame read itself.
pub struct CaptureLoop<S, D> {
    source: S,
    detector: D,
    sender: LoopbackSender,
    tap: RecorderTap,
    dialog: Arc<dyn DialogControl>,
    shutdown: Arc<AtomicBool>,
    stats: CaptureStats,
    /// Cleared by a detection, set again by the next non-detecting frame.
    armed: bool,
}

impl<S: FrameSource, D: HotwordDetector> CaptureLoop<S, D> {
    /// Wires the pipeline together.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidConfig`] when the detector cannot consume the
    /// source's format, [`CoreError::FrameSizeMismatch`] when the loopback
    /// channel was built for a different frame length.
    #[track_caller]
    pub fn new(
        source: S,
        detector: D,
        sender: LoopbackSender,
        tap: RecorderTap,
        dialog: Arc<dyn DialogControl>,
    ) -> CoreResult<Self> {
        detector.format().check(source.config())?;

        if sender.frame_len() != source.frame_len() {
            return Err(CoreError::FrameSizeMismatch {
                expected: source.frame_len(),
                actual: sender.frame_len(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Self {
            source,
            detector,
            sender,
            tap,
            dialog,
            shutdown: Arc::new(AtomicBool::new(false)),
            stats: CaptureStats::default(),
            armed: true,
        })
    }

    /// Runs the pipeline on a dedicated thread.
    ///
    /// The source and detector are constructed on that thread, since audio
    /// device handles are often not `Send`. `open_detector` receives the
    /// negotiated device config. Returns once both are open.
    ///
    /// # Errors
    ///
    /// Whatever `open_source`, `open_detector` or [`CaptureLoop::new`]
    /// returned; these are hard initialization failures.
    #[track_caller]
    #[instrument(skip_all)]
    pub fn spawn<FS, FD>(
        open_source: FS,
        open_detector: FD,
        sender: LoopbackSender,
        tap: RecorderTap,
        dialog: Arc<dyn DialogControl>,
    ) -> CoreResult<CaptureHandle>
    where
        S: 'static,
        D: 'static,
        FS: FnOnce() -> CoreResult<S> + Send + 'static,
        FD: FnOnce(&DeviceConfig) -> CoreResult<D> + Send + 'static,
    {
        let (init_tx, init_rx) =
            crossbeam_channel::bounded::<CoreResult<(DeviceConfig, Arc<AtomicBool>)>>(1);

        let thread = thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || {
                let mut source = match open_source() {
                    Ok(source) => source,
                    Err(e) => {
                        let _ = init_tx.send(Err(e));
                        return CaptureStats::default();
                    }
                };

                let detector = match open_detector(source.config()) {
                    Ok(detector) => detector,
                    Err(e) => {
                        source.close();
                        let _ = init_tx.send(Err(e));
                        return CaptureStats::default();
                    }
                };

                let pipeline = match CaptureLoop::new(source, detector, sender, tap, dialog) {
                    Ok(pipeline) => pipeline,
                    Err(e) => {
                        let _ = init_tx.send(Err(e));
                        return CaptureStats::default();
                    }
                };

                let config = *pipeline.source.config();
                if init_tx.send(Ok((config, pipeline.shutdown_flag()))).is_err() {
                    return CaptureStats::default();
                }
                pipeline.run()
            })
            .map_err(|source| CoreError::ThreadSpawn {
                thread: "capture",
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        match init_rx.recv() {
            Ok(Ok((config, shutdown))) => Ok(CaptureHandle {
                config,
                shutdown,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(CoreError::ThreadPanicked {
                    thread: "capture",
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Flag that ends [`CaptureLoop::run`] after the current frame.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Counters so far.
    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Loops until the shutdown flag is set, then closes the source.
    #[instrument(skip(self))]
    pub fn run(mut self) -> CaptureStats {
        let mut frame = vec![0u8; self.source.frame_len()];
        info!(frame_len = frame.len(), "Capture loop running");

        while !self.shutdown.load(Ordering::Acquire) {
            self.step(&mut frame);
        }

        self.source.close();
        info!(stats = ?self.stats, "Capture loop stopped");
        self.stats
    }

    /// One iteration: read, detect, forward. A read error that cannot be
    /// recovered from sets the shutdown flag.
    pub(crate) fn step(&mut self, frame: &mut [u8]) {
        match self.source.read_frame(frame) {
            Ok(()) => self.stats.frames_read += 1,
            Err(CoreError::Overrun {
                dropped_samples, ..
            }) => {
                self.stats.overruns += 1;
                warn!(dropped_samples, "An overrun occurred, queued audio discarded");
                return;
            }
            Err(e) if !e.is_recoverable() => {
                self.stats.read_errors += 1;
                error!(error = %e, "Audio input lost, stopping capture");
                self.shutdown.store(true, Ordering::Release);
                return;
            }
            Err(e) => {
                self.stats.read_errors += 1;
                warn!(error = %e, "Frame read failed, frame discarded");
                thread::sleep(READ_ERROR_BACKOFF);
                return;
            }
        }

        self.detect(frame);
        self.forward(frame);
    }

    fn detect(&mut self, frame: &[u8]) {
        match self.detector.detect(frame) {
            Ok(Some(model)) => {
                if !self.armed {
                    return;
                }
                self.armed = false;
                self.stats.detections += 1;
                info!(model = %model, "Hotword detected");
                // Audio buffered up to the trigger must not fire again.
                self.detector.reset();
                self.dialog.cancel_dialog();
                self.dialog.begin_session(model);
            }
            Ok(None) => self.armed = true,
            Err(e) => {
                self.stats.detector_errors += 1;
                self.armed = true;
                debug!(error = %e, "Detector failed on frame, treating as no detection");
            }
        }
    }

    fn forward(&mut self, frame: &[u8]) {
        let Some(token) = self.tap.streaming_token() else {
            return;
        };

        if self.sender.try_send(token, frame) {
            self.stats.frames_forwarded += 1;
        } else {
            self.stats.frames_dropped += 1;
            trace!(token = %token, "Loopback channel full, frame dropped");
        }
    }
}

/// Owner of the running capture thread.
pub struct CaptureHandle {
    config: DeviceConfig,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<CaptureStats>>,
}

impl CaptureHandle {
    /// Negotiated device parameters.
    pub fn device_config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Whether the capture thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the loop and joins the thread. Takes up to one frame read.
    #[track_caller]
    pub fn stop(mut self) -> CoreResult<CaptureStats> {
        self.shutdown.store(true, Ordering::Release);
        let Some(thread) = self.thread.take() else {
            return Ok(CaptureStats::default());
        };
        thread.join().map_err(|_| CoreError::ThreadPanicked {
            thread: "capture",
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Capture thread panicked");
            }
        }
    }
}
