use crate::{CoreError, CoreResult, DeviceConfig, FrameSource, audio::pcm};

use std::{
    collections::VecDeque,
    panic::Location,
    sync::{
        Arc, Condvar, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use cpal::{
    BufferSize, Device, SampleFormat, Stream, StreamConfig, SupportedBufferSize,
    SupportedStreamConfigRange,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Seconds of audio the callback may queue ahead of the reader before the
/// oldest samples are dropped and the next read reports an overrun.
pub(crate) const MAX_QUEUED_SECONDS: usize = 2;

/// How long `read_frame` waits for one period before reporting a short read.
pub(crate) const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Samples handed over by the device callback, waiting for `read_frame`.
#[derive(Default)]
pub(crate) struct SampleQueue {
    pub(crate) samples: VecDeque<i16>,
    pub(crate) capacity: usize,
    /// Samples discarded since the last read because the queue was full.
    pub(crate) overrun: usize,
    pub(crate) stream_error: Option<String>,
}

impl SampleQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            overrun: 0,
            stream_error: None,
        }
    }

    pub(crate) fn push(&mut self, sample: i16) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
            self.overrun += 1;
        }
        self.samples.push_back(sample);
    }
}

struct Shared {
    queue: Mutex<SampleQueue>,
    ready: Condvar,
    shutdown: AtomicBool,
}

/// [`FrameSource`] backed by a cpal input stream.
///
/// The cpal callback converts to interleaved signed 16-bit samples and queues
/// them; `read_frame` blocks on a condition variable until one period is
/// queued. Must be created on the thread that reads from it.
pub struct CpalFrameSource {
    config: DeviceConfig,
    stream: Option<Stream>,
    shared: Arc<Shared>,
    read_timeout: Duration,
}

impl CpalFrameSource {
    /// Opens the named input device (or the default one) and negotiates
    /// `requested`. The returned source reports the negotiated period size.
    ///
    /// # Errors
    ///
    /// Fails when no device is found, the device cannot deliver the requested
    /// rate and channel count as 16-bit or float samples, or the stream
    /// cannot be started. These are hard initialization failures.
    #[track_caller]
    #[instrument]
    pub fn open(requested: DeviceConfig, device_name: Option<&str>) -> CoreResult<Self> {
        requested.validate()?;

        let device = find_device(device_name)?;
        let (range, negotiated, device_buffer) = negotiate(&device, &requested)?;

        let stream_config = StreamConfig {
            channels: range.channels(),
            sample_rate: negotiated.sample_rate,
            buffer_size: BufferSize::Fixed(device_buffer),
        };

        let capacity = negotiated.sample_rate as usize
            * usize::from(negotiated.channels)
            * MAX_QUEUED_SECONDS;
        let shared = Arc::new(Shared {
            queue: Mutex::new(SampleQueue::with_capacity(capacity)),
            ready: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });

        let stream = build_stream(
            &device,
            &stream_config,
            range.sample_format(),
            usize::from(negotiated.channels),
            Arc::clone(&shared),
        )?;

        stream.play().map_err(|e| CoreError::DeviceOpen {
            reason: format!("Failed to start stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(
            sample_rate = negotiated.sample_rate,
            channels = negotiated.channels,
            device_channels = range.channels(),
            sample_format = ?range.sample_format(),
            period_frames = negotiated.period_frames,
            device_buffer,
            frame_len = negotiated.frame_len(),
            "Audio input opened"
        );

        Ok(Self {
            config: negotiated,
            stream: Some(stream),
            shared,
            read_timeout: READ_TIMEOUT,
        })
    }
}

impl FrameSource for CpalFrameSource {
    fn config(&self) -> &DeviceConfig {
        &self.config
    }

    #[track_caller]
    fn read_frame(&mut self, frame: &mut [u8]) -> CoreResult<()> {
        let expected_len = self.config.frame_len();
        if frame.len() != expected_len {
            return Err(CoreError::FrameSizeMismatch {
                expected: expected_len,
                actual: frame.len(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if self.stream.is_none() {
            return Err(CoreError::DeviceError {
                reason: "Device is closed".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let needed = self.config.samples_per_frame();
        let deadline = Instant::now() + self.read_timeout;
        let mut queue = self.shared.queue.lock().unwrap_or_else(|e| {
            error!("Sample queue lock poisoned, recovering: {}", e);
            e.into_inner()
        });

        loop {
            if queue.overrun > 0 {
                // Resynchronize: everything queued is stale once the callback
                // has had to drop samples.
                let dropped = queue.overrun + queue.samples.len();
                queue.samples.clear();
                queue.overrun = 0;
                return Err(CoreError::Overrun {
                    dropped_samples: dropped,
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            if let Some(reason) = queue.stream_error.take() {
                return Err(CoreError::DeviceError {
                    reason,
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            if queue.samples.len() >= needed {
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(CoreError::ShortRead {
                    expected: needed,
                    actual: queue.samples.len(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            let (guard, _) = self
                .shared
                .ready
                .wait_timeout(queue, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            queue = guard;
        }

        for (bytes, sample) in frame.chunks_exact_mut(2).zip(queue.samples.drain(..needed)) {
            bytes.copy_from_slice(&sample.to_le_bytes());
        }

        Ok(())
    }

    #[instrument(skip(self))]
    fn close(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            drop(stream);
            let mut queue = self.shared.queue.lock().unwrap_or_else(|e| e.into_inner());
            let drained = queue.samples.len();
            queue.samples.clear();
            info!(drained_samples = drained, "Audio input closed");
        }
    }
}

impl Drop for CpalFrameSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[track_caller]
#[allow(deprecated)]
fn find_device(device_name: Option<&str>) -> CoreResult<Device> {
    let host = cpal::default_host();

    let Some(wanted) = device_name else {
        return host
            .default_input_device()
            .ok_or(CoreError::NoInputDevice {
                location: ErrorLocation::from(Location::caller()),
            });
    };

    let devices = host.input_devices().map_err(|e| CoreError::DeviceOpen {
        reason: format!("Failed to enumerate input devices: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    for device in devices {
        match device.name() {
            Ok(name) if name == wanted => return Ok(device),
            Ok(name) => debug!(device = %name, "Skipping input device"),
            Err(e) => debug!(error = %e, "Skipping unnamed input device"),
        }
    }

    warn!(device = wanted, "Configured input device not found");
    Err(CoreError::NoInputDevice {
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Picks a supported range that can deliver `requested`, preferring an exact
/// channel count and native 16-bit samples.
///
/// The device callback buffer is clamped into the range the device accepts.
/// Reads are served from the sample queue, so the frame period stays at the
/// requested value and frame sizing is known before the device opens.
#[track_caller]
fn negotiate(
    device: &Device,
    requested: &DeviceConfig,
) -> CoreResult<(SupportedStreamConfigRange, DeviceConfig, u32)> {
    let ranges: Vec<SupportedStreamConfigRange> = device
        .supported_input_configs()
        .map_err(|e| CoreError::DeviceOpen {
            reason: format!("Failed to query input configs: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?
        .collect();

    let range = ranges
        .into_iter()
        .filter(|r| {
            r.min_sample_rate() <= requested.sample_rate
                && requested.sample_rate <= r.max_sample_rate()
        })
        .filter(|r| matches!(r.sample_format(), SampleFormat::I16 | SampleFormat::F32))
        .filter(|r| r.channels() >= requested.channels)
        .min_by_key(|r| {
            (
                r.channels() != requested.channels,
                r.sample_format() != SampleFormat::I16,
            )
        })
        .ok_or_else(|| CoreError::UnsupportedFormat {
            reason: format!(
                "no input config offers {} Hz with {} channel(s) as i16 or f32",
                requested.sample_rate, requested.channels
            ),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let device_buffer = match range.buffer_size() {
        SupportedBufferSize::Range { min, max } => requested.period_frames.clamp(*min, *max),
        SupportedBufferSize::Unknown => requested.period_frames,
    };

    if device_buffer != requested.period_frames {
        debug!(
            period_frames = requested.period_frames,
            device_buffer, "Device buffer size adjusted, frames re-chunked from the queue"
        );
    }

    Ok((range, *requested, device_buffer))
}

#[track_caller]
fn build_stream(
    device: &Device,
    config: &StreamConfig,
    format: SampleFormat,
    out_channels: usize,
    shared: Arc<Shared>,
) -> CoreResult<Stream> {
    let device_channels = usize::from(config.channels);
    let err_shared = Arc::clone(&shared);
    let on_error = move |err: cpal::StreamError| {
        error!("Audio stream error: {}", err);
        let mut queue = err_shared.queue.lock().unwrap_or_else(|e| e.into_inner());
        queue.stream_error = Some(err.to_string());
        err_shared.ready.notify_one();
    };

    let result = match format {
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                enqueue(&shared, data, device_channels, out_channels, |s| s);
            },
            on_error,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                enqueue(&shared, data, device_channels, out_channels, pcm::f32_to_i16);
            },
            on_error,
            None,
        ),
        other => {
            return Err(CoreError::UnsupportedFormat {
                reason: format!("sample format {:?}", other),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    result.map_err(|e| CoreError::DeviceOpen {
        reason: format!("Failed to build stream: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })
}

fn enqueue<T: Copy>(
    shared: &Shared,
    data: &[T],
    device_channels: usize,
    out_channels: usize,
    convert: impl Fn(T) -> i16,
) {
    if shared.shutdown.load(Ordering::Acquire) {
        return;
    }
    let mut queue = shared.queue.lock().unwrap_or_else(|e| {
        error!("Sample queue lock poisoned, recovering: {}", e);
        e.into_inner()
    });
    pcm::take_channels(data, device_channels, out_channels, |s| queue.push(convert(s)));
    drop(queue);
    shared.ready.notify_one();
}
