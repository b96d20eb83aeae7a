//! Local voice upstream that writes each utterance to a WAV file.

use crate::{AppError, AppResult};

use std::{
    fs::{self, File},
    io::BufWriter,
    panic::Location,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::Local;
use error_location::ErrorLocation;
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, error, info, instrument, warn};
use voxgate_core::{CoreError, CoreResult, VoiceUpstream};

struct OpenUtterance {
    writer: WavWriter<BufWriter<File>>,
    path: PathBuf,
}

#[derive(Default)]
struct WavState {
    current: Option<OpenUtterance>,
    /// Utterances begun since the last terminate.
    counter: u32,
}

/// [`VoiceUpstream`] writing `utterance-<timestamp>-<n>.wav` files, mono
/// 16-bit at the rate announced by `begin_utterance`.
pub struct WavUpstream {
    dir: PathBuf,
    state: Mutex<WavState>,
}

impl WavUpstream {
    /// Creates the output directory if needed.
    #[track_caller]
    #[instrument]
    pub fn new(dir: PathBuf) -> AppResult<Self> {
        fs::create_dir_all(&dir).map_err(|e| AppError::Utterance {
            reason: format!("Failed to create utterance directory {:?}: {}", dir, e),
            location: ErrorLocation::from(Location::caller()),
        })?;
        info!(dir = ?dir, "Writing utterances to disk");
        Ok(Self {
            dir,
            state: Mutex::new(WavState::default()),
        })
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn state(&self) -> MutexGuard<'_, WavState> {
        self.state.lock().unwrap_or_else(|e| {
            error!("WAV state lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    #[track_caller]
    fn finalize(utterance: OpenUtterance) -> CoreResult<()> {
        let samples = utterance.writer.len();
        utterance
            .writer
            .finalize()
            .map_err(|e| CoreError::upstream(format!("Failed to finalize WAV: {}", e)))?;
        info!(path = ?utterance.path, samples, "Utterance written");
        Ok(())
    }
}

impl VoiceUpstream for WavUpstream {
    #[track_caller]
    fn begin_utterance(&self, sample_rate: u32) -> CoreResult<()> {
        let mut state = self.state();

        if let Some(previous) = state.current.take() {
            warn!(path = ?previous.path, "Previous utterance still open, closing it");
            Self::finalize(previous)?;
        }

        state.counter += 1;
        let name = format!(
            "utterance-{}-{}.wav",
            Local::now().format("%Y%m%d-%H%M%S-%3f"),
            state.counter
        );
        let path = self.dir.join(name);

        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(&path, spec).map_err(|e| {
            CoreError::upstream(format!("Failed to create {:?}: {}", path, e))
        })?;

        debug!(path = ?path, sample_rate, "Utterance opened");
        state.current = Some(OpenUtterance { writer, path });
        Ok(())
    }

    #[track_caller]
    fn send(&self, frame: &[u8]) -> CoreResult<()> {
        let mut state = self.state();
        let Some(utterance) = state.current.as_mut() else {
            return Err(CoreError::upstream("No utterance open"));
        };

        for bytes in frame.chunks_exact(2) {
            utterance
                .writer
                .write_sample(i16::from_le_bytes([bytes[0], bytes[1]]))
                .map_err(|e| CoreError::upstream(format!("Failed to write sample: {}", e)))?;
        }
        Ok(())
    }

    #[track_caller]
    fn end_utterance(&self) -> CoreResult<()> {
        match self.state().current.take() {
            Some(utterance) => Self::finalize(utterance),
            None => {
                debug!("End of utterance with none open");
                Ok(())
            }
        }
    }

    #[track_caller]
    fn terminate(&self) -> CoreResult<()> {
        let mut state = self.state();
        let open = state.current.take();
        state.counter = 0;
        drop(state);

        info!("Voice channel terminated");
        match open {
            Some(utterance) => Self::finalize(utterance),
            None => Ok(()),
        }
    }
}
