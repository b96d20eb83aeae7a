//! Voxgate: hotword-gated voice capture that streams each utterance to a
//! voice upstream (here, WAV files on disk).

mod app;
mod app_command;
mod cli;
mod config;
mod dialog;
mod error;
mod logging;
mod wav_upstream;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    cli::Cli,
    dialog::ChannelDialog,
    error::{AppError, Result as AppResult},
    wav_upstream::WavUpstream,
};

use crate::config::Config;

use std::{process::ExitCode, sync::Arc, thread, time::Duration};

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};
use voxgate_core::{
    CaptureLoop, CpalFrameSource, DialogControl, HotwordDetector, Recorder, RustpotterDetector,
    VoiceUpstream, loopback,
};

/// Capacity of the command channel the capture thread posts triggers into.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Application entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !cli.models.is_empty() {
        config.detector.override_models(&cli.models);
    }

    let log_dir = match config.log_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to resolve log directory: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Held until exit so buffered file logs are flushed.
    let _log_guard = match logging::init(cli.verbose, &config.logging, &log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialise logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Voxgate failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: Config) -> AppResult<()> {
    config.validate()?;

    if cli.startup_delay > 0 {
        info!(secs = cli.startup_delay, "Waiting before opening the audio device");
        thread::sleep(Duration::from_secs(cli.startup_delay));
    }

    let device = config.device.to_device_config();
    let device_name = config.device.device_name.clone();
    let detector = config.detector.to_detector_config()?;
    let session = config.session.to_session_config();

    let wav = Arc::new(WavUpstream::new(config.utterance_dir()?)?);
    let upstream: Arc<dyn VoiceUpstream> = wav.clone();
    let (sender, receiver) = loopback::channel(device.frame_len(), session.channel_capacity);
    let recorder = Arc::new(Recorder::new(receiver, upstream, session));

    let runtime = tokio::runtime::Runtime::new()?;
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let dialog = Arc::new(ChannelDialog::new(command_tx.clone(), cli.test_mode));
    let dialog_control: Arc<dyn DialogControl> = dialog.clone();

    let capture = CaptureLoop::spawn(
        move || CpalFrameSource::open(device, device_name.as_deref()),
        move |negotiated| {
            let detector = RustpotterDetector::new(&detector, negotiated.frame_len())?;
            let format = detector.format();
            info!(
                sample_rate = format.sample_rate,
                channels = format.channels,
                bits_per_sample = format.bits_per_sample,
                "Detector audio format"
            );
            Ok(detector)
        },
        sender,
        recorder.tap(),
        dialog_control,
    )?;

    info!(
        device = ?capture.device_config(),
        test_mode = cli.test_mode,
        "Capture running"
    );

    let app = App {
        recorder,
        capture: Some(capture),
        behaviour: config.behaviour,
        session: config.session,
        command_tx,
        command_rx,
        current_session: None,
    };

    runtime.block_on(app.run())?;

    info!(
        dialogs_cancelled = dialog.cancels(),
        utterance_dir = ?wav.dir(),
        "Voxgate finished"
    );
    Ok(())
}
