use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Hotword-gated voice capture.
#[derive(Debug, Parser)]
#[command(name = "voxgate", version, about)]
pub struct Cli {
    /// Configuration file (default: platform config directory).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Hotword model; repeat to load several. Replaces the configured list.
    #[arg(short = 'w', long = "model", value_name = "FILE")]
    pub models: Vec<PathBuf>,

    /// Seconds to wait before opening the audio device.
    #[arg(short = 's', long, value_name = "SECS", default_value_t = 0)]
    pub startup_delay: u64,

    /// Log detections without starting recording sessions.
    #[arg(long)]
    pub test_mode: bool,
}
