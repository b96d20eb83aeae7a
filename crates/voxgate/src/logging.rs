//! Tracing subscriber setup: stderr plus an optional rolling JSON file.

use crate::{AppError, AppResult, config::LoggingConfig};

use std::{panic::Location, path::Path};

use error_location::ErrorLocation;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set.
pub(crate) fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "voxgate=info,voxgate_core=info",
        1 => "voxgate=debug,voxgate_core=debug",
        _ => "voxgate=trace,voxgate_core=trace",
    }
}

/// Installs the global subscriber. The returned guard flushes the file
/// writer on drop and must live until exit.
#[track_caller]
pub(crate) fn init(
    verbosity: u8,
    config: &LoggingConfig,
    log_dir: &Path,
) -> AppResult<Option<WorkerGuard>> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(_) => EnvFilter::try_from_default_env().map_err(|e| e.to_string()),
        Err(_) => EnvFilter::try_new(default_filter(verbosity)).map_err(|e| e.to_string()),
    }
    .map_err(|e| AppError::Logging {
        reason: format!("Invalid log filter: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let (file_layer, guard) = if config.file {
        std::fs::create_dir_all(log_dir).map_err(|e| AppError::Logging {
            reason: format!("Failed to create log directory {:?}: {}", log_dir, e),
            location: ErrorLocation::from(Location::caller()),
        })?;
        let appender = tracing_appender::rolling::daily(log_dir, "voxgate.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().json().with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Logging {
            reason: format!("Failed to install subscriber: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(guard)
}
