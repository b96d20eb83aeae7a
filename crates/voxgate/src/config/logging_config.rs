use crate::config::default_log_to_file;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write daily-rolling JSON logs to disk.
    #[serde(default = "default_log_to_file")]
    pub file: bool,
    /// Log directory (None = `<data dir>/logs`).
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_to_file(),
            directory: None,
        }
    }
}
