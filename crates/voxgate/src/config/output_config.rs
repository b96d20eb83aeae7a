use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `[output]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where utterance WAV files go (None = `<data dir>/utterances`).
    #[serde(default)]
    pub utterance_dir: Option<PathBuf>,
}
