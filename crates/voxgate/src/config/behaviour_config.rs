use crate::config::default_max_utterance_secs;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// `[behaviour]` section: how long utterances run and how they end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Seconds after which a recording is stopped.
    #[serde(default = "default_max_utterance_secs")]
    pub max_utterance_secs: u64,
    /// Suspend (tear down the voice channel) instead of stopping on timeout.
    #[serde(default)]
    pub suspend_on_timeout: bool,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            max_utterance_secs: default_max_utterance_secs(),
            suspend_on_timeout: false,
        }
    }
}

impl BehaviourConfig {
    /// Utterance length limit.
    pub fn max_utterance(&self) -> Duration {
        Duration::from_secs(self.max_utterance_secs)
    }
}
