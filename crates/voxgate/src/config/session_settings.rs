use crate::config::{
    default_channel_capacity, default_receive_timeout_ms, default_start_retry_attempts,
    default_start_retry_ms, default_upstream_sample_rate,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use voxgate_core::SessionConfig;

/// `[session]` section: upload session tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Sample rate announced to the upstream.
    #[serde(default = "default_upstream_sample_rate")]
    pub upstream_sample_rate: u32,
    /// Relay receive timeout in milliseconds.
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,
    /// Loopback capacity in frames.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Delay between retries of a deferred start.
    #[serde(default = "default_start_retry_ms")]
    pub start_retry_ms: u64,
    /// Retries of a deferred start before the trigger is dropped.
    #[serde(default = "default_start_retry_attempts")]
    pub start_retry_attempts: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            upstream_sample_rate: default_upstream_sample_rate(),
            receive_timeout_ms: default_receive_timeout_ms(),
            channel_capacity: default_channel_capacity(),
            start_retry_ms: default_start_retry_ms(),
            start_retry_attempts: default_start_retry_attempts(),
        }
    }
}

impl SessionSettings {
    /// Core session parameters.
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            upstream_sample_rate: self.upstream_sample_rate,
            receive_timeout: Duration::from_millis(self.receive_timeout_ms),
            channel_capacity: self.channel_capacity,
        }
    }

    /// Pause between deferred start attempts.
    pub fn start_retry_interval(&self) -> Duration {
        Duration::from_millis(self.start_retry_ms)
    }
}
