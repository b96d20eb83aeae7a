mod config;
mod hotword;
#[cfg(feature = "wake-word")]
pub(crate) mod rustpotter_engine;

pub use {
    config::DetectorConfig,
    hotword::{DetectorFormat, HotwordDetector, ModelIndex},
};

#[cfg(feature = "wake-word")]
pub use rustpotter_engine::RustpotterDetector;
