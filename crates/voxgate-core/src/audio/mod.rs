pub(crate) mod cpal_source;
mod device_config;
mod frame_source;
pub(crate) mod pcm;

pub use {
    cpal_source::CpalFrameSource, device_config::DeviceConfig, frame_source::FrameSource,
};
