mod dialog;
pub(crate) mod pipeline;
mod stats;

pub use {
    dialog::DialogControl,
    pipeline::{CaptureHandle, CaptureLoop},
    stats::CaptureStats,
};
