/// Counters kept by the capture loop, returned when it is joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Frames read successfully.
    pub frames_read: u64,
    /// Reads that failed with something other than an overrun.
    pub read_errors: u64,
    /// Overruns recovered by the source.
    pub overruns: u64,
    /// Frames the detector failed on.
    pub detector_errors: u64,
    /// Distinct hotword triggers.
    pub detections: u64,
    /// Frames accepted by the loopback channel.
    pub frames_forwarded: u64,
    /// Frames dropped because the loopback channel was full.
    pub frames_dropped: u64,
}
