use crate::{
    DeviceConfig, FrameSource,
    audio::{CpalFrameSource, cpal_source::SampleQueue},
};

/// WHAT: A full sample queue drops the oldest samples and counts them
/// WHY: The reader reports the loss as an overrun instead of lagging forever
#[test]
fn given_full_queue_when_pushing_then_oldest_dropped_and_overrun_counted() {
    // Given: A queue holding four samples
    let mut queue = SampleQueue::with_capacity(4);
    for sample in 0..4 {
        queue.push(sample);
    }
    assert_eq!(queue.overrun, 0);

    // When: Pushing two more
    queue.push(4);
    queue.push(5);

    // Then: Capacity kept, newest retained, two overruns recorded
    assert_eq!(queue.samples.len(), 4);
    assert_eq!(queue.samples.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4, 5]);
    assert_eq!(queue.overrun, 2);
}

/// WHAT: The default input device delivers frames of the negotiated length
/// WHY: End-to-end check of device negotiation on real hardware
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
#[allow(clippy::unwrap_used)]
fn given_default_device_when_reading_frame_then_frame_len_bytes_filled() {
    // Given: The default microphone opened at 16 kHz mono
    let mut source = CpalFrameSource::open(DeviceConfig::default(), None).unwrap();
    let mut frame = vec![0u8; source.frame_len()];

    // When: Reading one frame
    let result = source.read_frame(&mut frame);
    source.close();

    // Then: The read succeeded and the length follows the negotiated period
    assert!(result.is_ok());
    assert_eq!(frame.len(), source.config().frame_len());
}

/// WHAT: Reads after close fail instead of blocking
/// WHY: The capture loop must be able to exit once the device is released
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
#[allow(clippy::unwrap_used)]
fn given_closed_source_when_reading_then_error() {
    // Given: An opened then closed device
    let mut source = CpalFrameSource::open(DeviceConfig::default(), None).unwrap();
    source.close();
    let mut frame = vec![0u8; source.frame_len()];

    // When: Reading
    let result = source.read_frame(&mut frame);

    // Then: Device error
    assert!(result.is_err());
}
