//! Sample conversions shared by the device callback and the detector adapter.

/// Converts a normalized float sample to signed 16-bit with clipping.
pub(crate) fn f32_to_i16(sample: f32) -> i16 {
    let scaled = (sample * f32::from(i16::MAX)).round();
    scaled.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

/// Multiplies every little-endian 16-bit sample in `bytes` by `gain`,
/// saturating at the sample range.
pub(crate) fn apply_gain_le(bytes: &mut [u8], gain: f32) {
    if (gain - 1.0).abs() < f32::EPSILON {
        return;
    }
    for chunk in bytes.chunks_exact_mut(2) {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        let scaled = (f32::from(sample) * gain).round();
        let clipped = scaled.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
        chunk.copy_from_slice(&clipped.to_le_bytes());
    }
}

/// Appends the first `out_channels` channels of each interleaved device frame.
///
/// Devices that only offer more channels than requested are reduced by
/// keeping the leading channels.
pub(crate) fn take_channels<T: Copy>(
    data: &[T],
    device_channels: usize,
    out_channels: usize,
    mut push: impl FnMut(T),
) {
    if device_channels == out_channels {
        data.iter().copied().for_each(push);
        return;
    }
    for frame in data.chunks_exact(device_channels) {
        frame.iter().take(out_channels).copied().for_each(&mut push);
    }
}
