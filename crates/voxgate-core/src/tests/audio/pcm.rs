use crate::audio::pcm::{apply_gain_le, f32_to_i16, take_channels};

fn to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

fn to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect()
}

/// WHAT: Float samples outside [-1, 1] clip to the i16 range
/// WHY: Devices delivering f32 can overshoot; wrapping would be audible
#[test]
fn given_out_of_range_float_when_converting_then_clipped() {
    // Given/When/Then: Overshoot clips, silence stays silent
    assert_eq!(f32_to_i16(2.0), i16::MAX);
    assert_eq!(f32_to_i16(-2.0), i16::MIN);
    assert_eq!(f32_to_i16(0.0), 0);
    assert_eq!(f32_to_i16(0.5), 16384);
}

/// WHAT: Gain saturates instead of wrapping
/// WHY: A loud frame amplified past full scale must stay a loud frame
#[test]
fn given_loud_samples_when_applying_gain_then_saturated() {
    // Given: Samples near full scale in both directions
    let mut bytes = to_bytes(&[20_000, -20_000, 100]);

    // When: Doubling the gain
    apply_gain_le(&mut bytes, 2.0);

    // Then: Clipped at the extremes, scaled in range
    assert_eq!(to_samples(&bytes), vec![i16::MAX, i16::MIN, 200]);
}

/// WHAT: Unity gain leaves samples untouched
/// WHY: The default configuration must not alter audio
#[test]
fn given_unity_gain_when_applying_gain_then_unchanged() {
    // Given: Arbitrary samples
    let original = to_bytes(&[1, -1, 12_345, i16::MIN]);
    let mut bytes = original.clone();

    // When: Applying gain 1.0
    apply_gain_le(&mut bytes, 1.0);

    // Then: Identical bytes
    assert_eq!(bytes, original);
}

/// WHAT: Extra device channels are dropped, keeping the leading ones
/// WHY: Stereo-only devices must still feed a mono pipeline
#[test]
fn given_stereo_input_when_taking_one_channel_then_left_kept() {
    // Given: Interleaved L/R pairs
    let data = [1i16, 100, 2, 200, 3, 300];
    let mut out = Vec::new();

    // When: Keeping one of two channels
    take_channels(&data, 2, 1, |s| out.push(s));

    // Then: Only the left samples remain
    assert_eq!(out, vec![1, 2, 3]);
}
