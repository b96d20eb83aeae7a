use crate::{CoreError, DetectorFormat, DeviceConfig, ModelIndex};

/// WHAT: Model indexes are 1-based
/// WHY: Callers and logs number models from one, in configuration order
#[test]
fn given_first_position_when_building_index_then_one() {
    // Given/When: Index for position 0, and raw values
    let first = ModelIndex::from_position(0);
    let zero = ModelIndex::new(0);
    let second = ModelIndex::new(2);

    // Then: Position 0 is model 1, zero is not an index
    assert_eq!(first.get(), 1);
    assert_eq!(first.to_string(), "1");
    assert!(zero.is_none());
    assert_eq!(second, Some(ModelIndex::from_position(1)));
}

/// WHAT: A device format the detector cannot consume is rejected
/// WHY: Feeding 44.1 kHz audio to a 16 kHz model silently never triggers
#[test]
fn given_mismatched_device_rate_when_checking_format_then_invalid_config() {
    // Given: A 16 kHz mono detector and a 44.1 kHz device
    let format = DetectorFormat {
        sample_rate: 16_000,
        channels: 1,
        bits_per_sample: 16,
    };
    let device = DeviceConfig {
        sample_rate: 44_100,
        ..DeviceConfig::default()
    };

    // When: Checking
    let mismatch = format.check(&device);
    let matched = format.check(&DeviceConfig::default());

    // Then: Only the matching device passes
    assert!(matches!(mismatch, Err(CoreError::InvalidConfig { .. })));
    assert!(matched.is_ok());
}

#[cfg(feature = "wake-word")]
mod engine {
    use crate::{
        CoreError, DetectorConfig, DeviceConfig, RustpotterDetector,
        detector::rustpotter_engine::sensitivity_to_threshold,
    };

    use std::path::PathBuf;

    /// WHAT: Higher sensitivity lowers the score threshold
    /// WHY: Sensitivity 1.0 must accept every engine detection
    #[test]
    fn given_sensitivities_when_mapping_then_inverted_threshold() {
        // Given/When/Then: The mapping is 1 - s, clamped
        assert!((sensitivity_to_threshold(0.7) - 0.3).abs() < 1e-6);
        assert!((sensitivity_to_threshold(1.0)).abs() < f32::EPSILON);
        assert!((sensitivity_to_threshold(0.0) - 1.0).abs() < f32::EPSILON);
    }

    /// WHAT: A missing model file fails construction
    /// WHY: Early validation prevents a detector that can never trigger
    #[test]
    fn given_missing_model_when_creating_detector_then_model_not_found() {
        // Given: A config pointing at a non-existent model
        let config = DetectorConfig {
            resource_path: PathBuf::from("/nonexistent"),
            models: vec![PathBuf::from("hey.rpw")],
            sensitivities: vec![0.5],
            audio_gain: 1.0,
            apply_frontend: false,
        };

        // When: Creating the detector
        let result = RustpotterDetector::new(&config, DeviceConfig::default().frame_len());

        // Then: ModelNotFound
        assert!(matches!(result, Err(CoreError::ModelNotFound { .. })));
    }

    /// WHAT: Silence never triggers a real model
    /// WHY: Sanity check of the engine adapter against a trained model
    #[test]
    #[cfg_attr(not(feature = "integration-tests"), ignore)]
    #[allow(clippy::unwrap_used)]
    fn given_real_model_when_feeding_silence_then_no_detection() {
        use crate::HotwordDetector;

        // Given: A detector over the model named by TEST_HOTWORD_MODEL_PATH
        let model = std::env::var("TEST_HOTWORD_MODEL_PATH")
            .unwrap_or_else(|_| "models/hotword.rpw".to_string());
        let config = DetectorConfig::from_delimited("", &model, "0.5", 1.0, true).unwrap();
        let frame_len = DeviceConfig::default().frame_len();
        let mut detector = RustpotterDetector::new(&config, frame_len).unwrap();
        let frame = vec![0u8; frame_len];

        // When: Feeding two seconds of silence
        let detections = (0..2_000)
            .filter_map(|_| detector.detect(&frame).unwrap())
            .count();

        // Then: Nothing detected; wrong-length frames are rejected
        assert_eq!(detections, 0);
        assert!(matches!(
            detector.detect(&frame[..frame_len - 2]),
            Err(CoreError::FrameSizeMismatch { .. })
        ));
    }
}
