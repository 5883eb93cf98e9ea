use super::*;
use crate::capture::synthetic::{generate, SyntheticPattern, SyntheticSpec};
use rustfft::num_complex::Complex32;

/// 51.2 kHz with 512-point FFT gives 100 Hz bins
const FS: f64 = 51_200.0;
const BIN_WIDTH: f64 = 100.0;

fn tone(frequency_hz: f64, len: usize) -> Capture {
    generate(&SyntheticSpec::tone(frequency_hz, FS, len)).unwrap()
}

#[test]
fn test_tone_peak_and_centroid_within_one_bin() {
    let extractor = FeatureExtractor::new(FS).unwrap();

    for &frequency in &[5_000.0, -7_200.0, 1_230.0, 12_345.0] {
        let features = extractor.extract(&tone(frequency, 4096));

        assert!(
            (features.peak_frequency_hz - frequency).abs() <= BIN_WIDTH,
            "peak {} Hz for {} Hz tone",
            features.peak_frequency_hz,
            frequency
        );
        assert!(
            (features.spectral_centroid_hz - frequency).abs() <= BIN_WIDTH,
            "centroid {} Hz for {} Hz tone",
            features.spectral_centroid_hz,
            frequency
        );
    }
}

#[test]
fn test_unit_tone_time_domain_stats() {
    let features = FeatureExtractor::new(FS).unwrap().extract(&tone(2_000.0, 1024));

    assert!((features.magnitude_mean - 1.0).abs() < 1e-5);
    assert!(features.magnitude_std < 1e-5);
    assert!((features.magnitude_rms - 1.0).abs() < 1e-5);
    assert!((features.crest_factor - 1.0).abs() < 1e-5);
    assert!((features.power_intensity - 1.0).abs() < 1e-5);
    assert!((features.energy_intensity - 1024.0).abs() < 1e-2);
}

#[test]
fn test_vector_is_finite_for_any_length() {
    let extractor = FeatureExtractor::new(FS).unwrap();

    for &len in &[1, 2, 3, 100, 511, 512, 513, 2000] {
        let capture = generate(&SyntheticSpec::tone(3_000.0, FS, len).with_noise(0.2, len as u64))
            .unwrap();
        let features = extractor.extract(&capture);

        assert_eq!(features.to_array().len(), FEATURE_COUNT);
        assert!(features.is_finite(), "non-finite feature for len {}", len);
    }
}

#[test]
fn test_all_zero_capture_uses_sentinels() {
    let capture = Capture::new(vec![Complex32::new(0.0, 0.0); 2048]).unwrap();
    let features = FeatureExtractor::new(FS).unwrap().extract(&capture);

    assert!(features.is_finite());
    assert_eq!(features.crest_factor, 0.0);
    assert_eq!(features.magnitude_rms, 0.0);
    assert_eq!(features.region_count, 0.0);
    assert_eq!(features.region_total_area, 0.0);
    assert_eq!(features.region_max_area, 0.0);
    assert_eq!(features.region_mean_aspect_ratio, 0.0);
    assert_eq!(features.region_mean_eccentricity, 0.0);
    assert_eq!(features.spectral_centroid_hz, 0.0);
    assert_eq!(features.spectral_bandwidth_hz, 0.0);
    assert_eq!(features.peak_frequency_hz, 0.0);
}

#[test]
fn test_extraction_is_deterministic() {
    let capture = generate(&SyntheticSpec::tone(800.0, FS, 3000).with_noise(0.5, 11)).unwrap();
    let extractor = FeatureExtractor::new(FS).unwrap();
    assert_eq!(extractor.extract(&capture), extractor.extract(&capture));
}

#[test]
fn test_burst_produces_regions() {
    let spec = SyntheticSpec {
        pattern: SyntheticPattern::Burst {
            frequency_hz: 6_400.0,
            amplitude: 1.0,
            period_samples: 2048,
            on_samples: 1024,
        },
        sample_rate_hz: FS,
        len: 512 * 16,
        noise_amplitude: 0.01,
        seed: 5,
    };
    let features = FeatureExtractor::new(FS).unwrap().extract(&generate(&spec).unwrap());

    assert!(features.region_count >= 1.0);
    assert!(features.region_total_area >= features.region_max_area);
    assert!(features.region_max_area >= 1.0);
}

#[test]
fn test_batch_matches_sequential_order() {
    let captures: Vec<Capture> = (0..9)
        .map(|i| tone(1_000.0 + 500.0 * i as f64, 1024 + 64 * i))
        .collect();

    let sequential = FeatureExtractor::new(FS).unwrap();
    let expected: Vec<FeatureVector> = captures.iter().map(|c| sequential.extract(c)).collect();

    let parallel = FeatureExtractor::new(FS).unwrap().with_workers(4);
    assert_eq!(parallel.extract_batch(&captures), expected);
}

#[test]
fn test_batch_with_more_workers_than_captures() {
    let captures = vec![tone(2_000.0, 1024), tone(-3_000.0, 1024)];
    let extractor = FeatureExtractor::new(FS).unwrap().with_workers(16);
    let features = extractor.extract_batch(&captures);

    assert_eq!(features.len(), 2);
    assert!((features[0].peak_frequency_hz - 2_000.0).abs() <= BIN_WIDTH);
    assert!((features[1].peak_frequency_hz + 3_000.0).abs() <= BIN_WIDTH);
    assert!(extractor.extract_batch(&[]).is_empty());
}

#[test]
fn test_unusable_sample_rate_is_rejected() {
    for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(
            matches!(
                FeatureExtractor::new(rate),
                Err(ModelError::InvalidConfig { .. })
            ),
            "sample rate {} accepted",
            rate
        );
    }

    let mut config = AppConfig::default();
    config.spectral.sample_rate_hz = 0.0;
    assert!(FeatureExtractor::from_config(&config).is_err());
}

#[test]
fn test_bin_centred_tones_near_band_edge() {
    // 25.3 kHz is three bins below fs/2, so the main lobe stays in band
    let extractor = FeatureExtractor::new(FS).unwrap();
    for &frequency in &[25_300.0, -25_300.0] {
        let features = extractor.extract(&tone(frequency, 4096));
        assert!((features.peak_frequency_hz - frequency).abs() <= BIN_WIDTH);
        assert!(
            (features.spectral_centroid_hz - frequency).abs() <= BIN_WIDTH,
            "centroid {} Hz for {} Hz tone",
            features.spectral_centroid_hz,
            frequency
        );
    }
}
