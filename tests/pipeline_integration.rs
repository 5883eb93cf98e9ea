use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::{rngs::StdRng, Rng, SeedableRng};
use rf_fingerprint::capture::synthetic::{generate, SyntheticPattern, SyntheticSpec};
use rf_fingerprint::capture::write_interleaved;
use rf_fingerprint::clustering::{ClusterModel, LabelGroup, StandardScaler};
use rf_fingerprint::config::ClusteringConfig;
use rf_fingerprint::{
    AppConfig, CaptureError, FeatureExtractor, FeatureMatrix, LabelResolver, SampleType,
    SignalLoader, VotePolicy, FEATURE_COUNT,
};

const FS: f64 = 51_200.0;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn temp_path(name: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!(
        "rf_pipeline_{}_{}_{}",
        std::process::id(),
        n,
        name
    ))
}

/// 40 flying rows (4 identities x 10, identity g high on features j % 4 == g)
/// followed by 8 controller rows far from all of them
fn synthetic_training_matrix(seed: u64) -> FeatureMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for group in 0..4 {
        for _ in 0..10 {
            rows.push(
                (0..FEATURE_COUNT)
                    .map(|j| {
                        let centre = if j % 4 == group { 5.0 } else { 0.0 };
                        centre + rng.gen_range(-0.1f64..0.1)
                    })
                    .collect(),
            );
        }
    }
    for _ in 0..8 {
        rows.push(
            (0..FEATURE_COUNT)
                .map(|_| 20.0 + rng.gen_range(-0.1f64..0.1))
                .collect(),
        );
    }
    FeatureMatrix::from_rows(&rows).unwrap()
}

fn flying_rows(matrix: &FeatureMatrix) -> FeatureMatrix {
    let rows: Vec<Vec<f64>> = matrix.rows().take(40).map(|r| r.to_vec()).collect();
    FeatureMatrix::from_rows(&rows).unwrap()
}

#[test]
fn stage_one_separates_controllers_from_flying_devices() {
    let matrix = synthetic_training_matrix(7);
    let mut model = ClusterModel::class_stage(&ClusteringConfig::default());
    let fit = model.fit(&matrix).unwrap();

    let flying_cluster = fit.assignments[0];
    let controller_cluster = fit.assignments[40];
    assert_ne!(flying_cluster, controller_cluster);
    assert!(fit.assignments[..40].iter().all(|&c| c == flying_cluster));
    assert!(fit.assignments[40..].iter().all(|&c| c == controller_cluster));

    let labels = LabelResolver::new(VotePolicy::StrictMajority)
        .resolve(
            &fit.assignments,
            2,
            &[
                LabelGroup::new("Drone", 0..40),
                LabelGroup::new("Controller", 40..48),
            ],
        )
        .unwrap();
    assert_eq!(labels.label_for(controller_cluster), Some("Controller"));
    assert_eq!(labels.label_for(flying_cluster), Some("Drone"));
}

#[test]
fn stage_two_recovers_identity_groups() {
    let flying = flying_rows(&synthetic_training_matrix(11));
    let mut model = ClusterModel::identity_stage(&ClusteringConfig::default());
    let fit = model.fit(&flying).unwrap();

    let groups: Vec<LabelGroup> = ["A", "B", "C", "D"]
        .iter()
        .enumerate()
        .map(|(g, label)| LabelGroup::new(*label, g * 10..(g + 1) * 10))
        .collect();
    let labels = LabelResolver::new(VotePolicy::StrictMajority)
        .resolve(&fit.assignments, 4, &groups)
        .unwrap();

    for vote in labels.votes() {
        assert!(vote.purity >= 0.9, "group {} purity {}", vote.label, vote.purity);
    }
    let mut clusters: Vec<usize> = labels.votes().iter().map(|v| v.cluster).collect();
    clusters.sort_unstable();
    assert_eq!(clusters, vec![0, 1, 2, 3]);
}

#[test]
fn refitting_is_deterministic() {
    let matrix = synthetic_training_matrix(3);
    let config = ClusteringConfig::default();

    let mut first = ClusterModel::identity_stage(&config);
    let mut second = ClusterModel::identity_stage(&config);
    let a = first.fit(&matrix).unwrap();
    let b = second.fit(&matrix).unwrap();

    assert_eq!(a.assignments, b.assignments);
    assert_eq!(a.centroids, b.centroids);
}

#[test]
fn scaler_round_trip_on_extracted_features() {
    let extractor = FeatureExtractor::new(FS).unwrap();
    let captures: Vec<_> = (0..6)
        .map(|i| {
            generate(
                &SyntheticSpec::tone(1_000.0 * (i + 1) as f64, FS, 2048).with_noise(0.05, i as u64),
            )
            .unwrap()
        })
        .collect();
    let matrix = FeatureMatrix::from_vectors(&extractor.extract_batch(&captures));

    let scaler = StandardScaler::fit(&matrix).unwrap();
    let restored = scaler
        .inverse_transform(&scaler.transform(&matrix).unwrap())
        .unwrap();

    for (original, back) in matrix.rows().zip(restored.rows()) {
        for (x, y) in original.iter().zip(back) {
            assert!(
                (x - y).abs() <= 1e-9 * x.abs().max(1.0),
                "round trip drifted: {} vs {}",
                x,
                y
            );
        }
    }
}

#[test]
fn files_load_and_extract_in_order() {
    let extractor = FeatureExtractor::new(FS).unwrap().with_workers(3);
    let loader = SignalLoader::new(SampleType::I16);

    let mut captures = Vec::new();
    for (i, frequency) in [2_000.0, -4_000.0, 9_000.0].iter().enumerate() {
        let path = temp_path(&format!("tone_{}.iq", i));
        let capture = generate(&SyntheticSpec::tone(*frequency, FS, 4096)).unwrap();
        write_interleaved(&path, &capture, SampleType::I16).unwrap();
        captures.push(vec![path]);
    }
    let missing = temp_path("missing.iq");
    captures.push(vec![missing.clone()]);

    let results = extractor.extract_files_batch(&loader, &captures);
    assert_eq!(results.len(), 4);

    for (result, expected) in results.iter().zip([2_000.0, -4_000.0, 9_000.0]) {
        let features = result.as_ref().unwrap();
        assert!(features.is_finite());
        assert!((features.peak_frequency_hz - expected).abs() <= 100.0);
    }
    assert_eq!(
        results[3],
        Err(CaptureError::FileNotFound { path: missing })
    );

    for paths in &captures[..3] {
        let _ = std::fs::remove_file(&paths[0]);
    }
}

#[test]
fn silent_and_bursty_captures_stay_finite() {
    let extractor = FeatureExtractor::from_config(&AppConfig {
        spectral: rf_fingerprint::config::SpectralConfig {
            sample_rate_hz: FS,
            ..Default::default()
        },
        ..AppConfig::default()
    })
    .unwrap();

    let specs = [
        SyntheticSpec::silence(FS, 5000),
        SyntheticSpec {
            pattern: SyntheticPattern::Burst {
                frequency_hz: 3_200.0,
                amplitude: 0.8,
                period_samples: 1024,
                on_samples: 256,
            },
            sample_rate_hz: FS,
            len: 8192,
            noise_amplitude: 0.001,
            seed: 21,
        },
        SyntheticSpec {
            pattern: SyntheticPattern::Noise { amplitude: 0.5 },
            sample_rate_hz: FS,
            len: 3000,
            noise_amplitude: 0.0,
            seed: 4,
        },
    ];

    for spec in &specs {
        let features = extractor.extract(&generate(spec).unwrap());
        assert!(features.is_finite(), "{:?}", spec.pattern);
        assert_eq!(features.to_array().len(), FEATURE_COUNT);
    }
}
