use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::{rngs::StdRng, Rng, SeedableRng};
use rf_fingerprint::{AppConfig, DeviceClassifier, FeatureMatrix, TrainingSet, FEATURE_COUNT};
use serde_json::Value;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rf_cli"))
}

fn temp_file(name: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("rf_cli_{}_{}_{}", std::process::id(), n, name))
}

fn path_arg(path: &PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

fn synth_tone(frequency: &str, path: &PathBuf) {
    synth("tone", frequency, path);
}

fn synth(kind: &str, frequency: &str, path: &PathBuf) {
    let output = cli()
        .args([
            "--sample-rate",
            "51200",
            "synth",
            "--output",
            &path_arg(path),
            "--kind",
            kind,
            "--frequency",
            frequency,
            "--len",
            "4096",
        ])
        .output()
        .expect("failed to run rf_cli synth");
    assert!(
        output.status.success(),
        "synth exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Trained classifier JSON built from well separated synthetic feature rows
fn write_model(path: &PathBuf) {
    let mut rng = StdRng::seed_from_u64(5);
    let mut noisy = |centre: &dyn Fn(usize) -> f64, count: usize| {
        let rows: Vec<Vec<f64>> = (0..count)
            .map(|_| {
                (0..FEATURE_COUNT)
                    .map(|j| centre(j) + rng.gen_range(-0.1f64..0.1))
                    .collect()
            })
            .collect();
        FeatureMatrix::from_rows(&rows).unwrap()
    };

    let mut set = TrainingSet::new(noisy(&|_| 20.0, 8));
    for g in 0..4 {
        let centre = move |j: usize| if j % 4 == g { 5.0 } else { 0.0 };
        set = set.with_identity(format!("ID{}", g), noisy(&centre, 10));
    }

    let (classifier, _) = DeviceClassifier::train(&set, &AppConfig::default()).unwrap();
    std::fs::write(path, serde_json::to_string(classifier.trained()).unwrap()).unwrap();
}

#[test]
fn synth_then_features_reports_tone() {
    let capture = temp_file("tone.iq");
    synth_tone("5000", &capture);

    let output = cli()
        .args(["--sample-rate", "51200", "features", &path_arg(&capture)])
        .output()
        .expect("failed to run rf_cli features");
    assert!(output.status.success(), "features exited with {:?}", output.status.code());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("feature report JSON payload");
    assert_eq!(json["samples"], 4096);
    assert_eq!(json["values"].as_array().map(|v| v.len()), Some(FEATURE_COUNT));
    assert_eq!(json["feature_names"][5], "peak_frequency_hz");

    let peak = json["features"]["peak_frequency_hz"].as_f64().unwrap();
    assert!((peak - 5000.0).abs() <= 100.0, "peak {} Hz", peak);

    let _ = std::fs::remove_file(capture);
}

#[test]
fn features_missing_file_fails_with_path() {
    let missing = temp_file("does_not_exist.iq");
    let output = cli()
        .args(["features", &path_arg(&missing)])
        .output()
        .expect("failed to run rf_cli features");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("does_not_exist.iq"),
        "expected path in error, got {stderr}"
    );
}

#[test]
fn classify_with_trained_model() {
    let model = temp_file("model.json");
    write_model(&model);
    let capture = temp_file("classify.iq");
    synth_tone("-2000", &capture);

    let output = cli()
        .args(["classify", "--model", &path_arg(&model), &path_arg(&capture)])
        .output()
        .expect("failed to run rf_cli classify");
    assert!(
        output.status.success(),
        "classify exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("classification JSON payload");
    assert!(json["result"]["label"].is_string());
    assert!(json["result"]["class_cluster"].is_u64());

    let _ = std::fs::remove_file(model);
    let _ = std::fs::remove_file(capture);
}

fn classify_label(config: &PathBuf, model: &PathBuf, capture: &PathBuf) -> String {
    let output = cli()
        .args([
            "--config",
            &path_arg(config),
            "classify",
            "--model",
            &path_arg(model),
            &path_arg(capture),
        ])
        .output()
        .expect("failed to run rf_cli classify");
    assert!(
        output.status.success(),
        "classify exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("classification JSON payload");
    json["result"]["label"].as_str().unwrap_or_default().to_string()
}

#[test]
fn train_from_manifest_then_classify() {
    let alpha = temp_file("alpha.iq");
    let bravo = temp_file("bravo.iq");
    let controller = temp_file("controller.iq");
    synth("tone", "2000", &alpha);
    synth("tone", "-9000", &bravo);
    synth("burst", "-3500", &controller);

    let mut config = AppConfig::default();
    config.spectral.sample_rate_hz = 51_200.0;
    config.clustering.identity_clusters = 2;
    let config_path = temp_file("config.json");
    std::fs::write(&config_path, serde_json::to_string(&config).unwrap()).unwrap();

    let manifest = temp_file("manifest_ok.json");
    let body = serde_json::json!({
        "identities": [
            { "label": "Alpha", "captures": [[alpha], [alpha], [alpha]] },
            { "label": "Bravo", "captures": [[bravo], [bravo], [bravo]] }
        ],
        "controllers": [[controller], [controller], [controller]]
    });
    std::fs::write(&manifest, body.to_string()).unwrap();
    let model = temp_file("trained.json");

    let output = cli()
        .args([
            "--config",
            &path_arg(&config_path),
            "train",
            "--manifest",
            &path_arg(&manifest),
            "--output",
            &path_arg(&model),
        ])
        .output()
        .expect("failed to run rf_cli train");
    assert!(
        output.status.success(),
        "train exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    let report: Value = serde_json::from_slice(&output.stdout).expect("training report JSON");
    assert_eq!(report["class_stage"]["rows"], 9);
    assert_eq!(report["identity_stage"]["k"], 2);
    assert!(model.exists());

    assert_eq!(classify_label(&config_path, &model, &alpha), "Alpha");
    assert_eq!(classify_label(&config_path, &model, &bravo), "Bravo");
    assert_eq!(classify_label(&config_path, &model, &controller), "Controller");

    for path in [alpha, bravo, controller, config_path, manifest, model] {
        let _ = std::fs::remove_file(path);
    }
}

#[test]
fn train_rejects_manifest_without_identities() {
    let manifest = temp_file("manifest.json");
    std::fs::write(&manifest, r#"{"identities": [], "controllers": []}"#).unwrap();
    let model = temp_file("never_written.json");

    let output = cli()
        .args([
            "train",
            "--manifest",
            &path_arg(&manifest),
            "--output",
            &path_arg(&model),
        ])
        .output()
        .expect("failed to run rf_cli train");

    assert_eq!(output.status.code(), Some(1));
    assert!(!model.exists());
    let _ = std::fs::remove_file(manifest);
}

#[test]
fn train_reports_missing_capture() {
    let manifest = temp_file("manifest_missing.json");
    let missing = temp_file("absent_capture.iq");
    let body = serde_json::json!({
        "identities": [{ "label": "A", "captures": [[missing]] }],
        "controllers": []
    });
    std::fs::write(&manifest, body.to_string()).unwrap();

    let output = cli()
        .args([
            "train",
            "--manifest",
            &path_arg(&manifest),
            "--output",
            &path_arg(&temp_file("unused.json")),
        ])
        .output()
        .expect("failed to run rf_cli train");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("absent_capture.iq"), "got {stderr}");
    let _ = std::fs::remove_file(manifest);
}

#[test]
fn unknown_sample_type_is_rejected() {
    let output = cli()
        .args(["--sample-type", "c64", "features", "x.iq"])
        .output()
        .expect("failed to run rf_cli");
    assert!(!output.status.success());
}
