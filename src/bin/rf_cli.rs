use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rf_fingerprint::analysis::classifier::{
    ClassificationResult, DeviceClassifier, TrainedClassifier, TrainingReport, TrainingSet,
};
use rf_fingerprint::analysis::features::{FeatureExtractor, FeatureVector, FEATURE_NAMES};
use rf_fingerprint::capture::synthetic::{generate, SyntheticPattern, SyntheticSpec};
use rf_fingerprint::capture::{write_interleaved, SampleType, SignalLoader};
use rf_fingerprint::clustering::FeatureMatrix;
use rf_fingerprint::config::AppConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "rf_cli",
    about = "Feature extraction and two-stage clustering for raw RF captures"
)]
struct Cli {
    /// JSON configuration file (defaults are used when omitted or unreadable)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the capture sample rate in Hz
    #[arg(long)]
    sample_rate: Option<f64>,
    /// Raw sample type of capture files (f32, f64, i16, i8, u8)
    #[arg(long, default_value = "f32")]
    sample_type: SampleType,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the feature vector of one capture (files are concatenated)
    Features {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Train both clustering stages from a manifest of labelled captures
    Train {
        #[arg(long)]
        manifest: PathBuf,
        /// Where to write the trained classifier JSON
        #[arg(long)]
        output: PathBuf,
        /// Optional path for the training report (printed to stdout otherwise)
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Classify one capture with a trained classifier
    Classify {
        #[arg(long)]
        model: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Write a deterministic synthetic capture
    Synth {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = SynthKind::Tone)]
        kind: SynthKind,
        #[arg(long, default_value_t = 1_000_000.0, allow_hyphen_values = true)]
        frequency: f64,
        #[arg(long, default_value_t = 1.0)]
        amplitude: f64,
        #[arg(long, default_value_t = 65_536)]
        len: usize,
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SynthKind {
    Silence,
    Tone,
    Burst,
    Noise,
}

/// Training manifest: every capture is a list of files concatenated in order
#[derive(Deserialize, Debug)]
struct Manifest {
    identities: Vec<ManifestGroup>,
    controllers: Vec<Vec<PathBuf>>,
}

#[derive(Deserialize, Debug)]
struct ManifestGroup {
    label: String,
    captures: Vec<Vec<PathBuf>>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();
    if let Some(rate) = cli.sample_rate {
        config.spectral.sample_rate_hz = rate;
    }
    config.validate().context("validating configuration")?;
    let loader = SignalLoader::new(cli.sample_type);

    match cli.command {
        Commands::Features { files, output } => run_features(&config, &loader, &files, output),
        Commands::Train {
            manifest,
            output,
            report,
        } => run_train(&config, &loader, &manifest, &output, report),
        Commands::Classify { model, files } => run_classify(&loader, &model, &files),
        Commands::Synth {
            output,
            kind,
            frequency,
            amplitude,
            len,
            noise,
            seed,
        } => {
            let pattern = match kind {
                SynthKind::Silence => SyntheticPattern::Silence,
                SynthKind::Tone => SyntheticPattern::Tone {
                    frequency_hz: frequency,
                    amplitude,
                },
                SynthKind::Burst => SyntheticPattern::Burst {
                    frequency_hz: frequency,
                    amplitude,
                    period_samples: config.spectral.segment_len * 4,
                    on_samples: config.spectral.segment_len * 2,
                },
                SynthKind::Noise => SyntheticPattern::Noise { amplitude },
            };
            let spec = SyntheticSpec {
                pattern,
                sample_rate_hz: config.spectral.sample_rate_hz,
                len,
                noise_amplitude: noise,
                seed,
            };
            run_synth(&spec, cli.sample_type, &output)
        }
    }
}

fn run_features(
    config: &AppConfig,
    loader: &SignalLoader,
    files: &[PathBuf],
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let capture = loader.load(files).context("loading capture")?;
    let extractor = FeatureExtractor::from_config(config).context("building feature extractor")?;
    let features = extractor.extract(&capture);

    let report = FeatureReport {
        files,
        sample_rate_hz: extractor.sample_rate(),
        samples: capture.len(),
        feature_names: &FEATURE_NAMES,
        values: features.to_array().to_vec(),
        features,
    };
    write_or_print(&serde_json::to_string_pretty(&report)?, output_path.as_deref())?;
    Ok(ExitCode::from(0))
}

fn run_train(
    config: &AppConfig,
    loader: &SignalLoader,
    manifest_path: &Path,
    output: &Path,
    report_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let text = fs::read_to_string(manifest_path)
        .with_context(|| format!("reading manifest {}", manifest_path.display()))?;
    let manifest: Manifest = serde_json::from_str(&text)
        .with_context(|| format!("parsing manifest {}", manifest_path.display()))?;
    if manifest.identities.is_empty() {
        bail!("manifest lists no identity groups");
    }

    let extractor = FeatureExtractor::from_config(config).context("building feature extractor")?;
    let controllers = extract_group(&extractor, loader, "controllers", &manifest.controllers)?;
    let mut set = TrainingSet::new(controllers);
    for group in &manifest.identities {
        let features = extract_group(&extractor, loader, &group.label, &group.captures)?;
        set = set.with_identity(group.label.clone(), features);
    }

    let (classifier, report) =
        DeviceClassifier::train(&set, config).context("training classifier")?;
    let trained: TrainedClassifier = classifier.into_trained();
    fs::write(output, serde_json::to_string_pretty(&trained)?)
        .with_context(|| format!("writing {}", output.display()))?;

    emit_training_report(&report, report_path.as_deref())?;
    Ok(ExitCode::from(0))
}

fn extract_group(
    extractor: &FeatureExtractor,
    loader: &SignalLoader,
    label: &str,
    captures: &[Vec<PathBuf>],
) -> Result<FeatureMatrix> {
    let mut vectors: Vec<FeatureVector> = Vec::with_capacity(captures.len());
    for (index, result) in extractor
        .extract_files_batch(loader, captures)
        .into_iter()
        .enumerate()
    {
        let vector =
            result.with_context(|| format!("group '{}' capture {}", label, index))?;
        vectors.push(vector);
    }
    Ok(FeatureMatrix::from_vectors(&vectors))
}

fn run_classify(loader: &SignalLoader, model_path: &Path, files: &[PathBuf]) -> Result<ExitCode> {
    let text = fs::read_to_string(model_path)
        .with_context(|| format!("reading model {}", model_path.display()))?;
    let trained: TrainedClassifier = serde_json::from_str(&text)
        .with_context(|| format!("parsing model {}", model_path.display()))?;
    let classifier = DeviceClassifier::from_trained(trained)
        .with_context(|| format!("restoring model {}", model_path.display()))?;

    let result = classifier
        .classify_files(loader, files)
        .context("classifying capture")?;

    let payload = ClassifyPayload {
        files,
        result: &result,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(ExitCode::from(0))
}

fn run_synth(spec: &SyntheticSpec, sample_type: SampleType, output: &Path) -> Result<ExitCode> {
    let capture = generate(spec).context("generating capture")?;
    write_interleaved(output, &capture, sample_type)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&SynthPayload {
            output,
            sample_type,
            samples: capture.len(),
            spec,
        })?
    );
    Ok(ExitCode::from(0))
}

fn emit_training_report(report: &TrainingReport, path: Option<&Path>) -> Result<()> {
    write_or_print(&serde_json::to_string_pretty(report)?, path)
}

fn write_or_print(json: &str, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }
    Ok(())
}

#[derive(Serialize)]
struct FeatureReport<'a> {
    files: &'a [PathBuf],
    sample_rate_hz: f64,
    samples: usize,
    feature_names: &'a [&'static str],
    values: Vec<f64>,
    features: FeatureVector,
}

#[derive(Serialize)]
struct ClassifyPayload<'a> {
    files: &'a [PathBuf],
    result: &'a ClassificationResult,
}

#[derive(Serialize)]
struct SynthPayload<'a> {
    output: &'a Path,
    sample_type: SampleType,
    samples: usize,
    spec: &'a SyntheticSpec,
}
