// RF Fingerprint Core - capture features and two-stage device clustering
// Deterministic feature extraction with unsupervised, vote-labelled models

// Module declarations
pub mod analysis;
pub mod capture;
pub mod clustering;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use analysis::classifier::{
    ClassificationResult, DeviceClassifier, TrainedClassifier, TrainingReport, TrainingSet,
};
pub use analysis::features::{FeatureExtractor, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use capture::{Capture, SampleType, SignalLoader};
pub use clustering::{ClusterModel, FeatureMatrix, LabelMap, LabelResolver, VotePolicy};
pub use config::AppConfig;
pub use error::{CaptureError, ErrorCode, LabelError, ModelError, PipelineError};
