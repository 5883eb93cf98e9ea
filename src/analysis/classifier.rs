// DeviceClassifier - two-stage capture -> label inference
//
// Stage 1 (class): k-means over flying devices and controllers together;
// the controller group's elected cluster means "controller", the flying
// group's cluster means "continue to stage 2".
// Stage 2 (identity): k-means over flying devices only; each identity group
// elects one cluster.
//
// Training produces one owned TrainedClassifier value (config, both fitted
// models, both label maps). Inference only reads it. A cluster that no group
// elected maps to the configured unrecognized label.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::features::{FeatureExtractor, FeatureVector};
use crate::capture::{Capture, SignalLoader};
use crate::clustering::{
    ClusterModel, FeatureMatrix, GroupVote, LabelGroup, LabelMap, LabelResolver,
};
use crate::config::AppConfig;
use crate::error::{log_label_error, log_model_error, LabelError, ModelError, PipelineError};

/// Training rows of one known flying-device identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingGroup {
    pub label: String,
    pub features: FeatureMatrix,
}

/// Labelled training data for both stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    /// Flying-device identities, in row order
    pub identities: Vec<TrainingGroup>,
    pub controllers: FeatureMatrix,
}

impl TrainingSet {
    pub fn new(controllers: FeatureMatrix) -> Self {
        Self {
            identities: Vec::new(),
            controllers,
        }
    }

    pub fn with_identity(mut self, label: impl Into<String>, features: FeatureMatrix) -> Self {
        self.identities.push(TrainingGroup {
            label: label.into(),
            features,
        });
        self
    }

    /// Identity rows stacked in group order, with one label group per identity
    pub fn flying_matrix(&self) -> Result<(FeatureMatrix, Vec<LabelGroup>), ModelError> {
        let parts: Vec<&FeatureMatrix> = self.identities.iter().map(|g| &g.features).collect();
        let matrix = FeatureMatrix::vstack(&parts)?;

        let mut groups = Vec::with_capacity(self.identities.len());
        let mut start = 0;
        for identity in &self.identities {
            let end = start + identity.features.n_rows();
            groups.push(LabelGroup::new(identity.label.clone(), start..end));
            start = end;
        }
        Ok((matrix, groups))
    }

    /// Flying rows followed by controller rows, grouped by class
    pub fn class_matrix(
        &self,
        flying_label: &str,
        controller_label: &str,
    ) -> Result<(FeatureMatrix, Vec<LabelGroup>), ModelError> {
        let (flying, _) = self.flying_matrix()?;
        let matrix = FeatureMatrix::vstack(&[&flying, &self.controllers])?;
        let groups = vec![
            LabelGroup::new(flying_label, 0..flying.n_rows()),
            LabelGroup::new(controller_label, flying.n_rows()..matrix.n_rows()),
        ];
        Ok((matrix, groups))
    }
}

/// One fitted stage with its label table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierStage {
    pub model: ClusterModel,
    pub labels: LabelMap,
}

impl ClassifierStage {
    /// Predicted cluster and its label (None when unelected)
    fn resolve(&self, row: &[f64]) -> Result<(usize, Option<&str>), ModelError> {
        let cluster = self.model.predict(row)?;
        Ok((cluster, self.labels.label_for(cluster)))
    }
}

/// Owned result of training: everything inference needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedClassifier {
    pub config: AppConfig,
    pub class_stage: ClassifierStage,
    pub identity_stage: ClassifierStage,
}

/// Per-stage training outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub k: usize,
    pub rows: usize,
    /// Cluster per training row, in row order
    pub assignments: Vec<usize>,
    pub inertia: f64,
    pub votes: Vec<GroupVote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub class_stage: StageReport,
    pub identity_stage: StageReport,
}

/// Classification of one capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Final label: controller, a known identity, or the unrecognized label
    pub label: String,
    /// Stage-1 label (unrecognized label when the class cluster is unelected)
    pub class_label: String,
    pub class_cluster: usize,
    /// Stage-2 cluster, only for flying devices
    pub identity_cluster: Option<usize>,
    /// False when either stage landed in an unelected cluster
    pub recognized: bool,
}

/// Capture -> label pipeline over a trained two-stage model
pub struct DeviceClassifier {
    extractor: FeatureExtractor,
    trained: TrainedClassifier,
}

impl DeviceClassifier {
    /// Fit both stages and resolve both label maps
    ///
    /// # Errors
    /// - `Model` for an invalid config, mismatched widths or too few rows
    /// - `Label` when either stage's vote is ambiguous
    pub fn train(
        set: &TrainingSet,
        config: &AppConfig,
    ) -> Result<(Self, TrainingReport), PipelineError> {
        let model_err = |err: ModelError| {
            log_model_error(&err, "train");
            err
        };
        let label_err = |err: LabelError| {
            log_label_error(&err, "train");
            err
        };

        config.validate().map_err(model_err)?;
        let resolver = LabelResolver::new(config.labels.vote_policy);

        let (class_rows, class_groups) = set
            .class_matrix(&config.labels.flying_label, &config.labels.controller_label)
            .map_err(model_err)?;
        let mut class_model = ClusterModel::class_stage(&config.clustering);
        let class_fit = class_model.fit(&class_rows).map_err(model_err)?;
        let class_labels = resolver
            .resolve(&class_fit.assignments, class_model.k(), &class_groups)
            .map_err(label_err)?;

        let (identity_rows, identity_groups) = set.flying_matrix().map_err(model_err)?;
        let mut identity_model = ClusterModel::identity_stage(&config.clustering);
        let identity_fit = identity_model.fit(&identity_rows).map_err(model_err)?;
        let identity_labels = resolver
            .resolve(&identity_fit.assignments, identity_model.k(), &identity_groups)
            .map_err(label_err)?;

        tracing::info!(
            class_rows = class_rows.n_rows(),
            identity_rows = identity_rows.n_rows(),
            identities = set.identities.len(),
            "Device classifier trained"
        );

        let report = TrainingReport {
            class_stage: StageReport {
                k: class_model.k(),
                rows: class_rows.n_rows(),
                assignments: class_fit.assignments,
                inertia: class_fit.inertia,
                votes: class_labels.votes().to_vec(),
            },
            identity_stage: StageReport {
                k: identity_model.k(),
                rows: identity_rows.n_rows(),
                assignments: identity_fit.assignments,
                inertia: identity_fit.inertia,
                votes: identity_labels.votes().to_vec(),
            },
        };

        let trained = TrainedClassifier {
            config: config.clone(),
            class_stage: ClassifierStage {
                model: class_model,
                labels: class_labels,
            },
            identity_stage: ClassifierStage {
                model: identity_model,
                labels: identity_labels,
            },
        };

        Ok((Self::from_trained(trained)?, report))
    }

    /// Rebuild a classifier from a previously trained value
    ///
    /// # Errors
    /// `InvalidConfig` when the carried configuration does not validate
    /// (a deserialized model is checked like a fresh one)
    pub fn from_trained(trained: TrainedClassifier) -> Result<Self, ModelError> {
        let extractor = FeatureExtractor::from_config(&trained.config).map_err(|err| {
            log_model_error(&err, "from_trained");
            err
        })?;
        Ok(Self { extractor, trained })
    }

    pub fn trained(&self) -> &TrainedClassifier {
        &self.trained
    }

    pub fn into_trained(self) -> TrainedClassifier {
        self.trained
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Extract features from a capture and classify them
    pub fn classify(&self, capture: &Capture) -> Result<ClassificationResult, ModelError> {
        self.classify_features(&self.extractor.extract(capture))
    }

    /// Load a capture from files and classify it
    pub fn classify_files<P: AsRef<Path>>(
        &self,
        loader: &SignalLoader,
        paths: &[P],
    ) -> Result<ClassificationResult, PipelineError> {
        let capture = loader.load(paths)?;
        Ok(self.classify(&capture)?)
    }

    /// Two-stage classification of an extracted feature vector
    pub fn classify_features(
        &self,
        features: &FeatureVector,
    ) -> Result<ClassificationResult, ModelError> {
        let labels = &self.trained.config.labels;
        let row = features.to_array();
        let predict_err = |err: ModelError| {
            log_model_error(&err, "classify");
            err
        };

        let (class_cluster, class_label) =
            self.trained.class_stage.resolve(&row).map_err(predict_err)?;
        let class_label = match class_label {
            Some(label) => label.to_string(),
            None => {
                tracing::debug!(class_cluster, "Class cluster has no label");
                return Ok(ClassificationResult {
                    label: labels.unrecognized_label.clone(),
                    class_label: labels.unrecognized_label.clone(),
                    class_cluster,
                    identity_cluster: None,
                    recognized: false,
                });
            }
        };

        if class_label != labels.flying_label {
            return Ok(ClassificationResult {
                label: class_label.clone(),
                class_label,
                class_cluster,
                identity_cluster: None,
                recognized: true,
            });
        }

        let (identity_cluster, identity) = self
            .trained
            .identity_stage
            .resolve(&row)
            .map_err(predict_err)?;
        let (label, recognized) = match identity {
            Some(label) => (label.to_string(), true),
            None => (labels.unrecognized_label.clone(), false),
        };

        Ok(ClassificationResult {
            label,
            class_label,
            class_cluster,
            identity_cluster: Some(identity_cluster),
            recognized,
        })
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
