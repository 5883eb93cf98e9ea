// Clustering - unsupervised grouping of feature vectors
//
// Module organization:
// - matrix: FeatureMatrix (row-major, order preserving)
// - scaler: StandardScaler (zero mean, unit variance)
// - kmeans: seeded k-means++ / Lloyd
// - model: ClusterModel (fit once, predict many)
// - labels: LabelResolver (cluster -> label by majority vote)

pub mod kmeans;
pub mod labels;
pub mod matrix;
pub mod model;
pub mod scaler;

pub use labels::{
    AmbiguityIssue, GroupVote, LabelAmbiguityReport, LabelGroup, LabelMap, LabelResolver,
    VotePolicy,
};
pub use matrix::FeatureMatrix;
pub use model::{ClusterFit, ClusterModel, FittedClusters};
pub use scaler::StandardScaler;
