// Cluster model error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Model error code constants
///
/// Error code range: 2001-2007
pub struct ModelErrorCodes {}

impl ModelErrorCodes {
    /// predict() called before fit()
    pub const NOT_FITTED: i32 = 2001;

    /// Feature vector length differs from the fitted width
    pub const DIMENSION_MISMATCH: i32 = 2002;

    /// Fewer training rows than clusters
    pub const INSUFFICIENT_ROWS: i32 = 2003;

    /// Configuration cannot be run
    pub const INVALID_CONFIG: i32 = 2004;

    /// Matrix has no rows or no columns
    pub const EMPTY_MATRIX: i32 = 2005;

    /// Row length differs from the matrix width
    pub const RAGGED_ROW: i32 = 2006;

    /// Feature value is NaN or infinite
    pub const NON_FINITE_FEATURE: i32 = 2007;
}

/// Log a model error with structured context
pub fn log_model_error(err: &ModelError, context: &str) {
    error!(
        "Model error in {}: code={}, component=ClusterModel, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Cluster model usage and configuration errors
///
/// These are structural errors: they are surfaced to the caller immediately
/// and never coerced into a default assignment.
///
/// Error code ranges: 2001-2007
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Model has not been fitted yet
    NotFitted,

    /// Feature vector width does not match the fitted model
    DimensionMismatch { expected: usize, actual: usize },

    /// Not enough training rows for the requested cluster count
    InsufficientRows { required: usize, available: usize },

    /// Invalid pipeline configuration
    InvalidConfig { reason: String },

    /// Matrix without rows or columns
    EmptyMatrix,

    /// A row does not match the matrix width
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A feature value is NaN or infinite; such rows have no nearest centroid
    NonFiniteFeature { row: usize, column: usize },
}

impl ErrorCode for ModelError {
    fn code(&self) -> i32 {
        match self {
            ModelError::NotFitted => ModelErrorCodes::NOT_FITTED,
            ModelError::DimensionMismatch { .. } => ModelErrorCodes::DIMENSION_MISMATCH,
            ModelError::InsufficientRows { .. } => ModelErrorCodes::INSUFFICIENT_ROWS,
            ModelError::InvalidConfig { .. } => ModelErrorCodes::INVALID_CONFIG,
            ModelError::EmptyMatrix => ModelErrorCodes::EMPTY_MATRIX,
            ModelError::RaggedRow { .. } => ModelErrorCodes::RAGGED_ROW,
            ModelError::NonFiniteFeature { .. } => ModelErrorCodes::NON_FINITE_FEATURE,
        }
    }

    fn message(&self) -> String {
        match self {
            ModelError::NotFitted => "Cluster model not fitted. Call fit() first.".to_string(),
            ModelError::DimensionMismatch { expected, actual } => {
                format!(
                    "Feature vector length mismatch: expected {}, got {}",
                    expected, actual
                )
            }
            ModelError::InsufficientRows {
                required,
                available,
            } => {
                format!(
                    "Insufficient training rows: need at least {}, got {}",
                    required, available
                )
            }
            ModelError::InvalidConfig { reason } => {
                format!("Invalid configuration: {}", reason)
            }
            ModelError::EmptyMatrix => "Feature matrix is empty".to_string(),
            ModelError::RaggedRow {
                row,
                expected,
                actual,
            } => {
                format!(
                    "Row {} has {} columns, expected {}",
                    row, actual, expected
                )
            }
            ModelError::NonFiniteFeature { row, column } => {
                format!("Row {} has a non-finite value in column {}", row, column)
            }
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModelError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ModelError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_codes() {
        assert_eq!(ModelError::NotFitted.code(), ModelErrorCodes::NOT_FITTED);
        assert_eq!(
            ModelError::DimensionMismatch {
                expected: 19,
                actual: 3
            }
            .code(),
            ModelErrorCodes::DIMENSION_MISMATCH
        );
        assert_eq!(
            ModelError::InsufficientRows {
                required: 4,
                available: 2
            }
            .code(),
            ModelErrorCodes::INSUFFICIENT_ROWS
        );
        assert_eq!(
            ModelError::InvalidConfig {
                reason: "test".to_string()
            }
            .code(),
            ModelErrorCodes::INVALID_CONFIG
        );
        assert_eq!(ModelError::EmptyMatrix.code(), ModelErrorCodes::EMPTY_MATRIX);
        assert_eq!(
            ModelError::RaggedRow {
                row: 1,
                expected: 2,
                actual: 3
            }
            .code(),
            ModelErrorCodes::RAGGED_ROW
        );
        assert_eq!(
            ModelError::NonFiniteFeature { row: 0, column: 6 }.code(),
            ModelErrorCodes::NON_FINITE_FEATURE
        );
    }

    #[test]
    fn test_model_error_messages() {
        let err = ModelError::InsufficientRows {
            required: 4,
            available: 2,
        };
        assert_eq!(
            err.message(),
            "Insufficient training rows: need at least 4, got 2"
        );

        let err = ModelError::DimensionMismatch {
            expected: 19,
            actual: 18,
        };
        assert!(err.message().contains("expected 19"));
        assert!(err.message().contains("got 18"));

        assert!(ModelError::NotFitted.message().contains("not fitted"));
    }

    #[test]
    fn test_model_error_display() {
        let err = ModelError::NotFitted;
        let display = format!("{}", err);
        assert!(display.contains("ModelError"));
        assert!(display.contains(&err.code().to_string()));
    }
}
