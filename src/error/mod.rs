// Error types for the RF fingerprinting pipeline
//
// This module defines custom error types for capture loading, cluster model
// usage and label resolution, each carrying a stable numeric code so batch
// orchestrators can skip or report failures per capture.

mod capture;
mod label;
mod model;

use std::fmt;

pub use capture::{log_capture_error, CaptureError, CaptureErrorCodes};
pub use label::{log_label_error, LabelError, LabelErrorCodes};
pub use model::{log_model_error, ModelError, ModelErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the library and CLI.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Errors surfaced by the end-to-end training and classification entry points
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Capture(CaptureError),
    Model(ModelError),
    Label(LabelError),
}

impl ErrorCode for PipelineError {
    fn code(&self) -> i32 {
        match self {
            PipelineError::Capture(err) => err.code(),
            PipelineError::Model(err) => err.code(),
            PipelineError::Label(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            PipelineError::Capture(err) => err.message(),
            PipelineError::Model(err) => err.message(),
            PipelineError::Label(err) => err.message(),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Capture(err) => err.fmt(f),
            PipelineError::Model(err) => err.fmt(f),
            PipelineError::Label(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Capture(err) => Some(err),
            PipelineError::Model(err) => Some(err),
            PipelineError::Label(err) => Some(err),
        }
    }
}

impl From<CaptureError> for PipelineError {
    fn from(err: CaptureError) -> Self {
        PipelineError::Capture(err)
    }
}

impl From<ModelError> for PipelineError {
    fn from(err: ModelError) -> Self {
        PipelineError::Model(err)
    }
}

impl From<LabelError> for PipelineError {
    fn from(err: LabelError) -> Self {
        PipelineError::Label(err)
    }
}
