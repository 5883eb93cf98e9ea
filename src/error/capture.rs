// Capture loading error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;
use std::path::PathBuf;

/// Capture error code constants
///
/// Error code range: 1001-1006
pub struct CaptureErrorCodes {}

impl CaptureErrorCodes {
    /// Capture file does not exist
    pub const FILE_NOT_FOUND: i32 = 1001;

    /// Capture file exists but could not be read
    pub const READ_FAILED: i32 = 1002;

    /// Files were read but produced no complex samples
    pub const EMPTY_CAPTURE: i32 = 1003;

    /// Load requested with an empty path list
    pub const NO_FILES: i32 = 1004;

    /// Sample type name not recognized
    pub const INVALID_SAMPLE_TYPE: i32 = 1005;

    /// Capture file could not be written
    pub const WRITE_FAILED: i32 = 1006;
}

/// Log a capture error with structured context
///
/// Logs the numeric code, the component and the message (which carries the
/// offending path) so a skipped capture can be localized in batch logs.
pub fn log_capture_error(err: &CaptureError, context: &str) {
    error!(
        "Capture error in {}: code={}, component=SignalLoader, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Capture-related errors
///
/// These errors are fatal for the capture being loaded. No partially loaded
/// capture is ever returned.
///
/// Error code ranges: 1001-1006
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// Capture file does not exist
    FileNotFound { path: PathBuf },

    /// Capture file could not be opened or read
    ReadFailed { path: PathBuf, reason: String },

    /// Files held fewer than one complete real/imaginary pair
    EmptyCapture { paths: Vec<PathBuf> },

    /// No file paths were supplied
    NoFiles,

    /// Unknown sample type name
    InvalidSampleType { name: String },

    /// Capture file could not be created or written
    WriteFailed { path: PathBuf, reason: String },
}

impl CaptureError {
    /// Classify an I/O failure for the given path
    pub fn from_io(path: PathBuf, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            CaptureError::FileNotFound { path }
        } else {
            CaptureError::ReadFailed {
                path,
                reason: err.to_string(),
            }
        }
    }
}

impl ErrorCode for CaptureError {
    fn code(&self) -> i32 {
        match self {
            CaptureError::FileNotFound { .. } => CaptureErrorCodes::FILE_NOT_FOUND,
            CaptureError::ReadFailed { .. } => CaptureErrorCodes::READ_FAILED,
            CaptureError::EmptyCapture { .. } => CaptureErrorCodes::EMPTY_CAPTURE,
            CaptureError::NoFiles => CaptureErrorCodes::NO_FILES,
            CaptureError::InvalidSampleType { .. } => CaptureErrorCodes::INVALID_SAMPLE_TYPE,
            CaptureError::WriteFailed { .. } => CaptureErrorCodes::WRITE_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            CaptureError::FileNotFound { path } => {
                format!("Capture file not found: {}", path.display())
            }
            CaptureError::ReadFailed { path, reason } => {
                format!("Failed to read capture {}: {}", path.display(), reason)
            }
            CaptureError::EmptyCapture { paths } => {
                let joined = paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Capture contains no complex samples: [{}]", joined)
            }
            CaptureError::NoFiles => "No capture files supplied".to_string(),
            CaptureError::InvalidSampleType { name } => {
                format!(
                    "Unknown sample type '{}' (expected f32, f64, i16, i8 or u8)",
                    name
                )
            }
            CaptureError::WriteFailed { path, reason } => {
                format!("Failed to write capture {}: {}", path.display(), reason)
            }
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CaptureError::{} (code {}): {}",
            self.variant_name(),
            self.code(),
            self.message()
        )
    }
}

impl CaptureError {
    fn variant_name(&self) -> &'static str {
        match self {
            CaptureError::FileNotFound { .. } => "FileNotFound",
            CaptureError::ReadFailed { .. } => "ReadFailed",
            CaptureError::EmptyCapture { .. } => "EmptyCapture",
            CaptureError::NoFiles => "NoFiles",
            CaptureError::InvalidSampleType { .. } => "InvalidSampleType",
            CaptureError::WriteFailed { .. } => "WriteFailed",
        }
    }
}

impl std::error::Error for CaptureError {}
