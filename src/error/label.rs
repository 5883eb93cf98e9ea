// Label resolution error types and constants

use crate::clustering::labels::LabelAmbiguityReport;
use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Label error code constants
///
/// Error code range: 3001-3004
pub struct LabelErrorCodes {}

impl LabelErrorCodes {
    /// Majority votes tied, fell short of the policy or collided
    pub const AMBIGUOUS: i32 = 3001;

    /// A group's row range exceeds the assignment list
    pub const GROUP_OUT_OF_RANGE: i32 = 3002;

    /// An assignment references a cluster >= k
    pub const CLUSTER_OUT_OF_RANGE: i32 = 3003;

    /// Two groups claim the same training row
    pub const OVERLAPPING_GROUPS: i32 = 3004;
}

/// Log a label resolution error with structured context
pub fn log_label_error(err: &LabelError, context: &str) {
    error!(
        "Label error in {}: code={}, component=LabelResolver, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Label resolution errors
///
/// Error code ranges: 3001-3004
#[derive(Debug, Clone, PartialEq)]
pub enum LabelError {
    /// Votes could not be turned into an injective cluster -> label map
    Ambiguous(LabelAmbiguityReport),

    /// Group boundaries reach past the training rows
    GroupOutOfRange {
        label: String,
        end: usize,
        rows: usize,
    },

    /// Assignment outside 0..k
    ClusterOutOfRange { row: usize, cluster: usize, k: usize },

    /// Two group ranges share at least one row
    OverlappingGroups { first: String, second: String },
}

impl ErrorCode for LabelError {
    fn code(&self) -> i32 {
        match self {
            LabelError::Ambiguous(_) => LabelErrorCodes::AMBIGUOUS,
            LabelError::GroupOutOfRange { .. } => LabelErrorCodes::GROUP_OUT_OF_RANGE,
            LabelError::ClusterOutOfRange { .. } => LabelErrorCodes::CLUSTER_OUT_OF_RANGE,
            LabelError::OverlappingGroups { .. } => LabelErrorCodes::OVERLAPPING_GROUPS,
        }
    }

    fn message(&self) -> String {
        match self {
            LabelError::Ambiguous(report) => {
                format!("Ambiguous label resolution: {}", report)
            }
            LabelError::GroupOutOfRange { label, end, rows } => {
                format!(
                    "Group '{}' ends at row {} but only {} rows were assigned",
                    label, end, rows
                )
            }
            LabelError::ClusterOutOfRange { row, cluster, k } => {
                format!("Row {} assigned to cluster {} (k = {})", row, cluster, k)
            }
            LabelError::OverlappingGroups { first, second } => {
                format!("Groups '{}' and '{}' share training rows", first, second)
            }
        }
    }
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            LabelError::Ambiguous(_) => "Ambiguous",
            LabelError::GroupOutOfRange { .. } => "GroupOutOfRange",
            LabelError::ClusterOutOfRange { .. } => "ClusterOutOfRange",
            LabelError::OverlappingGroups { .. } => "OverlappingGroups",
        };
        write!(
            f,
            "LabelError::{} (code {}): {}",
            variant,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for LabelError {}
