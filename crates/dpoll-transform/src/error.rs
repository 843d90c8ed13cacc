use std::fmt;

use thiserror::Error;

use dpoll_model::ModelError;

/// A data-integrity problem found while aligning records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// The same identifier appears more than once at one time point.
    DuplicateObservation {
        identifier: String,
        time: String,
        rows: Vec<usize>,
    },
    /// One identifier is recorded in different groups.
    GroupConflict {
        identifier: String,
        groups: Vec<String>,
        rows: Vec<usize>,
    },
}

fn join_rows(rows: &[usize]) -> String {
    rows.iter().map(usize::to_string).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateObservation {
                identifier,
                time,
                rows,
            } => write!(
                f,
                "respondent {identifier} has {} observations at {time} (rows {})",
                rows.len(),
                join_rows(rows)
            ),
            Self::GroupConflict {
                identifier,
                groups,
                rows,
            } => write!(
                f,
                "respondent {identifier} is recorded in groups {} (rows {})",
                groups.join(", "),
                join_rows(rows)
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A design cell is null; the validator normally rejects this first.
    #[error("design variable '{variable}' is missing at row {row}")]
    DesignValueMissing { variable: String, row: usize },

    #[error("{} data-integrity error(s):{}", .0.len(), render_issues(.0))]
    Integrity(Vec<IntegrityIssue>),

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

fn render_issues(issues: &[IntegrityIssue]) -> String {
    issues.iter().map(|i| format!("\n  - {i}")).collect()
}

impl From<polars::prelude::PolarsError> for TransformError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
