//! Error types for survey ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a dataset and its codebook.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Dataset or codebook file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Parsing Errors ===
    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV file has no data rows.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// A header cell is blank.
    #[error("CSV file has an empty column name: {path}")]
    EmptyColumnName { path: PathBuf },

    // === Codebook Errors ===
    /// Codebook is not valid TOML for the expected structure.
    #[error("failed to parse codebook {path}: {source}")]
    CodebookParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Codebook header names another schema or version.
    #[error("unsupported codebook {path}: {message}")]
    CodebookSchema { path: PathBuf, message: String },

    /// Invalid value in a codebook field.
    #[error("invalid {field} value '{value}' for variable '{variable}' in {path}")]
    InvalidValue {
        field: String,
        value: String,
        variable: String,
        path: PathBuf,
    },

    // === Column Errors ===
    /// Text found in a column that must be numeric.
    #[error("variable '{variable}' has non-numeric values: {}", samples.join(", "))]
    NonNumeric {
        variable: String,
        count: usize,
        samples: Vec<String>,
    },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl IngestError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::FileRead {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::NonNumeric {
            variable: "Q1".to_string(),
            count: 2,
            samples: vec!["agree".to_string(), "n/a".to_string()],
        };
        assert_eq!(err.to_string(), "variable 'Q1' has non-numeric values: agree, n/a");
    }

    #[test]
    fn test_not_found_maps_to_file_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = IngestError::io(std::path::Path::new("/tmp/x.csv"), io);
        assert!(matches!(err, IngestError::FileNotFound { .. }));
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }
}
