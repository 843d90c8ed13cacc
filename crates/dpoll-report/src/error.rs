use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("spreadsheet error in {path}: {source}")]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("document package error in {path}: {source}")]
    Package {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("document markup error: {message}")]
    Markup { message: String },

    #[error("manifest serialization failed: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
