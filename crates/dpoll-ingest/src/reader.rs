//! Dataset readers.

use std::path::{Path, PathBuf};

use dpoll_model::{AnalysisOptions, SurveyData};

use crate::codebook::{codebook_path_for, load_codebook};
use crate::csv::read_csv_frame;
use crate::error::Result;
use crate::normalize::normalize_columns;

/// A dataset together with the analysis options found alongside it.
#[derive(Debug, Clone)]
pub struct LoadedSurvey {
    pub survey: SurveyData,
    pub options: AnalysisOptions,
}

/// Reads a statistical dataset into records plus raw declarations.
pub trait DatasetReader {
    fn read(&self, path: &Path) -> Result<LoadedSurvey>;
}

/// Reads a CSV file described by a TOML codebook.
///
/// Without an explicit codebook path the sidecar `<stem>.codebook.toml`
/// next to the CSV is used.
#[derive(Debug, Clone, Default)]
pub struct CodebookCsvReader {
    codebook: Option<PathBuf>,
}

impl CodebookCsvReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codebook(mut self, path: impl Into<PathBuf>) -> Self {
        self.codebook = Some(path.into());
        self
    }

    fn codebook_path(&self, data_path: &Path) -> PathBuf {
        self.codebook
            .clone()
            .unwrap_or_else(|| codebook_path_for(data_path))
    }
}

impl DatasetReader for CodebookCsvReader {
    fn read(&self, path: &Path) -> Result<LoadedSurvey> {
        let codebook_path = self.codebook_path(path);
        let codebook = load_codebook(&codebook_path)?;
        let raw = read_csv_frame(path)?;

        let mut variables = codebook.variables;
        let data = normalize_columns(&raw, &mut variables)?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset".to_string());

        tracing::info!(
            dataset = %name,
            rows = data.height(),
            columns = data.width(),
            variables = variables.len(),
            "dataset loaded"
        );

        Ok(LoadedSurvey {
            survey: SurveyData::new(name, data, variables),
            options: codebook.options,
        })
    }
}
