//! TOML codebook describing each variable of a CSV dataset.
//!
//! ```toml
//! [codebook]
//! schema = "dpoll.codebook"
//! schema_version = 1
//!
//! [analysis]
//! missing_codes = [98, 99]
//!
//! [[variables]]
//! name = "Q1"
//! label = "Support for the proposal"
//! measure = "ordinal"
//!
//! [variables.value_labels]
//! 0 = "Strongly oppose"
//! 10 = "Strongly support"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use dpoll_model::{AnalysisOptions, Code, MeasurementLevel, Variable, VariableRole, infer_role};

use crate::error::{IngestError, Result};

pub const CODEBOOK_SCHEMA: &str = "dpoll.codebook";
pub const CODEBOOK_SCHEMA_VERSION: u32 = 1;

/// Sidecar codebook path for a dataset: `<stem>.codebook.toml`.
pub fn codebook_path_for(data_path: &Path) -> PathBuf {
    let stem = data_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    data_path.with_file_name(format!("{stem}.codebook.toml"))
}

#[derive(Debug, Deserialize)]
struct CodebookFile {
    codebook: CodebookHeader,
    #[serde(default)]
    analysis: AnalysisOptions,
    #[serde(default)]
    variables: Vec<VariableEntry>,
}

#[derive(Debug, Deserialize)]
struct CodebookHeader {
    schema: String,
    schema_version: u32,
}

#[derive(Debug, Deserialize)]
struct VariableEntry {
    name: String,
    #[serde(default)]
    label: String,
    measure: String,
    role: Option<String>,
    #[serde(default)]
    value_labels: BTreeMap<String, String>,
}

/// Variable declarations and analysis options read from a codebook.
#[derive(Debug, Clone)]
pub struct Codebook {
    pub variables: Vec<Variable>,
    pub options: AnalysisOptions,
}

/// Loads and checks a codebook file.
pub fn load_codebook(path: &Path) -> Result<Codebook> {
    let contents = std::fs::read_to_string(path).map_err(|e| IngestError::io(path, e))?;
    parse_codebook(&contents, path)
}

/// Parses codebook text; `path` is used for error messages only.
pub fn parse_codebook(contents: &str, path: &Path) -> Result<Codebook> {
    let file: CodebookFile = toml::from_str(contents).map_err(|e| IngestError::CodebookParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    if file.codebook.schema != CODEBOOK_SCHEMA {
        return Err(IngestError::CodebookSchema {
            path: path.to_path_buf(),
            message: format!("unsupported schema: {}", file.codebook.schema),
        });
    }
    if file.codebook.schema_version != CODEBOOK_SCHEMA_VERSION {
        return Err(IngestError::CodebookSchema {
            path: path.to_path_buf(),
            message: format!("unsupported schema_version: {}", file.codebook.schema_version),
        });
    }

    let variables = file
        .variables
        .into_iter()
        .map(|entry| build_variable(entry, path))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        path = %path.display(),
        variables = variables.len(),
        "loaded codebook"
    );

    Ok(Codebook {
        variables,
        options: file.analysis,
    })
}

fn build_variable(entry: VariableEntry, path: &Path) -> Result<Variable> {
    let invalid = |field: &str, value: &str| IngestError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        variable: entry.name.clone(),
        path: path.to_path_buf(),
    };

    let level = MeasurementLevel::parse(&entry.measure).ok_or_else(|| invalid("measure", &entry.measure))?;

    let role = match entry.role.as_deref().map(str::trim) {
        None => infer_role(&entry.name, level),
        Some("" | "none") => None,
        Some(text) => Some(VariableRole::parse(text).ok_or_else(|| invalid("role", text))?),
    };

    let mut value_labels = BTreeMap::new();
    for (key, label) in &entry.value_labels {
        let code: Code = key.parse().map_err(|_| invalid("value label code", key))?;
        if value_labels.insert(code, label.clone()).is_some() {
            return Err(invalid("duplicate value label code", key));
        }
    }

    Ok(Variable {
        name: entry.name.clone(),
        label: entry.label.clone(),
        role,
        level,
        value_labels,
    })
}
