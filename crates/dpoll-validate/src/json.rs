//! JSON export of a validation report.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::category::Category;
use crate::issue::Severity;
use crate::report::ValidationReport;

const REPORT_SCHEMA: &str = "dpoll.validation-report";
const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ReportWriteError {
    #[error("failed to write validation report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize validation report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
pub struct ValidationReportPayload<'a> {
    pub schema: &'static str,
    pub schema_version: u32,
    pub generated_at: String,
    pub dataset: &'a str,
    pub error_count: usize,
    pub warning_count: usize,
    pub issues: Vec<ValidationIssueJson>,
}

#[derive(Debug, Serialize)]
pub struct ValidationIssueJson {
    pub severity: Severity,
    pub category: Category,
    pub variable: Option<String>,
    pub message: String,
    pub count: Option<u64>,
}

/// File name of the JSON report for a dataset.
pub fn validation_report_file_name(dataset: &str) -> String {
    format!("{dataset}.validation.json")
}

/// Writes `<dataset>.validation.json` into `output_dir`, errors first.
pub fn write_validation_report_json(
    output_dir: &Path,
    report: &ValidationReport,
) -> Result<PathBuf, ReportWriteError> {
    let output_path = output_dir.join(validation_report_file_name(&report.dataset));
    let payload = ValidationReportPayload {
        schema: REPORT_SCHEMA,
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at: Utc::now().to_rfc3339(),
        dataset: &report.dataset,
        error_count: report.error_count(),
        warning_count: report.warning_count(),
        issues: report
            .sorted_by_severity()
            .into_iter()
            .map(|issue| ValidationIssueJson {
                severity: issue.severity(),
                category: issue.category(),
                variable: issue.variable().map(str::to_string),
                message: issue.message(),
                count: issue.count(),
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&payload)?;
    std::fs::create_dir_all(output_dir).map_err(|source| ReportWriteError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    std::fs::write(&output_path, format!("{json}\n")).map_err(|source| ReportWriteError::Io {
        path: output_path.clone(),
        source,
    })?;
    Ok(output_path)
}
