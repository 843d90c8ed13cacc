//! Dataset processing pipeline with explicit stages.
//!
//! The pipeline follows these stages in order:
//! 1. **Ingest**: read the CSV dataset and its codebook
//! 2. **Validate**: run every check; any error stops the run
//! 3. **Reshape**: extract respondent records and align them into matched units
//! 4. **Aggregate**: compute every comparison and distribution table
//! 5. **Assemble**: lay tables out as labeled rows and columns and build the
//!    prose reports
//! 6. **Write**: spreadsheet and document files plus `manifest.json`
//!
//! Each stage takes the output of the previous stage and returns typed
//! results. Nothing is written under `Outputs/` unless validation passes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use thiserror::Error;
use tracing::{info, info_span, warn};

use dpoll_aggregate::{
    AggregateError, aggregate_all_with_progress, aggregate_distributions_with_progress,
    plan_distributions, plan_tables,
};
use dpoll_ingest::{CodebookCsvReader, DatasetReader, IngestError, LoadedSurvey};
use dpoll_model::{AnalysisOptions, Metadata, ModelError, SurveyData};
use dpoll_report::{
    OutputTableSet, ReportError, WrittenOutputs, assemble, assemble_distributions, write_outputs,
};
use dpoll_transform::{Reshaped, TransformError, extract_records, reshape};
use dpoll_validate::{ReportWriteError, ValidationFailure, ValidationReport};

use crate::types::{AggregatedTables, AggregationProgress, CheckSummary, RunSummary};

/// Directory under the dataset's folder that holds one subdirectory per dataset.
pub const OUTPUTS_DIR: &str = "Outputs";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Lists every validation error.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    ValidationReport(#[from] ReportWriteError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl PipelineError {
    /// The validation report when the run stopped at the gate.
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation(failure) => Some(&failure.report),
            _ => None,
        }
    }
}

/// `<dataset dir>/Outputs/<dataset stem>/`.
pub fn output_dir_for(dataset: &Path) -> PathBuf {
    let stem = dataset
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    dataset_dir(dataset).join(OUTPUTS_DIR).join(stem)
}

fn dataset_dir(dataset: &Path) -> PathBuf {
    dataset
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

// ============================================================================
// Stage 1: Ingest
// ============================================================================

pub fn ingest(path: &Path) -> Result<LoadedSurvey, PipelineError> {
    let span = info_span!("ingest", path = %path.display());
    let _guard = span.enter();
    let start = Instant::now();
    let loaded = CodebookCsvReader::new().read(path)?;
    info!(
        rows = loaded.survey.row_count(),
        variables = loaded.survey.variables.len(),
        duration_ms = start.elapsed().as_millis(),
        "ingest complete"
    );
    Ok(loaded)
}

// ============================================================================
// Stage 2: Validate
// ============================================================================

/// Runs the validation gate.
///
/// On failure the JSON report is written into `report_dir` and the error
/// carries the full report.
pub fn validate(
    survey: &SurveyData,
    options: &AnalysisOptions,
    report_dir: &Path,
) -> Result<ValidationReport, PipelineError> {
    let span = info_span!("validate", dataset = %survey.name);
    let _guard = span.enter();
    let start = Instant::now();
    let report = dpoll_validate::validate(survey, options);
    for issue in report.warnings() {
        warn!(variable = issue.variable().unwrap_or("-"), "{}", issue.message());
    }
    info!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        duration_ms = start.elapsed().as_millis(),
        "validation complete"
    );
    if report.has_errors() {
        let path = dpoll_validate::write_validation_report_json(report_dir, &report)?;
        info!(path = %path.display(), "validation report written");
    }
    Ok(report.into_result()?)
}

// ============================================================================
// Stage 3: Reshape
// ============================================================================

pub fn reshape_survey(survey: &SurveyData, metadata: &Metadata) -> Result<Reshaped, PipelineError> {
    let span = info_span!("reshape", dataset = %survey.name);
    let _guard = span.enter();
    let start = Instant::now();
    let records = extract_records(survey, metadata)?;
    let reshaped = reshape(&records, metadata)?;
    info!(
        records = records.len(),
        units = reshaped.len(),
        times = reshaped.design.times.len(),
        groups = reshaped.design.groups.len(),
        duration_ms = start.elapsed().as_millis(),
        "reshape complete"
    );
    Ok(reshaped)
}

// ============================================================================
// Stage 4: Aggregate
// ============================================================================

pub fn aggregate<F>(
    reshaped: &Reshaped,
    metadata: &Metadata,
    options: &AnalysisOptions,
    on_progress: F,
) -> Result<AggregatedTables, PipelineError>
where
    F: Fn(AggregationProgress) + Sync,
{
    let span = info_span!("aggregate");
    let _guard = span.enter();
    let start = Instant::now();
    let requests = plan_tables(metadata, options);
    let distribution_requests = plan_distributions(metadata, options);
    let total = requests.len() + distribution_requests.len();
    let completed = AtomicUsize::new(0);
    let tick = || {
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        on_progress(AggregationProgress {
            completed: done,
            total,
        });
    };
    on_progress(AggregationProgress {
        completed: 0,
        total,
    });
    let comparisons = aggregate_all_with_progress(
        &reshaped.units,
        &reshaped.design,
        metadata,
        &requests,
        options,
        |_| tick(),
    )?;
    let distributions = aggregate_distributions_with_progress(
        &reshaped.units,
        &reshaped.design,
        metadata,
        &distribution_requests,
        options,
        |_| tick(),
    )?;
    info!(
        tables = comparisons.len(),
        distributions = distributions.len(),
        duration_ms = start.elapsed().as_millis(),
        "aggregation complete"
    );
    Ok(AggregatedTables {
        comparisons,
        distributions,
    })
}

// ============================================================================
// Stage 5: Assemble
// ============================================================================

pub fn assemble_tables(
    tables: &AggregatedTables,
    metadata: &Metadata,
    options: &AnalysisOptions,
) -> OutputTableSet {
    let span = info_span!("assemble");
    let _guard = span.enter();
    let start = Instant::now();
    let mut set = assemble(&tables.comparisons, metadata, options);
    set.tables
        .extend(assemble_distributions(&tables.distributions, metadata));
    info!(
        tables = set.len(),
        reports = set.reports.len(),
        cells = set.iter().map(|t| t.cell_count).sum::<usize>(),
        duration_ms = start.elapsed().as_millis(),
        "assembly complete"
    );
    set
}

// ============================================================================
// Stage 6: Write
// ============================================================================

pub fn write(set: &OutputTableSet, dir: &Path) -> Result<WrittenOutputs, PipelineError> {
    let span = info_span!("write", dir = %dir.display());
    let _guard = span.enter();
    let start = Instant::now();
    let written = write_outputs(set, dir)?;
    info!(
        files = written.manifest.files.len(),
        duration_ms = start.elapsed().as_millis(),
        "write complete"
    );
    Ok(written)
}

// ============================================================================
// Entry points
// ============================================================================

/// Produces every table and prose report for the dataset at `path`.
///
/// Files go to `<dataset dir>/Outputs/<dataset stem>/`. When validation fails
/// the only file written is `<stem>.validation.json` next to the dataset.
pub fn outputs(path: &Path) -> Result<RunSummary, PipelineError> {
    outputs_with_progress(path, |_| {})
}

/// Like [`outputs`], reporting aggregation progress to `on_progress`.
pub fn outputs_with_progress<F>(path: &Path, on_progress: F) -> Result<RunSummary, PipelineError>
where
    F: Fn(AggregationProgress) + Sync,
{
    let span = info_span!("outputs", path = %path.display());
    let _guard = span.enter();
    let start = Instant::now();

    let LoadedSurvey { survey, options } = ingest(path)?;
    let validation = validate(&survey, &options, &dataset_dir(path))?;
    let metadata = Metadata::new(survey.variables.clone())?;
    let reshaped = reshape_survey(&survey, &metadata)?;
    let tables = aggregate(&reshaped, &metadata, &options, on_progress)?;
    let set = assemble_tables(&tables, &metadata, &options);
    let written = write(&set, &output_dir_for(path))?;

    info!(
        dataset = %survey.name,
        tables = set.len(),
        files = written.manifest.files.len(),
        duration_ms = start.elapsed().as_millis(),
        "pipeline complete"
    );
    Ok(RunSummary {
        dataset: survey.name.clone(),
        rows: survey.row_count(),
        units: reshaped.len(),
        design: reshaped.design.clone(),
        tables: set.len(),
        validation,
        outputs: written,
    })
}

/// Validates the dataset at `path` and writes the JSON report next to it,
/// whatever the outcome.
pub fn check(path: &Path) -> Result<CheckSummary, PipelineError> {
    let span = info_span!("check", path = %path.display());
    let _guard = span.enter();
    let LoadedSurvey { survey, options } = ingest(path)?;
    let report = dpoll_validate::validate(&survey, &options);
    let report_path = dpoll_validate::write_validation_report_json(&dataset_dir(path), &report)?;
    info!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        path = %report_path.display(),
        "check complete"
    );
    Ok(CheckSummary {
        dataset: survey.name.clone(),
        rows: survey.row_count(),
        report,
        report_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_sits_beside_the_dataset() {
        assert_eq!(
            output_dir_for(Path::new("/data/poll.csv")),
            PathBuf::from("/data/Outputs/poll")
        );
        assert_eq!(
            output_dir_for(Path::new("poll.csv")),
            PathBuf::from("./Outputs/poll")
        );
    }
}
