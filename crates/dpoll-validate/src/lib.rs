//! Validation gate for survey datasets.
//!
//! Checks the raw variable declarations against the dataset before any
//! statistic is computed:
//!
//! - **Structure**: variable names, duplicate declarations, missing and
//!   undeclared columns
//! - **Roles**: exactly one Identifier, TimeMarker and GroupMarker; role and
//!   measurement level agree
//! - **Labels**: every Ordinal/Nominal variable has a label and every observed
//!   code has a value label
//! - **Design**: no missing design values; at least one ordinal variable and
//!   one (group, time) pair
//! - **Weights**: weight values are finite and non-negative
//!
//! Every check runs; the report lists all issues at once.
//!
//! # Example
//!
//! ```ignore
//! let report = dpoll_validate::validate(&survey, &options);
//! let report = report.into_result()?; // ValidationFailure lists every error
//! ```

mod category;
pub mod checks;
mod issue;
mod json;
mod report;

use dpoll_model::{AnalysisOptions, SurveyData};

pub use category::Category;
pub use issue::{Issue, Severity};
pub use json::{
    ReportWriteError, ValidationIssueJson, ValidationReportPayload, validation_report_file_name,
    write_validation_report_json,
};
pub use report::{ValidationFailure, ValidationReport};

/// Runs every check against `data`.
pub fn validate(data: &SurveyData, options: &AnalysisOptions) -> ValidationReport {
    let mut report = ValidationReport::new(data.name.clone());

    report.extend(checks::structure::check_names(data));
    report.extend(checks::structure::check_columns(data));
    report.extend(checks::roles::check_design_roles(&data.variables));
    report.extend(checks::roles::check_role_levels(&data.variables));
    report.extend(checks::labels::check_column_labels(data));
    report.extend(checks::labels::check_value_labels(data));
    report.extend(checks::design::check_design_values(data));
    report.extend(checks::design::check_design(data));
    report.extend(checks::weights::check_weight_values(data, options));
    report.extend(checks::weights::check_weight_selection(data, options));
    report.extend(checks::labels::check_sentinels(data, options));

    tracing::debug!(
        dataset = %data.name,
        errors = report.error_count(),
        warnings = report.warning_count(),
        "validation checks complete"
    );
    report
}
