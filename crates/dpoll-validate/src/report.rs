//! Validation report containing all issues for a dataset.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::issue::{Issue, Severity};

/// Validation report for a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub dataset: String,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    /// Create an empty report for a dataset.
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            issues: Vec::new(),
        }
    }

    pub fn add(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Issues with errors first; order within a severity is preserved.
    pub fn sorted_by_severity(&self) -> Vec<&Issue> {
        let mut issues: Vec<_> = self.issues.iter().collect();
        issues.sort_by_key(|i| i.severity());
        issues
    }

    /// `Ok` when there are no errors, warnings included.
    pub fn into_result(self) -> Result<ValidationReport, ValidationFailure> {
        if self.has_errors() {
            Err(ValidationFailure { report: self })
        } else {
            Ok(self)
        }
    }
}

/// A report with at least one error; displays every error, numbered.
#[derive(Debug, Clone, Error)]
#[error("{}", render_failure(.report))]
pub struct ValidationFailure {
    pub report: ValidationReport,
}

fn render_failure(report: &ValidationReport) -> String {
    let count = report.error_count();
    let mut out = format!(
        "validation of '{}' failed with {} error{}:",
        report.dataset,
        count,
        if count == 1 { "" } else { "s" }
    );
    for (index, issue) in report.errors().enumerate() {
        out.push_str(&format!("\n  {}. {}", index + 1, issue.message()));
    }
    out
}
