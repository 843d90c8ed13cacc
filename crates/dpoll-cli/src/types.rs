use std::path::PathBuf;

use dpoll_model::{ComparisonTable, Design, DistributionTable};
use dpoll_report::WrittenOutputs;
use dpoll_validate::ValidationReport;

/// Result of a successful `outputs` run.
#[derive(Debug)]
pub struct RunSummary {
    pub dataset: String,
    pub rows: usize,
    pub units: usize,
    pub design: Design,
    pub tables: usize,
    /// Validation passed; the report holds warnings only.
    pub validation: ValidationReport,
    pub outputs: WrittenOutputs,
}

/// Result of a `check` run.
#[derive(Debug)]
pub struct CheckSummary {
    pub dataset: String,
    pub rows: usize,
    pub report: ValidationReport,
    pub report_path: PathBuf,
}

/// Aggregation progress reported after each completed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationProgress {
    pub completed: usize,
    pub total: usize,
}

/// Everything the aggregate stage computed, each list in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedTables {
    pub comparisons: Vec<ComparisonTable>,
    pub distributions: Vec<DistributionTable>,
}

impl AggregatedTables {
    pub fn len(&self) -> usize {
        self.comparisons.len() + self.distributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
