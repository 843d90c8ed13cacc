//! Analysis options threaded through every pipeline stage.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::code::Code;

/// Rich-document output is only produced for tables with fewer populated
/// cells than this.
pub const DOCUMENT_CELL_LIMIT: usize = 50_000;

/// Options controlling validation and aggregation.
///
/// Read from the `[analysis]` table of the codebook; every field has a
/// default so the table may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Missing-data sentinels for every Ordinal and Nominal variable.
    /// Empty by default: no code is assumed to mean "missing".
    pub missing_codes: Vec<Code>,

    /// Extra sentinels per variable, added to `missing_codes`.
    pub variable_missing_codes: BTreeMap<String, Vec<Code>>,

    /// Compute an "Unweighted" table set with the constant weight 1.
    pub include_unweighted: bool,

    /// Restrict the weight variables to these names.
    pub weights: Option<Vec<String>>,

    /// Threshold for flagging a comparison as significant.
    pub significance_level: f64,

    /// Compute independent tables concurrently.
    pub parallel: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            missing_codes: Vec::new(),
            variable_missing_codes: BTreeMap::new(),
            include_unweighted: true,
            weights: None,
            significance_level: 0.05,
            parallel: true,
        }
    }
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_codes(mut self, codes: Vec<Code>) -> Self {
        self.missing_codes = codes;
        self
    }

    pub fn with_variable_missing_codes(mut self, variable: impl Into<String>, codes: Vec<Code>) -> Self {
        self.variable_missing_codes.insert(variable.into(), codes);
        self
    }

    pub fn with_unweighted(mut self, include: bool) -> Self {
        self.include_unweighted = include;
        self
    }

    pub fn with_weights(mut self, weights: Vec<String>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// All sentinel codes that apply to `variable`.
    pub fn sentinels_for(&self, variable: &str) -> BTreeSet<Code> {
        let mut codes: BTreeSet<Code> = self.missing_codes.iter().copied().collect();
        if let Some(extra) = self.variable_missing_codes.get(variable) {
            codes.extend(extra.iter().copied());
        }
        codes
    }

    pub fn is_sentinel(&self, variable: &str, code: Code) -> bool {
        self.missing_codes.contains(&code)
            || self
                .variable_missing_codes
                .get(variable)
                .is_some_and(|codes| codes.contains(&code))
    }

    /// Whether a declared weight variable is selected for computation.
    pub fn uses_weight(&self, name: &str) -> bool {
        match &self.weights {
            Some(selected) => selected.iter().any(|w| w == name),
            None => true,
        }
    }
}
