//! Raw dataset, respondent records and matched units.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;

use crate::code::Code;
use crate::variable::Variable;

/// The dataset as handed over by a reader: every column is `Float64`, with
/// nulls for missing values, plus the raw variable declarations.
///
/// Declarations are kept unchecked so the validator can itemize every
/// problem before the [`Metadata`](crate::Metadata) is built.
#[derive(Debug, Clone)]
pub struct SurveyData {
    pub name: String,
    pub data: DataFrame,
    pub variables: Vec<Variable>,
}

impl SurveyData {
    pub fn new(name: impl Into<String>, data: DataFrame, variables: Vec<Variable>) -> Self {
        Self {
            name: name.into(),
            data,
            variables,
        }
    }

    pub fn row_count(&self) -> usize {
        self.data.height()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.data.column(name).is_ok()
    }
}

/// One raw row tied to an identifier, a time point and a group.
#[derive(Debug, Clone, PartialEq)]
pub struct RespondentRecord {
    /// 1-based row in the source dataset.
    pub row: usize,
    pub identifier: Code,
    pub time: Code,
    pub group: Code,
    /// Non-missing values by variable name.
    pub values: BTreeMap<String, f64>,
}

impl RespondentRecord {
    pub fn value(&self, variable: &str) -> Option<f64> {
        self.values.get(variable).copied()
    }
}

/// One individual's responses aligned across the time points they appear in.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedUnit {
    pub identifier: Code,
    pub group: Code,
    pub waves: BTreeMap<Code, BTreeMap<String, f64>>,
}

impl MatchedUnit {
    /// Value of `variable` at `time`, if the unit answered it then.
    pub fn value(&self, time: Code, variable: &str) -> Option<f64> {
        self.waves.get(&time)?.get(variable).copied()
    }

    pub fn appears_at(&self, time: Code) -> bool {
        self.waves.contains_key(&time)
    }
}

/// Time and group codes in order of first appearance in the source rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Design {
    pub times: Vec<Code>,
    pub groups: Vec<Code>,
}

impl Design {
    /// Records a (time, group) observation, keeping first-appearance order.
    pub fn observe(&mut self, time: Code, group: Code) {
        if !self.times.contains(&time) {
            self.times.push(time);
        }
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
    }

    /// The first time point, against which later times are compared.
    pub fn baseline(&self) -> Option<Code> {
        self.times.first().copied()
    }
}
