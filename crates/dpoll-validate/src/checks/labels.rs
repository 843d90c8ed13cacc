//! Variable labels, value labels and configured sentinels.

use std::collections::BTreeSet;

use dpoll_model::{AnalysisOptions, Code, SurveyData, Variable};

use super::numeric_values;
use crate::issue::Issue;

fn labeled_variables(data: &SurveyData) -> impl Iterator<Item = &Variable> {
    data.variables
        .iter()
        .filter(|v| v.role.is_some_and(|r| r.is_labeled()))
}

pub fn check_column_labels(data: &SurveyData) -> Vec<Issue> {
    labeled_variables(data)
        .filter(|v| v.label.trim().is_empty())
        .map(|v| Issue::MissingColumnLabel {
            variable: v.name.clone(),
        })
        .collect()
}

/// Every observed code of an Ordinal or Nominal variable must be labeled.
///
/// All unlabeled codes are collected, not only the first one found.
pub fn check_value_labels(data: &SurveyData) -> Vec<Issue> {
    let mut issues = Vec::new();
    for variable in labeled_variables(data) {
        let Some(values) = numeric_values(&data.data, &variable.name) else {
            continue;
        };
        let unlabeled: BTreeSet<Code> = values
            .into_iter()
            .flatten()
            .filter_map(Code::new)
            .filter(|code| !variable.value_labels.contains_key(code))
            .collect();
        if !unlabeled.is_empty() {
            issues.push(Issue::UnlabeledValue {
                variable: variable.name.clone(),
                codes: unlabeled.into_iter().collect(),
            });
        }
    }
    issues
}

/// Configured missing-data codes should be labeled values of each variable
/// they apply to.
pub fn check_sentinels(data: &SurveyData, options: &AnalysisOptions) -> Vec<Issue> {
    let mut issues = Vec::new();
    for variable in labeled_variables(data) {
        for code in options.sentinels_for(&variable.name) {
            if !variable.value_labels.contains_key(&code) {
                issues.push(Issue::SentinelNotLabeled {
                    variable: variable.name.clone(),
                    code,
                });
            }
        }
    }
    issues
}
