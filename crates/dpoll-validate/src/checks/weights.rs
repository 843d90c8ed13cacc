//! Weight values and weight selection.

use dpoll_model::{AnalysisOptions, SurveyData, VariableRole};

use super::numeric_values;
use crate::issue::Issue;

/// Weights must be finite and non-negative; nulls are allowed and exclude
/// the row from that weight's statistics.
pub fn check_weight_values(data: &SurveyData, options: &AnalysisOptions) -> Vec<Issue> {
    let mut issues = Vec::new();
    for variable in data
        .variables
        .iter()
        .filter(|v| v.has_role(VariableRole::Weight) && options.uses_weight(&v.name))
    {
        let Some(values) = numeric_values(&data.data, &variable.name) else {
            continue;
        };
        let count = values
            .iter()
            .flatten()
            .filter(|w| !w.is_finite() || **w < 0.0)
            .count() as u64;
        if count > 0 {
            issues.push(Issue::NegativeWeight {
                variable: variable.name.clone(),
                count,
            });
        }
    }
    issues
}

pub fn check_weight_selection(data: &SurveyData, options: &AnalysisOptions) -> Vec<Issue> {
    let Some(selected) = &options.weights else {
        return Vec::new();
    };
    selected
        .iter()
        .filter(|name| {
            !data
                .variables
                .iter()
                .any(|v| &v.name == *name && v.has_role(VariableRole::Weight))
        })
        .map(|name| Issue::UnknownWeight { name: name.clone() })
        .collect()
}
