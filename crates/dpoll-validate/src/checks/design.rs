//! Group/time design checks.

use std::collections::BTreeSet;

use dpoll_model::{Code, SurveyData, Variable, VariableRole};

use super::numeric_values;
use crate::issue::Issue;

fn sole_holder(data: &SurveyData, role: VariableRole) -> Option<&Variable> {
    let mut holders = data.variables.iter().filter(|v| v.has_role(role));
    let first = holders.next()?;
    holders.next().is_none().then_some(first)
}

/// Null cells in identifier, time or group columns.
pub fn check_design_values(data: &SurveyData) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut seen = BTreeSet::new();
    for variable in data.variables.iter().filter(|v| v.role.is_some_and(|r| r.is_design())) {
        if !seen.insert(variable.name.as_str()) {
            continue;
        }
        let Some(values) = numeric_values(&data.data, &variable.name) else {
            continue;
        };
        let count = values
            .iter()
            .filter(|v| v.is_none_or(|x| !x.is_finite()))
            .count() as u64;
        if count > 0 {
            issues.push(Issue::DesignValueMissing {
                variable: variable.name.clone(),
                count,
            });
        }
    }
    issues
}

/// Distinct (group, time) pairs, when both design columns can be resolved.
pub fn group_time_pairs(data: &SurveyData) -> Option<usize> {
    let time = sole_holder(data, VariableRole::TimeMarker)?;
    let group = sole_holder(data, VariableRole::GroupMarker)?;
    let times = numeric_values(&data.data, &time.name)?;
    let groups = numeric_values(&data.data, &group.name)?;
    let pairs: BTreeSet<(Code, Code)> = groups
        .into_iter()
        .zip(times)
        .filter_map(|(g, t)| Some((Code::new(g?)?, Code::new(t?)?)))
        .collect();
    Some(pairs.len())
}

/// At least one Ordinal variable and one (group, time) pair.
pub fn check_design(data: &SurveyData) -> Vec<Issue> {
    let ordinal_variables = data
        .variables
        .iter()
        .filter(|v| v.has_role(VariableRole::Ordinal))
        .count();
    let pairs = group_time_pairs(data);
    if ordinal_variables == 0 || pairs == Some(0) {
        vec![Issue::InsufficientDesign {
            ordinal_variables,
            group_time_pairs: pairs.unwrap_or(0),
        }]
    } else {
        Vec::new()
    }
}
