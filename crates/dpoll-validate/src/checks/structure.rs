//! Variable names and dataset columns.

use std::collections::BTreeSet;

use dpoll_model::SurveyData;

use crate::issue::Issue;

/// Names may contain letters, digits and underscores only.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

pub fn check_names(data: &SurveyData) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    for variable in &data.variables {
        if !is_valid_name(&variable.name) {
            issues.push(Issue::InvalidVariableName {
                variable: variable.name.clone(),
            });
        }
        if !seen.insert(variable.name.as_str()) && reported.insert(variable.name.as_str()) {
            issues.push(Issue::DuplicateVariable {
                variable: variable.name.clone(),
            });
        }
    }
    issues
}

/// Declared variables without a column, and columns nobody declared.
pub fn check_columns(data: &SurveyData) -> Vec<Issue> {
    let mut issues = Vec::new();
    let declared: BTreeSet<&str> = data.variables.iter().map(|v| v.name.as_str()).collect();
    let mut reported = BTreeSet::new();

    for variable in &data.variables {
        if !data.has_column(&variable.name) && reported.insert(variable.name.as_str()) {
            issues.push(Issue::ColumnMissing {
                variable: variable.name.clone(),
            });
        }
    }

    for column in data.data.get_column_names() {
        if !declared.contains(column.as_str()) {
            issues.push(Issue::UndeclaredColumn {
                column: column.to_string(),
            });
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules() {
        assert!(is_valid_name("Q1_post"));
        assert!(!is_valid_name("Q 1"));
        assert!(!is_valid_name("Q1?"));
        assert!(!is_valid_name(""));
    }
}
