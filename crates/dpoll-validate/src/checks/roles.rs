//! Design roles and role/level consistency.

use dpoll_model::{Variable, VariableRole};

use crate::issue::Issue;

/// Exactly one variable must fill each of Identifier, TimeMarker and
/// GroupMarker.
pub fn check_design_roles(variables: &[Variable]) -> Vec<Issue> {
    let mut issues = Vec::new();
    for role in VariableRole::DESIGN {
        let holders: Vec<String> = variables
            .iter()
            .filter(|v| v.has_role(role))
            .map(|v| v.name.clone())
            .collect();
        match holders.len() {
            0 => issues.push(Issue::RoleMissing { role }),
            1 => {}
            _ => issues.push(Issue::RoleDuplicated {
                role,
                variables: holders,
            }),
        }
    }
    issues
}

pub fn check_role_levels(variables: &[Variable]) -> Vec<Issue> {
    variables
        .iter()
        .filter_map(|v| {
            let role = v.role?;
            (role.required_level() != v.level).then(|| Issue::RoleLevelMismatch {
                variable: v.name.clone(),
                role,
                level: v.level,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpoll_model::MeasurementLevel;

    #[test]
    fn reports_missing_and_duplicated_roles() {
        let vars = vec![
            Variable::new("IDs", MeasurementLevel::Scale).with_role(VariableRole::Identifier),
            Variable::new("Time", MeasurementLevel::Scale).with_role(VariableRole::TimeMarker),
            Variable::new("Wave", MeasurementLevel::Scale).with_role(VariableRole::TimeMarker),
        ];
        let issues = check_design_roles(&vars);
        assert_eq!(
            issues,
            vec![
                Issue::RoleDuplicated {
                    role: VariableRole::TimeMarker,
                    variables: vec!["Time".to_string(), "Wave".to_string()],
                },
                Issue::RoleMissing {
                    role: VariableRole::GroupMarker
                },
            ]
        );
    }

    #[test]
    fn ordinal_role_requires_ordinal_level() {
        let vars = vec![Variable::new("Q1", MeasurementLevel::Scale).with_role(VariableRole::Ordinal)];
        let issues = check_role_levels(&vars);
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], Issue::RoleLevelMismatch { .. }));
    }
}
