//! The read-only Metadata Model built from variable declarations.

use std::collections::BTreeMap;

use crate::code::Code;
use crate::error::{ModelError, Result};
use crate::variable::{Variable, VariableRole};

/// Validated set of variable declarations with lookups by name and role.
///
/// Declaration order is preserved; ordinals, nominals and weights are
/// returned in that order.
#[derive(Debug, Clone)]
pub struct Metadata {
    variables: Vec<Variable>,
    index: BTreeMap<String, usize>,
}

impl Metadata {
    /// Builds the model, rejecting duplicate names and a second variable
    /// for any design role.
    pub fn new(variables: Vec<Variable>) -> Result<Self> {
        let mut index = BTreeMap::new();
        let mut design: BTreeMap<VariableRole, usize> = BTreeMap::new();
        for (position, variable) in variables.iter().enumerate() {
            if index.insert(variable.name.clone(), position).is_some() {
                return Err(ModelError::DuplicateVariable {
                    variable: variable.name.clone(),
                });
            }
            if let Some(role) = variable.role.filter(VariableRole::is_design) {
                if let Some(&first) = design.get(&role) {
                    return Err(ModelError::RoleConflict {
                        role,
                        first: variables[first].name.clone(),
                        second: variable.name.clone(),
                    });
                }
                design.insert(role, position);
            }
        }
        Ok(Self { variables, index })
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&i| &self.variables[i])
    }

    /// Like [`Metadata::variable`] but an unknown name is an error.
    pub fn require(&self, name: &str) -> Result<&Variable> {
        self.variable(name).ok_or_else(|| ModelError::UnknownVariable {
            variable: name.to_string(),
        })
    }

    pub fn by_role(&self, role: VariableRole) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(move |v| v.has_role(role))
    }

    /// The single variable filling a design role.
    pub fn require_role(&self, role: VariableRole) -> Result<&Variable> {
        self.by_role(role)
            .next()
            .ok_or(ModelError::RoleMissing { role })
    }

    pub fn identifier(&self) -> Option<&Variable> {
        self.by_role(VariableRole::Identifier).next()
    }

    pub fn time_marker(&self) -> Option<&Variable> {
        self.by_role(VariableRole::TimeMarker).next()
    }

    pub fn group_marker(&self) -> Option<&Variable> {
        self.by_role(VariableRole::GroupMarker).next()
    }

    pub fn ordinals(&self) -> Vec<&Variable> {
        self.by_role(VariableRole::Ordinal).collect()
    }

    pub fn nominals(&self) -> Vec<&Variable> {
        self.by_role(VariableRole::Nominal).collect()
    }

    pub fn weights(&self) -> Vec<&Variable> {
        self.by_role(VariableRole::Weight).collect()
    }

    /// Ordinal and Nominal variables, the ones that need value labels.
    pub fn labeled(&self) -> Vec<&Variable> {
        self.variables
            .iter()
            .filter(|v| v.role.is_some_and(|r| r.is_labeled()))
            .collect()
    }

    /// Value label of `code` for `variable`, falling back to the number.
    pub fn label_for(&self, variable: &str, code: Code) -> String {
        match self.variable(variable) {
            Some(var) => var.label_for(code),
            None => code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::MeasurementLevel;

    fn design() -> Vec<Variable> {
        vec![
            Variable::new("IDs", MeasurementLevel::Scale).with_role(VariableRole::Identifier),
            Variable::new("Time", MeasurementLevel::Scale).with_role(VariableRole::TimeMarker),
            Variable::new("Group", MeasurementLevel::Scale).with_role(VariableRole::GroupMarker),
        ]
    }

    #[test]
    fn lookups_by_role_and_name() {
        let mut vars = design();
        vars.push(Variable::new("Q1", MeasurementLevel::Ordinal).with_role(VariableRole::Ordinal));
        vars.push(Variable::new("Q2", MeasurementLevel::Ordinal).with_role(VariableRole::Ordinal));
        vars.push(Variable::new("Gender", MeasurementLevel::Nominal).with_role(VariableRole::Nominal));
        let metadata = Metadata::new(vars).unwrap();

        assert_eq!(metadata.identifier().unwrap().name, "IDs");
        assert_eq!(metadata.time_marker().unwrap().name, "Time");
        let ordinals: Vec<_> = metadata.ordinals().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(ordinals, ["Q1", "Q2"]);
        assert_eq!(metadata.labeled().len(), 3);
        assert!(metadata.variable("Missing").is_none());
    }

    #[test]
    fn rejects_second_design_role() {
        let mut vars = design();
        vars.push(Variable::new("Wave", MeasurementLevel::Scale).with_role(VariableRole::TimeMarker));
        let err = Metadata::new(vars).unwrap_err();
        assert_eq!(
            err,
            ModelError::RoleConflict {
                role: VariableRole::TimeMarker,
                first: "Time".to_string(),
                second: "Wave".to_string(),
            }
        );
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut vars = design();
        vars.push(Variable::new("IDs", MeasurementLevel::Scale));
        assert!(matches!(
            Metadata::new(vars),
            Err(ModelError::DuplicateVariable { .. })
        ));
    }

    #[test]
    fn multiple_weights_are_allowed() {
        let mut vars = design();
        vars.push(Variable::new("w1", MeasurementLevel::Scale).with_role(VariableRole::Weight));
        vars.push(Variable::new("w2", MeasurementLevel::Scale).with_role(VariableRole::Weight));
        let metadata = Metadata::new(vars).unwrap();
        assert_eq!(metadata.weights().len(), 2);
        assert!(metadata.require_role(VariableRole::GroupMarker).is_ok());
    }
}
