//! Validation issue types.
//!
//! Each variant carries only the data needed to locate and fix the problem.

use serde::{Deserialize, Serialize};

use dpoll_model::{Code, MeasurementLevel, VariableRole};

use crate::category::Category;

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Blocks aggregation.
    Error,
    /// Reported, does not block.
    Warning,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

/// Validation issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Issue {
    // Role checks
    /// No variable fills a design role.
    RoleMissing { role: VariableRole },
    /// More than one variable fills a design role.
    RoleDuplicated {
        role: VariableRole,
        variables: Vec<String>,
    },
    /// Role and measurement level disagree.
    RoleLevelMismatch {
        variable: String,
        role: VariableRole,
        level: MeasurementLevel,
    },

    // Label checks
    /// Observed codes with no value label; all of them, ascending.
    UnlabeledValue { variable: String, codes: Vec<Code> },
    /// Ordinal or Nominal variable with a blank label.
    MissingColumnLabel { variable: String },

    // Design checks
    /// No Ordinal variable, or no (group, time) pair in the data.
    InsufficientDesign {
        ordinal_variables: usize,
        group_time_pairs: usize,
    },
    /// Null identifier, time or group cells.
    DesignValueMissing { variable: String, count: u64 },

    // Structure checks
    /// Name contains whitespace or punctuation.
    InvalidVariableName { variable: String },
    DuplicateVariable { variable: String },
    /// Declared variable has no column in the data.
    ColumnMissing { variable: String },
    /// Data column not declared in the codebook.
    UndeclaredColumn { column: String },

    // Weight checks
    /// Negative or non-finite weight values.
    NegativeWeight { variable: String, count: u64 },

    // Configuration checks
    /// Configured sentinel is not one of the variable's labeled codes.
    SentinelNotLabeled { variable: String, code: Code },
    /// Configured weight name is not a declared weight variable.
    UnknownWeight { name: String },
}

impl Issue {
    /// Variable the issue concerns, if any.
    pub fn variable(&self) -> Option<&str> {
        match self {
            Issue::RoleMissing { .. } => None,
            Issue::RoleDuplicated { .. } => None,
            Issue::InsufficientDesign { .. } => None,
            Issue::RoleLevelMismatch { variable, .. } => Some(variable),
            Issue::UnlabeledValue { variable, .. } => Some(variable),
            Issue::MissingColumnLabel { variable } => Some(variable),
            Issue::DesignValueMissing { variable, .. } => Some(variable),
            Issue::InvalidVariableName { variable } => Some(variable),
            Issue::DuplicateVariable { variable } => Some(variable),
            Issue::ColumnMissing { variable } => Some(variable),
            Issue::UndeclaredColumn { column } => Some(column),
            Issue::NegativeWeight { variable, .. } => Some(variable),
            Issue::SentinelNotLabeled { variable, .. } => Some(variable),
            Issue::UnknownWeight { name } => Some(name),
        }
    }

    /// Count of occurrences (if applicable).
    pub fn count(&self) -> Option<u64> {
        match self {
            Issue::UnlabeledValue { codes, .. } => Some(codes.len() as u64),
            Issue::RoleDuplicated { variables, .. } => Some(variables.len() as u64),
            Issue::DesignValueMissing { count, .. } => Some(*count),
            Issue::NegativeWeight { count, .. } => Some(*count),
            _ => None,
        }
    }

    /// Category for this issue type.
    pub fn category(&self) -> Category {
        match self {
            Issue::RoleMissing { .. } => Category::Roles,
            Issue::RoleDuplicated { .. } => Category::Roles,
            Issue::RoleLevelMismatch { .. } => Category::Roles,
            Issue::UnlabeledValue { .. } => Category::Labels,
            Issue::MissingColumnLabel { .. } => Category::Labels,
            Issue::InsufficientDesign { .. } => Category::Design,
            Issue::DesignValueMissing { .. } => Category::Design,
            Issue::InvalidVariableName { .. } => Category::Structure,
            Issue::DuplicateVariable { .. } => Category::Structure,
            Issue::ColumnMissing { .. } => Category::Structure,
            Issue::UndeclaredColumn { .. } => Category::Structure,
            Issue::NegativeWeight { .. } => Category::Weights,
            Issue::SentinelNotLabeled { .. } => Category::Configuration,
            Issue::UnknownWeight { .. } => Category::Configuration,
        }
    }

    /// Severity for this issue type.
    pub fn severity(&self) -> Severity {
        match self {
            Issue::UndeclaredColumn { .. }
            | Issue::SentinelNotLabeled { .. }
            | Issue::UnknownWeight { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Format message with issue-specific data.
    pub fn message(&self) -> String {
        match self {
            Issue::RoleMissing { role } => {
                format!("No variable has role {role}")
            }

            Issue::RoleDuplicated { role, variables } => {
                format!(
                    "Role {} is assigned to {} variables: {}",
                    role,
                    variables.len(),
                    variables.join(", ")
                )
            }

            Issue::RoleLevelMismatch {
                variable,
                role,
                level,
            } => {
                format!(
                    "Variable {} has role {} but is measured as {} (expected {})",
                    variable,
                    role,
                    level,
                    role.required_level()
                )
            }

            Issue::UnlabeledValue { variable, codes } => {
                let list: Vec<String> = codes.iter().map(Code::to_string).collect();
                format!("Variable {} has unlabeled codes: {}", variable, list.join(", "))
            }

            Issue::MissingColumnLabel { variable } => {
                format!("Variable {variable} has no descriptive label")
            }

            Issue::InsufficientDesign {
                ordinal_variables,
                group_time_pairs,
            } => {
                format!(
                    "Dataset needs at least one ordinal variable and one group/time pair \
                     (found {ordinal_variables} ordinal variables, {group_time_pairs} group/time pairs)"
                )
            }

            Issue::DesignValueMissing { variable, count } => {
                format!("Design variable {variable} has {count} missing values")
            }

            Issue::InvalidVariableName { variable } => {
                format!("Variable name '{variable}' contains whitespace or punctuation")
            }

            Issue::DuplicateVariable { variable } => {
                format!("Variable {variable} is declared more than once")
            }

            Issue::ColumnMissing { variable } => {
                format!("Declared variable {variable} is not a column of the dataset")
            }

            Issue::UndeclaredColumn { column } => {
                format!("Column {column} is not declared and will be ignored")
            }

            Issue::NegativeWeight { variable, count } => {
                format!("Weight variable {variable} has {count} negative or non-finite values")
            }

            Issue::SentinelNotLabeled { variable, code } => {
                format!("Missing-data code {code} is not a labeled value of {variable}")
            }

            Issue::UnknownWeight { name } => {
                format!("Configured weight {name} is not a declared weight variable")
            }
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}
