use thiserror::Error;

use crate::variable::VariableRole;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    /// Two declarations share a name.
    #[error("variable '{variable}' is declared more than once")]
    DuplicateVariable { variable: String },

    /// A design role was assigned to a second variable.
    #[error("role {role} is assigned to both '{first}' and '{second}'")]
    RoleConflict {
        role: VariableRole,
        first: String,
        second: String,
    },

    /// A design role has no variable.
    #[error("no variable has role {role}")]
    RoleMissing { role: VariableRole },

    #[error("variable '{variable}' is not declared")]
    UnknownVariable { variable: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
