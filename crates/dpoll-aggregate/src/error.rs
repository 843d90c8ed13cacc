use thiserror::Error;

use dpoll_model::{ModelError, VariableRole};

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The requested variable does not have the role the request needs.
    #[error("variable '{variable}' cannot be used as {expected}: its role is {}", role_name(.actual))]
    WrongRole {
        variable: String,
        expected: VariableRole,
        actual: Option<VariableRole>,
    },

    #[error("the design has no time points")]
    EmptyDesign,
}

fn role_name(role: &Option<VariableRole>) -> String {
    role.map_or_else(|| "none".to_string(), |r| r.to_string())
}

pub type Result<T> = std::result::Result<T, AggregateError>;
