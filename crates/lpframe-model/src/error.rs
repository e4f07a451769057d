use thiserror::Error;

use crate::ids::VariableId;
use crate::name::Name;

/// Errors raised while building or validating a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("[VARIABLE_DUPLICATE_NAME] variable `{0}` is already declared")]
    DuplicateName(Name),
    #[error("[VARIABLE_INVALID_BOUNDS] variable `{name}` has invalid bounds: lower ({lower}) > upper ({upper})")]
    InvalidBounds { name: Name, lower: f64, upper: f64 },
    #[error("[NAME_INVALID] `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[error("[EXPR_ZERO_COEFFICIENT] zero coefficient for {0}; omit the term instead")]
    ZeroCoefficient(VariableId),
    #[error("[EXPR_NON_FINITE] value must be finite (got {value})")]
    NonFiniteCoefficient { value: f64 },
    #[error("[VARIABLE_UNKNOWN] unknown variable {0}")]
    UnknownVariable(String),
    #[error("[CONSTRAINT_DUPLICATE_NAME] constraint `{0}` already exists")]
    DuplicateConstraintName(Name),
    #[error("[CONSTRAINT_EMPTY] constraint `{0}` has no variable terms")]
    EmptyConstraint(Name),
    #[error("[OBJECTIVE_ALREADY_SET] model already has an objective")]
    ObjectiveAlreadySet,
    #[error("[OBJECTIVE_MISSING] model has no objective defined")]
    MissingObjective,
    #[error("[MODEL_CAPACITY_EXCEEDED] no {0} id left; a model holds at most 2^32 of each")]
    CapacityExceeded(&'static str),
    #[error("[MODEL_INVALID] {} problem(s): {}", .0.len(), join_issues(.0))]
    ModelInvalid(Vec<ModelError>),
}

impl ModelError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::DuplicateName(_) => "VARIABLE_DUPLICATE_NAME",
            ModelError::InvalidBounds { .. } => "VARIABLE_INVALID_BOUNDS",
            ModelError::InvalidName { .. } => "NAME_INVALID",
            ModelError::ZeroCoefficient(_) => "EXPR_ZERO_COEFFICIENT",
            ModelError::NonFiniteCoefficient { .. } => "EXPR_NON_FINITE",
            ModelError::UnknownVariable(_) => "VARIABLE_UNKNOWN",
            ModelError::DuplicateConstraintName(_) => "CONSTRAINT_DUPLICATE_NAME",
            ModelError::EmptyConstraint(_) => "CONSTRAINT_EMPTY",
            ModelError::ObjectiveAlreadySet => "OBJECTIVE_ALREADY_SET",
            ModelError::MissingObjective => "OBJECTIVE_MISSING",
            ModelError::CapacityExceeded(_) => "MODEL_CAPACITY_EXCEEDED",
            ModelError::ModelInvalid(_) => "MODEL_INVALID",
        }
    }

    /// The collected validation problems when this is `ModelInvalid`.
    pub fn issues(&self) -> &[ModelError] {
        match self {
            ModelError::ModelInvalid(issues) => issues,
            _ => &[],
        }
    }
}

fn join_issues(issues: &[ModelError]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
