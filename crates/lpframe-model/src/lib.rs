//! Model building for linear and mixed-integer programs.
//!
//! - [`variable`]: variable registry, bounds and kinds
//! - [`expr`]: insertion-ordered linear expressions
//! - [`constraint`]: named constraint store
//! - [`model`]: the [`Model`] aggregate, objective and the `ONE` convention
//! - `validate`: whole-model consistency checks

pub mod constraint;
pub mod error;
pub mod expr;
pub mod ids;
pub mod model;
pub mod name;
mod validate;
pub mod variable;

pub use constraint::{Constraint, ConstraintStore, Relation};
pub use error::ModelError;
pub use expr::LinearExpr;
pub use ids::{ConstraintId, VariableId};
pub use model::{Model, ONE, Objective, Sense};
pub use name::Name;
pub use variable::{Bounds, VarKind, Variable, VariableRegistry};
