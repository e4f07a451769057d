use crate::constraint::{Constraint, ConstraintStore, Relation};
use crate::error::ModelError;
use crate::expr::LinearExpr;
use crate::ids::{ConstraintId, VariableId};
use crate::name::Name;
use crate::variable::{Bounds, VarKind, Variable, VariableRegistry};

/// Name of the variable fixed to 1 that [`Model::one`] declares.
pub const ONE: &str = "ONE";

/// Optimization direction.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    Minimize,
    Maximize,
}

impl Sense {
    pub fn as_str(self) -> &'static str {
        match self {
            Sense::Minimize => "min",
            Sense::Maximize => "max",
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub sense: Sense,
    pub expr: LinearExpr,
}

/// A linear or mixed-integer program.
///
/// Variables and constraints are only ever appended; the model is read
/// as-is by the LP writer, which needs no locking.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub(crate) variables: VariableRegistry,
    pub(crate) constraints: ConstraintStore,
    pub(crate) objective: Option<Objective>,
    one: Option<VariableId>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Variables ───────────────────────────────────────────

    pub fn declare_variable(
        &mut self,
        name: impl Into<Name>,
        bounds: Bounds,
        kind: VarKind,
    ) -> Result<VariableId, ModelError> {
        let id = self.variables.declare(name, bounds, kind)?;
        tracing::debug!(
            component = "model",
            operation = "declare_variable",
            status = "success",
            variable_id = id.inner(),
            kind = kind.as_str(),
            "Declared variable"
        );
        Ok(id)
    }

    /// Continuous variable with the default `[0, +inf)` bounds.
    pub fn continuous(&mut self, name: impl Into<Name>) -> Result<VariableId, ModelError> {
        self.declare_variable(name, Bounds::default(), VarKind::Continuous)
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id)
    }

    pub fn lookup_variable(&self, name: impl Into<Name>) -> Result<VariableId, ModelError> {
        self.variables.lookup(name)
    }

    pub fn variables(&self) -> &VariableRegistry {
        &self.variables
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// The always-one variable, declared on first use as an ordinary
    /// continuous variable fixed to `[1, 1]`.
    pub fn one(&mut self) -> Result<VariableId, ModelError> {
        if let Some(id) = self.one {
            return Ok(id);
        }
        let id = self.declare_variable(ONE, Bounds::fixed(1.0), VarKind::Continuous)?;
        self.one = Some(id);
        Ok(id)
    }

    /// Rewrite the constant of `expr` as a coefficient on [`Model::one`].
    pub fn fold_constant(&mut self, expr: LinearExpr) -> Result<LinearExpr, ModelError> {
        let constant = expr.constant_term();
        if constant == 0.0 {
            return Ok(expr);
        }
        let one = self.one()?;
        let shift = LinearExpr::term(one, constant)?.add(&LinearExpr::constant(-constant));
        Ok(expr.add(&shift))
    }

    // ── Constraints ─────────────────────────────────────────

    /// Add `expr <relation> rhs` under `name`.
    pub fn add_constraint(
        &mut self,
        name: impl Into<Name>,
        expr: LinearExpr,
        relation: Relation,
        rhs: f64,
    ) -> Result<ConstraintId, ModelError> {
        self.check_expr(&expr)?;
        if !rhs.is_finite() {
            return Err(ModelError::NonFiniteCoefficient { value: rhs });
        }
        let terms = expr.len();
        let id = self.constraints.add(name, expr, relation, rhs)?;
        tracing::debug!(
            component = "model",
            operation = "add_constraint",
            status = "success",
            constraint_id = id.inner(),
            relation = relation.as_str(),
            terms,
            "Added constraint"
        );
        Ok(id)
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id)
    }

    pub fn constraints(&self) -> &ConstraintStore {
        &self.constraints
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    // ── Objective ───────────────────────────────────────────

    /// Set the objective function.
    ///
    /// Returns `ObjectiveAlreadySet` if the model already has one; the
    /// existing objective is kept.
    pub fn set_objective(&mut self, sense: Sense, expr: LinearExpr) -> Result<(), ModelError> {
        if self.objective.is_some() {
            return Err(ModelError::ObjectiveAlreadySet);
        }
        self.check_expr(&expr)?;
        let terms = expr.len();
        self.objective = Some(Objective { sense, expr });
        tracing::debug!(
            component = "model",
            operation = "set_objective",
            status = "success",
            sense = sense.as_str(),
            terms,
            "Set objective function"
        );
        Ok(())
    }

    pub fn minimize(&mut self, expr: LinearExpr) -> Result<(), ModelError> {
        self.set_objective(Sense::Minimize, expr)
    }

    pub fn maximize(&mut self, expr: LinearExpr) -> Result<(), ModelError> {
        self.set_objective(Sense::Maximize, expr)
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    fn check_expr(&self, expr: &LinearExpr) -> Result<(), ModelError> {
        if let Some(unknown) = expr.variables().find(|id| !self.variables.contains(*id)) {
            return Err(ModelError::UnknownVariable(unknown.to_string()));
        }
        if let Some(value) = expr.first_non_finite() {
            return Err(ModelError::NonFiniteCoefficient { value });
        }
        Ok(())
    }
}
