//! Whole-model consistency checks run before serialization.

use std::collections::HashSet;

use crate::error::ModelError;
use crate::expr::LinearExpr;
use crate::model::Model;

impl Model {
    /// Collect every consistency problem instead of stopping at the first.
    ///
    /// An empty list means the model can be serialized.
    pub fn validate(&self) -> Vec<ModelError> {
        let mut issues = Vec::new();

        let mut seen_vars = HashSet::new();
        let mut rendered_vars = HashSet::new();
        for var in self.variables.iter() {
            let fresh_name = seen_vars.insert(&var.name);
            let fresh_text = rendered_vars.insert(var.name.to_string());
            if !fresh_name || !fresh_text {
                issues.push(ModelError::DuplicateName(var.name.clone()));
            }
        }

        match &self.objective {
            Some(objective) => self.check_references(&objective.expr, "objective", &mut issues),
            None => issues.push(ModelError::MissingObjective),
        }

        let mut seen_rows = HashSet::new();
        let mut rendered_rows = HashSet::new();
        for constraint in self.constraints.iter() {
            let fresh_name = seen_rows.insert(&constraint.name);
            let fresh_text = rendered_rows.insert(constraint.name.to_string());
            if !fresh_name || !fresh_text {
                issues.push(ModelError::DuplicateConstraintName(constraint.name.clone()));
            }
            if constraint.expr.is_empty() {
                issues.push(ModelError::EmptyConstraint(constraint.name.clone()));
            }
            let owner = format!("constraint `{}`", constraint.name);
            self.check_references(&constraint.expr, &owner, &mut issues);
            if !constraint.rhs.is_finite() {
                issues.push(ModelError::NonFiniteCoefficient {
                    value: constraint.rhs,
                });
            }
        }

        let status = if issues.is_empty() { "success" } else { "invalid" };
        tracing::debug!(
            component = "model",
            operation = "validate",
            status,
            issues = issues.len(),
            "Validated model"
        );
        issues
    }

    /// `Ok` when [`Model::validate`] finds nothing, else `ModelInvalid`.
    pub fn ensure_valid(&self) -> Result<(), ModelError> {
        let issues = self.validate();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ModelError::ModelInvalid(issues))
        }
    }

    fn check_references(&self, expr: &LinearExpr, owner: &str, issues: &mut Vec<ModelError>) {
        for id in expr.variables() {
            if !self.variables.contains(id) {
                issues.push(ModelError::UnknownVariable(format!("{id} in {owner}")));
            }
        }
        if let Some(value) = expr.first_non_finite() {
            issues.push(ModelError::NonFiniteCoefficient { value });
        }
    }
}
