use std::collections::HashMap;

use crate::error::ModelError;
use crate::expr::LinearExpr;
use crate::ids::ConstraintId;
use crate::name::Name;

/// Comparison between a constraint's left-hand side and its bound.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Le => "<=",
            Relation::Ge => ">=",
            Relation::Eq => "=",
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub id: ConstraintId,
    pub name: Name,
    /// Left-hand side
    pub expr: LinearExpr,
    pub relation: Relation,
    /// Right-hand side value
    pub rhs: f64,
}

impl Constraint {
    /// Right-hand side once the left-hand constant is moved across.
    pub fn effective_rhs(&self) -> f64 {
        self.rhs - self.expr.constant_term()
    }
}

/// Named constraints in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ConstraintStore {
    constraints: Vec<Constraint>,
    by_name: HashMap<Name, ConstraintId>,
}

impl ConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a constraint. Nothing is stored when the name is taken.
    pub fn add(
        &mut self,
        name: impl Into<Name>,
        expr: LinearExpr,
        relation: Relation,
        rhs: f64,
    ) -> Result<ConstraintId, ModelError> {
        let name = name.into();
        name.validate()?;
        if self.by_name.contains_key(&name) {
            return Err(ModelError::DuplicateConstraintName(name));
        }

        let id = ConstraintId::for_position(self.constraints.len())?;
        self.by_name.insert(name.clone(), id);
        self.constraints.push(Constraint {
            id,
            name,
            expr,
            relation,
            rhs,
        });
        Ok(id)
    }

    pub fn get(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id.index())
    }

    pub fn lookup(&self, name: impl Into<Name>) -> Option<ConstraintId> {
        self.by_name.get(&name.into()).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> {
        self.constraints.iter()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}
