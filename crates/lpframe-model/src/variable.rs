use std::collections::HashMap;

use crate::error::ModelError;
use crate::ids::VariableId;
use crate::name::Name;

/// Variable domain.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VarKind {
    #[default]
    Continuous,
    Binary,
    Integer,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Continuous => "continuous",
            VarKind::Binary => "binary",
            VarKind::Integer => "integer",
        }
    }
}

/// Lower and upper limits on a variable. Infinite values mean unbounded.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::non_negative()
    }
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// `[0, +inf)`, the LP format default.
    pub fn non_negative() -> Self {
        Self::new(0.0, f64::INFINITY)
    }

    pub fn free() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn fixed(value: f64) -> Self {
        Self::new(value, value)
    }

    pub fn binary() -> Self {
        Self::new(0.0, 1.0)
    }

    pub fn is_default(&self) -> bool {
        self.lower == 0.0 && self.upper == f64::INFINITY
    }

    pub fn is_fixed(&self) -> bool {
        self.lower == self.upper
    }

    fn is_valid(&self) -> bool {
        !self.lower.is_nan()
            && !self.upper.is_nan()
            && self.lower != f64::INFINITY
            && self.upper != f64::NEG_INFINITY
            && self.lower <= self.upper
    }
}

/// A declared decision variable.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub id: VariableId,
    pub name: Name,
    pub bounds: Bounds,
    pub kind: VarKind,
}

/// Allocates variable ids and keeps variables in declaration order.
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    variables: Vec<Variable>,
    by_name: HashMap<Name, VariableId>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable and return its id.
    ///
    /// Binary variables always get bounds `[0, 1]`, whatever was passed.
    pub fn declare(
        &mut self,
        name: impl Into<Name>,
        bounds: Bounds,
        kind: VarKind,
    ) -> Result<VariableId, ModelError> {
        let name = name.into();
        name.validate()?;
        if self.by_name.contains_key(&name) {
            return Err(ModelError::DuplicateName(name));
        }
        let bounds = match kind {
            VarKind::Binary => Bounds::binary(),
            VarKind::Continuous | VarKind::Integer => bounds,
        };
        if !bounds.is_valid() {
            return Err(ModelError::InvalidBounds {
                name,
                lower: bounds.lower,
                upper: bounds.upper,
            });
        }

        let id = VariableId::for_position(self.variables.len())?;
        self.by_name.insert(name.clone(), id);
        self.variables.push(Variable {
            id,
            name,
            bounds,
            kind,
        });
        Ok(id)
    }

    pub fn lookup(&self, name: impl Into<Name>) -> Result<VariableId, ModelError> {
        let name = name.into();
        self.by_name
            .get(&name)
            .copied()
            .ok_or_else(|| ModelError::UnknownVariable(name.to_string()))
    }

    pub fn get(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    pub fn contains(&self, id: VariableId) -> bool {
        id.index() < self.variables.len()
    }

    /// Variables in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }

    pub fn binaries(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(|v| v.kind == VarKind::Binary)
    }

    pub fn integers(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(|v| v.kind == VarKind::Integer)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
