//! Sparse linear expressions.
//!
//! Terms keep their insertion order, which is the order the LP writer
//! prints them in. Merging appends unseen variables of the right operand
//! after the left operand's terms, so identical build steps always give
//! identical output.

use std::collections::HashMap;

use crate::error::ModelError;
use crate::ids::VariableId;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VariableId, f64)>,
    constant: f64,
}

impl LinearExpr {
    /// Expression with no terms and a zero constant.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single term `coeff * var`.
    ///
    /// A zero coefficient is refused rather than silently dropped.
    pub fn term(var: VariableId, coeff: f64) -> Result<Self, ModelError> {
        if coeff == 0.0 {
            return Err(ModelError::ZeroCoefficient(var));
        }
        if !coeff.is_finite() {
            return Err(ModelError::NonFiniteCoefficient { value: coeff });
        }
        Ok(Self {
            terms: vec![(var, coeff)],
            constant: 0.0,
        })
    }

    /// Single variable with coefficient 1.
    pub fn var(var: VariableId) -> Self {
        Self {
            terms: vec![(var, 1.0)],
            constant: 0.0,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Build from raw `(variable, coefficient)` pairs.
    ///
    /// Repeated variables are summed in first-seen order and zero results are
    /// dropped, as with [`LinearExpr::add`].
    pub fn from_terms<I>(terms: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (VariableId, f64)>,
    {
        let mut merged: Vec<(VariableId, f64)> = Vec::new();
        let mut position: HashMap<VariableId, usize> = HashMap::new();
        for (id, coeff) in terms {
            if !coeff.is_finite() {
                return Err(ModelError::NonFiniteCoefficient { value: coeff });
            }
            match position.get(&id) {
                Some(&idx) => merged[idx].1 += coeff,
                None => {
                    position.insert(id, merged.len());
                    merged.push((id, coeff));
                }
            }
        }
        merged.retain(|(_, coeff)| *coeff != 0.0);
        Ok(Self {
            terms: merged,
            constant: 0.0,
        })
    }

    /// Same expression with its constant replaced.
    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant = constant;
        self
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn terms(&self) -> &[(VariableId, f64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    pub fn coefficient(&self, var: VariableId) -> Option<f64> {
        self.terms
            .iter()
            .find(|(id, _)| *id == var)
            .map(|(_, coeff)| *coeff)
    }

    pub fn variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.terms.iter().map(|(id, _)| *id)
    }

    /// Number of variable terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn into_parts(self) -> (Vec<(VariableId, f64)>, f64) {
        (self.terms, self.constant)
    }

    // ── Operations ──────────────────────────────────────────

    /// Sum of two expressions. Coefficients that cancel are removed.
    pub fn add(&self, other: &LinearExpr) -> Self {
        let mut terms = Vec::with_capacity(self.terms.len() + other.terms.len());
        terms.extend_from_slice(&self.terms);
        let mut position: HashMap<VariableId, usize> = terms
            .iter()
            .enumerate()
            .map(|(idx, (id, _))| (*id, idx))
            .collect();

        for &(id, coeff) in &other.terms {
            match position.get(&id) {
                Some(&idx) => terms[idx].1 += coeff,
                None => {
                    position.insert(id, terms.len());
                    terms.push((id, coeff));
                }
            }
        }
        terms.retain(|(_, coeff)| *coeff != 0.0);

        Self {
            terms,
            constant: self.constant + other.constant,
        }
    }

    pub fn sub(&self, other: &LinearExpr) -> Self {
        self.add(&other.scale(-1.0))
    }

    /// Multiply every coefficient and the constant by `by`.
    pub fn scale(&self, by: f64) -> Self {
        if by == 0.0 {
            return Self::empty();
        }
        Self {
            terms: self
                .terms
                .iter()
                .map(|(id, coeff)| (*id, coeff * by))
                .filter(|(_, coeff)| *coeff != 0.0)
                .collect(),
            constant: self.constant * by,
        }
    }

    /// Left fold of [`LinearExpr::add`].
    pub fn sum<I>(exprs: I) -> Self
    where
        I: IntoIterator<Item = LinearExpr>,
    {
        exprs
            .into_iter()
            .fold(Self::empty(), |acc, expr| acc.add(&expr))
    }

    /// First non-finite coefficient or constant, if any.
    pub(crate) fn first_non_finite(&self) -> Option<f64> {
        self.terms
            .iter()
            .map(|(_, coeff)| *coeff)
            .chain(std::iter::once(self.constant))
            .find(|value| !value.is_finite())
    }
}
