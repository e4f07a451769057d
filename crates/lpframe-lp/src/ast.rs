use lpframe_model::{Relation, Sense};

use crate::lexer::Span;

/// An LP file as written, before any names are resolved.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpDocument {
    /// Text after `\ Signature:` in the header, if present.
    pub signature: Option<String>,
    pub objective: ObjectiveSection,
    pub rows: Vec<Row>,
    pub bounds: Vec<BoundStatement>,
    pub generals: Vec<String>,
    pub binaries: Vec<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveSection {
    pub span: Span,
    pub sense: Sense,
    pub label: Option<String>,
    pub expr: ParsedExpr,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedExpr {
    pub terms: Vec<ParsedTerm>,
    pub constant: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTerm {
    pub span: Span,
    pub coeff: f64,
    pub var: String,
}

/// One line (possibly wrapped) under `Subject To`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub span: Span,
    pub label: Option<String>,
    pub expr: ParsedExpr,
    pub relation: Relation,
    pub rhs: f64,
}

/// One statement of the `Bounds` section. `None` leaves that side as is;
/// `x free` sets both sides to infinity.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub span: Span,
    pub var: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl LpDocument {
    /// Variable names in order of first appearance.
    pub fn variable_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut names = Vec::new();
        let mentions = self
            .objective
            .expr
            .terms
            .iter()
            .chain(self.rows.iter().flat_map(|row| row.expr.terms.iter()))
            .map(|term| term.var.as_str())
            .chain(self.bounds.iter().map(|bound| bound.var.as_str()))
            .chain(self.generals.iter().map(String::as_str))
            .chain(self.binaries.iter().map(String::as_str));
        for name in mentions {
            if seen.insert(name) {
                names.push(name);
            }
        }
        names
    }
}
