use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::path::Path;

use lpframe_model::{Bounds, LinearExpr, Model, ModelError, Name, VarKind, VariableId};
use thiserror::Error;

use crate::ast::*;
use crate::parser::{ParseError, Parser};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Model(#[from] ModelError),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Variable {name} is listed under both {first} and {second}")]
    ConflictingKind {
        name: String,
        first: &'static str,
        second: &'static str,
    },
}

/// Builds a [`Model`] from a parsed LP document.
#[derive(Debug, Clone)]
pub struct Compiler {
    row_prefix: String,
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            row_prefix: "R".to_string(),
        }
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix for the generated names of unlabelled rows, `R` by default.
    pub fn with_row_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.row_prefix = prefix.into();
        self
    }

    pub fn compile(&self, document: &LpDocument) -> Result<Model, CompileError> {
        let kinds = resolve_kinds(document)?;
        let bounds = resolve_bounds(document);

        let mut model = Model::new();
        let mut ids: HashMap<&str, VariableId> = HashMap::new();
        for name in declaration_order(document) {
            let kind = kinds.get(name).copied().unwrap_or_default();
            let bounds = bounds.get(name).copied().unwrap_or_default();
            let id = model.declare_variable(Name::parse(name), bounds, kind)?;
            ids.insert(name, id);
        }

        let objective = build_expr(&document.objective.expr, &ids)?;
        model.set_objective(document.objective.sense, objective)?;

        for (index, row) in document.rows.iter().enumerate() {
            let name = match &row.label {
                Some(label) => Name::parse(label),
                None => Name::flat(format!("{}{index}", self.row_prefix)),
            };
            let expr = build_expr(&row.expr, &ids)?;
            model.add_constraint(name, expr, row.relation, row.rhs)?;
        }

        tracing::debug!(
            component = "compiler",
            operation = "compile",
            status = "success",
            variables = model.num_variables(),
            constraints = model.num_constraints(),
            "Compiled LP document"
        );
        Ok(model)
    }
}

/// Parse and compile LP text with the default [`Compiler`].
pub fn read_lp(source: &str) -> Result<Model, CompileError> {
    let document = Parser::parse(source)?;
    Compiler::new().compile(&document)
}

pub fn read_lp_file(path: impl AsRef<Path>) -> Result<Model, CompileError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .map_err(|e| CompileError::IoError(format!("{}: {}", path.display(), e)))?;
    read_lp(&source)
}

fn resolve_kinds(document: &LpDocument) -> Result<HashMap<&str, VarKind>, CompileError> {
    let mut kinds = HashMap::new();
    let listed = document
        .generals
        .iter()
        .map(|name| (name.as_str(), VarKind::Integer))
        .chain(document.binaries.iter().map(|name| (name.as_str(), VarKind::Binary)));
    for (name, kind) in listed {
        match kinds.insert(name, kind) {
            Some(previous) if previous != kind => {
                return Err(CompileError::ConflictingKind {
                    name: name.to_string(),
                    first: previous.as_str(),
                    second: kind.as_str(),
                });
            }
            _ => {}
        }
    }
    Ok(kinds)
}

/// Variables in first-appearance order, moved only as far as needed for the
/// Bounds, Generals and Binaries sections to list them in file order.
///
/// Writing declares those sections in declaration order, so this is what
/// makes a written file read back into the same file. Sections that
/// disagree with each other (a cycle) leave the rest in first-appearance
/// order.
fn declaration_order(document: &LpDocument) -> Vec<&str> {
    let names = document.variable_names();
    let rank: HashMap<&str, usize> = names.iter().enumerate().map(|(i, name)| (*name, i)).collect();

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); names.len()];
    let mut pending = vec![0usize; names.len()];
    let sections = [
        first_occurrences(document.bounds.iter().map(|b| b.var.as_str())),
        first_occurrences(document.generals.iter().map(String::as_str)),
        first_occurrences(document.binaries.iter().map(String::as_str)),
    ];
    for section in &sections {
        for pair in section.windows(2) {
            let (before, after) = (rank[pair[0]], rank[pair[1]]);
            successors[before].push(after);
            pending[after] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..names.len())
        .filter(|&i| pending[i] == 0)
        .map(Reverse)
        .collect();
    let mut placed = vec![false; names.len()];
    let mut order = Vec::with_capacity(names.len());
    while let Some(Reverse(i)) = ready.pop() {
        placed[i] = true;
        order.push(i);
        for &next in &successors[i] {
            pending[next] -= 1;
            if pending[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }
    order.extend((0..names.len()).filter(|&i| !placed[i]));

    order.into_iter().map(|i| names[i]).collect()
}

fn first_occurrences<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    names.filter(|name| seen.insert(*name)).collect()
}

/// Later statements override the sides they mention.
fn resolve_bounds(document: &LpDocument) -> HashMap<&str, Bounds> {
    let mut resolved: HashMap<&str, Bounds> = HashMap::new();
    for statement in &document.bounds {
        let bounds = resolved.entry(statement.var.as_str()).or_default();
        if let Some(lower) = statement.lower {
            bounds.lower = lower;
        }
        if let Some(upper) = statement.upper {
            bounds.upper = upper;
        }
    }
    resolved
}

fn build_expr(parsed: &ParsedExpr, ids: &HashMap<&str, VariableId>) -> Result<LinearExpr, CompileError> {
    let mut terms = Vec::with_capacity(parsed.terms.len());
    for term in &parsed.terms {
        let id = ids
            .get(term.var.as_str())
            .copied()
            .ok_or_else(|| ModelError::UnknownVariable(term.var.clone()))?;
        terms.push((id, term.coeff));
    }
    Ok(LinearExpr::from_terms(terms)?.with_constant(parsed.constant))
}
