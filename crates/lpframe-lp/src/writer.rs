//! Deterministic LP text output.
//!
//! The body (from `Minimize`/`Maximize` to `End`) is rendered in full before
//! anything reaches the sink, then prefixed with the banner and the
//! signature of that body.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

use lpframe_model::{
    Bounds, Constraint, LinearExpr, Model, ModelError, Sense, VarKind, Variable, VariableId,
};
use thiserror::Error;

use crate::signature::Signature;

/// First header line of every written file.
pub const BANNER: &str = "\\ LP format - for model browsing.";

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Model cannot be written: {0}")]
    Invalid(#[from] ModelError),
    #[error("Internal inconsistency while writing: {0}")]
    Inconsistent(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Layout settings for [`LpWriter`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Column budget for wrapped lines.
    pub max_line_length: usize,
    /// Spaces in front of a continuation line.
    pub continuation_indent: usize,
    /// Emit the `\ Signature:` header line.
    pub signature: bool,
    /// Render declared names. When off, variables print as `x<id>` and
    /// rows as `c<id>`.
    pub var_names: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            max_line_length: 80,
            continuation_indent: 3,
            signature: true,
            var_names: true,
        }
    }
}

impl WriterOptions {
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    pub fn with_continuation_indent(mut self, continuation_indent: usize) -> Self {
        self.continuation_indent = continuation_indent;
        self
    }

    pub fn with_signature(mut self, signature: bool) -> Self {
        self.signature = signature;
        self
    }

    pub fn with_var_names(mut self, var_names: bool) -> Self {
        self.var_names = var_names;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct LpWriter {
    options: WriterOptions,
}

impl LpWriter {
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Validate `model` and render it with the header.
    pub fn write_string(&self, model: &Model) -> Result<String, WriteError> {
        let started = Instant::now();
        model.ensure_valid()?;
        let body = self.render_body(model)?;

        let mut text = String::with_capacity(body.len() + 64);
        text.push_str(BANNER);
        text.push('\n');
        if self.options.signature {
            text.push_str(&format!("\\ Signature: {}\n", Signature::of(&body)));
        }
        text.push_str(&body);

        tracing::debug!(
            component = "writer",
            operation = "write",
            status = "success",
            bytes = text.len(),
            variables = model.num_variables(),
            constraints = model.num_constraints(),
            duration_us = started.elapsed().as_micros() as u64,
            "Wrote LP text"
        );
        Ok(text)
    }

    /// Render fully, then hand the bytes to `sink` in one write.
    pub fn write_to<W: io::Write>(&self, model: &Model, mut sink: W) -> Result<(), WriteError> {
        let text = self.write_string(model)?;
        sink.write_all(text.as_bytes())?;
        sink.flush()?;
        Ok(())
    }

    /// Write to `path`, creating missing parent directories.
    pub fn write_file(&self, model: &Model, path: impl AsRef<Path>) -> Result<(), WriteError> {
        let path = path.as_ref();
        let text = self.write_string(model)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
        Ok(())
    }

    fn render_body(&self, model: &Model) -> Result<String, WriteError> {
        let mut out = String::new();

        let objective = model
            .objective()
            .ok_or_else(|| WriteError::Inconsistent("objective missing after validation".to_string()))?;
        out.push_str(match objective.sense {
            Sense::Minimize => "Minimize\n",
            Sense::Maximize => "Maximize\n",
        });
        let mut chunks = self.term_chunks(model, &objective.expr)?;
        let constant = objective.expr.constant_term();
        if constant != 0.0 || chunks.is_empty() {
            chunks.push(signed_chunk(chunks.is_empty(), constant, format_number(constant.abs())));
        }
        let mut lines = self.lines(&mut out, "  ".to_string(), true);
        lines.extend(&chunks);
        lines.finish();

        out.push_str("Subject To\n");
        for constraint in model.constraints().iter() {
            if constraint.expr.is_empty() {
                return Err(WriteError::Inconsistent(format!(
                    "constraint `{}` has no terms",
                    constraint.name
                )));
            }
            let mut chunks = self.term_chunks(model, &constraint.expr)?;
            chunks.push(format!(
                "{} {}",
                constraint.relation,
                format_number(constraint.effective_rhs())
            ));
            let mut lines = self.lines(&mut out, format!(" {}:", self.row_label(constraint)), false);
            lines.extend(&chunks);
            lines.finish();
        }

        let bounds: Vec<String> = model
            .variables()
            .iter()
            .filter(|var| var.kind != VarKind::Binary)
            .filter_map(|var| bound_line(&self.var_label(var), &var.bounds))
            .collect();
        if !bounds.is_empty() {
            out.push_str("Bounds\n");
            for line in bounds {
                out.push_str(&format!(" {line}\n"));
            }
        }

        let generals: Vec<String> = model
            .variables()
            .integers()
            .map(|var| self.var_label(var))
            .collect();
        self.name_section(&mut out, "Generals", &generals);
        let binaries: Vec<String> = model
            .variables()
            .binaries()
            .map(|var| self.var_label(var))
            .collect();
        self.name_section(&mut out, "Binaries", &binaries);

        out.push_str("End\n");
        Ok(out)
    }

    fn term_chunks(&self, model: &Model, expr: &LinearExpr) -> Result<Vec<String>, WriteError> {
        expr.terms()
            .iter()
            .enumerate()
            .map(|(idx, &(id, coeff))| {
                let name = self.variable_name(model, id)?;
                let magnitude = coeff.abs();
                let body = if magnitude == 1.0 {
                    name
                } else {
                    format!("{} {name}", format_number(magnitude))
                };
                Ok(signed_chunk(idx == 0, coeff, body))
            })
            .collect()
    }

    fn variable_name(&self, model: &Model, id: VariableId) -> Result<String, WriteError> {
        model
            .variable(id)
            .map(|var| self.var_label(var))
            .ok_or_else(|| WriteError::Inconsistent(format!("{id} is not declared")))
    }

    fn var_label(&self, var: &Variable) -> String {
        if self.options.var_names {
            var.name.to_string()
        } else {
            format!("x{}", var.id.inner())
        }
    }

    fn row_label(&self, constraint: &Constraint) -> String {
        if self.options.var_names {
            constraint.name.to_string()
        } else {
            format!("c{}", constraint.id.inner())
        }
    }

    fn name_section(&self, out: &mut String, header: &str, names: &[String]) {
        if names.is_empty() {
            return;
        }
        out.push_str(header);
        out.push('\n');
        let mut lines = self.lines(out, " ".to_string(), true);
        lines.extend(names);
        lines.finish();
    }

    fn lines<'a>(&self, out: &'a mut String, start: String, fresh: bool) -> Lines<'a> {
        Lines {
            out,
            line: start,
            fresh,
            max: self.options.max_line_length,
            indent: " ".repeat(self.options.continuation_indent),
        }
    }
}

/// Render `model` with default options.
pub fn to_lp_string(model: &Model) -> Result<String, WriteError> {
    LpWriter::default().write_string(model)
}

/// Accumulates whole chunks into lines, breaking before a chunk that would
/// cross the column budget.
struct Lines<'a> {
    out: &'a mut String,
    line: String,
    /// No chunk on the line yet; the next one goes right after the prefix.
    fresh: bool,
    max: usize,
    indent: String,
}

impl Lines<'_> {
    fn push(&mut self, chunk: &str) {
        if self.fresh {
            self.line.push_str(chunk);
            self.fresh = false;
        } else if self.line.len() + 1 + chunk.len() > self.max {
            self.out.push_str(&self.line);
            self.out.push('\n');
            self.line.clear();
            self.line.push_str(&self.indent);
            self.line.push_str(chunk);
        } else {
            self.line.push(' ');
            self.line.push_str(chunk);
        }
    }

    fn extend<S: AsRef<str>>(&mut self, chunks: &[S]) {
        for chunk in chunks {
            self.push(chunk.as_ref());
        }
    }

    fn finish(self) {
        self.out.push_str(&self.line);
        self.out.push('\n');
    }
}

/// `body`, `- body` or `+ body` depending on position and sign.
fn signed_chunk(first: bool, value: f64, body: String) -> String {
    match (first, value < 0.0) {
        (true, false) => body,
        (_, true) => format!("- {body}"),
        (false, false) => format!("+ {body}"),
    }
}

fn bound_line(name: &str, bounds: &Bounds) -> Option<String> {
    let (lower, upper) = (bounds.lower, bounds.upper);
    let line = if bounds.is_default() {
        return None;
    } else if bounds.is_fixed() {
        format!("{name} = {}", format_number(lower))
    } else if lower == f64::NEG_INFINITY && upper == f64::INFINITY {
        format!("{name} free")
    } else if lower == 0.0 {
        format!("{name} <= {}", format_number(upper))
    } else if lower == f64::NEG_INFINITY {
        format!("-inf <= {name} <= {}", format_number(upper))
    } else if upper == f64::INFINITY {
        format!("{name} >= {}", format_number(lower))
    } else {
        format!("{} <= {name} <= {}", format_number(lower), format_number(upper))
    };
    Some(line)
}

/// Shortest decimal that reads back to the same `f64`.
///
/// Zero (including `-0`) prints `0`; very large or very small magnitudes
/// switch to exponent notation.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = value.abs();
    if !(1e-5..1e15).contains(&magnitude) {
        format!("{value:e}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpframe_model::{Name, Relation};

    fn body(model: &Model) -> String {
        LpWriter::new(WriterOptions::default().with_signature(false))
            .write_string(model)
            .unwrap()
            .strip_prefix(&format!("{BANNER}\n"))
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.49), "2.49");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(730.0), "730");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-40.0), "-40");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(1e20), "1e20");
        assert_eq!(format_number(2.5e-7), "2.5e-7");
        assert_eq!(format_number(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_buy_ub_scenario() {
        let mut model = Model::new();
        let hamburger = model.continuous("Buy_hamburger").unwrap();
        let chicken = model.continuous("Buy_chicken").unwrap();
        let one = model.one().unwrap();
        model
            .minimize(
                LinearExpr::term(hamburger, 2.49)
                    .unwrap()
                    .add(&LinearExpr::term(chicken, 2.89).unwrap()),
            )
            .unwrap();
        let lhs = LinearExpr::term(one, -40.0)
            .unwrap()
            .add(&LinearExpr::var(hamburger));
        model.add_constraint("Buy_ub", lhs, Relation::Le, 0.0).unwrap();

        assert_eq!(
            body(&model),
            "Minimize
  2.49 Buy_hamburger + 2.89 Buy_chicken
Subject To
 Buy_ub: - 40 ONE + Buy_hamburger <= 0
Bounds
 ONE = 1
End
"
        );
    }

    #[test]
    fn test_unit_coefficients_and_cancelled_terms() {
        let mut model = Model::new();
        let x = model.continuous("x").unwrap();
        let y = model.continuous("y").unwrap();
        let z = model.continuous("z").unwrap();
        let lhs = LinearExpr::term(x, -1.0)
            .unwrap()
            .add(&LinearExpr::var(z))
            .add(&LinearExpr::term(y, -1.0).unwrap())
            .add(&LinearExpr::var(z).scale(-1.0));
        model.add_constraint("c", lhs, Relation::Ge, -3.0).unwrap();
        model.maximize(LinearExpr::var(x)).unwrap();

        let text = body(&model);
        assert!(text.contains(" c: - x - y >= -3\n"), "{text}");
        assert!(text.starts_with("Maximize\n  x\n"));
        assert!(!text.contains(" z"));
    }

    #[test]
    fn test_constants_move_to_rhs() {
        let mut model = Model::new();
        let x = model.continuous("x").unwrap();
        let lhs = LinearExpr::term(x, 2.0).unwrap().add(&LinearExpr::constant(5.0));
        model.add_constraint("c", lhs, Relation::Eq, 5.0).unwrap();
        model
            .minimize(LinearExpr::var(x).add(&LinearExpr::constant(-1.5)))
            .unwrap();

        let text = body(&model);
        assert!(text.contains("  x - 1.5\n"), "{text}");
        assert!(text.contains(" c: 2 x = 0\n"), "{text}");
    }

    #[test]
    fn test_empty_objective_renders_zero() {
        let mut model = Model::new();
        let x = model.continuous("x").unwrap();
        model.add_constraint("c", LinearExpr::var(x), Relation::Le, 1.0).unwrap();
        model.minimize(LinearExpr::empty()).unwrap();
        assert!(body(&model).starts_with("Minimize\n  0\nSubject To\n"));
    }

    #[test]
    fn test_bounds_section() {
        let mut model = Model::new();
        let declare = |model: &mut Model, name: &str, lower: f64, upper: f64| {
            model
                .declare_variable(name, Bounds::new(lower, upper), VarKind::Continuous)
                .unwrap()
        };
        let ids = [
            declare(&mut model, "plain", 0.0, f64::INFINITY),
            declare(&mut model, "fixed", 2.0, 2.0),
            declare(&mut model, "unbounded", f64::NEG_INFINITY, f64::INFINITY),
            declare(&mut model, "upper", 0.0, 10.0),
            declare(&mut model, "neg_upper", f64::NEG_INFINITY, 4.0),
            declare(&mut model, "lower", -1.0, f64::INFINITY),
            declare(&mut model, "range", 2.0, 8.5),
        ];
        let switch = model
            .declare_variable("switch", Bounds::default(), VarKind::Binary)
            .unwrap();
        let lhs = LinearExpr::sum(ids.iter().map(|id| LinearExpr::var(*id)))
            .add(&LinearExpr::var(switch));
        model.add_constraint("all", lhs, Relation::Le, 100.0).unwrap();
        model.minimize(LinearExpr::var(ids[0])).unwrap();

        let text = body(&model);
        let bounds = text
            .split("Bounds\n")
            .nth(1)
            .and_then(|rest| rest.split("Binaries\n").next())
            .unwrap();
        assert_eq!(
            bounds,
            " fixed = 2
 unbounded free
 upper <= 10
 -inf <= neg_upper <= 4
 lower >= -1
 2 <= range <= 8.5
"
        );
        assert!(text.ends_with("Binaries\n switch\nEnd\n"));
    }

    #[test]
    fn test_no_bounds_section_for_defaults() {
        let mut model = Model::new();
        let x = model.continuous("x").unwrap();
        model.add_constraint("c", LinearExpr::var(x), Relation::Le, 1.0).unwrap();
        model.minimize(LinearExpr::var(x)).unwrap();
        assert!(!body(&model).contains("Bounds"));
    }

    #[test]
    fn test_generals_listed_with_their_bounds() {
        let mut model = Model::new();
        let n = model
            .declare_variable(Name::indexed("n", ["a"]), Bounds::new(0.0, 5.0), VarKind::Integer)
            .unwrap();
        let m = model
            .declare_variable(Name::indexed("n", ["b"]), Bounds::default(), VarKind::Integer)
            .unwrap();
        model
            .add_constraint("c", LinearExpr::var(n).add(&LinearExpr::var(m)), Relation::Ge, 1.0)
            .unwrap();
        model.minimize(LinearExpr::var(n)).unwrap();

        let text = body(&model);
        assert!(text.contains("Bounds\n n[a] <= 5\nGenerals\n n[a] n[b]\nEnd\n"), "{text}");
    }

    #[test]
    fn test_wrapping_keeps_terms_whole() {
        let mut model = Model::new();
        let ids: Vec<_> = (0..12)
            .map(|i| model.continuous(Name::indexed("quantity", [format!("item{i}")])).unwrap())
            .collect();
        let objective = LinearExpr::from_terms(ids.iter().map(|id| (*id, 12.5))).unwrap();
        model.minimize(objective).unwrap();
        model
            .add_constraint("c", LinearExpr::var(ids[0]), Relation::Ge, 1.0)
            .unwrap();

        let text = body(&model);
        let objective: Vec<&str> = text
            .lines()
            .skip(1)
            .take_while(|line| *line != "Subject To")
            .collect();
        assert!(objective.len() > 1);
        assert!(objective.iter().all(|line| line.len() <= 80));
        assert!(objective[0].starts_with("  12.5 quantity[item0] + "));
        for line in &objective[1..] {
            assert!(line.starts_with("   + 12.5 quantity[item"), "{line}");
        }
        let terms: usize = objective
            .iter()
            .map(|line| line.matches("quantity[").count())
            .sum();
        assert_eq!(terms, 12);
    }

    #[test]
    fn test_narrow_width_option() {
        let mut model = Model::new();
        let x = model.continuous("x").unwrap();
        let y = model.continuous("y").unwrap();
        model
            .add_constraint("c", LinearExpr::var(x).add(&LinearExpr::var(y)), Relation::Le, 1.0)
            .unwrap();
        model.minimize(LinearExpr::var(x)).unwrap();

        let writer = LpWriter::new(
            WriterOptions::default()
                .with_signature(false)
                .with_max_line_length(8)
                .with_continuation_indent(2),
        );
        let text = writer.write_string(&model).unwrap();
        assert!(text.contains(" c: x\n  + y\n  <= 1\n"), "{text}");
    }

    #[test]
    fn test_invalid_model_writes_nothing() {
        let mut model = Model::new();
        model.continuous("x").unwrap();
        let mut sink = Vec::new();
        let err = LpWriter::default().write_to(&model, &mut sink).unwrap_err();
        match err {
            WriteError::Invalid(inner) => assert_eq!(inner.code(), "MODEL_INVALID"),
            other => panic!("Expected invalid model, got {other:?}"),
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn test_header_lines() {
        let mut model = Model::new();
        let x = model.continuous("x").unwrap();
        model.add_constraint("c", LinearExpr::var(x), Relation::Le, 1.0).unwrap();
        model.minimize(LinearExpr::var(x)).unwrap();

        let text = to_lp_string(&model).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(BANNER));
        let signature = lines.next().unwrap();
        assert!(signature.starts_with("\\ Signature: 0x"));
        assert_eq!(signature.len(), "\\ Signature: 0x".len() + 16);
        assert_eq!(lines.next(), Some("Minimize"));
    }

    #[test]
    fn test_write_file_creates_directories() {
        let mut model = Model::new();
        let x = model.continuous("x").unwrap();
        model.add_constraint("c", LinearExpr::var(x), Relation::Le, 1.0).unwrap();
        model.minimize(LinearExpr::var(x)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.lp");
        LpWriter::default().write_file(&model, &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, to_lp_string(&model).unwrap());
    }

    fn named_model() -> Model {
        let mut model = Model::new();
        let buy = model
            .declare_variable(Name::indexed("Buy", ["fries"]), Bounds::new(0.0, 4.0), VarKind::Continuous)
            .unwrap();
        let pick = model
            .declare_variable("pick", Bounds::default(), VarKind::Binary)
            .unwrap();
        let count = model
            .declare_variable("count", Bounds::default(), VarKind::Integer)
            .unwrap();
        model
            .minimize(LinearExpr::from_terms([(buy, 1.89), (pick, 1.0)]).unwrap())
            .unwrap();
        model
            .add_constraint(
                Name::indexed("cap", ["fries"]),
                LinearExpr::from_terms([(buy, 1.0), (pick, -4.0), (count, 2.0)]).unwrap(),
                Relation::Le,
                0.0,
            )
            .unwrap();
        model
    }

    #[test]
    fn test_declared_names_by_default() {
        assert!(WriterOptions::default().var_names);
        assert_eq!(
            body(&named_model()),
            "Minimize
  1.89 Buy[fries] + pick
Subject To
 cap[fries]: Buy[fries] - 4 pick + 2 count <= 0
Bounds
 Buy[fries] <= 4
Generals
 count
Binaries
 pick
End
"
        );
    }

    #[test]
    fn test_generic_names_when_disabled() {
        let writer = LpWriter::new(
            WriterOptions::default()
                .with_signature(false)
                .with_var_names(false),
        );
        let text = writer.write_string(&named_model()).unwrap();
        assert_eq!(
            text.strip_prefix(&format!("{BANNER}\n")).unwrap(),
            "Minimize
  1.89 x0 + x1
Subject To
 c0: x0 - 4 x1 + 2 x2 <= 0
Bounds
 x0 <= 4
Generals
 x2
Binaries
 x1
End
"
        );
        assert!(!text.contains("Buy"));
        assert!(!text.contains("cap"));
    }
}
