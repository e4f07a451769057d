use lpframe_model::{Relation, Sense};
use thiserror::Error;

use crate::ast::*;
use crate::lexer::{Lexer, Span, Token, TokenKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Missing Minimize or Maximize section")]
    MissingObjective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Objective(Sense),
    SubjectTo,
    Bounds,
    Generals,
    Binaries,
    End,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    signature: Option<String>,
}

impl Parser {
    /// Comments are dropped here; the `\ Signature:` one is remembered.
    pub fn new(tokens: Vec<Token>) -> Self {
        let signature = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Comment)
            .find_map(|t| signature_text(&t.text));
        let tokens = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        Self {
            tokens,
            pos: 0,
            signature,
        }
    }

    pub fn parse(source: &str) -> Result<LpDocument, ParseError> {
        let tokens = Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        let document = parser.parse_document()?;
        tracing::debug!(
            component = "reader",
            operation = "parse",
            status = "success",
            rows = document.rows.len(),
            bounds = document.bounds.len(),
            "Parsed LP text"
        );
        Ok(document)
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_span(&self) -> Span {
        self.current().map(|t| t.span).unwrap_or(Span::new(0, 0))
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn skip_newlines(&mut self) {
        while self.peek_kind() == TokenKind::Newline {
            self.advance();
        }
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0
            || self
                .tokens
                .get(self.pos - 1)
                .is_some_and(|t| t.kind == TokenKind::Newline)
    }

    fn last_end(&self, start: Span) -> usize {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.span.end)
            .unwrap_or(start.end)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) if t.kind != TokenKind::Eof => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?} `{}`", t.kind, t.text),
                span: t.span,
            },
            _ => ParseError::UnexpectedEof,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        self.skip_newlines();
        match self.current().cloned() {
            Some(t) if t.kind == kind => {
                self.advance();
                Ok(t)
            }
            _ => Err(self.unexpected(&format!("{:?}", kind))),
        }
    }

    /// Section keyword at the start of the current line, with the number of
    /// tokens it spans.
    fn section_here(&self) -> Option<(Section, usize)> {
        if !self.at_line_start() {
            return None;
        }
        let token = self.current().filter(|t| t.kind == TokenKind::Ident)?;
        let next = self.tokens.get(self.pos + 1);
        if next.is_some_and(|t| t.kind == TokenKind::Colon) {
            // A row label that happens to look like a keyword.
            return None;
        }
        let next_word = next
            .filter(|t| t.kind == TokenKind::Ident)
            .map(|t| t.text.to_ascii_lowercase());

        let section = match token.text.to_ascii_lowercase().as_str() {
            "minimize" | "minimise" | "minimum" | "min" => (Section::Objective(Sense::Minimize), 1),
            "maximize" | "maximise" | "maximum" | "max" => (Section::Objective(Sense::Maximize), 1),
            "subject" if next_word.as_deref() == Some("to") => (Section::SubjectTo, 2),
            "such" if next_word.as_deref() == Some("that") => (Section::SubjectTo, 2),
            "st" | "s.t." | "st." => (Section::SubjectTo, 1),
            "bounds" | "bound" => (Section::Bounds, 1),
            "generals" | "general" | "gen" => (Section::Generals, 1),
            "binaries" | "binary" | "bin" => (Section::Binaries, 1),
            "end" => (Section::End, 1),
            _ => return None,
        };
        Some(section)
    }

    fn at_block_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof || self.section_here().is_some()
    }

    fn parse_document(&mut self) -> Result<LpDocument, ParseError> {
        self.skip_newlines();
        let start = self.current_span();
        let sense = match self.section_here() {
            Some((Section::Objective(sense), width)) => {
                self.pos += width;
                sense
            }
            Some(_) => return Err(ParseError::MissingObjective),
            None if self.peek_kind() == TokenKind::Eof => return Err(ParseError::MissingObjective),
            None => return Err(self.unexpected("Minimize or Maximize")),
        };
        let label = self.parse_label();
        let expr = self.parse_expr()?;
        let objective = ObjectiveSection {
            span: Span::new(start.start, self.last_end(start)),
            sense,
            label,
            expr,
        };

        let mut document = LpDocument {
            signature: self.signature.take(),
            objective,
            rows: Vec::new(),
            bounds: Vec::new(),
            generals: Vec::new(),
            binaries: Vec::new(),
        };

        loop {
            self.skip_newlines();
            if self.peek_kind() == TokenKind::Eof {
                // A missing `End` is tolerated.
                break;
            }
            let Some((section, width)) = self.section_here() else {
                return Err(self.unexpected("section keyword"));
            };
            let span = self.current_span();
            self.pos += width;
            match section {
                Section::SubjectTo => self.parse_rows(&mut document.rows)?,
                Section::Bounds => self.parse_bounds(&mut document.bounds)?,
                Section::Generals => self.parse_names(&mut document.generals)?,
                Section::Binaries => self.parse_names(&mut document.binaries)?,
                Section::End => break,
                Section::Objective(_) => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "constraint, bounds or integrality section".to_string(),
                        found: "second objective section".to_string(),
                        span,
                    });
                }
            }
        }

        Ok(document)
    }

    /// Optional `name:` prefix of an objective or row.
    fn parse_label(&mut self) -> Option<String> {
        self.skip_newlines();
        if self.peek_kind() == TokenKind::Ident && self.peek_kind_at(1) == TokenKind::Colon {
            let label = self.advance().map(|t| t.text.clone());
            self.advance();
            return label;
        }
        None
    }

    /// Terms up to a relation, a section keyword or the end of input.
    fn parse_expr(&mut self) -> Result<ParsedExpr, ParseError> {
        let mut expr = ParsedExpr::default();
        let mut first = true;

        loop {
            self.skip_newlines();
            if self.peek_kind().is_relation() || self.at_block_end() {
                break;
            }

            let start = self.current_span();
            let mut sign = 1.0;
            let mut signed = false;
            while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
                if self.peek_kind() == TokenKind::Minus {
                    sign = -sign;
                }
                signed = true;
                self.advance();
                self.skip_newlines();
            }
            if !first && !signed {
                return Err(self.unexpected("+ or -"));
            }

            match self.peek_kind() {
                TokenKind::Number => {
                    let value = self.parse_number()?;
                    // The coefficient and its variable share a line.
                    if self.peek_kind() == TokenKind::Ident {
                        let token = self.expect(TokenKind::Ident)?;
                        expr.terms.push(ParsedTerm {
                            span: start.merge(token.span),
                            coeff: sign * value,
                            var: token.text,
                        });
                    } else {
                        expr.constant += sign * value;
                    }
                }
                TokenKind::Ident => {
                    let token = self.expect(TokenKind::Ident)?;
                    expr.terms.push(ParsedTerm {
                        span: start.merge(token.span),
                        coeff: sign,
                        var: token.text,
                    });
                }
                _ => return Err(self.unexpected("coefficient or variable")),
            }
            first = false;
        }

        Ok(expr)
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        let token = self.expect(TokenKind::Number)?;
        token
            .text
            .parse()
            .map_err(|_| ParseError::InvalidNumber(token.text.clone()))
    }

    /// Signed number, or signed `inf` / `infinity`.
    fn parse_value(&mut self) -> Result<f64, ParseError> {
        self.skip_newlines();
        let mut sign = 1.0;
        while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            if self.peek_kind() == TokenKind::Minus {
                sign = -sign;
            }
            self.advance();
        }
        match self.current() {
            Some(t) if t.kind == TokenKind::Number => Ok(sign * self.parse_number()?),
            Some(t) if t.kind == TokenKind::Ident && is_infinity(&t.text) => {
                self.advance();
                Ok(sign * f64::INFINITY)
            }
            _ => Err(self.unexpected("number")),
        }
    }

    fn parse_relation(&mut self) -> Result<Relation, ParseError> {
        self.skip_newlines();
        let relation = match self.peek_kind() {
            TokenKind::Le => Relation::Le,
            TokenKind::Ge => Relation::Ge,
            TokenKind::Eq => Relation::Eq,
            _ => return Err(self.unexpected("<=, >= or =")),
        };
        self.advance();
        Ok(relation)
    }

    fn parse_rows(&mut self, rows: &mut Vec<Row>) -> Result<(), ParseError> {
        loop {
            self.skip_newlines();
            if self.at_block_end() {
                return Ok(());
            }
            let start = self.current_span();
            let label = self.parse_label();
            let expr = self.parse_expr()?;
            let relation = self.parse_relation()?;
            let rhs = self.parse_value()?;
            rows.push(Row {
                span: Span::new(start.start, self.last_end(start)),
                label,
                expr,
                relation,
                rhs,
            });
        }
    }

    fn parse_bounds(&mut self, bounds: &mut Vec<BoundStatement>) -> Result<(), ParseError> {
        loop {
            self.skip_newlines();
            if self.at_block_end() {
                return Ok(());
            }
            let start = self.current_span();
            let value_first = match self.current() {
                Some(t) if matches!(t.kind, TokenKind::Plus | TokenKind::Minus | TokenKind::Number) => true,
                Some(t) if t.kind == TokenKind::Ident => {
                    is_infinity(&t.text) && self.peek_kind_at(1).is_relation()
                }
                _ => return Err(self.unexpected("bound statement")),
            };

            let mut statement = if value_first {
                // `lo <= x`, optionally followed by `<= hi`
                let value = self.parse_value()?;
                let relation = self.parse_relation()?;
                let var = self.expect(TokenKind::Ident)?.text;
                let mut statement = BoundStatement {
                    span: start,
                    var,
                    lower: None,
                    upper: None,
                };
                apply_bound(&mut statement, flip(relation), value);
                if self.peek_kind().is_relation() {
                    let relation = self.parse_relation()?;
                    let value = self.parse_value()?;
                    apply_bound(&mut statement, relation, value);
                }
                statement
            } else {
                let var = self.expect(TokenKind::Ident)?.text;
                let mut statement = BoundStatement {
                    span: start,
                    var,
                    lower: None,
                    upper: None,
                };
                let is_free = self
                    .current()
                    .is_some_and(|t| t.kind == TokenKind::Ident && t.text.eq_ignore_ascii_case("free"));
                if is_free {
                    self.advance();
                    statement.lower = Some(f64::NEG_INFINITY);
                    statement.upper = Some(f64::INFINITY);
                } else {
                    let relation = self.parse_relation()?;
                    let value = self.parse_value()?;
                    apply_bound(&mut statement, relation, value);
                }
                statement
            };
            statement.span = Span::new(start.start, self.last_end(start));
            bounds.push(statement);
        }
    }

    fn parse_names(&mut self, names: &mut Vec<String>) -> Result<(), ParseError> {
        loop {
            self.skip_newlines();
            if self.at_block_end() {
                return Ok(());
            }
            names.push(self.expect(TokenKind::Ident)?.text);
        }
    }
}

/// Apply `var <relation> value`.
fn apply_bound(statement: &mut BoundStatement, relation: Relation, value: f64) {
    match relation {
        Relation::Le => statement.upper = Some(value),
        Relation::Ge => statement.lower = Some(value),
        Relation::Eq => {
            statement.lower = Some(value);
            statement.upper = Some(value);
        }
    }
}

/// `value <= var` reads as `var >= value`.
fn flip(relation: Relation) -> Relation {
    match relation {
        Relation::Le => Relation::Ge,
        Relation::Ge => Relation::Le,
        Relation::Eq => Relation::Eq,
    }
}

fn is_infinity(text: &str) -> bool {
    text.eq_ignore_ascii_case("inf") || text.eq_ignore_ascii_case("infinity")
}

fn signature_text(comment: &str) -> Option<String> {
    comment
        .trim_start_matches('\\')
        .trim()
        .strip_prefix("Signature:")
        .map(|rest| rest.trim().to_string())
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    const SCENARIO: &str = "\\ LP format - for model browsing.
\\ Signature: 0x0123456789abcdef
Minimize
  2.49 Buy_hamburger + 2.89 Buy_chicken
Subject To
 Buy_ub: - 40 ONE + Buy_hamburger <= 0
Bounds
 ONE = 1
End
";

    #[test]
    fn test_parse_scenario() {
        let doc = Parser::parse(SCENARIO).unwrap();
        assert_eq!(doc.signature.as_deref(), Some("0x0123456789abcdef"));
        assert_eq!(doc.objective.sense, Sense::Minimize);
        let objective: Vec<_> = doc
            .objective
            .expr
            .terms
            .iter()
            .map(|t| (t.var.as_str(), t.coeff))
            .collect();
        assert_eq!(objective, vec![("Buy_hamburger", 2.49), ("Buy_chicken", 2.89)]);

        assert_eq!(doc.rows.len(), 1);
        let row = &doc.rows[0];
        assert_eq!(row.label.as_deref(), Some("Buy_ub"));
        assert_eq!(row.relation, Relation::Le);
        assert_eq!(row.rhs, 0.0);
        assert_eq!(row.expr.terms[0].var, "ONE");
        assert_eq!(row.expr.terms[0].coeff, -40.0);
        assert_eq!(row.expr.terms[1].coeff, 1.0);

        assert_eq!(doc.bounds.len(), 1);
        assert_eq!(doc.bounds[0].var, "ONE");
        assert_eq!(doc.bounds[0].lower, Some(1.0));
        assert_eq!(doc.bounds[0].upper, Some(1.0));
        assert_eq!(doc.variable_names(), vec!["Buy_hamburger", "Buy_chicken", "ONE"]);
    }

    #[test]
    fn test_wrapped_lines_join() {
        let source = "Maximize
  x + 2 y
   - 3 z + 4
Subject To
 c1: x + y
   + z >= 1
End";
        let doc = Parser::parse(source).unwrap();
        assert_eq!(doc.objective.sense, Sense::Maximize);
        assert_eq!(doc.objective.expr.terms.len(), 3);
        assert_eq!(doc.objective.expr.terms[2].coeff, -3.0);
        assert_eq!(doc.objective.expr.constant, 4.0);
        assert_eq!(doc.rows[0].expr.terms.len(), 3);
        assert_eq!(doc.rows[0].relation, Relation::Ge);
    }

    #[test]
    fn test_bound_forms() {
        let source = "min
 obj: x
st
 r: x + y + z + w + v >= -2.5
bounds
 x free
 -inf <= y <= 4
 2 <= z <= 8
 w >= -1
 v <= 1e3
 10 >= u
end";
        let doc = Parser::parse(source).unwrap();
        assert_eq!(doc.objective.label.as_deref(), Some("obj"));
        assert_eq!(doc.rows[0].rhs, -2.5);

        let bounds: Vec<_> = doc
            .bounds
            .iter()
            .map(|b| (b.var.as_str(), b.lower, b.upper))
            .collect();
        assert_eq!(
            bounds,
            vec![
                ("x", Some(f64::NEG_INFINITY), Some(f64::INFINITY)),
                ("y", Some(f64::NEG_INFINITY), Some(4.0)),
                ("z", Some(2.0), Some(8.0)),
                ("w", Some(-1.0), None),
                ("v", None, Some(1000.0)),
                ("u", None, Some(10.0)),
            ]
        );
    }

    #[test]
    fn test_integrality_sections() {
        let source = "Minimize
  a + b + c
Subject To
 R0: a + b >= 1
Generals
 a
Binaries
 b c
End
";
        let doc = Parser::parse(source).unwrap();
        assert_eq!(doc.generals, vec!["a"]);
        assert_eq!(doc.binaries, vec!["b", "c"]);
        assert!(doc.signature.is_none());
    }

    #[test]
    fn test_unlabelled_rows_and_keyword_case() {
        let source = "MINIMIZE\n x\nSUBJECT TO\n x >= 1\n - x - y <= 3\nEND\n";
        let doc = Parser::parse(source).unwrap();
        assert_eq!(doc.rows.len(), 2);
        assert!(doc.rows.iter().all(|r| r.label.is_none()));
        assert_eq!(doc.rows[1].expr.terms[1].coeff, -1.0);
    }

    #[test]
    fn test_missing_objective() {
        assert_eq!(Parser::parse("").unwrap_err(), ParseError::MissingObjective);
        assert_eq!(
            Parser::parse("Subject To\n x >= 1\nEnd").unwrap_err(),
            ParseError::MissingObjective
        );
    }

    #[test]
    fn test_missing_operator_between_terms() {
        let err = Parser::parse("Minimize\n x y\nEnd").unwrap_err();
        match err {
            ParseError::UnexpectedToken { expected, found, .. } => {
                assert_eq!(expected, "+ or -");
                assert!(found.contains("`y`"));
            }
            other => panic!("Expected unexpected token, got {other:?}"),
        }
    }

    #[test]
    fn test_row_without_relation() {
        let err = Parser::parse("Minimize\n x\nSubject To\n c: x + y\nEnd").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { ref expected, .. } if expected == "<=, >= or ="));
    }

    #[test]
    fn test_truncated_input() {
        assert_eq!(
            Parser::parse("Minimize\n x\nSubject To\n c: x <=").unwrap_err(),
            ParseError::UnexpectedEof
        );
    }
}
