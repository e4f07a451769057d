//! Golden-file comparison of LP texts.

use thiserror::Error;

/// First difference found by [`lp_equivalent`].
///
/// Line numbers count significant lines only, starting at 1.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LpDiff {
    #[error("Line {line} differs: expected `{expected}`, found `{actual}`")]
    Line {
        line: usize,
        expected: String,
        actual: String,
    },
    #[error("Expected {expected} lines, found {actual}")]
    Length { expected: usize, actual: usize },
}

/// Compare two LP texts, ignoring signature comments, blank lines and
/// surrounding whitespace on each line.
pub fn lp_equivalent(expected: &str, actual: &str) -> Result<(), LpDiff> {
    let expected = significant_lines(expected);
    let actual = significant_lines(actual);

    for (idx, (want, got)) in expected.iter().zip(&actual).enumerate() {
        if want != got {
            return Err(LpDiff::Line {
                line: idx + 1,
                expected: want.to_string(),
                actual: got.to_string(),
            });
        }
    }
    if expected.len() != actual.len() {
        return Err(LpDiff::Length {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    Ok(())
}

fn significant_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_signature(line))
        .collect()
}

fn is_signature(line: &str) -> bool {
    line.strip_prefix('\\')
        .is_some_and(|rest| rest.trim_start().starts_with("Signature:"))
}
