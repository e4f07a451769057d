//! Structured identifiers for variables and constraints.
//!
//! A [`Name`] is a template plus an optional index key. Flat names such as
//! `ONE` have no key; indexed names such as `Buy[hamburger]` keep the
//! template and key parts apart until they are rendered, so uniqueness is
//! checked on the pair rather than on formatted text.

use std::fmt;

use crate::error::ModelError;

/// Punctuation accepted inside a template besides ASCII letters and digits.
const TEMPLATE_PUNCT: &str = "_.!#$%&/;?@'~|";
/// Punctuation accepted inside an index key part.
const KEY_PUNCT: &str = "_.-+!#$%&/;?@'~|";
/// Words an LP reader takes as section headers or bound keywords. Compared
/// case-insensitively against flat names; an indexed name renders with its
/// brackets and never collides.
const RESERVED: [&str; 25] = [
    "min", "minimize", "minimise", "minimum",
    "max", "maximize", "maximise", "maximum",
    "st", "s.t.", "st.", "subject", "such",
    "bound", "bounds",
    "gen", "general", "generals",
    "bin", "binary", "binaries",
    "end", "free", "inf", "infinity",
];

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
    template: String,
    key: Vec<String>,
}

impl Name {
    /// A name without an index key.
    pub fn flat(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            key: Vec::new(),
        }
    }

    /// A name from a template and its index key parts, e.g.
    /// `Name::indexed("Buy", ["hamburger"])` renders as `Buy[hamburger]`.
    pub fn indexed<I, S>(template: impl Into<String>, key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            template: template.into(),
            key: key.into_iter().map(Into::into).collect(),
        }
    }

    /// Split rendered text back into template and key.
    ///
    /// `x[a,b]` becomes template `x` with key `["a", "b"]`; anything that is
    /// not of the bracketed form is taken as a flat name.
    pub fn parse(text: &str) -> Self {
        if let Some(inner) = text.strip_suffix(']') {
            if let Some((template, key)) = inner.split_once('[') {
                if !template.is_empty() && !key.is_empty() {
                    return Self::indexed(template, key.split(','));
                }
            }
        }
        Self::flat(text)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn key(&self) -> &[String] {
        &self.key
    }

    pub fn is_indexed(&self) -> bool {
        !self.key.is_empty()
    }

    /// Check that the rendered name is a legal LP identifier.
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |reason: &'static str| ModelError::InvalidName {
            name: self.to_string(),
            reason,
        };

        let mut chars = self.template.chars();
        let Some(first) = chars.next() else {
            return Err(invalid("template is empty"));
        };
        if first.is_ascii_digit() || first == '.' {
            return Err(invalid("template cannot start with a digit or '.'"));
        }
        if !self
            .template
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || TEMPLATE_PUNCT.contains(c))
        {
            return Err(invalid("template contains a character not allowed in LP names"));
        }
        if !self.is_indexed()
            && RESERVED
                .iter()
                .any(|word| word.eq_ignore_ascii_case(&self.template))
        {
            return Err(invalid("name is a reserved LP keyword"));
        }

        for part in &self.key {
            if part.is_empty() {
                return Err(invalid("index key part is empty"));
            }
            if !part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || KEY_PUNCT.contains(c))
            {
                return Err(invalid("index key contains a character not allowed in LP names"));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)?;
        if self.is_indexed() {
            write!(f, "[{}]", self.key.join(","))?;
        }
        Ok(())
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Name::parse(text)
    }
}

impl From<String> for Name {
    fn from(text: String) -> Self {
        Name::parse(&text)
    }
}

impl From<&Name> for Name {
    fn from(name: &Name) -> Self {
        name.clone()
    }
}
