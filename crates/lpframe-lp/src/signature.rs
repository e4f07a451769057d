//! Content signature of an LP body.
//!
//! The signature is the first 8 bytes of the Blake3 hash of everything
//! after the header comments, rendered as `0x` and 16 lowercase hex digits.

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

const PREFIX: &str = "0x";
const MARKER: &str = "Signature:";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignatureError {
    #[error("Signature must start with `0x`: {0}")]
    MissingPrefix(String),
    #[error("Signature is not hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("Signature must be 8 bytes, got {0}")]
    InvalidLength(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 8]);

impl Signature {
    /// Hash `body` and keep the leading 8 bytes.
    #[must_use]
    pub fn of(body: &str) -> Self {
        let hash = blake3::hash(body.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        Self(bytes)
    }

    pub fn parse(text: &str) -> Result<Self, SignatureError> {
        let digits = text
            .trim()
            .strip_prefix(PREFIX)
            .ok_or_else(|| SignatureError::MissingPrefix(text.to_string()))?;
        let decoded = hex::decode(digits)?;
        let bytes: [u8; 8] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| SignatureError::InvalidLength(decoded.len()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", hex::encode(self.0))
    }
}

/// Outcome of [`verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureCheck {
    Match(Signature),
    /// The embedded text is kept verbatim, even when it does not parse.
    Mismatch { embedded: String, actual: Signature },
    Missing { actual: Signature },
}

impl SignatureCheck {
    pub fn is_match(&self) -> bool {
        matches!(self, SignatureCheck::Match(_))
    }

    pub fn actual(&self) -> Signature {
        match self {
            SignatureCheck::Match(actual)
            | SignatureCheck::Mismatch { actual, .. }
            | SignatureCheck::Missing { actual } => *actual,
        }
    }
}

/// Split LP text into the embedded signature (if any) and the body that
/// follows the leading `\` comment lines.
pub fn split_header(text: &str) -> (Option<&str>, &str) {
    let mut embedded = None;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let Some(comment) = line.trim_start().strip_prefix('\\') else {
            break;
        };
        if embedded.is_none() {
            embedded = comment.trim().strip_prefix(MARKER).map(str::trim);
        }
        offset += line.len();
    }
    (embedded, &text[offset..])
}

/// Recompute the signature of `text` and compare it with the embedded one.
pub fn verify(text: &str) -> SignatureCheck {
    let (embedded, body) = split_header(text);
    let actual = Signature::of(body);
    match embedded {
        None => SignatureCheck::Missing { actual },
        Some(embedded) => match Signature::parse(embedded) {
            Ok(found) if found == actual => SignatureCheck::Match(actual),
            _ => SignatureCheck::Mismatch {
                embedded: embedded.to_string(),
                actual,
            },
        },
    }
}
