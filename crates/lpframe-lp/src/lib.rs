//! LP text format support for `lpframe` models.
//!
//! - [`writer`]: deterministic, signed LP output
//! - [`lexer`], [`parser`], [`ast`]: reading LP text back
//! - [`compiler`]: turning a parsed document into a [`lpframe_model::Model`]
//! - [`compare`]: golden-file comparison

pub mod ast;
pub mod compare;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod signature;
pub mod writer;

pub use ast::*;
pub use compare::{LpDiff, lp_equivalent};
pub use compiler::{CompileError, Compiler, read_lp, read_lp_file};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parser::{ParseError, Parser};
pub use signature::{Signature, SignatureCheck, SignatureError, verify};
pub use writer::{BANNER, LpWriter, WriteError, WriterOptions, format_number, to_lp_string};
