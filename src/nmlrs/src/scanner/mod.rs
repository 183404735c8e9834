// nmlrs/src/scanner/mod.rs

//! Lexical scanner for namelist text.
//!
//! [`tokenize`] returns a lazy, single-pass token iterator. Every token,
//! including whitespace, newlines and comments, carries its byte span so the
//! patch engine can rewrite the original text in place.

pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Operator, Span, Token, TokenKind};

use crate::config::ParserConfig;
use crate::error::Result;

/// Start tokenizing `text` with the comment delimiters from `config`.
pub fn tokenize<'a>(text: &'a str, config: &ParserConfig) -> Lexer<'a> {
    Lexer::with_config(text, config)
}

/// Collect every token of `text`, trivia included, ending with `Eof`.
pub fn scan_all(text: &str, config: &ParserConfig) -> Result<Vec<Token>> {
    tokenize(text, config).collect()
}

/// Collect only the tokens that carry grammar (no whitespace or comments).
pub fn scan_significant(text: &str, config: &ParserConfig) -> Result<Vec<Token>> {
    tokenize(text, config)
        .filter(|t| t.as_ref().map_or(true, |t| !t.is_trivia()))
        .collect()
}
