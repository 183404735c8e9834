// nmlrs/src/fortran_types/parsing.rs

//! Literal classification and repeat expansion.
//!
//! Bare literals are tried in a fixed order and the first match wins:
//! integer, real, logical, then string. Quoted tokens are always strings.
//! Complex values arrive from the parser as two already-split parts.

use super::scalar::Scalar;
use crate::error::{NmlError, Result};
use crate::scanner::{Token, TokenKind};

/// Classify a value token into a typed scalar.
pub fn classify(token: &Token, strict_logical: bool) -> Result<Scalar> {
    match token.kind {
        TokenKind::String { quote } => Ok(Scalar::Character(unquote(&token.lexeme, quote))),
        _ => classify_literal(&token.lexeme, strict_logical),
    }
}

/// Classify an unquoted literal.
pub fn classify_literal(text: &str, strict_logical: bool) -> Result<Scalar> {
    if text.is_empty() {
        return Err(NmlError::AmbiguousType {
            literal: text.to_string(),
        });
    }
    if let Some(i) = parse_integer(text) {
        return Ok(Scalar::Integer(i));
    }
    if let Some(r) = parse_real(text) {
        return Ok(Scalar::Real(r));
    }
    if let Some(b) = parse_logical(text, strict_logical) {
        return Ok(Scalar::Logical(b));
    }
    Ok(Scalar::Character(text.to_string()))
}

/// Optional sign followed by digits, with an optional kind suffix (`42_8`).
pub fn parse_integer(text: &str) -> Option<i64> {
    let body = strip_kind(text);
    let digits = body.strip_prefix(['+', '-']).unwrap_or(body);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    body.trim_start_matches('+').parse().ok()
}

/// Real literal: decimal point and/or exponent, `d` or `e` marker in any
/// case, a sign-only exponent (`1.0+5`), kind suffixes and `inf`/`nan`.
pub fn parse_real(text: &str) -> Option<f64> {
    let body = strip_kind(text).to_ascii_lowercase();
    let unsigned = body.trim_start_matches(['+', '-']);
    if matches!(unsigned, "inf" | "infinity" | "nan") {
        return body.parse().ok();
    }
    if !body.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut normalized = String::with_capacity(body.len() + 1);
    let mut prev: Option<char> = None;
    let mut has_exponent = false;
    for c in body.chars() {
        match c {
            'e' | 'd' => {
                if has_exponent {
                    return None;
                }
                has_exponent = true;
                normalized.push('e');
            }
            '+' | '-' if !has_exponent && prev.map_or(false, |p| p.is_ascii_digit() || p == '.') => {
                has_exponent = true;
                normalized.push('e');
                normalized.push(c);
            }
            '0'..='9' | '.' | '+' | '-' => normalized.push(c),
            _ => return None,
        }
        prev = Some(c);
    }
    normalized.parse().ok()
}

/// Parse a complex value from its two parenthesised parts.
pub fn parse_complex(re: &str, im: &str) -> Option<Scalar> {
    let part = |text: &str| parse_integer(text).map(|i| i as f64).or_else(|| parse_real(text));
    Some(Scalar::Complex(part(re)?, part(im)?))
}

/// Logical literal. Strict mode accepts `t`, `f`, `true`, `false`, each
/// optionally dot-delimited; relaxed mode only looks at the first letter.
pub fn parse_logical(text: &str, strict: bool) -> Option<bool> {
    let lower = text.to_ascii_lowercase();
    if strict {
        let inner = lower.strip_prefix('.').unwrap_or(&lower);
        let inner = inner.strip_suffix('.').unwrap_or(inner);
        return match inner {
            "t" | "true" => Some(true),
            "f" | "false" => Some(false),
            _ => None,
        };
    }
    match lower.strip_prefix('.').unwrap_or(&lower).chars().next() {
        Some('t') => Some(true),
        Some('f') => Some(false),
        _ => None,
    }
}

/// Strip the delimiters of a quoted token and collapse doubled quotes.
pub fn unquote(text: &str, quote: char) -> String {
    let inner = text
        .strip_prefix(quote)
        .and_then(|t| t.strip_suffix(quote))
        .unwrap_or(text);
    let doubled: String = [quote, quote].iter().collect();
    inner.replace(&doubled, &quote.to_string())
}

/// Repeat count of `N*value`: a positive integer without sign or kind.
pub fn parse_repeat_count(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok().filter(|&n| n > 0)
}

/// Expand `N*value` into N copies; `N*` alone gives N unset positions.
pub fn expand_repeat(count: usize, value: Option<Scalar>) -> Vec<Scalar> {
    vec![value.unwrap_or(Scalar::Unset); count]
}

fn strip_kind(text: &str) -> &str {
    match text.find('_') {
        Some(pos) if pos > 0 && text[..pos].bytes().any(|b| b.is_ascii_digit()) => &text[..pos],
        _ => text,
    }
}
