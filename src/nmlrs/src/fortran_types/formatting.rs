// nmlrs/src/fortran_types/formatting.rs

//! Rendering scalars as namelist literals.

use super::scalar::Scalar;
use crate::config::WriteOptions;

impl Scalar {
    /// Render the scalar as it would be written in a namelist.
    ///
    /// `Unset` renders as an empty string; the caller decides how to keep
    /// the position (usually an empty slot between commas).
    pub fn to_fortran_string(&self, options: &WriteOptions) -> String {
        match self {
            Scalar::Integer(i) => i.to_string(),
            Scalar::Real(r) => format_real(*r, options),
            Scalar::Complex(re, im) => {
                format!("({}, {})", format_real(*re, options), format_real(*im, options))
            }
            Scalar::Logical(true) => options.true_repr.clone(),
            Scalar::Logical(false) => options.false_repr.clone(),
            Scalar::Character(s) => format_string(s),
            Scalar::Unset => String::new(),
        }
    }
}

/// Reals always keep a decimal point or exponent so they re-read as reals.
pub fn format_real(value: f64, options: &WriteOptions) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+inf" } else { "-inf" }.to_string();
    }

    match options.float_precision {
        Some(precision) => {
            let s = format!("{:.precision$}", value, precision = precision);
            if s.contains('.') {
                s
            } else {
                format!("{}.", s)
            }
        }
        // Debug output is the shortest text that reads back to the same value.
        None => format!("{:?}", value),
    }
}

/// Single quotes with doubled escaping, unless the text holds a single
/// quote and no double quote.
pub fn format_string(value: &str) -> String {
    if value.contains('\'') && !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}
