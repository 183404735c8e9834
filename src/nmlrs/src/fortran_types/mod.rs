// nmlrs/src/fortran_types/mod.rs

//! Typed scalar values: classification from literals and rendering back.

pub mod conversion;
pub mod formatting;
pub mod parsing;
pub mod scalar;


pub use formatting::{format_real, format_string};
pub use parsing::{
    classify, classify_literal, expand_repeat, parse_complex, parse_integer, parse_logical,
    parse_real, parse_repeat_count, unquote,
};
pub use scalar::Scalar;
