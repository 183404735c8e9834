// nmlrs/src/fortran_types/scalar.rs

//! Core Scalar enum and basic operations.

use std::fmt;

use crate::error::{NmlError, Result};

/// A single typed value as it can appear in a namelist.
///
/// Equality is type plus value: `Integer(1)` is not equal to `Real(1.0)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Integer(i64),
    Real(f64),
    /// Complex value (real, imaginary)
    Complex(f64, f64),
    Logical(bool),
    Character(String),
    /// Placeholder for a position that was never assigned
    Unset,
}

impl Scalar {
    /// Get the type name as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Integer(_) => "integer",
            Scalar::Real(_) => "real",
            Scalar::Complex(_, _) => "complex",
            Scalar::Logical(_) => "logical",
            Scalar::Character(_) => "character",
            Scalar::Unset => "unset",
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Scalar::Unset)
    }

    pub fn as_integer(&self) -> Result<i64> {
        match self {
            Scalar::Integer(i) => Ok(*i),
            other => Err(other.conversion_error("integer")),
        }
    }

    /// Integers widen to reals; nothing else converts.
    pub fn as_real(&self) -> Result<f64> {
        match self {
            Scalar::Real(r) => Ok(*r),
            Scalar::Integer(i) => Ok(*i as f64),
            other => Err(other.conversion_error("real")),
        }
    }

    pub fn as_complex(&self) -> Result<(f64, f64)> {
        match self {
            Scalar::Complex(re, im) => Ok((*re, *im)),
            other => Err(other.conversion_error("complex")),
        }
    }

    pub fn as_logical(&self) -> Result<bool> {
        match self {
            Scalar::Logical(b) => Ok(*b),
            other => Err(other.conversion_error("logical")),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Scalar::Character(s) => Ok(s),
            other => Err(other.conversion_error("character")),
        }
    }

    fn conversion_error(&self, to: &'static str) -> NmlError {
        NmlError::TypeConversion {
            from: self.type_name(),
            to,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Real(r) => write!(f, "{:?}", r),
            Scalar::Complex(re, im) => write!(f, "({:?}, {:?})", re, im),
            Scalar::Logical(b) => write!(f, "{}", if *b { ".true." } else { ".false." }),
            Scalar::Character(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Scalar::Unset => Ok(()),
        }
    }
}
