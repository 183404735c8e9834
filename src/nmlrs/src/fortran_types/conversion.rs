// nmlrs/src/fortran_types/conversion.rs

//! Conversions between Rust types and namelist values.

use super::scalar::Scalar;
use crate::error::NmlError;
use crate::namelist::{Namelist, Value};

macro_rules! scalar_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from($v: $ty) -> Self {
                    $body
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Scalar(Scalar::from(value))
                }
            }

            impl From<Vec<$ty>> for Value {
                fn from(values: Vec<$ty>) -> Self {
                    Value::Array(values.into_iter().map(Value::from).collect())
                }
            }

            impl From<Option<$ty>> for Value {
                fn from(value: Option<$ty>) -> Self {
                    value.map_or_else(Value::unset, Value::from)
                }
            }
        )*
    };
}

scalar_from! {
    i32 => |v| Scalar::Integer(v as i64),
    i64 => |v| Scalar::Integer(v),
    f32 => |v| Scalar::Real(v as f64),
    f64 => |v| Scalar::Real(v),
    bool => |v| Scalar::Logical(v),
    String => |v| Scalar::Character(v),
    &str => |v| Scalar::Character(v.to_string()),
    (f64, f64) => |v| Scalar::Complex(v.0, v.1),
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

impl From<Vec<Scalar>> for Value {
    fn from(values: Vec<Scalar>) -> Self {
        Value::Array(values.into_iter().map(Value::Scalar).collect())
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl From<Namelist> for Value {
    fn from(group: Namelist) -> Self {
        Value::Group(group)
    }
}

impl TryFrom<&Scalar> for i64 {
    type Error = NmlError;

    fn try_from(value: &Scalar) -> Result<Self, Self::Error> {
        value.as_integer()
    }
}

impl TryFrom<&Scalar> for f64 {
    type Error = NmlError;

    fn try_from(value: &Scalar) -> Result<Self, Self::Error> {
        value.as_real()
    }
}

impl TryFrom<&Scalar> for bool {
    type Error = NmlError;

    fn try_from(value: &Scalar) -> Result<Self, Self::Error> {
        value.as_logical()
    }
}

impl TryFrom<&Scalar> for String {
    type Error = NmlError;

    fn try_from(value: &Scalar) -> Result<Self, Self::Error> {
        value.as_str().map(str::to_string)
    }
}

impl TryFrom<&Value> for Vec<f64> {
    type Error = NmlError;

    /// A scalar converts to a one-element vector.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let scalars = value.scalars().ok_or(NmlError::TypeConversion {
            from: value.type_name(),
            to: "real array",
        })?;
        scalars.into_iter().map(Scalar::as_real).collect()
    }
}

impl TryFrom<&Value> for Vec<i64> {
    type Error = NmlError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let scalars = value.scalars().ok_or(NmlError::TypeConversion {
            from: value.type_name(),
            to: "integer array",
        })?;
        scalars.into_iter().map(Scalar::as_integer).collect()
    }
}
