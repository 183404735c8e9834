// nmlrs/src/namelist/value.rs

//! Values stored in a namelist node, and cogroups of duplicated entries.

use std::fmt;

use super::core::Namelist;
use crate::fortran_types::Scalar;

/// A value stored under a key of a [`Namelist`] node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    /// Array elements in storage order. Multidimensional arrays nest one
    /// level per dimension; arrays of derived types hold `Group` elements.
    Array(Vec<Value>),
    /// Nested node: a group at the root, a derived type below it
    Group(Namelist),
    /// Several entries sharing one key
    Cogroup(Cogroup),
}

impl Value {
    pub fn unset() -> Self {
        Value::Scalar(Scalar::Unset)
    }

    /// Collapse a typed value list: none is unset, one is a scalar,
    /// more is an array.
    pub fn from_scalars(mut values: Vec<Scalar>) -> Self {
        match values.len() {
            0 => Value::unset(),
            1 => Value::Scalar(values.remove(0)),
            _ => Value::Array(values.into_iter().map(Value::Scalar).collect()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(s) => s.type_name(),
            Value::Array(_) => "array",
            Value::Group(_) => "group",
            Value::Cogroup(_) => "cogroup",
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::Unset))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Namelist> {
        match self {
            Value::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Namelist> {
        match self {
            Value::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_cogroup(&self) -> Option<&Cogroup> {
        match self {
            Value::Cogroup(c) => Some(c),
            _ => None,
        }
    }

    /// Flat list of scalars for a one-dimensional array or a scalar.
    pub fn scalars(&self) -> Option<Vec<&Scalar>> {
        match self {
            Value::Scalar(s) => Some(vec![s]),
            Value::Array(items) => items.iter().map(Value::as_scalar).collect(),
            _ => None,
        }
    }

    /// Members of a cogroup, or the value itself.
    pub fn members(&self) -> Vec<&Value> {
        match self {
            Value::Cogroup(c) => c.values().collect(),
            other => vec![other],
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Group(g) => write!(f, "<group with {} keys>", g.len()),
            Value::Cogroup(c) => write!(f, "<cogroup of {}>", c.len()),
        }
    }
}

/// Opaque identifier of one cogroup member, stable while the member lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CogroupKey(u32);

impl CogroupKey {
    /// Internal key used when a member needs a unique name.
    pub fn internal_name(&self, name: &str) -> String {
        format!("_grp_{}_{}", name.to_lowercase(), self.0)
    }
}

/// Ordered entries sharing one case-insensitive key.
#[derive(Debug, Clone, Default)]
pub struct Cogroup {
    members: Vec<(CogroupKey, Value)>,
    next_id: u32,
}

impl Cogroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member, returning its position.
    pub fn push(&mut self, value: Value) -> usize {
        let key = CogroupKey(self.next_id);
        self.next_id += 1;
        self.members.push((key, value));
        self.members.len() - 1
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Value> {
        self.members.get(position).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut Value> {
        self.members.get_mut(position).map(|(_, v)| v)
    }

    pub fn last_mut(&mut self) -> Option<&mut Value> {
        self.members.last_mut().map(|(_, v)| v)
    }

    pub fn key(&self, position: usize) -> Option<CogroupKey> {
        self.members.get(position).map(|(k, _)| *k)
    }

    /// Position of the member carrying `key`.
    pub fn position(&self, key: CogroupKey) -> Option<usize> {
        self.members.iter().position(|(k, _)| *k == key)
    }

    pub fn remove(&mut self, position: usize) -> Option<Value> {
        if position < self.members.len() {
            Some(self.members.remove(position).1)
        } else {
            None
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = CogroupKey> + '_ {
        self.members.iter().map(|(k, _)| *k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.members.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.members.iter_mut().map(|(_, v)| v)
    }
}

impl PartialEq for Cogroup {
    /// Member identifiers are internal; only the values are compared.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.values().eq(other.values())
    }
}

impl FromIterator<Value> for Cogroup {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut cogroup = Cogroup::new();
        for value in iter {
            cogroup.push(value);
        }
        cogroup
    }
}
