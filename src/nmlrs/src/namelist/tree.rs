// nmlrs/src/namelist/tree.rs

//! Plain hierarchical form of a namelist for interchange formats.

use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;

use super::core::Namelist;
use super::value::Value;
use crate::fortran_types::Scalar;

/// Key under which a node's recorded start indices are emitted.
pub const START_INDEX_KEY: &str = "_start_index";

/// Mapping-of-mappings/sequences view of a namelist.
///
/// Cogroups become lists, unset values become `Null`, and maps keep the
/// original key order and casing.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Serialized as a two-element list `[re, im]`
    Complex(f64, f64),
    List(Vec<Tree>),
    Map(Vec<(String, Tree)>),
}

impl Tree {
    /// Value under `key` of a map, compared case-insensitively.
    pub fn get(&self, key: &str) -> Option<&Tree> {
        match self {
            Tree::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tree]> {
        match self {
            Tree::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Tree::Null)
    }
}

impl From<&Scalar> for Tree {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Integer(i) => Tree::Int(*i),
            Scalar::Real(r) => Tree::Float(*r),
            Scalar::Complex(re, im) => Tree::Complex(*re, *im),
            Scalar::Logical(b) => Tree::Bool(*b),
            Scalar::Character(s) => Tree::Str(s.clone()),
            Scalar::Unset => Tree::Null,
        }
    }
}

impl From<&Value> for Tree {
    fn from(value: &Value) -> Self {
        match value {
            Value::Scalar(s) => Tree::from(s),
            Value::Array(items) => Tree::List(items.iter().map(Tree::from).collect()),
            Value::Group(g) => g.to_tree(),
            Value::Cogroup(c) => Tree::List(c.values().map(Tree::from).collect()),
        }
    }
}

impl Namelist {
    /// Convert the namelist into a [`Tree`].
    pub fn to_tree(&self) -> Tree {
        let mut entries: Vec<(String, Tree)> = self
            .iter()
            .map(|(name, value)| (name.to_string(), Tree::from(value)))
            .collect();

        if self.has_start_indices() {
            let starts = self
                .keys()
                .filter_map(|name| {
                    let start = self.start_index(name)?;
                    let dims = start
                        .iter()
                        .map(|s| s.map_or(Tree::Null, Tree::Int))
                        .collect();
                    Some((name.to_string(), Tree::List(dims)))
                })
                .collect();
            entries.push((START_INDEX_KEY.to_string(), Tree::Map(starts)));
        }
        Tree::Map(entries)
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tree::Null => serializer.serialize_none(),
            Tree::Bool(b) => serializer.serialize_bool(*b),
            Tree::Int(i) => serializer.serialize_i64(*i),
            Tree::Float(f) => serializer.serialize_f64(*f),
            Tree::Str(s) => serializer.serialize_str(s),
            Tree::Complex(re, im) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(re)?;
                seq.serialize_element(im)?;
                seq.end()
            }
            Tree::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Tree::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}
