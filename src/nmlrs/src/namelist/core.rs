// nmlrs/src/namelist/core.rs

//! Core Namelist node: an ordered map with case-insensitive keys.

use std::collections::HashMap;

use linked_hash_map::LinkedHashMap;

use super::value::{Cogroup, Value};
use crate::findex::StartIndex;
use crate::fortran_types::Scalar;

#[derive(Debug, Clone)]
struct Entry {
    /// Casing of the key as first seen
    name: String,
    value: Value,
}

/// A namelist node.
///
/// The root node holds groups; a group node holds variables; a derived
/// type is a nested node. Keys are matched case-insensitively, iterate in
/// first-insertion order, and keep the casing they were first written with.
#[derive(Debug, Clone, Default)]
pub struct Namelist {
    entries: LinkedHashMap<String, Entry>,
    /// Start indices of array variables, keyed like `entries`
    start_index: HashMap<String, StartIndex>,
}

pub(crate) fn normalize(key: &str) -> String {
    key.to_lowercase()
}

impl Namelist {
    /// Create a new empty node.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize(key))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(&normalize(key)).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(&normalize(key)).map(|e| &mut e.value)
    }

    /// The key as it was first written.
    pub fn original_name(&self, key: &str) -> Option<&str> {
        self.entries.get(&normalize(key)).map(|e| e.name.as_str())
    }

    /// Set `key` to `value`, replacing any previous value in place.
    ///
    /// Returns the previous value. An existing key keeps its position and
    /// its first-seen casing.
    pub fn set<V: Into<Value>>(&mut self, key: &str, value: V) -> Option<Value> {
        let norm = normalize(key);
        match self.entries.get_mut(&norm) {
            Some(entry) => Some(std::mem::replace(&mut entry.value, value.into())),
            None => {
                self.entries.insert(
                    norm,
                    Entry {
                        name: key.to_string(),
                        value: value.into(),
                    },
                );
                None
            }
        }
    }

    /// Insert a value and return `self` for chaining.
    pub fn insert<V: Into<Value>>(&mut self, key: &str, value: V) -> &mut Self {
        self.set(key, value);
        self
    }

    /// Add a value under `key` without replacing what is there.
    ///
    /// A second value turns the entry into a cogroup. Returns the member
    /// position of the new value (0 when the key was new).
    pub fn push<V: Into<Value>>(&mut self, key: &str, value: V) -> usize {
        let norm = normalize(key);
        let value = value.into();
        let entry = match self.entries.get_mut(&norm) {
            Some(entry) => entry,
            None => {
                self.entries.insert(
                    norm,
                    Entry {
                        name: key.to_string(),
                        value,
                    },
                );
                return 0;
            }
        };

        if let Value::Cogroup(cogroup) = &mut entry.value {
            return cogroup.push(value);
        }
        let first = std::mem::replace(&mut entry.value, Value::unset());
        let mut cogroup = Cogroup::new();
        cogroup.push(first);
        let position = cogroup.push(value);
        log::debug!("'{}' is duplicated; now a cogroup", entry.name);
        entry.value = Value::Cogroup(cogroup);
        position
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let norm = normalize(key);
        self.start_index.remove(&norm);
        self.entries.remove(&norm).map(|e| e.value)
    }

    /// Keys in insertion order, with their original casing.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|e| e.name.as_str())
    }

    /// Entries in insertion order, with original key casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.values().map(|e| (e.name.as_str(), &e.value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries
            .iter_mut()
            .map(|(_, e)| (e.name.as_str(), &mut e.value))
    }

    /// Recorded start index of an array variable.
    ///
    /// `None` when no explicit index was ever given for it.
    pub fn start_index(&self, key: &str) -> Option<&StartIndex> {
        self.start_index.get(&normalize(key))
    }

    pub fn set_start_index(&mut self, key: &str, start: StartIndex) {
        self.start_index.insert(normalize(key), start);
    }

    pub fn clear_start_index(&mut self, key: &str) -> Option<StartIndex> {
        self.start_index.remove(&normalize(key))
    }

    pub(crate) fn has_start_indices(&self) -> bool {
        !self.start_index.is_empty()
    }

    /// Scalar stored directly under `key`.
    pub fn get_scalar(&self, key: &str) -> Option<&Scalar> {
        self.get(key).and_then(Value::as_scalar)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get_scalar(key).and_then(|s| s.as_integer().ok())
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.get_i64(key).and_then(|i| i32::try_from(i).ok())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get_scalar(key).and_then(|s| s.as_real().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_scalar(key).and_then(|s| s.as_logical().ok())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get_scalar(key).and_then(|s| s.as_str().ok())
    }
}

impl PartialEq for Namelist {
    /// Same keys in the same order, equal values and start indices.
    /// Key casing is not compared.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((ka, a), (kb, b))| ka == kb && a.value == b.value)
            && self.start_index == other.start_index
    }
}
