// nmlrs/src/namelist/path.rs

//! Key paths into a namelist tree, and path-based get and set.
//!
//! A path is written `group.var%field`, where either `.` or `%` separates
//! keys. A segment may select a cogroup member with `[n]` (0-based) and an
//! array element with `(i)` or `(i,j)`, e.g. `run[1].dt` or `grid.x(3)`.

use std::fmt;
use std::str::FromStr;

use super::array::{group_element_mut, write_indexed};
use super::core::Namelist;
use super::value::Value;
use crate::config::ParserConfig;
use crate::error::{NmlError, Result};
use crate::findex::{Index, StartIndex};

/// One key of a [`KeyPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    /// Cogroup member position; `None` addresses every member
    pub member: Option<usize>,
    /// Array element position, one entry per dimension
    pub index: Option<Vec<i64>>,
}

impl PathSegment {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            member: None,
            index: None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(member) = self.member {
            write!(f, "[{}]", member)?;
        }
        if let Some(index) = &self.index {
            let parts: Vec<String> = index.iter().map(|i| i.to_string()).collect();
            write!(f, "({})", parts.join(","))?;
        }
        Ok(())
    }
}

/// A sequence of case-insensitive keys from the root of a namelist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<PathSegment>,
}

impl KeyPath {
    /// Path to a group.
    pub fn new<S: Into<String>>(group: S) -> Self {
        Self {
            segments: vec![PathSegment::new(group)],
        }
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(NmlError::invalid_path("", "path has no keys"));
        }
        Ok(Self { segments })
    }

    /// Append a key.
    pub fn key<S: Into<String>>(mut self, name: S) -> Self {
        self.segments.push(PathSegment::new(name));
        self
    }

    /// Select a cogroup member on the last key.
    pub fn member(mut self, position: usize) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.member = Some(position);
        }
        self
    }

    /// Select an array element on the last key.
    pub fn index(mut self, positions: &[i64]) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.index = Some(positions.to_vec());
        }
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match i {
                0 => {}
                1 => write!(f, ".")?,
                _ => write!(f, "%")?,
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = NmlError;

    fn from_str(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = text.trim();

        loop {
            let name_len = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            if name_len == 0 {
                return Err(NmlError::invalid_path(text, "expected a key name"));
            }
            let mut segment = PathSegment::new(&rest[..name_len]);
            rest = &rest[name_len..];

            if let Some(after) = rest.strip_prefix('[') {
                let (inner, tail) = split_closing(after, ']', text)?;
                let member = inner
                    .trim()
                    .parse()
                    .map_err(|_| NmlError::invalid_path(text, "member selector must be a number"))?;
                segment.member = Some(member);
                rest = tail;
            }
            if let Some(after) = rest.strip_prefix('(') {
                let (inner, tail) = split_closing(after, ')', text)?;
                let positions = inner
                    .split(',')
                    .map(|p| p.trim().parse::<i64>())
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| NmlError::invalid_path(text, "array index must be integers"))?;
                segment.index = Some(positions);
                rest = tail;
            }
            segments.push(segment);

            if rest.is_empty() {
                break;
            }
            rest = rest
                .strip_prefix(['.', '%'])
                .ok_or_else(|| NmlError::invalid_path(text, "expected '.' or '%' between keys"))?;
        }

        KeyPath::from_segments(segments)
    }
}

fn split_closing<'a>(text: &'a str, close: char, full: &str) -> Result<(&'a str, &'a str)> {
    let end = text
        .find(close)
        .ok_or_else(|| NmlError::invalid_path(full, format!("missing '{}'", close)))?;
    Ok((&text[..end], &text[end + 1..]))
}

impl Namelist {
    /// Look up the value at `path`.
    ///
    /// A duplicated key along the way needs a member selector unless it
    /// is the last key, in which case the whole cogroup is returned.
    pub fn get_path(&self, path: &KeyPath) -> Result<&Value> {
        let mut node = self;
        let segments = path.segments();
        for (i, segment) in segments.iter().enumerate() {
            let not_found = || NmlError::KeyNotFound(prefix(path, i));
            let mut value = node.get(&segment.name).ok_or_else(not_found)?;

            value = match (value, segment.member) {
                (Value::Cogroup(c), Some(m)) => c.get(m).ok_or_else(not_found)?,
                (Value::Cogroup(_), None) if i + 1 < segments.len() || segment.index.is_some() => {
                    return Err(NmlError::invalid_path(
                        path.to_string(),
                        format!("'{}' is duplicated; select a member", segment.name),
                    ))
                }
                (_, Some(m)) if m > 0 => return Err(not_found()),
                (v, _) => v,
            };

            if let Some(position) = &segment.index {
                let start = node.start_index(&segment.name);
                value = element(value, position, start).ok_or_else(not_found)?;
            }

            if i + 1 == segments.len() {
                return Ok(value);
            }
            node = value.as_group().ok_or_else(|| {
                NmlError::invalid_path(
                    path.to_string(),
                    format!("'{}' is not a group or derived type", segment.name),
                )
            })?;
        }
        Err(NmlError::invalid_path(path.to_string(), "path has no keys"))
    }

    /// Set the value at `path`, creating groups and derived types as needed.
    ///
    /// Replacing an array with a shorter one drops the trailing elements.
    /// An empty array is refused. Without a member selector, a duplicated
    /// key has every member set.
    pub fn set_path<V: Into<Value>>(&mut self, path: &KeyPath, value: V) -> Result<()> {
        self.set_path_with(path, value, &ParserConfig::default())
    }

    /// Like [`Namelist::set_path`], with explicit index conventions.
    pub fn set_path_with<V: Into<Value>>(
        &mut self,
        path: &KeyPath,
        value: V,
        config: &ParserConfig,
    ) -> Result<()> {
        assign_path(self, path, path.segments(), &value.into(), None, config)
    }
}

/// Recursive worker for `set_path`; `start` replaces the start index
/// metadata of the final key when given.
pub(crate) fn assign_path(
    node: &mut Namelist,
    path: &KeyPath,
    segments: &[PathSegment],
    value: &Value,
    start: Option<&StartIndex>,
    config: &ParserConfig,
) -> Result<()> {
    let (segment, rest) = match segments.split_first() {
        Some(split) => split,
        None => return Err(NmlError::invalid_path(path.to_string(), "path has no keys")),
    };
    let target_not_found = |member: usize, available: usize| NmlError::PatchTargetNotFound {
        path: path.to_string(),
        member,
        available,
    };

    if rest.is_empty() {
        // `x =` with nothing after it reads back as one null, not as no values.
        if matches!(value, Value::Array(items) if items.is_empty()) {
            return Err(NmlError::invalid_path(
                path.to_string(),
                "an empty list cannot be written to a namelist",
            ));
        }
        if let Some(position) = &segment.index {
            let scalar = value.as_scalar().cloned().ok_or_else(|| {
                NmlError::invalid_path(path.to_string(), "an array element takes a scalar")
            })?;
            if matches!(node.get(&segment.name), Some(Value::Cogroup(_))) {
                return Err(NmlError::invalid_path(
                    path.to_string(),
                    "cannot assign an element of a duplicated key",
                ));
            }
            let index = Index::element(position);
            return write_indexed(node, &segment.name, &index, vec![scalar], false, config);
        }

        let replace = match (node.get_mut(&segment.name), segment.member) {
            (Some(Value::Cogroup(c)), Some(m)) => {
                let available = c.len();
                *c.get_mut(m).ok_or_else(|| target_not_found(m, available))? = value.clone();
                false
            }
            (Some(Value::Cogroup(c)), None) => {
                for member in c.values_mut() {
                    *member = value.clone();
                }
                false
            }
            (Some(_), Some(m)) if m > 0 => return Err(target_not_found(m, 1)),
            (None, Some(m)) if m > 0 => return Err(target_not_found(m, 0)),
            _ => true,
        };
        if replace {
            node.set(&segment.name, value.clone());
        }
        if let Some(start) = start {
            node.set_start_index(&segment.name, start.clone());
        }
        return Ok(());
    }

    if let Some(position) = &segment.index {
        if position.len() != 1 {
            return Err(NmlError::invalid_path(
                path.to_string(),
                "derived type arrays have one dimension",
            ));
        }
        let child = group_element_mut(node, &segment.name, position[0], config)?;
        return assign_path(child, path, rest, value, start, config);
    }

    if !node.contains_key(&segment.name) {
        if let Some(m) = segment.member.filter(|&m| m > 0) {
            return Err(target_not_found(m, 0));
        }
        node.set(&segment.name, Value::Group(Namelist::new()));
    }
    let entry = node
        .get_mut(&segment.name)
        .ok_or_else(|| NmlError::KeyNotFound(segment.name.clone()))?;

    let targets: Vec<&mut Value> = match (entry, segment.member) {
        (Value::Cogroup(c), Some(m)) => {
            let available = c.len();
            vec![c.get_mut(m).ok_or_else(|| target_not_found(m, available))?]
        }
        (Value::Cogroup(c), None) => c.values_mut().collect(),
        (_, Some(m)) if m > 0 => return Err(target_not_found(m, 1)),
        (other, _) => vec![other],
    };

    for target in targets {
        let child = target.as_group_mut().ok_or_else(|| {
            NmlError::invalid_path(
                path.to_string(),
                format!("'{}' is not a group or derived type", segment.name),
            )
        })?;
        assign_path(child, path, rest, value, start, config)?;
    }
    Ok(())
}

fn prefix(path: &KeyPath, upto: usize) -> String {
    KeyPath {
        segments: path.segments()[..=upto].to_vec(),
    }
    .to_string()
}

/// Element at `position` of a nested array stored last dimension outermost.
fn element<'a>(value: &'a Value, position: &[i64], start: Option<&StartIndex>) -> Option<&'a Value> {
    let mut current = value;
    for dim in (0..position.len()).rev() {
        let base = start
            .and_then(|s| s.get(dim).copied().flatten())
            .unwrap_or(1);
        let offset = usize::try_from(position[dim].checked_sub(base)?).ok()?;
        current = match current {
            Value::Array(items) => items.get(offset)?,
            // A scalar behaves as a one-element array.
            other if offset == 0 && position.len() == 1 => other,
            _ => return None,
        };
    }
    Some(current)
}
