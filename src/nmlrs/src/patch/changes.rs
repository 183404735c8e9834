// nmlrs/src/patch/changes.rs

//! Change sets: the values a patch should write.

use std::str::FromStr;

use crate::config::ParserConfig;
use crate::error::{NmlError, Result};
use crate::findex::StartIndex;
use crate::namelist::path::assign_path;
use crate::namelist::{KeyPath, Namelist, Value};

/// Reserved group-level key selecting which member of a duplicated group
/// a patch applies to (0-based).
pub const MEMBER_INDEX_KEY: &str = "_index";

/// One desired value at one path.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: KeyPath,
    pub value: Value,
    /// Start index to record for the new value
    pub start_index: Option<StartIndex>,
}

impl Change {
    pub fn new<V: Into<Value>>(path: KeyPath, value: V) -> Self {
        Self {
            path,
            value: value.into(),
            start_index: None,
        }
    }

    pub fn with_start_index(mut self, start: StartIndex) -> Self {
        self.start_index = Some(start);
        self
    }

    /// Apply this change to a tree.
    pub fn apply(&self, nml: &mut Namelist, config: &ParserConfig) -> Result<()> {
        assign_path(
            nml,
            &self.path,
            self.path.segments(),
            &self.value,
            self.start_index.as_ref(),
            config,
        )
    }
}

/// An ordered list of changes.
///
/// # Examples
///
/// ```
/// use nmlrs::ChangeSet;
///
/// let changes = ChangeSet::new()
///     .set("run.steps", 200i64)
///     .unwrap()
///     .set("run[1].dt", 0.5f64)
///     .unwrap();
/// assert_eq!(changes.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a change addressed by a textual key path.
    pub fn set<V: Into<Value>>(mut self, path: &str, value: V) -> Result<Self> {
        let path = KeyPath::from_str(path)?;
        self.changes.push(Change::new(path, value));
        Ok(self)
    }

    pub fn push(&mut self, change: Change) -> &mut Self {
        self.changes.push(change);
        self
    }

    /// Build changes from a partial namelist.
    ///
    /// Every variable of every group becomes a change. Derived types are
    /// flattened to their fields, so unrelated fields are left alone. A
    /// group's `_index` integer restricts its changes to one member of a
    /// duplicated group.
    pub fn from_namelist(patch: &Namelist) -> Result<Self> {
        let mut set = ChangeSet::new();
        for (group_name, value) in patch.iter() {
            for member in value.members() {
                let group = member.as_group().ok_or_else(|| {
                    NmlError::invalid_path(group_name, "patch entries at the top level must be groups")
                })?;

                let mut base = KeyPath::new(group_name);
                if let Some(selector) = group.get(MEMBER_INDEX_KEY) {
                    let position = selector
                        .as_scalar()
                        .and_then(|s| s.as_integer().ok())
                        .and_then(|i| usize::try_from(i).ok())
                        .ok_or_else(|| {
                            NmlError::invalid_path(
                                group_name,
                                format!("'{}' must be a non-negative integer", MEMBER_INDEX_KEY),
                            )
                        })?;
                    base = base.member(position);
                }

                for (name, value) in group.iter() {
                    if name.eq_ignore_ascii_case(MEMBER_INDEX_KEY) {
                        continue;
                    }
                    let path = base.clone().key(name);
                    set.collect(path, value, group.start_index(name));
                }
            }
        }
        Ok(set)
    }

    fn collect(&mut self, path: KeyPath, value: &Value, start: Option<&StartIndex>) {
        match value {
            Value::Group(fields) => {
                for (name, field) in fields.iter() {
                    self.collect(path.clone().key(name), field, fields.start_index(name));
                }
            }
            other => {
                let mut change = Change::new(path, other.clone());
                change.start_index = start.cloned();
                self.changes.push(change);
            }
        }
    }

    /// Apply every change, in order, to a tree.
    pub fn apply(&self, nml: &mut Namelist, config: &ParserConfig) -> Result<()> {
        for change in &self.changes {
            change.apply(nml, config)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl FromIterator<Change> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}

impl Namelist {
    /// Apply the values of a partial namelist to this one.
    ///
    /// See [`ChangeSet::from_namelist`] for how the patch is read.
    pub fn apply_patch(&mut self, patch: &Namelist) -> Result<()> {
        ChangeSet::from_namelist(patch)?.apply(self, &ParserConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_namelist_flattens_derived_types() {
        let mut patch = Namelist::new();
        let mut point = Namelist::new();
        point.insert("x", 1i64).insert("y", 2i64);
        patch.insert_group("g").insert("p", point).insert("n", 3i64);

        let changes = ChangeSet::from_namelist(&patch).unwrap();
        let paths: Vec<String> = changes.iter().map(|c| c.path.to_string()).collect();
        assert_eq!(paths, vec!["g.p%x", "g.p%y", "g.n"]);
    }

    #[test]
    fn test_member_index_key() {
        let mut patch = Namelist::new();
        patch.insert_group("run").insert("_index", 1i64).insert("dt", 0.5f64);
        let changes = ChangeSet::from_namelist(&patch).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.iter().next().unwrap().path.to_string(), "run[1].dt");

        let mut bad = Namelist::new();
        bad.insert_group("run").insert("_index", -1i64);
        assert!(ChangeSet::from_namelist(&bad).is_err());
    }

    #[test]
    fn test_apply_patch_broadcasts_and_selects() {
        let mut nml = Namelist::new();
        nml.add_group("run").1.insert("dt", 1.0f64);
        nml.add_group("run").1.insert("dt", 2.0f64);

        let mut all = Namelist::new();
        all.insert_group("run").insert("dt", 9.0f64);
        nml.apply_patch(&all).unwrap();
        assert!(nml.get_groups("run").iter().all(|g| g.get_f64("dt") == Some(9.0)));

        let mut one = Namelist::new();
        one.insert_group("run").insert("_index", 0i64).insert("dt", 3.0f64);
        nml.apply_patch(&one).unwrap();
        let dts: Vec<f64> = nml.get_groups("run").iter().filter_map(|g| g.get_f64("dt")).collect();
        assert_eq!(dts, vec![3.0, 9.0]);

        let mut missing = Namelist::new();
        missing.insert_group("run").insert("_index", 5i64).insert("dt", 1.0f64);
        assert!(matches!(
            nml.apply_patch(&missing),
            Err(NmlError::PatchTargetNotFound { member: 5, .. })
        ));
    }

    #[test]
    fn test_change_keeps_start_index() {
        let mut nml = Namelist::new();
        let change = Change::new("g.x".parse().unwrap(), vec![1i64, 2]).with_start_index(vec![Some(0)]);
        change.apply(&mut nml, &ParserConfig::default()).unwrap();
        assert_eq!(
            nml.get_group("g").unwrap().start_index("x"),
            Some(&vec![Some(0)])
        );
    }
}
