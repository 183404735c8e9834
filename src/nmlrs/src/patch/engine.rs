// nmlrs/src/patch/engine.rs

//! Text-preserving patch engine.
//!
//! The original text is parsed once with a source map. Changes are applied
//! to a copy of the tree, and each changed value is then written back into
//! the text by editing only the spans that hold it. A changed array element
//! or cogroup member is edited in the statement that wrote it; the whole
//! value list or statement is rewritten only when no such statement can
//! express the new value. New variables go before the end of their group;
//! new groups are appended at the end. Every other byte of the input is
//! copied through unchanged.

use std::collections::HashMap;

use crate::config::{ParserConfig, WriteOptions};
use crate::error::Result;
use crate::findex::StartIndex;
use crate::namelist::core::normalize;
use crate::namelist::formatting::{group_string, value_list, variable_lines};
use crate::fortran_types::Scalar;
use crate::namelist::{Namelist, PathSegment, Value};
use crate::parser::{Parser, SourceMap, StatementSpan, ValueSpan};

use super::changes::ChangeSet;

/// Apply `changes` to namelist text, keeping its formatting.
///
/// # Examples
///
/// ```
/// use nmlrs::{patch, ChangeSet, ParserConfig, WriteOptions};
///
/// let text = "&run\n    steps = 10 ! keep me\n/\n";
/// let changes = ChangeSet::new().set("run.steps", 20i64).unwrap();
/// let out = patch::patch(text, &changes, &ParserConfig::default(), &WriteOptions::default()).unwrap();
/// assert_eq!(out, "&run\n    steps = 20 ! keep me\n/\n");
/// ```
pub fn patch(
    original: &str,
    changes: &ChangeSet,
    config: &ParserConfig,
    options: &WriteOptions,
) -> Result<String> {
    patch_with_model(original, changes, config, options).map(|(text, _)| text)
}

/// Like [`patch`], also returning the patched tree.
///
/// Nothing is produced unless every change applies.
pub fn patch_with_model(
    original: &str,
    changes: &ChangeSet,
    config: &ParserConfig,
    options: &WriteOptions,
) -> Result<(String, Namelist)> {
    let (parsed, map) = Parser::with_config(config.clone()).parse_with_source_map(original)?;
    let mut model = parsed.clone();
    changes.apply(&mut model, config)?;

    let planner = Planner {
        text: original,
        map: &map,
        parsed: &parsed,
        model: &model,
        config,
        options,
    };
    let edits = planner.plan(changes);
    log::debug!("patch: {} change(s), {} edit(s)", changes.len(), edits.len());
    Ok((apply_edits(original, edits), model))
}

/// Replace `start..end` of the original text with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

impl Edit {
    fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }

    fn delete(start: usize, end: usize) -> Self {
        Self::replace(start, end, String::new())
    }
}

/// Edits are applied in order of position; edits at the same position
/// keep the order they were planned in.
fn apply_edits(original: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.start);
    let mut out = String::with_capacity(original.len());
    let mut cursor = 0;
    for edit in edits {
        log::trace!("edit {}..{} -> {:?}", edit.start, edit.end, edit.text);
        if edit.start < cursor {
            log::warn!("dropping overlapping edit at byte {}", edit.start);
            continue;
        }
        out.push_str(&original[cursor..edit.start]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&original[cursor..]);
    out
}

/// A value to write back: one variable (or derived-type field) of one
/// group occurrence. Keys stop at the first array element or cogroup
/// member; the planner finds which statements hold the changed part.
#[derive(Debug, Clone, PartialEq)]
struct Target {
    group: String,
    ordinal: usize,
    keys: Vec<String>,
}

impl Target {
    fn covers(&self, other: &Target) -> bool {
        self.group == other.group
            && self.ordinal == other.ordinal
            && other.keys.starts_with(&self.keys)
    }
}

/// A target's value as found in a tree.
struct Resolved<'a> {
    /// Keys as first written
    names: Vec<String>,
    value: &'a Value,
    start: Option<&'a StartIndex>,
}

impl Resolved<'_> {
    fn name(&self) -> String {
        self.names.join("%")
    }
}

struct Planner<'a> {
    text: &'a str,
    map: &'a SourceMap,
    parsed: &'a Namelist,
    model: &'a Namelist,
    config: &'a ParserConfig,
    options: &'a WriteOptions,
}

impl<'a> Planner<'a> {
    fn plan(&self, changes: &ChangeSet) -> Vec<Edit> {
        let mut targets: Vec<Target> = Vec::new();
        for change in changes.iter() {
            for target in self.targets_for(change.path.segments()) {
                if targets.iter().any(|t| t.covers(&target)) {
                    continue;
                }
                targets.retain(|t| !target.covers(t));
                targets.push(target);
            }
        }

        let mut edits = Vec::new();
        let mut new_groups: Vec<(String, usize)> = Vec::new();
        for target in &targets {
            if self.map.group(&target.group, target.ordinal).is_none() {
                let occurrence = (target.group.clone(), target.ordinal);
                if !new_groups.contains(&occurrence) {
                    new_groups.push(occurrence);
                }
                continue;
            }
            self.plan_target(target, &mut edits);
        }
        if !new_groups.is_empty() {
            edits.push(self.append_groups(&new_groups));
        }
        edits
    }

    fn targets_for(&self, segments: &[PathSegment]) -> Vec<Target> {
        let (group_segment, rest) = match segments.split_first() {
            Some(split) => split,
            None => return Vec::new(),
        };
        let group = normalize(&group_segment.name);
        let members = match self.model.get(&group) {
            Some(value) => value.members(),
            None => return Vec::new(),
        };
        let ordinals: Vec<usize> = match group_segment.member {
            Some(m) => vec![m],
            None => (0..members.len()).collect(),
        };

        let mut targets = Vec::new();
        for ordinal in ordinals {
            let node = match members.get(ordinal).and_then(|m| m.as_group()) {
                Some(node) => node,
                None => continue,
            };

            if rest.is_empty() {
                // Whole group: every variable in the tree or the source.
                let mut keys: Vec<String> = node.keys().map(normalize).collect();
                for statement in self.statements(&group, ordinal) {
                    let key = normalize(&statement.names[0]);
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                targets.extend(keys.into_iter().map(|key| Target {
                    group: group.clone(),
                    ordinal,
                    keys: vec![key],
                }));
                continue;
            }

            let mut keys = Vec::new();
            let mut current = Some(node);
            for segment in rest {
                keys.push(normalize(&segment.name));
                if segment.index.is_some() || segment.member.is_some() {
                    break;
                }
                current = match current.and_then(|n| n.get(&segment.name)) {
                    Some(Value::Group(g)) => Some(g),
                    _ => break,
                };
            }
            targets.push(Target {
                group: group.clone(),
                ordinal,
                keys,
            });
        }
        targets
    }

    fn statements<'s>(
        &'s self,
        group: &'s str,
        ordinal: usize,
    ) -> impl Iterator<Item = &'a StatementSpan> + 's {
        let map: &'a SourceMap = self.map;
        map.statements
            .iter()
            .filter(move |s| s.group == group && s.group_ordinal == ordinal)
    }

    fn plan_target(&self, target: &Target, edits: &mut Vec<Edit>) {
        let statements: Vec<&StatementSpan> = self
            .statements(&target.group, target.ordinal)
            .filter(|s| s.target().starts_with(&target.keys))
            .collect();
        let new = match resolve(self.model, target) {
            Some(new) => new,
            None => {
                // Dropped along with the derived type that held it.
                for statement in &statements {
                    edits.push(self.remove_statement(statement));
                }
                return;
            }
        };
        let old = match resolve(self.parsed, target) {
            Some(old) if old.value == new.value && old.start == new.start => return,
            old => old,
        };
        log::debug!(
            "patch target {}[{}].{}: {} statement(s)",
            target.group,
            target.ordinal,
            new.name(),
            statements.len()
        );

        let old = match (statements.is_empty(), old) {
            (true, _) => {
                self.insert_variable(target, &new, edits);
                return;
            }
            (false, Some(old)) => old,
            (false, None) => {
                self.rewrite_statements(&statements, &new, edits);
                return;
            }
        };

        if let (Value::Group(_), Value::Group(fields)) = (old.value, new.value) {
            self.plan_fields(target, fields, &statements, edits);
            return;
        }
        if self.rewrite_members(&target.keys, &statements, &old, &new, edits) {
            return;
        }
        if let [statement] = statements.as_slice() {
            if statement.target() == target.keys
                && (self.rewrite_value_list(statement, &new, edits)
                    || self.rewrite_indexed(statement, &new, edits))
            {
                return;
            }
        }
        self.rewrite_statements(&statements, &new, edits);
    }

    /// A derived type replaced as a whole: each field is planned on its own.
    fn plan_fields(
        &self,
        target: &Target,
        fields: &Namelist,
        statements: &[&StatementSpan],
        edits: &mut Vec<Edit>,
    ) {
        let depth = target.keys.len();
        let mut keys: Vec<String> = fields.keys().map(normalize).collect();
        for statement in statements {
            if let Some(name) = statement.names.get(depth) {
                let key = normalize(name);
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        for key in keys {
            let mut field = target.clone();
            field.keys.push(key);
            self.plan_target(&field, edits);
        }
    }

    /// Start index metadata that an unindexed statement reproduces.
    fn unindexed_start(&self, start: Option<&StartIndex>) -> bool {
        match start {
            None => true,
            Some(s) => s.as_slice() == [Some(self.unindexed_position())],
        }
    }

    /// Position of the first value of an unindexed statement.
    fn unindexed_position(&self) -> i64 {
        self.config
            .global_start_index
            .unwrap_or(self.config.default_start_index)
    }

    /// Edit each member of a duplicated key through the statements that
    /// wrote it. A key written once is its own single member.
    fn rewrite_members(
        &self,
        keys: &[String],
        statements: &[&StatementSpan],
        old: &Resolved,
        new: &Resolved,
        edits: &mut Vec<Edit>,
    ) -> bool {
        let same_start = old.start == new.start
            || (self.unindexed_start(old.start) && self.unindexed_start(new.start));
        if !same_start
            || matches!(old.value, Value::Cogroup(_)) != matches!(new.value, Value::Cogroup(_))
            || statements.iter().any(|s| s.target() != keys || !s.is_direct())
        {
            return false;
        }
        let (old_members, new_members) = (old.value.members(), new.value.members());
        if old_members.len() != new_members.len() {
            return false;
        }

        let last = new_members.len().saturating_sub(1);
        let mut planned = Vec::new();
        for (member, (old_value, new_value)) in old_members.iter().zip(&new_members).enumerate() {
            if old_value == new_value {
                continue;
            }
            let owned: Vec<&StatementSpan> = statements
                .iter()
                .copied()
                .filter(|s| s.member == member)
                .collect();
            let appendable = member == last && new.start.is_some();
            if owned.is_empty()
                || !self.rewrite_elements(&owned, old_value, new_value, new.start, appendable, &mut planned)
            {
                return false;
            }
        }
        edits.extend(planned);
        true
    }

    /// Edit the statements that wrote one array, position by position.
    ///
    /// Each position belongs to the last statement that wrote a value
    /// there, or the last that left it empty. A changed position is edited
    /// in its owner's list only. Positions past the new length are cut from
    /// every statement. Positions no statement wrote are appended to the
    /// statement ending just before them, or, with `new_statements`, get a
    /// statement of their own before the end of the group.
    fn rewrite_elements(
        &self,
        statements: &[&StatementSpan],
        old: &Value,
        new: &Value,
        start: Option<&StartIndex>,
        new_statements: bool,
        edits: &mut Vec<Edit>,
    ) -> bool {
        let (old_items, new_items) = match (old.scalars(), new.scalars()) {
            (Some(o), Some(n)) if !n.is_empty() => (o, n),
            _ => return false,
        };
        let base = match start.map(|s| s.as_slice()) {
            None => self.unindexed_position(),
            Some([Some(first)]) => *first,
            Some(_) => return false,
        };
        let slots: Vec<Vec<i64>> = match statements
            .iter()
            .map(|s| self.slot_positions(s))
            .collect::<Option<Vec<_>>>()
        {
            Some(slots) => slots,
            None => return false,
        };

        let mut owners: HashMap<i64, (usize, usize)> = HashMap::new();
        for (s, positions) in slots.iter().enumerate() {
            let nulls = slot_nulls(statements[s]);
            for (k, &position) in positions.iter().enumerate() {
                if nulls[k] {
                    owners.entry(position).or_insert((s, k));
                } else {
                    owners.insert(position, (s, k));
                }
            }
        }

        let mut changes: Vec<Vec<Option<&Scalar>>> = slots.iter().map(|p| vec![None; p.len()]).collect();
        let mut uncovered: Vec<(i64, &Scalar)> = Vec::new();
        for (i, &value) in new_items.iter().enumerate() {
            let position = match i64::try_from(i).ok().and_then(|i| base.checked_add(i)) {
                Some(position) => position,
                None => return false,
            };
            match owners.get(&position) {
                Some(_) if old_items.get(i) == Some(&value) => {}
                // An owned position cannot be emptied by editing its item.
                Some(_) if value.is_unset() => return false,
                Some(&(s, k)) => changes[s][k] = Some(value),
                None if value.is_unset() => {}
                None => uncovered.push((position, value)),
            }
        }

        let end = match i64::try_from(new_items.len()).ok().and_then(|n| base.checked_add(n)) {
            Some(end) => end,
            None => return false,
        };
        for (s, statement) in statements.iter().enumerate() {
            let keep = slots[s].iter().take_while(|&&p| p >= base && p < end).count();
            if !self.edit_items(statement, &changes[s], keep, edits) {
                return false;
            }
        }

        let mut lines = Vec::new();
        for run in uncovered.chunk_by(|a, b| b.0 == a.0 + 1) {
            let (first, last) = (run[0].0, run[run.len() - 1].0);
            let values: Vec<&Scalar> = run.iter().map(|(_, v)| *v).collect();
            let list = value_list(&values, self.options);

            let neighbour = first
                .checked_sub(1)
                .and_then(|before| slots.iter().rposition(|p| p.last() == Some(&before)));
            if let Some(s) = neighbour {
                if self.append_items(statements[s], last, &list, edits) {
                    continue;
                }
            }
            if !new_statements {
                return false;
            }
            let index = if first == last {
                format!("({})", first)
            } else {
                format!("({}:{})", first, last)
            };
            let indent = self.group_indent(&statements[0].group, statements[0].group_ordinal);
            lines.push(format!("{}{}{} = {}", indent, statements[0].target_name(), index, list));
        }
        if !lines.is_empty() {
            let (group, ordinal) = (&statements[0].group, statements[0].group_ordinal);
            self.insert_lines(group, ordinal, &lines, edits);
        }
        true
    }

    /// Positions the list items of a one-dimensional statement fill.
    fn slot_positions(&self, statement: &StatementSpan) -> Option<Vec<i64>> {
        let first = match &statement.index {
            None => self.unindexed_position(),
            Some(index) => match index.index.dims.as_slice() {
                [bound] => bound.start?,
                _ => return None,
            },
        };
        (0..statement.slot_count())
            .map(|k| first.checked_add(i64::try_from(k).ok()?))
            .collect()
    }

    /// Apply per-position `changes` to a statement's items and keep only
    /// its first `keep` positions.
    fn edit_items(
        &self,
        statement: &StatementSpan,
        changes: &[Option<&Scalar>],
        keep: usize,
        edits: &mut Vec<Edit>,
    ) -> bool {
        if keep == 0 {
            edits.push(self.remove_statement(statement));
            return true;
        }

        let mut first = 0;
        let mut cut: Option<&ValueSpan> = None;
        for item in &statement.values {
            if first >= keep {
                break;
            }
            let kept = item.count.min(keep - first);
            let slots = &changes[first..first + kept];
            let span = item.span;
            if item.repeat {
                if kept < item.count || slots.iter().any(Option::is_some) {
                    match self.repeat_text(item, slots) {
                        Some(text) => edits.push(Edit::replace(span.offset, span.end(), text)),
                        None => return false,
                    }
                }
            } else if let Some(value) = slots.first().copied().flatten() {
                let text = value.to_fortran_string(self.options);
                if item.is_gap() && self.text[..span.offset].ends_with('=') {
                    edits.push(Edit::insert(span.offset, format!(" {}", text)));
                } else if item.is_gap() {
                    edits.push(Edit::insert(span.offset, text));
                } else {
                    edits.push(Edit::replace(span.offset, span.end(), text));
                }
            }
            cut = Some(item);
            first += item.count;
        }

        if keep < statement.slot_count() {
            match (cut, statement.values.last()) {
                (Some(cut), Some(tail)) if !cut.is_gap() => {
                    edits.push(Edit::delete(cut.span.end(), tail.span.end()))
                }
                _ => return false,
            }
        }
        true
    }

    /// A repeat item rewritten for the positions it keeps, e.g. `3*0` with
    /// its second position set to 1 becomes `0, 1, 0`.
    fn repeat_text(&self, item: &ValueSpan, slots: &[Option<&Scalar>]) -> Option<String> {
        let written = &self.text[item.span.offset..item.span.end()];
        let own = written.split_once('*')?.1;
        let texts: Vec<String> = slots
            .iter()
            .map(|slot| match slot {
                Some(value) => value.to_fortran_string(self.options),
                None => own.to_string(),
            })
            .collect();
        if texts.iter().any(String::is_empty) && !texts.iter().all(String::is_empty) {
            return None;
        }

        let mut runs: Vec<(usize, &str)> = Vec::new();
        for text in &texts {
            match runs.last_mut() {
                Some((count, last)) if *last == text.as_str() => *count += 1,
                _ => runs.push((1, text.as_str())),
            }
        }
        let text = runs
            .iter()
            .map(|&(count, text)| match count {
                1 => text.to_string(),
                n => format!("{}*{}", n, text),
            })
            .collect::<Vec<_>>()
            .join(", ");
        (!text.is_empty()).then_some(text)
    }

    /// Append `list` to a statement whose last value sits just before it,
    /// widening a closed index to reach `last`.
    fn append_items(&self, statement: &StatementSpan, last: i64, list: &str, edits: &mut Vec<Edit>) -> bool {
        let tail = match statement.values.last() {
            Some(tail) if !tail.is_gap() => tail,
            _ => return false,
        };
        if let Some(index) = &statement.index {
            match index.index.dims.as_slice() {
                [bound] => match (bound.start, bound.end) {
                    (Some(first), Some(end)) if end < last => edits.push(Edit::replace(
                        index.span.offset,
                        index.span.end(),
                        format!("({}:{})", first, last),
                    )),
                    (Some(_), _) => {}
                    (None, _) => return false,
                },
                _ => return false,
            }
        }
        edits.push(Edit::insert(tail.span.end(), format!(", {}", list)));
        true
    }

    /// Replace the whole value list of an unindexed statement.
    fn rewrite_value_list(&self, statement: &StatementSpan, new: &Resolved, edits: &mut Vec<Edit>) -> bool {
        if statement.indexed_at.is_some() || !self.unindexed_start(new.start) {
            return false;
        }
        let (span, items) = match (statement.value_span(), new.value.scalars()) {
            (Some(span), Some(items)) if !items.is_empty() => (span, items),
            _ => return false,
        };
        edits.push(Edit::replace(span.offset, span.end(), value_list(&items, self.options)));
        true
    }

    /// Rewrite the index and value list of a one-dimensional indexed
    /// statement, e.g. `x(3:4) = 1, 2` to `x(5:7) = 1, 2, 3`.
    fn rewrite_indexed(&self, statement: &StatementSpan, new: &Resolved, edits: &mut Vec<Edit>) -> bool {
        if !statement.is_direct_index() {
            return false;
        }
        let index = match &statement.index {
            Some(index) if index.index.rank() == 1 => index,
            _ => return false,
        };
        let first = match new.start.map(|s| s.as_slice()) {
            Some([Some(first)]) => *first,
            _ => return false,
        };
        let (span, items) = match (statement.value_span(), new.value.scalars()) {
            (Some(span), Some(items)) if !items.is_empty() => (span, items),
            _ => return false,
        };
        let last = match i64::try_from(items.len() - 1).ok().and_then(|n| first.checked_add(n)) {
            Some(last) => last,
            None => return false,
        };

        let bounds = if first == last {
            format!("({})", first)
        } else {
            format!("({}:{})", first, last)
        };
        edits.push(Edit::replace(index.span.offset, index.span.end(), bounds));
        edits.push(Edit::replace(span.offset, span.end(), value_list(&items, self.options)));
        true
    }

    /// Serialize the value in place of its first statement and remove the
    /// others.
    fn rewrite_statements(&self, statements: &[&StatementSpan], new: &Resolved, edits: &mut Vec<Edit>) {
        let (first, rest) = match statements.split_first() {
            Some(split) => split,
            None => return,
        };
        let indent = line_indent(self.text, first.span.offset).unwrap_or("");
        let lines = variable_lines(&new.name(), new.value, new.start, self.options, indent);
        let text = lines
            .iter()
            .enumerate()
            .map(|(i, line)| match i {
                0 => line.strip_prefix(indent).unwrap_or(line),
                _ => line.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n");
        edits.push(Edit::replace(first.span.offset, first.span.end(), text));

        for statement in rest {
            edits.push(self.remove_statement(statement));
        }
    }

    /// Delete a statement, and its line too when nothing but a comment
    /// shares it.
    fn remove_statement(&self, statement: &StatementSpan) -> Edit {
        let start = statement.span.offset;
        let end = statement.span.end();
        let line_start = self.text[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.text[end..].find('\n').map_or(self.text.len(), |i| end + i);
        let after = self.text[end..line_end].trim();
        let alone = self.text[line_start..start].trim().is_empty()
            && (after.is_empty() || after.starts_with(|c| self.config.comment_tokens.contains(&c)));
        if alone {
            Edit::delete(line_start, (line_end + 1).min(self.text.len()))
        } else {
            Edit::delete(start, end)
        }
    }

    /// Add a variable just before the end of its group.
    fn insert_variable(&self, target: &Target, new: &Resolved, edits: &mut Vec<Edit>) {
        let indent = self.group_indent(&target.group, target.ordinal);
        let lines = variable_lines(&new.name(), new.value, new.start, self.options, indent);
        self.insert_lines(&target.group, target.ordinal, &lines, edits);
    }

    /// Indentation of the first statement of a group.
    fn group_indent(&self, group: &str, ordinal: usize) -> &'a str {
        let options: &'a WriteOptions = self.options;
        self.statements(group, ordinal)
            .next()
            .and_then(|s| line_indent(self.text, s.span.offset))
            .unwrap_or(options.indent.as_str())
    }

    /// Add whole lines just before the end of a group.
    fn insert_lines(&self, group: &str, ordinal: usize, lines: &[String], edits: &mut Vec<Edit>) {
        let group = match self.map.group(group, ordinal) {
            Some(group) => group,
            None => return,
        };
        let lines = lines.join("\n");

        let at = group.end.offset;
        if line_indent(self.text, at).is_some() {
            let line_start = self.text[..at].rfind('\n').map_or(0, |i| i + 1);
            edits.push(Edit::insert(line_start, format!("{}\n", lines)));
        } else {
            edits.push(Edit::insert(at, format!("\n{}\n", lines)));
        }
    }

    /// Render groups that do not occur in the text and append them.
    fn append_groups(&self, occurrences: &[(String, usize)]) -> Edit {
        let mut text = String::new();
        if !self.text.is_empty() {
            if !self.text.ends_with('\n') {
                text.push('\n');
            }
            text.push('\n');
        }
        let mut first = true;
        for (key, ordinal) in occurrences {
            let name = self.model.original_name(key).unwrap_or(key);
            let member = self
                .model
                .get(key)
                .and_then(|v| v.members().get(*ordinal).copied())
                .and_then(Value::as_group);
            if let Some(group) = member {
                if !first {
                    text.push('\n');
                }
                text.push_str(&group_string(name, group, self.options));
                first = false;
            }
        }
        Edit::insert(self.text.len(), text)
    }
}

/// Look a target up in a tree.
fn resolve<'t>(root: &'t Namelist, target: &Target) -> Option<Resolved<'t>> {
    let group = root
        .get(&target.group)?
        .members()
        .get(target.ordinal)
        .copied()?
        .as_group()?;
    let (last, parents) = target.keys.split_last()?;

    let mut node = group;
    let mut names = Vec::with_capacity(target.keys.len());
    for key in parents {
        names.push(node.original_name(key)?.to_string());
        node = node.get(key)?.as_group()?;
    }
    names.push(node.original_name(last)?.to_string());
    Some(Resolved {
        names,
        value: node.get(last)?,
        start: node.start_index(last),
    })
}

/// Whether each list position of a statement was left empty.
fn slot_nulls(statement: &StatementSpan) -> Vec<bool> {
    statement
        .values
        .iter()
        .flat_map(|v| std::iter::repeat(v.null).take(v.count))
        .collect()
}

/// The whitespace before `offset` on its line, if only whitespace is there.
fn line_indent(text: &str, offset: usize) -> Option<&str> {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let before = &text[line_start..offset];
    before.trim().is_empty().then_some(before)
}
