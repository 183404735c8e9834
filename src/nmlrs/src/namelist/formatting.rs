// nmlrs/src/namelist/formatting.rs

//! Default serialization of a namelist tree to namelist text.
//!
//! Each group is written as `&name`, one assignment per line, then `/`.
//! Arrays carry an index when their start is known (`x(0:2) = ...`),
//! multidimensional arrays are written one line per outer index, derived
//! types as `a%b = ...` and arrays of derived types as `a(i)%b = ...`.
//! Long value lists wrap at `column_width`, continuing under the first
//! value.

use super::core::Namelist;
use super::value::Value;
use crate::config::WriteOptions;
use crate::findex::StartIndex;
use crate::fortran_types::Scalar;

impl Namelist {
    /// Render the namelist with the given output options.
    ///
    /// The node is treated as a root: its entries are groups, and a
    /// duplicated group is written once per member. Groups are separated
    /// by a blank line.
    pub fn to_fortran_string(&self, options: &WriteOptions) -> String {
        let mut groups: Vec<(&str, &Namelist)> = self.groups().collect();
        if options.sort_groups {
            groups.sort_by_key(|(name, _)| name.to_lowercase());
        }
        for (name, value) in self.iter() {
            if value.members().iter().any(|m| m.as_group().is_none()) {
                log::warn!("skipping '{}': only groups can be written at the top level", name);
            }
        }

        let mut output = String::new();
        for (i, (name, group)) in groups.into_iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            output.push_str(&group_string(name, group, options));
        }
        output
    }
}

/// One group: header, assignments and terminator.
pub(crate) fn group_string(name: &str, group: &Namelist, options: &WriteOptions) -> String {
    let mut output = format!("&{}\n", cased(name, options));
    for (var, value) in entries(group, options) {
        for line in variable_lines(var, value, group.start_index(var), options, &options.indent) {
            output.push_str(&line);
            output.push('\n');
        }
    }
    output.push_str("/\n");
    output
}

/// Assignment lines for one variable, each starting with `indent`.
pub(crate) fn variable_lines(
    name: &str,
    value: &Value,
    start: Option<&StartIndex>,
    options: &WriteOptions,
    indent: &str,
) -> Vec<String> {
    let mut lines = Vec::new();
    push_variable(&mut lines, name, value, start, &[], options, indent);
    lines
}

fn push_variable(
    lines: &mut Vec<String>,
    name: &str,
    value: &Value,
    start: Option<&StartIndex>,
    outer: &[i64],
    options: &WriteOptions,
    indent: &str,
) {
    let name = cased(name, options);
    match value {
        Value::Cogroup(cogroup) => {
            for member in cogroup.values() {
                push_variable(lines, &name, member, start, outer, options, indent);
            }
        }
        Value::Group(group) => {
            for (field, field_value) in entries(group, options) {
                let title = format!("{}%{}", name, field);
                let field_start = group.start_index(field);
                push_variable(lines, &title, field_value, field_start, &[], options, indent);
            }
        }
        Value::Array(items) if items.iter().any(|v| matches!(v, Value::Array(_))) => {
            let first = dimension_start(start, start_dim(start, outer.len()), options);
            for (offset, item) in items.iter().enumerate() {
                if item.is_unset() {
                    continue;
                }
                let mut positions = vec![first + offset as i64];
                positions.extend_from_slice(outer);
                push_variable(lines, &name, item, start, &positions, options, indent);
            }
        }
        Value::Array(items) if items.iter().any(|v| matches!(v, Value::Group(_))) => {
            let first = dimension_start(start, Some(0), options);
            for (offset, item) in items.iter().enumerate() {
                if let Value::Group(group) = item {
                    for (field, field_value) in entries(group, options) {
                        let title = format!("{}({})%{}", name, first + offset as i64, field);
                        let field_start = group.start_index(field);
                        push_variable(lines, &title, field_value, field_start, &[], options, indent);
                    }
                }
            }
        }
        Value::Array(items) => {
            let scalars: Vec<&Scalar> = items.iter().filter_map(Value::as_scalar).collect();
            push_values(lines, &name, &scalars, true, start, outer, options, indent);
        }
        Value::Scalar(scalar) => {
            push_values(lines, &name, &[scalar], false, start, outer, options, indent);
        }
    }
}

/// Index of the start entry for the dimension `depth` levels from the
/// outermost one.
fn start_dim(start: Option<&StartIndex>, depth: usize) -> Option<usize> {
    start.and_then(|s| s.len().checked_sub(depth + 1))
}

fn dimension_start(start: Option<&StartIndex>, dim: Option<usize>, options: &WriteOptions) -> i64 {
    dim.and_then(|d| start.and_then(|s| s.get(d).copied().flatten()))
        .or(options.default_start_index)
        .unwrap_or(1)
}

#[allow(clippy::too_many_arguments)]
fn push_values(
    lines: &mut Vec<String>,
    name: &str,
    values: &[&Scalar],
    is_list: bool,
    start: Option<&StartIndex>,
    outer: &[i64],
    options: &WriteOptions,
    indent: &str,
) {
    let header = format!(
        "{}{}{} = ",
        indent,
        name,
        index_repr(values.len(), is_list, start, outer, options)
    );
    let header_len = header.chars().count();
    let width = options.column_width.max(header_len + 1);
    let pad = " ".repeat(header_len);

    let runs = repeat_runs(values, options.repeat_counter);
    let mut out = Vec::new();
    let mut line = header;
    for (i, (count, value)) in runs.iter().enumerate() {
        let comma = if i + 1 < runs.len() || options.end_comma {
            ", "
        } else {
            ""
        };
        let mut text = render_run(*count, value, options);

        if options.split_strings && matches!(value, Scalar::Character(_)) {
            let room = width.saturating_sub(line.chars().count() + comma.trim_end().len());
            if text.chars().count() > room {
                let next_line_len = header_len + text.chars().count() + comma.trim_end().len();
                if next_line_len <= width {
                    out.push(line.trim_end().to_string());
                    line = pad.clone();
                } else {
                    let (mut head, mut tail) = split_chars(&text, room);
                    while !tail.is_empty() {
                        line.push_str(&head);
                        out.push(line);
                        line = String::new();
                        let room = width.saturating_sub(comma.trim_end().len()).max(1);
                        let (h, t) = split_chars(&tail, room);
                        head = h;
                        tail = t;
                    }
                    text = head;
                }
            }
        }

        line.push_str(&text);
        line.push_str(comma);
        if line.chars().count() >= width {
            out.push(line.trim_end().to_string());
            line = pad.clone();
        }
    }
    if !line.trim().is_empty() {
        out.push(line.trim_end().to_string());
    }

    // A trailing null value must still be followed by a comma.
    let trailing_null = values.last().map_or(true, |v| v.is_unset());
    if trailing_null {
        if let Some(last) = out.last_mut() {
            last.push_str(" ,");
        }
    }
    lines.extend(out);
}

/// A value list on one line, without name or wrapping.
pub(crate) fn value_list(values: &[&Scalar], options: &WriteOptions) -> String {
    let text = repeat_runs(values, options.repeat_counter)
        .into_iter()
        .map(|(count, value)| render_run(count, value, options))
        .collect::<Vec<_>>()
        .join(", ");
    if values.last().map_or(true, |v| v.is_unset()) {
        let head = text.trim_end();
        if head.is_empty() {
            return ",".to_string();
        }
        return format!("{} ,", head);
    }
    text
}

fn index_repr(
    len: usize,
    is_list: bool,
    start: Option<&StartIndex>,
    outer: &[i64],
    options: &WriteOptions,
) -> String {
    let use_default = is_list && options.default_start_index.is_some();
    if outer.is_empty() && start.is_none() && !use_default {
        return String::new();
    }

    let mut repr = String::from("(");
    let first = match start {
        Some(s) => s.first().copied().flatten(),
        None if use_default => options.default_start_index,
        None => None,
    };
    match first {
        Some(first) => {
            let count = i64::try_from(len.max(1)).unwrap_or(i64::MAX);
            let last = first.saturating_add(count - 1);
            if first == last {
                repr.push_str(&first.to_string());
            } else {
                repr.push_str(&format!("{}:{}", first, last));
            }
        }
        None => repr.push(':'),
    }
    if !outer.is_empty() {
        let delim = if options.index_spacing { ", " } else { "," };
        for position in outer {
            repr.push_str(delim);
            repr.push_str(&position.to_string());
        }
    }
    repr.push(')');
    repr
}

/// Runs of equal consecutive values, or single values when repeat
/// counters are off.
fn repeat_runs<'a>(values: &[&'a Scalar], repeat_counter: bool) -> Vec<(usize, &'a Scalar)> {
    let mut runs: Vec<(usize, &Scalar)> = Vec::new();
    for &value in values {
        match runs.last_mut() {
            Some((count, last)) if repeat_counter && *last == value => *count += 1,
            _ => runs.push((1, value)),
        }
    }
    runs
}

fn render_run(count: usize, value: &Scalar, options: &WriteOptions) -> String {
    match (count, value) {
        (1, v) => v.to_fortran_string(options),
        (n, Scalar::Unset) => format!("{}*", n),
        (n, v) => format!("{}*{}", n, v.to_fortran_string(options)),
    }
}

fn split_chars(text: &str, at: usize) -> (String, String) {
    let head: String = text.chars().take(at).collect();
    let tail: String = text.chars().skip(at).collect();
    (head, tail)
}

fn entries<'a>(node: &'a Namelist, options: &WriteOptions) -> Vec<(&'a str, &'a Value)> {
    let mut entries: Vec<(&str, &Value)> = node.iter().collect();
    if options.sort_variables {
        entries.sort_by_key(|(name, _)| name.to_lowercase());
    }
    entries
}

fn cased(name: &str, options: &WriteOptions) -> String {
    if options.uppercase {
        name.to_uppercase()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(name: &str, value: Value, start: Option<StartIndex>, options: &WriteOptions) -> Vec<String> {
        variable_lines(name, &value, start.as_ref(), options, "")
    }

    #[test]
    fn test_group_layout() {
        let mut nml = Namelist::new();
        nml.insert_group("data_nml")
            .insert("x", 1i64)
            .insert("name", "abc")
            .insert("flag", true);
        let text = nml.to_fortran_string(&WriteOptions::default());
        assert_eq!(
            text,
            "&data_nml\n    x = 1\n    name = 'abc'\n    flag = .true.\n/\n"
        );
    }

    #[test]
    fn test_groups_separated_by_blank_line() {
        let mut nml = Namelist::new();
        nml.insert_group("a").insert("x", 1i64);
        nml.insert_group("b").insert("y", 2i64);
        let text = nml.to_fortran_string(&WriteOptions::default());
        assert_eq!(text, "&a\n    x = 1\n/\n\n&b\n    y = 2\n/\n");
    }

    #[test]
    fn test_array_with_known_start() {
        let opts = WriteOptions::default();
        assert_eq!(
            lines("x", vec![1i64, 2, 3].into(), Some(vec![Some(0)]), &opts),
            vec!["x(0:2) = 1, 2, 3"]
        );
        assert_eq!(lines("x", vec![1i64, 2].into(), None, &opts), vec!["x = 1, 2"]);
        let with_default = WriteOptions::default().with_default_start_index(Some(1));
        assert_eq!(
            lines("x", vec![1i64, 2].into(), None, &with_default),
            vec!["x(1:2) = 1, 2"]
        );
    }

    #[test]
    fn test_trailing_null_keeps_comma() {
        let value = Value::Array(vec![Value::from(1i64), Value::unset()]);
        assert_eq!(
            lines("x", value, None, &WriteOptions::default()),
            vec!["x = 1, ,"]
        );
    }

    #[test]
    fn test_multidimensional_one_line_per_column() {
        let value = Value::Array(vec![
            Value::from(vec![1i64, 2]),
            Value::from(vec![3i64, 4]),
        ]);
        let out = lines(
            "a",
            value,
            Some(vec![Some(1), Some(1)]),
            &WriteOptions::default(),
        );
        assert_eq!(out, vec!["a(1:2,1) = 1, 2", "a(1:2,2) = 3, 4"]);
    }

    #[test]
    fn test_derived_types() {
        let mut inner = Namelist::new();
        inner.insert("b", 1i64).insert("c", 2.5f64);
        let out = lines("a", Value::Group(inner.clone()), None, &WriteOptions::default());
        assert_eq!(out, vec!["a%b = 1", "a%c = 2.5"]);

        let array = Value::Array(vec![Value::Group(inner), Value::unset()]);
        let out = lines("t", array, Some(vec![Some(2)]), &WriteOptions::default());
        assert_eq!(out, vec!["t(2)%b = 1", "t(2)%c = 2.5"]);
    }

    #[test]
    fn test_wrapping_aligns_under_first_value() {
        let opts = WriteOptions::default().with_column_width(20);
        let out = lines("x", vec![100i64, 200, 300, 400, 500].into(), None, &opts);
        assert_eq!(out, vec!["x = 100, 200, 300, 400,", "    500"]);
    }

    #[test]
    fn test_repeat_counter() {
        let opts = WriteOptions::default().with_repeat_counter(true);
        let out = lines("x", vec![1i64, 1, 1, 2].into(), None, &opts);
        assert_eq!(out, vec!["x = 3*1, 2"]);
    }

    #[test]
    fn test_uppercase_and_end_comma() {
        let opts = WriteOptions::default().with_uppercase(true).with_end_comma(true);
        let mut nml = Namelist::new();
        nml.insert_group("grp").insert("val", 3i64);
        assert_eq!(nml.to_fortran_string(&opts), "&GRP\n    VAL = 3,\n/\n");
    }

    #[test]
    fn test_sorting() {
        let opts = WriteOptions::default().with_sorting(true, true);
        let mut nml = Namelist::new();
        nml.insert_group("zeta").insert("b", 1i64).insert("a", 2i64);
        nml.insert_group("alpha");
        assert_eq!(
            nml.to_fortran_string(&opts),
            "&alpha\n/\n\n&zeta\n    a = 2\n    b = 1\n/\n"
        );
    }

    #[test]
    fn test_duplicated_group_written_per_member() {
        let mut nml = Namelist::new();
        nml.add_group("run").1.insert("id", 1i64);
        nml.add_group("run").1.insert("id", 2i64);
        assert_eq!(
            nml.to_fortran_string(&WriteOptions::default()),
            "&run\n    id = 1\n/\n\n&run\n    id = 2\n/\n"
        );
    }

    #[test]
    fn test_split_strings() {
        let opts = WriteOptions::default()
            .with_column_width(16)
            .with_split_strings(true);
        let out = lines("s", Value::from("abcdefghijklmnopqrstuvwxyz"), None, &opts);
        assert!(out.len() > 1);
        let joined: String = out.concat();
        assert!(joined.starts_with("s = 'abc"));
        assert!(joined.contains("xyz'"));
    }
}
