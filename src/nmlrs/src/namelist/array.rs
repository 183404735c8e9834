// nmlrs/src/namelist/array.rs

//! Indexed writes into array variables.
//!
//! Arrays are stored as nested `Value::Array`s, one level per dimension,
//! with the last dimension outermost (column-major order). `row_major` only
//! changes the order in which a value list fills the positions of an index.
//! Writes outside the current storage grow it, padding with unset values.

use super::core::Namelist;
use super::value::Value;
use crate::config::ParserConfig;
use crate::error::{NmlError, Result};
use crate::findex::{resolve_layout, FIndex, Index, IndexBound, Layout, StartIndex};
use crate::fortran_types::Scalar;

/// Write `values` at the positions `index` addresses in `node[name]`.
///
/// With `keep_on_unset`, an unset value leaves an existing element alone,
/// so `x(1:3) = , 5,` only changes the middle element.
pub(crate) fn write_indexed(
    node: &mut Namelist,
    name: &str,
    index: &Index,
    values: Vec<Scalar>,
    keep_on_unset: bool,
    config: &ParserConfig,
) -> Result<()> {
    let layout = layout_for(node, name, index, config)?;
    let positions = FIndex::new(index, &layout.base);
    let positions: Box<dyn Iterator<Item = Vec<i64>>> = if config.row_major {
        Box::new(positions.row_major())
    } else {
        Box::new(positions)
    };
    let offsets = positions
        .take(values.len())
        .map(|position| storage_offsets(&layout, &position, name))
        .collect::<Result<Vec<_>>>()?;
    if offsets.len() < values.len() {
        return Err(NmlError::invalid_index(
            name,
            format!("{} values do not fit index {}", values.len(), index),
        ));
    }

    let stored = take_storage(node, name)?;
    let existed = stored.is_some();
    let mut items = stored.unwrap_or_default();
    let filled = apply_shift(&mut items, &layout, name).and_then(|()| {
        values.into_iter().zip(&offsets).try_for_each(|(value, offsets)| {
            set_at(&mut items, offsets, Value::Scalar(value), keep_on_unset, name)
        })
    });
    if existed || filled.is_ok() {
        put_storage(node, name, Value::Array(items));
    }
    filled?;
    log::trace!("{}{} written, shape {}", name, index, layout.shape);
    node.set_start_index(name, layout.first);
    Ok(())
}

/// Assign values written without an index onto a variable that already
/// holds indexed data. They land at the default (or global) start index.
pub(crate) fn write_unindexed_over(
    node: &mut Namelist,
    name: &str,
    values: Vec<Scalar>,
    config: &ParserConfig,
) -> Result<()> {
    let rank = node.start_index(name).map_or(1, |s| s.len());
    if rank != 1 {
        return Err(NmlError::invalid_index(
            name,
            format!("values without an index cannot fill a {}-dimensional array", rank),
        ));
    }
    let start = config
        .global_start_index
        .unwrap_or(config.default_start_index);
    let index = Index::new(vec![IndexBound::new(Some(start), None)]);
    write_indexed(node, name, &index, values, true, config)
}

/// Element `position` of a one-dimensional array of derived types,
/// created as an empty node if needed.
pub(crate) fn group_element_mut<'a>(
    node: &'a mut Namelist,
    name: &str,
    position: i64,
    config: &ParserConfig,
) -> Result<&'a mut Namelist> {
    let index = Index::element(&[position]);
    let layout = layout_for(node, name, &index, config)?;
    let offset = storage_offsets(&layout, &[position], name)?[0];

    let stored = take_storage(node, name)?;
    let existed = stored.is_some();
    let mut items = stored.unwrap_or_default();
    let grown = apply_shift(&mut items, &layout, name)
        .and_then(|()| grow(&mut items, offset, Value::unset(), name));
    if let Err(err) = grown {
        if existed {
            put_storage(node, name, Value::Array(items));
        }
        return Err(err);
    }
    let occupied = !items[offset].is_unset() && !matches!(items[offset], Value::Group(_));
    if !occupied && items[offset].is_unset() {
        items[offset] = Value::Group(Namelist::new());
    }
    put_storage(node, name, Value::Array(items));
    if occupied {
        return Err(NmlError::invalid_index(
            name,
            format!("element {} is not a derived type", position),
        ));
    }
    node.set_start_index(name, layout.first);

    match slot_mut(node, name) {
        Some(Value::Array(items)) => items[offset]
            .as_group_mut()
            .ok_or_else(|| NmlError::invalid_index(name, "element is not a derived type")),
        _ => Err(NmlError::KeyNotFound(name.to_string())),
    }
}

fn layout_for(node: &Namelist, name: &str, index: &Index, config: &ParserConfig) -> Result<Layout> {
    let meta = node.start_index(name);
    let stored = slot(node, name);
    check_rank(name, meta, stored.is_some(), index.rank())?;

    let existing = stored.map(|value| current_shape(value, meta, config.default_start_index));
    resolve_layout(
        existing.as_ref(),
        index,
        config.default_start_index,
        config.global_start_index,
    )
    .ok_or_else(|| NmlError::invalid_index(name, format!("index {} is out of range", index)))
}

/// Bounds a stored variable currently covers. Values stored without any
/// start index metadata count as starting at `default_start`.
fn current_shape(value: &Value, meta: Option<&StartIndex>, default_start: i64) -> Index {
    let mut extents = Vec::new();
    collect_extents(value, 0, &mut extents);
    let rank = meta.map_or(1, |m| m.len());

    let dims = (0..rank)
        .map(|d| {
            let start = match meta {
                Some(meta) => meta.get(d).copied().flatten(),
                None => Some(default_start),
            };
            let extent = extents.get(rank - 1 - d).copied().unwrap_or(0);
            let end = match extent {
                0 => None,
                n => i64::try_from(n - 1)
                    .ok()
                    .and_then(|n| start.unwrap_or(default_start).checked_add(n)),
            };
            IndexBound::new(start, end)
        })
        .collect();
    Index::new(dims)
}

/// Longest array found at each nesting level.
fn collect_extents(value: &Value, level: usize, extents: &mut Vec<usize>) {
    if extents.len() <= level {
        extents.resize(level + 1, 0);
    }
    match value {
        Value::Array(items) => {
            extents[level] = extents[level].max(items.len());
            for item in items {
                if matches!(item, Value::Array(_)) {
                    collect_extents(item, level + 1, extents);
                }
            }
        }
        _ => extents[level] = extents[level].max(1),
    }
}

/// Current storage of `name` as array elements, or `None` if absent.
/// A duplicated key is written through its last member.
fn take_storage(node: &mut Namelist, name: &str) -> Result<Option<Vec<Value>>> {
    let slot = match slot_mut(node, name) {
        Some(slot) => slot,
        None => return Ok(None),
    };
    match std::mem::replace(slot, Value::unset()) {
        Value::Array(items) => Ok(Some(items)),
        Value::Scalar(s) => Ok(Some(vec![Value::Scalar(s)])),
        Value::Group(g) => Ok(Some(vec![Value::Group(g)])),
        other => {
            let kind = other.type_name();
            *slot = other;
            Err(NmlError::invalid_index(
                name,
                format!("cannot index a {} value", kind),
            ))
        }
    }
}

fn put_storage(node: &mut Namelist, name: &str, value: Value) {
    match slot_mut(node, name) {
        Some(slot) => *slot = value,
        None => {
            node.set(name, value);
        }
    }
}

fn slot<'a>(node: &'a Namelist, name: &str) -> Option<&'a Value> {
    match node.get(name)? {
        Value::Cogroup(c) => c.values().last(),
        other => Some(other),
    }
}

fn slot_mut<'a>(node: &'a mut Namelist, name: &str) -> Option<&'a mut Value> {
    match node.get_mut(name)? {
        Value::Cogroup(c) => c.last_mut(),
        other => Some(other),
    }
}

fn check_rank(
    name: &str,
    meta: Option<&StartIndex>,
    has_data: bool,
    rank: usize,
) -> Result<()> {
    let existing = match meta {
        Some(meta) => meta.len(),
        None if has_data => 1,
        None => return Ok(()),
    };
    if existing != rank {
        return Err(NmlError::invalid_index(
            name,
            format!("index has {} dimensions, array has {}", rank, existing),
        ));
    }
    Ok(())
}

fn apply_shift(items: &mut Vec<Value>, layout: &Layout, name: &str) -> Result<()> {
    let rank = layout.base.len();
    for (dim, &count) in layout.shift.iter().enumerate() {
        if count > 0 {
            pad_front(items, rank - 1 - dim, count, rank, name)?;
        }
    }
    Ok(())
}

/// Insert `count` empty slots at the front of every array at `level`.
fn pad_front(items: &mut Vec<Value>, level: usize, count: usize, depth: usize, name: &str) -> Result<()> {
    if level == 0 {
        let fill = if depth == 1 {
            Value::unset()
        } else {
            Value::Array(Vec::new())
        };
        reserve(items, count, name)?;
        items.splice(0..0, std::iter::repeat(fill).take(count));
        return Ok(());
    }
    for item in items.iter_mut() {
        if let Value::Array(inner) = item {
            pad_front(inner, level - 1, count, depth - 1, name)?;
        }
    }
    Ok(())
}

fn storage_offsets(layout: &Layout, position: &[i64], name: &str) -> Result<Vec<usize>> {
    let mut offsets = layout.offsets(position).ok_or_else(|| {
        NmlError::invalid_index(name, format!("position {:?} is out of range", position))
    })?;
    offsets.reverse();
    Ok(offsets)
}

fn reserve(items: &mut Vec<Value>, additional: usize, name: &str) -> Result<()> {
    items
        .try_reserve(additional)
        .map_err(|_| NmlError::invalid_index(name, "array is too large to store"))
}

/// Make `items[offset]` addressable, filling new slots with `fill`.
fn grow(items: &mut Vec<Value>, offset: usize, fill: Value, name: &str) -> Result<()> {
    if items.len() > offset {
        return Ok(());
    }
    let len = offset
        .checked_add(1)
        .ok_or_else(|| NmlError::invalid_index(name, "array is too large to store"))?;
    reserve(items, len - items.len(), name)?;
    items.resize(len, fill);
    Ok(())
}

fn set_at(
    items: &mut Vec<Value>,
    offsets: &[usize],
    value: Value,
    keep_on_unset: bool,
    name: &str,
) -> Result<()> {
    let i = offsets[0];
    if offsets.len() == 1 {
        grow(items, i, Value::unset(), name)?;
        if !(keep_on_unset && value.is_unset()) {
            items[i] = value;
        }
        return Ok(());
    }

    grow(items, i, Value::Array(Vec::new()), name)?;
    if !matches!(items[i], Value::Array(_)) {
        items[i] = Value::Array(Vec::new());
    }
    match &mut items[i] {
        Value::Array(inner) => set_at(inner, &offsets[1..], value, keep_on_unset, name),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Scalar> {
        values.iter().map(|&v| Scalar::Integer(v)).collect()
    }

    fn flat(value: &Value) -> Vec<Option<i64>> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_scalar().and_then(|s| s.as_integer().ok()))
            .collect()
    }

    #[test]
    fn test_union_of_ranges() {
        let config = ParserConfig::default();
        let mut node = Namelist::new();
        let first = Index::new(vec![IndexBound::range(3, 4)]);
        let second = Index::new(vec![IndexBound::range(6, 7)]);
        write_indexed(&mut node, "x", &first, ints(&[1, 2]), true, &config).unwrap();
        write_indexed(&mut node, "x", &second, ints(&[3, 4]), true, &config).unwrap();
        assert_eq!(
            flat(node.get("x").unwrap()),
            vec![Some(1), Some(2), None, Some(3), Some(4)]
        );
        assert_eq!(node.start_index("x"), Some(&vec![Some(3)]));
    }

    #[test]
    fn test_write_before_start_pads_front() {
        let config = ParserConfig::default();
        let mut node = Namelist::new();
        let late = Index::new(vec![IndexBound::range(4, 5)]);
        write_indexed(&mut node, "x", &late, ints(&[4, 5]), true, &config).unwrap();
        write_indexed(&mut node, "x", &Index::element(&[1]), ints(&[1]), true, &config).unwrap();
        assert_eq!(
            flat(node.get("x").unwrap()),
            vec![Some(1), None, None, Some(4), Some(5)]
        );
        assert_eq!(node.start_index("x"), Some(&vec![Some(1)]));
    }

    #[test]
    fn test_two_dimensional_column_major() {
        let config = ParserConfig::default();
        let mut node = Namelist::new();
        let index = Index::new(vec![IndexBound::range(1, 2), IndexBound::range(1, 2)]);
        write_indexed(&mut node, "m", &index, ints(&[1, 2, 3, 4]), true, &config).unwrap();
        let outer = node.get("m").unwrap().as_array().unwrap();
        assert_eq!(flat(&outer[0]), vec![Some(1), Some(2)]);
        assert_eq!(flat(&outer[1]), vec![Some(3), Some(4)]);
    }

    #[test]
    fn test_too_many_values() {
        let config = ParserConfig::default();
        let mut node = Namelist::new();
        let index = Index::new(vec![IndexBound::range(1, 2)]);
        let err = write_indexed(&mut node, "x", &index, ints(&[1, 2, 3]), true, &config);
        assert!(matches!(err, Err(NmlError::InvalidIndex { .. })));
    }

    #[test]
    fn test_unset_keeps_existing() {
        let config = ParserConfig::default();
        let mut node = Namelist::new();
        let index = Index::new(vec![IndexBound::range(1, 3)]);
        write_indexed(&mut node, "x", &index, ints(&[1, 2, 3]), true, &config).unwrap();
        let update = vec![Scalar::Unset, Scalar::Integer(5), Scalar::Unset];
        write_indexed(&mut node, "x", &index, update, true, &config).unwrap();
        assert_eq!(flat(node.get("x").unwrap()), vec![Some(1), Some(5), Some(3)]);
    }

    #[test]
    fn test_unindexed_over_indexed() {
        let config = ParserConfig::default();
        let mut node = Namelist::new();
        let index = Index::new(vec![IndexBound::range(3, 4)]);
        write_indexed(&mut node, "x", &index, ints(&[7, 8]), true, &config).unwrap();
        write_unindexed_over(&mut node, "x", ints(&[1, 2]), &config).unwrap();
        assert_eq!(
            flat(node.get("x").unwrap()),
            vec![Some(1), Some(2), Some(7), Some(8)]
        );
        assert_eq!(node.start_index("x"), Some(&vec![Some(1)]));
    }

    #[test]
    fn test_row_major_fill_order() {
        let config = ParserConfig::default().with_row_major(true);
        let mut node = Namelist::new();
        let index = Index::new(vec![IndexBound::range(1, 2), IndexBound::range(1, 2)]);
        write_indexed(&mut node, "m", &index, ints(&[1, 2, 3, 4]), true, &config).unwrap();
        // m(1,1)=1, m(1,2)=2, m(2,1)=3, m(2,2)=4, still stored column by column
        let outer = node.get("m").unwrap().as_array().unwrap();
        assert_eq!(flat(&outer[0]), vec![Some(1), Some(3)]);
        assert_eq!(flat(&outer[1]), vec![Some(2), Some(4)]);

        let mut elements = Namelist::new();
        for (position, value) in [([1, 2], 2), ([2, 1], 4)] {
            write_indexed(&mut elements, "a", &Index::element(&position), ints(&[value]), true, &config)
                .unwrap();
        }
        let outer = elements.get("a").unwrap().as_array().unwrap();
        assert_eq!(flat(&outer[0]), vec![None, Some(4)]);
        assert_eq!(flat(&outer[1]), vec![Some(2)]);
    }

    #[test]
    fn test_extreme_positions_are_errors() {
        let config = ParserConfig::default();
        let mut node = Namelist::new();
        write_indexed(&mut node, "x", &Index::element(&[i64::MAX]), ints(&[1]), true, &config).unwrap();
        assert_eq!(node.start_index("x"), Some(&vec![Some(i64::MAX)]));

        let err = write_indexed(&mut node, "x", &Index::element(&[i64::MIN]), ints(&[2]), true, &config);
        assert!(matches!(err, Err(NmlError::InvalidIndex { .. })));
        let err = write_indexed(&mut node, "x", &Index::element(&[1]), ints(&[2]), true, &config);
        assert!(matches!(err, Err(NmlError::InvalidIndex { .. })));
        assert_eq!(flat(node.get("x").unwrap()), vec![Some(1)]);
    }

    #[test]
    fn test_rank_mismatch() {
        let config = ParserConfig::default();
        let mut node = Namelist::new();
        write_indexed(&mut node, "x", &Index::element(&[1]), ints(&[1]), true, &config).unwrap();
        let err = write_indexed(&mut node, "x", &Index::element(&[1, 1]), ints(&[1]), true, &config);
        assert!(err.is_err());
    }

    #[test]
    fn test_group_elements() {
        let config = ParserConfig::default();
        let mut node = Namelist::new();
        group_element_mut(&mut node, "a", 2, &config)
            .unwrap()
            .set("b", 5i64);
        group_element_mut(&mut node, "a", 1, &config)
            .unwrap()
            .set("b", 4i64);
        let items = node.get("a").unwrap().as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_group().unwrap().get_i64("b"), Some(4));
        assert_eq!(items[1].as_group().unwrap().get_i64("b"), Some(5));
        assert_eq!(node.start_index("a"), Some(&vec![Some(1)]));
    }
}
