// nmlrs/src/findex.rs

//! Array index model and column-major index iteration.
//!
//! An [`Index`] holds one `start[:end]` bound per dimension as written in the
//! source. [`resolve_layout`] widens a variable's shape with each new write
//! through [`merge_bounds`] and decides, per dimension, which position maps
//! to storage offset zero and what start index is recorded.

use std::fmt;

/// Start index metadata recorded for a variable, one entry per dimension.
///
/// `None` marks a dimension whose start was never written explicitly.
pub type StartIndex = Vec<Option<i64>>;

/// A single dimension's bounds, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexBound {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl IndexBound {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }

    /// Create a simple range from start to end.
    pub fn range(start: i64, end: i64) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// Create a single index.
    pub fn single(index: i64) -> Self {
        Self::new(Some(index), Some(index))
    }

    /// Create an open range (`:`).
    pub fn open() -> Self {
        Self::new(None, None)
    }

    /// Union of two bounds; an unspecified side takes whatever the other has.
    pub fn union(&self, other: &IndexBound) -> IndexBound {
        IndexBound {
            start: min_option(self.start, other.start),
            end: max_option(self.end, other.end),
        }
    }
}

impl fmt::Display for IndexBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (Some(s), Some(e)) if s == e => write!(f, "{}", s),
            (s, e) => {
                if let Some(s) = s {
                    write!(f, "{}", s)?;
                }
                write!(f, ":")?;
                if let Some(e) = e {
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
        }
    }
}

/// A multi-dimensional index as written in `name(i:j, k)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Index {
    pub dims: Vec<IndexBound>,
}

impl Index {
    pub fn new(dims: Vec<IndexBound>) -> Self {
        Self { dims }
    }

    /// Index addressing exactly one element.
    pub fn element(positions: &[i64]) -> Self {
        Self::new(positions.iter().map(|&p| IndexBound::single(p)).collect())
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// True when every dimension names a single position.
    pub fn is_element(&self) -> bool {
        self.dims
            .iter()
            .all(|b| b.start.is_some() && b.start == b.end)
    }

    /// Explicit starts, as they would be recorded for a fresh variable.
    pub fn starts(&self) -> StartIndex {
        self.dims.iter().map(|b| b.start).collect()
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, bound) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", bound)?;
        }
        write!(f, ")")
    }
}

/// Merge a new index into a variable's existing shape.
///
/// Each dimension becomes the union of both bounds. Dimensions only present
/// in `new` are appended.
pub fn merge_bounds(existing: Option<&Index>, new: &Index) -> Index {
    let existing = match existing {
        Some(existing) => existing,
        None => return new.clone(),
    };

    let rank = existing.rank().max(new.rank());
    let dims = (0..rank)
        .map(|d| match (existing.dims.get(d), new.dims.get(d)) {
            (Some(a), Some(b)) => a.union(b),
            (Some(a), None) => *a,
            (None, Some(b)) => *b,
            (None, None) => IndexBound::open(),
        })
        .collect();
    Index { dims }
}

/// How a write is addressed in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Start index metadata to record after the write.
    pub first: StartIndex,
    /// Position stored at offset zero, per dimension.
    pub base: Vec<i64>,
    /// Elements to insert in front of existing data, per dimension.
    pub shift: Vec<usize>,
    /// Bounds of the variable once the write is done.
    pub shape: Index,
}

impl Layout {
    /// Storage offsets of `position`, or `None` if it lies before the base.
    pub fn offsets(&self, position: &[i64]) -> Option<Vec<usize>> {
        position
            .iter()
            .zip(&self.base)
            .map(|(&p, &b)| p.checked_sub(b).and_then(|d| usize::try_from(d).ok()))
            .collect()
    }
}

/// Resolve start indices for a write of `index` into a variable.
///
/// `existing` is the variable's current shape, `None` when it holds no
/// values yet. A dimension of `existing` without a start holds values that
/// were assigned without an index. Each dimension is resolved on its own.
/// When `global_start` is set it is folded into every written start, so it
/// takes precedence over `default_start`.
///
/// Returns `None` when the positions involved cannot be told apart in
/// storage (the distance between them overflows).
pub fn resolve_layout(
    existing: Option<&Index>,
    index: &Index,
    default_start: i64,
    global_start: Option<i64>,
) -> Option<Layout> {
    let written = Index::new(
        index
            .dims
            .iter()
            .map(|b| IndexBound {
                start: match global_start {
                    Some(g) => Some(g.min(b.start.unwrap_or(g))),
                    None => b.start,
                },
                end: b.end,
            })
            .collect(),
    );
    let shape = merge_bounds(existing, &written);

    let rank = shape.rank();
    let mut first = Vec::with_capacity(rank);
    let mut base = Vec::with_capacity(rank);
    let mut shift = Vec::with_capacity(rank);
    for (d, bound) in shape.dims.iter().enumerate() {
        let new_base = bound.start.unwrap_or(default_start);
        let count = match existing {
            Some(existing) => {
                let old_base = existing
                    .dims
                    .get(d)
                    .and_then(|b| b.start)
                    .unwrap_or(default_start);
                usize::try_from(old_base.checked_sub(new_base)?).unwrap_or(0)
            }
            None => 0,
        };
        first.push(bound.start);
        base.push(new_base);
        shift.push(count);
    }

    Some(Layout {
        first,
        base,
        shift,
        shape,
    })
}

/// Column-major iterator over the positions an index addresses.
///
/// The first dimension varies fastest, unless [`FIndex::row_major`] is
/// asked for. A dimension without an end bound is unbounded; the caller
/// stops when it runs out of values.
#[derive(Debug, Clone)]
pub struct FIndex {
    start: Vec<i64>,
    end: Vec<Option<i64>>,
    current: Vec<i64>,
    /// Dimensions from fastest to slowest varying
    order: Vec<usize>,
    exhausted: bool,
}

impl FIndex {
    /// Iterate `index`, taking the start of open dimensions from `base`.
    pub fn new(index: &Index, base: &[i64]) -> Self {
        let start: Vec<i64> = index
            .dims
            .iter()
            .enumerate()
            .map(|(d, b)| b.start.unwrap_or_else(|| base.get(d).copied().unwrap_or(1)))
            .collect();
        let end: Vec<Option<i64>> = index.dims.iter().map(|b| b.end).collect();
        let exhausted = start.is_empty()
            || start
                .iter()
                .zip(&end)
                .any(|(s, e)| e.map_or(false, |e| e < *s));

        Self {
            current: start.clone(),
            order: (0..start.len()).collect(),
            start,
            end,
            exhausted,
        }
    }

    /// Vary the last dimension fastest.
    pub fn row_major(mut self) -> Self {
        self.order.reverse();
        self
    }
}

impl Iterator for FIndex {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let position = self.current.clone();
        let slowest = *self.order.last()?;

        for &dim in &self.order {
            let has_room = self.end[dim].map_or(true, |e| self.current[dim] < e);
            if has_room || dim == slowest {
                match self.current[dim].checked_add(1) {
                    Some(next) => self.current[dim] = next,
                    None => self.exhausted = true,
                }
                break;
            }
            self.current[dim] = self.start[dim];
        }
        if let Some(e) = self.end[slowest] {
            if self.current[slowest] > e {
                self.exhausted = true;
            }
        }

        Some(position)
    }
}

fn min_option(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_option(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_bounds_union() {
        let first = Index::new(vec![IndexBound::range(3, 4)]);
        let second = Index::new(vec![IndexBound::range(6, 7)]);
        let merged = merge_bounds(Some(&first), &second);
        assert_eq!(merged.dims, vec![IndexBound::range(3, 7)]);
    }

    #[test]
    fn test_merge_bounds_widens_unspecified_and_appends() {
        let existing = Index::new(vec![IndexBound::new(None, Some(4))]);
        let new = Index::new(vec![IndexBound::new(Some(2), None), IndexBound::single(5)]);
        let merged = merge_bounds(Some(&existing), &new);
        assert_eq!(merged.dims[0], IndexBound::range(2, 4));
        assert_eq!(merged.dims[1], IndexBound::single(5));
        assert_eq!(merge_bounds(None, &new), new);
    }

    fn shape(bounds: &[(Option<i64>, Option<i64>)]) -> Index {
        Index::new(bounds.iter().map(|&(s, e)| IndexBound::new(s, e)).collect())
    }

    #[test]
    fn test_layout_fresh_variable() {
        let index = Index::new(vec![IndexBound::range(3, 5)]);
        let layout = resolve_layout(None, &index, 1, None).unwrap();
        assert_eq!(layout.first, vec![Some(3)]);
        assert_eq!(layout.base, vec![3]);
        assert_eq!(layout.offsets(&[4]), Some(vec![1]));
        assert_eq!(layout.shape, index);
    }

    #[test]
    fn test_layout_global_start_overrides() {
        let index = Index::new(vec![IndexBound::range(3, 5)]);
        let layout = resolve_layout(None, &index, 0, Some(1)).unwrap();
        assert_eq!(layout.first, vec![Some(1)]);
        assert_eq!(layout.offsets(&[3]), Some(vec![2]));
    }

    #[test]
    fn test_layout_extends_existing_downwards() {
        let existing = shape(&[(Some(3), Some(4))]);
        let index = Index::new(vec![IndexBound::range(1, 2)]);
        let layout = resolve_layout(Some(&existing), &index, 1, None).unwrap();
        assert_eq!(layout.first, vec![Some(1)]);
        assert_eq!(layout.shift, vec![2]);
        assert_eq!(layout.shape.dims, vec![IndexBound::range(1, 4)]);
    }

    #[test]
    fn test_layout_shape_is_union_of_writes() {
        let existing = shape(&[(Some(3), Some(4))]);
        let index = Index::new(vec![IndexBound::range(6, 7)]);
        let layout = resolve_layout(Some(&existing), &index, 1, None).unwrap();
        assert_eq!(layout.shape.dims, vec![IndexBound::range(3, 7)]);
        assert_eq!(layout.shift, vec![0]);
        assert_eq!(layout.offsets(&[6]), Some(vec![3]));
    }

    #[test]
    fn test_layout_mixed_dimensions_resolve_independently() {
        let index = Index::new(vec![IndexBound::open(), IndexBound::single(4)]);
        let layout = resolve_layout(None, &index, 1, None).unwrap();
        assert_eq!(layout.first, vec![None, Some(4)]);
        assert_eq!(layout.base, vec![1, 4]);
    }

    #[test]
    fn test_layout_implicit_data_counts_as_default() {
        let existing = shape(&[(Some(1), Some(2))]);
        let index = Index::element(&[5]);
        let layout = resolve_layout(Some(&existing), &index, 1, None).unwrap();
        assert_eq!(layout.first, vec![Some(1)]);
        assert_eq!(layout.offsets(&[5]), Some(vec![4]));
    }

    #[test]
    fn test_layout_extreme_positions() {
        let existing = shape(&[(Some(i64::MAX), Some(i64::MAX))]);
        let index = Index::element(&[i64::MIN]);
        assert!(resolve_layout(Some(&existing), &index, 1, None).is_none());

        let layout = resolve_layout(None, &Index::element(&[i64::MIN]), 1, None).unwrap();
        assert_eq!(layout.offsets(&[i64::MAX]), None);
    }

    #[test]
    fn test_findex_column_major() {
        let index = Index::new(vec![IndexBound::range(1, 2), IndexBound::range(1, 2)]);
        let positions: Vec<Vec<i64>> = FIndex::new(&index, &[1, 1]).collect();
        assert_eq!(
            positions,
            vec![vec![1, 1], vec![2, 1], vec![1, 2], vec![2, 2]]
        );
    }

    #[test]
    fn test_findex_open_end_is_unbounded() {
        let index = Index::new(vec![IndexBound::new(Some(3), None)]);
        let positions: Vec<Vec<i64>> = FIndex::new(&index, &[3]).take(4).collect();
        assert_eq!(positions, vec![vec![3], vec![4], vec![5], vec![6]]);
    }

    #[test]
    fn test_findex_row_major() {
        let index = Index::new(vec![IndexBound::range(1, 2), IndexBound::range(1, 2)]);
        let positions: Vec<Vec<i64>> = FIndex::new(&index, &[1, 1]).row_major().collect();
        assert_eq!(
            positions,
            vec![vec![1, 1], vec![1, 2], vec![2, 1], vec![2, 2]]
        );
    }

    #[test]
    fn test_findex_stops_at_largest_position() {
        let index = Index::element(&[i64::MAX]);
        let positions: Vec<Vec<i64>> = FIndex::new(&index, &[1]).collect();
        assert_eq!(positions, vec![vec![i64::MAX]]);

        let open = Index::new(vec![IndexBound::new(Some(i64::MAX - 1), None)]);
        assert_eq!(FIndex::new(&open, &[1]).count(), 2);
    }

    #[test]
    fn test_findex_empty_range() {
        let index = Index::new(vec![IndexBound::range(5, 3)]);
        assert_eq!(FIndex::new(&index, &[1]).count(), 0);
    }

    #[test]
    fn test_index_display() {
        let index = Index::new(vec![
            IndexBound::range(1, 3),
            IndexBound::single(2),
            IndexBound::open(),
        ]);
        assert_eq!(index.to_string(), "(1:3,2,:)");
    }
}
