// nmlrs/src/parser/source_map.rs

//! Byte spans of groups and assignments, recorded while parsing.
//!
//! The patch engine uses these to rewrite only the text that changes.

use crate::findex::Index;
use crate::namelist::core::normalize;
use crate::scanner::Span;

/// One occurrence of a group in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpan {
    /// Group name as written
    pub name: String,
    /// Normalized group name
    pub key: String,
    /// Position among groups with the same name
    pub ordinal: usize,
    /// The `&name` token
    pub start: Span,
    /// The `/` (or `&end`) token
    pub end: Span,
}

/// One item of a value list: a literal, a complex pair, a repeat or an
/// empty position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueSpan {
    /// Empty, just before the comma that closes it, for an empty position
    pub span: Span,
    /// `N*value` or `N*`
    pub repeat: bool,
    /// Number of list positions the item fills
    pub count: usize,
    /// An empty position, or `N*`
    pub null: bool,
}

impl ValueSpan {
    pub(crate) fn single(span: Span) -> Self {
        Self {
            span,
            repeat: false,
            count: 1,
            null: false,
        }
    }

    pub(crate) fn gap(span: Span) -> Self {
        Self {
            span,
            repeat: false,
            count: 1,
            null: true,
        }
    }

    /// An empty position with nothing written for it.
    pub fn is_gap(&self) -> bool {
        self.null && !self.repeat
    }
}

/// Index written on the last key of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpan {
    /// From `(` to `)`
    pub span: Span,
    pub index: Index,
}

/// One assignment statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSpan {
    /// Normalized name of the enclosing group
    pub group: String,
    pub group_ordinal: usize,
    /// Cogroup member of the last key the values went to, 0 when the key
    /// is not duplicated
    pub member: usize,
    /// Keys as written, one per `%`-separated segment
    pub names: Vec<String>,
    /// Position of the first segment carrying an index
    pub indexed_at: Option<usize>,
    pub index: Option<IndexSpan>,
    /// From the first key to the last token of the value list
    pub span: Span,
    pub values: Vec<ValueSpan>,
}

impl StatementSpan {
    /// Normalized keys of the value this statement writes into.
    ///
    /// The path stops at the first indexed key, since everything below an
    /// array element belongs to that array.
    pub fn target(&self) -> Vec<String> {
        let len = self.indexed_at.map_or(self.names.len(), |i| i + 1);
        self.names[..len].iter().map(|n| normalize(n)).collect()
    }

    /// Target keys as written, joined with `%`.
    pub fn target_name(&self) -> String {
        let len = self.indexed_at.map_or(self.names.len(), |i| i + 1);
        self.names[..len].join("%")
    }

    /// The index is on the last key, so the statement writes array elements
    /// directly rather than through a derived-type array.
    pub fn is_direct_index(&self) -> bool {
        self.index.is_some() && self.indexed_at == Some(self.names.len() - 1)
    }

    /// Writes into its target directly, not through a derived-type array.
    pub fn is_direct(&self) -> bool {
        self.indexed_at.map_or(true, |i| i + 1 == self.names.len())
    }

    /// Span from the first to the last value item.
    pub fn value_span(&self) -> Option<Span> {
        let first = self.values.first()?;
        let last = self.values.last()?;
        Some(first.span.to(&last.span))
    }

    /// Number of list positions the values fill, repeats expanded.
    pub fn slot_count(&self) -> usize {
        self.values.iter().map(|v| v.count).sum()
    }
}

/// Everything the parser recorded about where things are in the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMap {
    pub groups: Vec<GroupSpan>,
    pub statements: Vec<StatementSpan>,
}

impl SourceMap {
    pub fn group(&self, key: &str, ordinal: usize) -> Option<&GroupSpan> {
        let key = normalize(key);
        self.groups
            .iter()
            .find(|g| g.key == key && g.ordinal == ordinal)
    }

    /// Number of occurrences of a group name.
    pub fn group_count(&self, key: &str) -> usize {
        let key = normalize(key);
        self.groups.iter().filter(|g| g.key == key).count()
    }

    /// Statements of one group occurrence that write into `target`.
    pub fn statements_for<'a>(
        &'a self,
        key: &'a str,
        ordinal: usize,
        target: &'a [String],
    ) -> impl Iterator<Item = &'a StatementSpan> + 'a {
        self.statements
            .iter()
            .filter(move |s| s.group == key && s.group_ordinal == ordinal && s.target() == target)
    }
}
