// nmlrs/src/config.rs

//! Configuration values threaded through parsing, patching and writing.
//!
//! Both structs are plain values: build one, then pass it by reference to
//! every call that needs it. Nothing here is read from the environment.

/// Options that control how namelist text is read.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    /// Characters that start a comment running to the end of the line.
    pub comment_tokens: Vec<char>,
    /// Start index assumed for a dimension that never received an explicit index.
    pub default_start_index: i64,
    /// When set, every dimension of every array is addressed from this index.
    pub global_start_index: Option<i64>,
    /// Only accept the fixed logical spellings (`T`, `.true.`, ...).
    pub strict_logical: bool,
    /// Fill multidimensional index ranges with the last index varying
    /// fastest. Storage stays column-major either way.
    pub row_major: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            comment_tokens: vec!['!'],
            default_start_index: 1,
            global_start_index: None,
            strict_logical: true,
            row_major: false,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the comment delimiter set (default: `['!']`).
    pub fn with_comment_tokens<I: IntoIterator<Item = char>>(mut self, tokens: I) -> Self {
        self.comment_tokens = tokens.into_iter().collect();
        self
    }

    pub fn with_default_start_index(mut self, index: i64) -> Self {
        self.default_start_index = index;
        self
    }

    pub fn with_global_start_index(mut self, index: Option<i64>) -> Self {
        self.global_start_index = index;
        self
    }

    pub fn with_strict_logical(mut self, strict: bool) -> Self {
        self.strict_logical = strict;
        self
    }

    pub fn with_row_major(mut self, row_major: bool) -> Self {
        self.row_major = row_major;
        self
    }
}

/// Options for controlling namelist output formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOptions {
    /// Force overwrite existing files
    pub force: bool,
    /// Column width at which long value lists wrap
    pub column_width: usize,
    /// Indentation string (spaces or tabs)
    pub indent: String,
    /// Whether to end every assignment with a comma
    pub end_comma: bool,
    /// Whether to use uppercase for group and variable names
    pub uppercase: bool,
    /// Rendering of a true logical
    pub true_repr: String,
    /// Rendering of a false logical
    pub false_repr: String,
    /// Fixed number of decimals for reals; shortest exact form when unset
    pub float_precision: Option<usize>,
    /// Compact runs of equal values as `N*value`
    pub repeat_counter: bool,
    /// Add a space after commas inside array indices
    pub index_spacing: bool,
    /// Split strings longer than the column width over continuation lines
    pub split_strings: bool,
    /// Whether to sort namelist groups alphabetically
    pub sort_groups: bool,
    /// Whether to sort variables within groups alphabetically
    pub sort_variables: bool,
    /// Start index written for arrays whose start index is unknown
    pub default_start_index: Option<i64>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            force: false,
            column_width: 72,
            indent: "    ".to_string(),
            end_comma: false,
            uppercase: false,
            true_repr: ".true.".to_string(),
            false_repr: ".false.".to_string(),
            float_precision: None,
            repeat_counter: false,
            index_spacing: false,
            split_strings: false,
            sort_groups: false,
            sort_variables: false,
            default_start_index: None,
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_column_width(mut self, width: usize) -> Self {
        self.column_width = width;
        self
    }

    pub fn with_indent<S: Into<String>>(mut self, indent: S) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn with_end_comma(mut self, end_comma: bool) -> Self {
        self.end_comma = end_comma;
        self
    }

    pub fn with_uppercase(mut self, uppercase: bool) -> Self {
        self.uppercase = uppercase;
        self
    }

    /// Set both logical spellings, e.g. `("T", "F")`.
    pub fn with_logical_repr<S: Into<String>>(mut self, true_repr: S, false_repr: S) -> Self {
        self.true_repr = true_repr.into();
        self.false_repr = false_repr.into();
        self
    }

    pub fn with_float_precision(mut self, precision: Option<usize>) -> Self {
        self.float_precision = precision;
        self
    }

    pub fn with_repeat_counter(mut self, repeat_counter: bool) -> Self {
        self.repeat_counter = repeat_counter;
        self
    }

    pub fn with_index_spacing(mut self, spacing: bool) -> Self {
        self.index_spacing = spacing;
        self
    }

    pub fn with_split_strings(mut self, split: bool) -> Self {
        self.split_strings = split;
        self
    }

    pub fn with_sorting(mut self, groups: bool, variables: bool) -> Self {
        self.sort_groups = groups;
        self.sort_variables = variables;
        self
    }

    pub fn with_default_start_index(mut self, index: Option<i64>) -> Self {
        self.default_start_index = index;
        self
    }
}
