// nmlrs/src/error.rs

//! Error types for parsing, editing and patching namelists.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for nmlrs operations.
pub type Result<T> = std::result::Result<T, NmlError>;

/// A location in the source text: 1-based line and column plus byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// Errors that can occur when reading, editing, writing or patching namelists.
#[derive(Debug, Error)]
pub enum NmlError {
    /// End of input reached inside an open string literal.
    #[error("unterminated string literal starting at line {line}, column {column}")]
    UnterminatedString {
        line: usize,
        column: usize,
        offset: usize,
    },

    /// End of input reached while a group was still open.
    #[error("group '{group}' opened at line {line}, column {column} is never closed")]
    UnterminatedGroup {
        group: String,
        line: usize,
        column: usize,
        offset: usize,
    },

    /// The token sequence does not fit the grammar at this point.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
        offset: usize,
    },

    /// A literal could not be classified, not even as a string.
    #[error("cannot classify literal '{literal}'")]
    AmbiguousType { literal: String },

    /// A patch selected a cogroup member that does not exist.
    #[error("patch target '{path}' has no member {member} ({available} available)")]
    PatchTargetNotFound {
        path: String,
        member: usize,
        available: usize,
    },

    #[error("key '{0}' not found")]
    KeyNotFound(String),

    #[error("invalid key path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("invalid index for '{variable}': {message}")]
    InvalidIndex { variable: String, message: String },

    #[error("cannot convert {from} value to {to}")]
    TypeConversion {
        from: &'static str,
        to: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("file already exists: {}", .0.display())]
    FileAlreadyExists(PathBuf),

    #[error("patch output must differ from the input file: {}", .0.display())]
    SamePath(PathBuf),

    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "yaml")]
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl NmlError {
    pub(crate) fn syntax<S: Into<String>>(message: S, at: Position) -> Self {
        NmlError::Syntax {
            message: message.into(),
            line: at.line,
            column: at.column,
            offset: at.offset,
        }
    }

    pub(crate) fn invalid_index<S: Into<String>, M: Into<String>>(variable: S, message: M) -> Self {
        NmlError::InvalidIndex {
            variable: variable.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_path<S: Into<String>, M: Into<String>>(path: S, message: M) -> Self {
        NmlError::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Source position of the error, for errors raised while reading text.
    pub fn position(&self) -> Option<Position> {
        match *self {
            NmlError::UnterminatedString {
                line,
                column,
                offset,
            }
            | NmlError::UnterminatedGroup {
                line,
                column,
                offset,
                ..
            }
            | NmlError::Syntax {
                line,
                column,
                offset,
                ..
            } => Some(Position {
                line,
                column,
                offset,
            }),
            _ => None,
        }
    }

    /// Get the error category for logging purposes.
    pub fn category(&self) -> &'static str {
        match self {
            NmlError::UnterminatedString { .. } => "string",
            NmlError::UnterminatedGroup { .. } => "group",
            NmlError::Syntax { .. } => "syntax",
            NmlError::AmbiguousType { .. } => "type",
            NmlError::PatchTargetNotFound { .. } => "patch",
            NmlError::KeyNotFound(_) | NmlError::InvalidPath { .. } => "path",
            NmlError::InvalidIndex { .. } => "index",
            NmlError::TypeConversion { .. } => "conversion",
            NmlError::Io(_) | NmlError::FileAlreadyExists(_) | NmlError::SamePath(_) => "io",
            #[cfg(feature = "json")]
            NmlError::Json(_) => "json",
            #[cfg(feature = "yaml")]
            NmlError::Yaml(_) => "yaml",
        }
    }

    /// True for errors raised while reading namelist text.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            NmlError::UnterminatedString { .. }
                | NmlError::UnterminatedGroup { .. }
                | NmlError::Syntax { .. }
                | NmlError::AmbiguousType { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = NmlError::syntax(
            "expected '='",
            Position {
                line: 3,
                column: 7,
                offset: 40,
            },
        );
        assert_eq!(
            err.to_string(),
            "syntax error at line 3, column 7: expected '='"
        );
        assert_eq!(err.category(), "syntax");
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_position_accessor() {
        let err = NmlError::UnterminatedString {
            line: 2,
            column: 6,
            offset: 11,
        };
        let pos = err.position().unwrap();
        assert_eq!((pos.line, pos.column, pos.offset), (2, 6, 11));
        assert!(NmlError::KeyNotFound("x".into()).position().is_none());
    }

    #[test]
    fn test_patch_target_display() {
        let err = NmlError::PatchTargetNotFound {
            path: "config".into(),
            member: 3,
            available: 2,
        };
        assert!(err.to_string().contains("member 3"));
        assert_eq!(err.category(), "patch");
        assert!(!err.is_parse_error());
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: NmlError = io_err.into();
        assert_eq!(err.category(), "io");
    }
}
