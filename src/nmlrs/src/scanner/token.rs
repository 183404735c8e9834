// nmlrs/src/scanner/token.rs

//! Token types and structures for namelist lexical analysis.

use std::fmt;

use crate::error::Position;

/// Where a token sits in the source text.
///
/// `offset` and `len` are byte counts so that spans can be sliced straight
/// out of the original string when patching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in characters)
    pub column: usize,
}

impl Span {
    /// Byte offset one past the end of the token.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: &Span) -> Span {
        let end = self.end().max(other.end());
        Span {
            offset: self.offset,
            len: end - self.offset,
            line: self.line,
            column: self.column,
        }
    }
}

/// Single-character operators recognised inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Assign,
    Comma,
    LeftParen,
    RightParen,
    Percent,
    Star,
    Colon,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '=' => Some(Operator::Assign),
            ',' => Some(Operator::Comma),
            '(' => Some(Operator::LeftParen),
            ')' => Some(Operator::RightParen),
            '%' => Some(Operator::Percent),
            '*' => Some(Operator::Star),
            ':' => Some(Operator::Colon),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Operator::Assign => '=',
            Operator::Comma => ',',
            Operator::LeftParen => '(',
            Operator::RightParen => ')',
            Operator::Percent => '%',
            Operator::Star => '*',
            Operator::Colon => ':',
        }
    }
}

/// Token kinds in a namelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `&name` or `$name`; the lexeme includes the name
    GroupStart,
    /// `/`, `&end`, `$end` or a bare `$`
    GroupEnd,
    /// Identifier: variable names and bare words such as `T` or `abc`
    Name,
    Operator(Operator),
    /// Numbers, dotted words like `.true.`, and stray punctuation
    Literal,
    /// Quoted string; the lexeme keeps its delimiters
    String { quote: char },
    /// Comment text, or inert text outside any group
    Comment,
    Whitespace,
    Newline,
    Eof,
}

/// A token in the namelist source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The raw text of the token
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: String, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    /// Whitespace, newlines and comments carry no grammar.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment
        )
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        self.kind == TokenKind::Operator(op)
    }

    /// Name of the group opened by a `GroupStart` token.
    pub fn group_name(&self) -> Option<&str> {
        match self.kind {
            TokenKind::GroupStart => Some(&self.lexeme[1..]),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Newline => write!(f, "end of line"),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}
