// nmlrs/src/scanner/lexer.rs

//! Low-level lexical analysis for namelist tokens.
//!
//! The lexer walks the input once, producing tokens lazily. It tracks
//! whether a group is open, and scans quoted strings as a single unit so
//! that comment markers and group delimiters inside them are never seen.

use super::token::{Operator, Span, Token, TokenKind};
use crate::config::ParserConfig;
use crate::error::{NmlError, Position, Result};

#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: usize,
    column: usize,
}

#[derive(Debug, Clone)]
enum LexState {
    OutsideGroup,
    InsideGroup {
        opener: char,
        name: String,
        start: Mark,
    },
}

/// Lazy tokenizer over a borrowed source string.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    comment_tokens: Vec<char>,
    state: LexState,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            comment_tokens: vec!['!'],
            state: LexState::OutsideGroup,
            finished: false,
        }
    }

    /// Create a lexer using the comment delimiters of a parser configuration.
    pub fn with_config(src: &'a str, config: &ParserConfig) -> Self {
        Self::new(src).with_comment_tokens(config.comment_tokens.iter().copied())
    }

    /// Set comment tokens (default: `['!']`).
    pub fn with_comment_tokens<I: IntoIterator<Item = char>>(mut self, tokens: I) -> Self {
        self.comment_tokens = tokens.into_iter().collect();
        self
    }

    /// True while a group has been opened and not yet closed.
    pub fn in_group(&self) -> bool {
        matches!(self.state, LexState::InsideGroup { .. })
    }

    /// Scan the next token.
    pub fn scan_token(&mut self) -> Result<Token> {
        let start = self.mark();
        let c = match self.peek() {
            Some(c) => c,
            None => return self.scan_eof(start),
        };

        if c == '\n' || (c == '\r' && self.peek_nth(1) == Some('\n')) {
            if c == '\r' {
                self.advance();
            }
            self.advance();
            return Ok(self.make(TokenKind::Newline, start));
        }
        if c.is_whitespace() {
            return Ok(self.scan_whitespace(start));
        }
        if self.comment_tokens.contains(&c) {
            return Ok(self.scan_comment(start));
        }

        match self.state {
            LexState::OutsideGroup => Ok(self.scan_outside(start, c)),
            LexState::InsideGroup { opener, .. } => self.scan_inside(start, c, opener),
        }
    }

    /// A group header seen while another group is still open.
    fn nested_group(&self, start: Mark) -> NmlError {
        let header: String = self.src[self.pos..]
            .chars()
            .take(1)
            .chain(self.src[self.pos..].chars().skip(1).take_while(|&c| is_name_char(c)))
            .collect();
        let open = match &self.state {
            LexState::InsideGroup { name, .. } => name.as_str(),
            LexState::OutsideGroup => "",
        };
        NmlError::syntax(
            format!("'{}' starts a group before group '{}' is closed", header, open),
            Position {
                line: start.line,
                column: start.column,
                offset: start.pos,
            },
        )
    }

    fn scan_eof(&mut self, start: Mark) -> Result<Token> {
        if let LexState::InsideGroup {
            name, start: opened, ..
        } = &self.state
        {
            return Err(NmlError::UnterminatedGroup {
                group: name.clone(),
                line: opened.line,
                column: opened.column,
                offset: opened.pos,
            });
        }
        Ok(self.make(TokenKind::Eof, start))
    }

    fn scan_whitespace(&mut self, start: Mark) -> Token {
        while let Some(c) = self.peek() {
            let line_break = c == '\n' || (c == '\r' && self.peek_nth(1) == Some('\n'));
            if !c.is_whitespace() || line_break {
                break;
            }
            self.advance();
        }
        self.make(TokenKind::Whitespace, start)
    }

    fn scan_comment(&mut self, start: Mark) -> Token {
        while let Some(c) = self.peek() {
            if c == '\n' || (c == '\r' && self.peek_nth(1) == Some('\n')) {
                break;
            }
            self.advance();
        }
        self.make(TokenKind::Comment, start)
    }

    fn opens_group(&self, c: char) -> bool {
        (c == '&' || c == '$') && self.peek_nth(1).map_or(false, |n| n.is_ascii_alphabetic())
    }

    fn scan_outside(&mut self, start: Mark, c: char) -> Token {
        if self.opens_group(c) {
            self.advance();
            self.consume_while(is_name_char);
            let token = self.make(TokenKind::GroupStart, start);
            if !token.lexeme[1..].eq_ignore_ascii_case("end") {
                log::trace!("group {} opened at line {}", token.lexeme, start.line);
                self.state = LexState::InsideGroup {
                    opener: c,
                    name: token.lexeme[1..].to_string(),
                    start,
                };
                return token;
            }
            // A stray `&end` outside a group is inert text.
            return Token::new(TokenKind::Comment, token.lexeme, token.span);
        }

        // Inert text runs to the next blank, comment marker or group opener.
        self.advance();
        while let Some(n) = self.peek() {
            if n.is_whitespace() || self.comment_tokens.contains(&n) || self.opens_group(n) {
                break;
            }
            self.advance();
        }
        self.make(TokenKind::Comment, start)
    }

    fn scan_inside(&mut self, start: Mark, c: char, opener: char) -> Result<Token> {
        if c == '/' {
            self.advance();
            return Ok(self.close_group(start));
        }
        if c == '&' || c == '$' {
            if self.matches_end_keyword() {
                for _ in 0..4 {
                    self.advance();
                }
                return Ok(self.close_group(start));
            }
            if self.opens_group(c) {
                return Err(self.nested_group(start));
            }
            self.advance();
            if c == '$' && opener == '$' {
                return Ok(self.close_group(start));
            }
            return Ok(self.make(TokenKind::Literal, start));
        }
        if c == '\'' || c == '"' {
            return self.scan_string(start, c);
        }
        if let Some(op) = Operator::from_char(c) {
            self.advance();
            return Ok(self.make(TokenKind::Operator(op), start));
        }

        let next = self.peek_nth(1);
        let next_is_digit = next.map_or(false, |n| n.is_ascii_digit());
        match c {
            _ if c.is_ascii_digit() => {
                self.scan_number();
                Ok(self.make(TokenKind::Literal, start))
            }
            '+' | '-' => {
                self.advance();
                let dot_digit = next == Some('.')
                    && self.peek_nth(1).map_or(false, |n| n.is_ascii_digit());
                if next_is_digit || dot_digit {
                    self.scan_number();
                } else if next.map_or(false, |n| n.is_ascii_alphabetic()) {
                    self.consume_while(is_name_char);
                }
                Ok(self.make(TokenKind::Literal, start))
            }
            '.' => {
                if next_is_digit {
                    self.scan_number();
                } else {
                    self.advance();
                    if next.map_or(false, |n| n.is_ascii_alphabetic()) {
                        self.consume_while(is_name_char);
                        if self.peek() == Some('.') {
                            self.advance();
                        }
                    }
                }
                Ok(self.make(TokenKind::Literal, start))
            }
            _ if c.is_alphabetic() || c == '_' => {
                self.consume_while(is_name_char);
                Ok(self.make(TokenKind::Name, start))
            }
            _ => {
                self.advance();
                Ok(self.make(TokenKind::Literal, start))
            }
        }
    }

    fn close_group(&mut self, start: Mark) -> Token {
        self.state = LexState::OutsideGroup;
        self.make(TokenKind::GroupEnd, start)
    }

    fn matches_end_keyword(&self) -> bool {
        let rest = &self.src[self.pos + 1..];
        rest.len() >= 3
            && rest.is_char_boundary(3)
            && rest[..3].eq_ignore_ascii_case("end")
            && !rest[3..].chars().next().map_or(false, is_name_char)
    }

    /// Inside-string state: runs until the matching delimiter. A doubled
    /// delimiter is an escaped quote, not a terminator.
    fn scan_string(&mut self, start: Mark, quote: char) -> Result<Token> {
        self.advance();
        loop {
            match self.advance() {
                None => {
                    return Err(NmlError::UnterminatedString {
                        line: start.line,
                        column: start.column,
                        offset: start.pos,
                    })
                }
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(_) => {}
            }
        }
        Ok(self.make(TokenKind::String { quote }, start))
    }

    /// Mantissa, then an optional exponent (`e`, `d`, or a bare sign) and
    /// kind suffix. The leading sign, if any, is already consumed.
    fn scan_number(&mut self) {
        self.consume_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            self.advance();
            self.consume_while(|c| c.is_ascii_digit());
        }

        let digit_at = |lexer: &Self, n: usize| lexer.peek_nth(n).map_or(false, |c| c.is_ascii_digit());
        match self.peek() {
            Some('e' | 'E' | 'd' | 'D') => {
                let signed = matches!(self.peek_nth(1), Some('+' | '-'));
                if digit_at(self, 1) || (signed && digit_at(self, 2)) {
                    self.advance();
                    if signed {
                        self.advance();
                    }
                    self.consume_while(|c| c.is_ascii_digit());
                }
            }
            Some('+' | '-') if digit_at(self, 1) => {
                self.advance();
                self.consume_while(|c| c.is_ascii_digit());
            }
            _ => {}
        }

        if self.peek() == Some('_') && self.peek_nth(1).map_or(false, |c| c.is_alphanumeric()) {
            self.advance();
            self.consume_while(is_name_char);
        }
    }

    fn consume_while<F: Fn(char) -> bool>(&mut self, pred: F) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn make(&self, kind: TokenKind, start: Mark) -> Token {
        let span = Span {
            offset: start.pos,
            len: self.pos - start.pos,
            line: start.line,
            column: start.column,
        };
        Token::new(kind, self.src[start.pos..self.pos].to_string(), span)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token>;

    /// Yields tokens up to and including `Eof`, or up to the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.scan_token();
        match &result {
            Ok(token) if token.kind == TokenKind::Eof => self.finished = true,
            Err(_) => self.finished = true,
            Ok(_) => {}
        }
        Some(result)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
