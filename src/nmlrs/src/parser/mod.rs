// nmlrs/src/parser/mod.rs

//! Parser that turns a namelist token stream into a [`Namelist`] tree.
//!
//! The parser pulls significant tokens from the lazy scanner with at most
//! two tokens of lookahead and walks an explicit state machine:
//!
//! ```text
//! Root --&name--> InGroup --name %--> InDerivedPath
//!                         --name (--> InArrayIndex
//!                         --/-------> Root
//! ```
//!
//! Any token that does not fit the current state is a syntax error and
//! stops the parse. Alongside the tree the parser records a [`SourceMap`]
//! of group and statement spans for the patch engine.

pub mod source_map;

pub use source_map::{GroupSpan, IndexSpan, SourceMap, StatementSpan, ValueSpan};

use std::collections::{HashMap, VecDeque};

use crate::config::ParserConfig;
use crate::error::{NmlError, Position, Result};
use crate::findex::{Index, IndexBound};
use crate::fortran_types::{
    classify, expand_repeat, parse_complex, parse_integer, parse_repeat_count, Scalar,
};
use crate::namelist::array::{group_element_mut, write_indexed, write_unindexed_over};
use crate::namelist::core::normalize;
use crate::namelist::{Namelist, Value};
use crate::scanner::{tokenize, Lexer, Operator, Span, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Root,
    InGroup,
    InDerivedPath,
    InArrayIndex,
    Error,
}

/// Namelist parser.
///
/// # Examples
///
/// ```
/// use nmlrs::Parser;
///
/// let nml = Parser::new().parse("&run steps = 10 /").unwrap();
/// assert_eq!(nml.get_group("run").unwrap().get_i64("steps"), Some(10));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse namelist text into a tree.
    pub fn parse(&self, text: &str) -> Result<Namelist> {
        self.parse_with_source_map(text).map(|(nml, _)| nml)
    }

    /// Parse namelist text, also returning where every group and
    /// assignment sits in the text.
    pub fn parse_with_source_map(&self, text: &str) -> Result<(Namelist, SourceMap)> {
        ParseRun::new(text, &self.config).run()
    }
}

/// Significant tokens with a small lookahead buffer.
struct TokenStream<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<Token>,
}

impl<'a> TokenStream<'a> {
    fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            lookahead: VecDeque::with_capacity(2),
        }
    }

    fn fill(&mut self, n: usize) -> Result<()> {
        while self.lookahead.len() < n {
            match self.lexer.next() {
                Some(token) => {
                    let token = token?;
                    if !token.is_trivia() {
                        self.lookahead.push_back(token);
                    }
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Token `n` places ahead (0 is the next one).
    fn peek_nth(&mut self, n: usize) -> Result<Option<&Token>> {
        self.fill(n + 1)?;
        Ok(self.lookahead.get(n))
    }

    fn peek(&mut self) -> Result<&Token> {
        self.fill(1)?;
        self.lookahead.front().ok_or_else(end_of_input)
    }

    /// Take the next token. `Eof` is never consumed.
    fn next(&mut self) -> Result<Token> {
        self.fill(1)?;
        match self.lookahead.front() {
            Some(token) if token.kind == TokenKind::Eof => Ok(token.clone()),
            _ => self.lookahead.pop_front().ok_or_else(end_of_input),
        }
    }
}

// The scanner always ends with `Eof` or an error, so this is only reached
// if a caller keeps pulling after an error.
fn end_of_input() -> NmlError {
    NmlError::syntax(
        "unexpected end of input",
        Position {
            line: 0,
            column: 0,
            offset: 0,
        },
    )
}

struct OpenGroup {
    name: String,
    key: String,
    ordinal: usize,
    start: Span,
}

/// One `%`-separated key of an assignment target.
struct Segment {
    name: String,
    index: Option<(Index, Span)>,
}

#[derive(PartialEq, Eq)]
enum Previous {
    Assign,
    Comma,
    Value,
}

struct ValueList {
    values: Vec<Scalar>,
    items: Vec<ValueSpan>,
    end: Span,
}

struct ParseRun<'a, 'c> {
    tokens: TokenStream<'a>,
    config: &'c ParserConfig,
    state: ParseState,
    root: Namelist,
    map: SourceMap,
    group: Option<OpenGroup>,
    group_counts: HashMap<String, usize>,
}

impl<'a, 'c> ParseRun<'a, 'c> {
    fn new(text: &'a str, config: &'c ParserConfig) -> Self {
        Self {
            tokens: TokenStream::new(tokenize(text, config)),
            config,
            state: ParseState::Root,
            root: Namelist::new(),
            map: SourceMap::default(),
            group: None,
            group_counts: HashMap::new(),
        }
    }

    fn run(mut self) -> Result<(Namelist, SourceMap)> {
        loop {
            match self.state {
                ParseState::Root => {
                    let token = self.tokens.next()?;
                    match token.kind {
                        TokenKind::Eof => break,
                        TokenKind::GroupStart => self.open_group(&token),
                        _ => return Err(self.fail(format!("unexpected {} outside a group", token), &token)),
                    }
                }
                ParseState::InGroup => self.group_item()?,
                ParseState::InDerivedPath | ParseState::InArrayIndex | ParseState::Error => {
                    let token = self.tokens.next()?;
                    return Err(self.fail(format!("unexpected {}", token), &token));
                }
            }
        }
        Ok((self.root, self.map))
    }

    fn fail<S: Into<String>>(&mut self, message: S, token: &Token) -> NmlError {
        let message = message.into();
        log::debug!("syntax error in state {:?}: {}", self.state, message);
        self.state = ParseState::Error;
        NmlError::syntax(message, token.span.position())
    }

    fn open_group(&mut self, token: &Token) {
        let name = token.group_name().unwrap_or_default().to_string();
        let key = normalize(&name);
        let count = self.group_counts.entry(key.clone()).or_insert(0);
        let ordinal = *count;
        *count += 1;

        self.root.add_group(&name);
        log::debug!("group '{}' opened at line {} (occurrence {})", name, token.span.line, ordinal);
        self.group = Some(OpenGroup {
            name,
            key,
            ordinal,
            start: token.span,
        });
        self.state = ParseState::InGroup;
    }

    fn group_item(&mut self) -> Result<()> {
        let token = self.tokens.next()?;
        match token.kind {
            TokenKind::GroupEnd => {
                if let Some(group) = self.group.take() {
                    log::debug!("group '{}' closed at line {}", group.name, token.span.line);
                    self.map.groups.push(GroupSpan {
                        name: group.name,
                        key: group.key,
                        ordinal: group.ordinal,
                        start: group.start,
                        end: token.span,
                    });
                }
                self.state = ParseState::Root;
                Ok(())
            }
            // Stray separators between statements
            TokenKind::Operator(Operator::Comma) => Ok(()),
            TokenKind::Name => self.statement(token),
            TokenKind::Eof => {
                let (group, opened) = match &self.group {
                    Some(g) => (g.name.clone(), g.start),
                    None => (String::new(), token.span),
                };
                Err(NmlError::UnterminatedGroup {
                    group,
                    line: opened.line,
                    column: opened.column,
                    offset: opened.offset,
                })
            }
            _ => Err(self.fail(format!("expected a variable name, found {}", token), &token)),
        }
    }

    fn statement(&mut self, first: Token) -> Result<()> {
        let start = first.span;
        let mut segments = Vec::new();
        let mut name = first;
        let assign = loop {
            let mut segment = Segment {
                name: name.lexeme.clone(),
                index: None,
            };
            if self.tokens.peek()?.is_operator(Operator::LeftParen) {
                self.state = ParseState::InArrayIndex;
                segment.index = Some(self.parse_index()?);
            }
            segments.push(segment);

            let next = self.tokens.next()?;
            match next.kind {
                TokenKind::Operator(Operator::Percent) => {
                    self.state = ParseState::InDerivedPath;
                    name = self.tokens.next()?;
                    if name.kind != TokenKind::Name {
                        return Err(self.fail(format!("expected a field name after '%', found {}", name), &name));
                    }
                }
                TokenKind::Operator(Operator::Assign) => break next.span,
                _ => {
                    let target = joined_names(&segments);
                    return Err(self.fail(format!("expected '=' after '{}', found {}", target, next), &next));
                }
            }
        };
        self.state = ParseState::InGroup;

        let list = self.parse_values(assign)?;
        log::trace!(
            "{} = {} value(s) at line {}",
            joined_names(&segments),
            list.values.len(),
            start.line
        );

        let group_key = match &self.group {
            Some(g) => g.key.clone(),
            None => return Err(NmlError::syntax("assignment outside a group", start.position())),
        };
        let member = store(&mut self.root, &group_key, &segments, list.values, self.config, start.position())?;

        let indexed_at = segments.iter().position(|s| s.index.is_some());
        let index = segments.last().and_then(|s| s.index.as_ref()).map(|(index, span)| IndexSpan {
            span: *span,
            index: index.clone(),
        });
        let group_ordinal = self.group.as_ref().map_or(0, |g| g.ordinal);
        self.map.statements.push(StatementSpan {
            group: group_key,
            group_ordinal,
            member,
            names: segments.into_iter().map(|s| s.name).collect(),
            indexed_at,
            index,
            span: start.to(&list.end),
            values: list.items,
        });
        Ok(())
    }

    /// `(` bound {`,` bound} `)` where a bound is `i`, `i:j`, `i:`, `:j` or `:`.
    fn parse_index(&mut self) -> Result<(Index, Span)> {
        let open = self.tokens.next()?;
        let mut dims = Vec::new();
        loop {
            let start = self.index_integer()?;
            let bound = if self.tokens.peek()?.is_operator(Operator::Colon) {
                self.tokens.next()?;
                let end = self.index_integer()?;
                if self.tokens.peek()?.is_operator(Operator::Colon) {
                    let token = self.tokens.next()?;
                    return Err(self.fail("array strides are not supported", &token));
                }
                IndexBound::new(start, end)
            } else {
                match start {
                    Some(position) => IndexBound::single(position),
                    None => {
                        let token = self.tokens.next()?;
                        return Err(self.fail(format!("expected an array index, found {}", token), &token));
                    }
                }
            };
            dims.push(bound);

            let token = self.tokens.next()?;
            match token.kind {
                TokenKind::Operator(Operator::Comma) => continue,
                TokenKind::Operator(Operator::RightParen) => {
                    return Ok((Index::new(dims), open.span.to(&token.span)));
                }
                _ => return Err(self.fail(format!("expected ',' or ')' in index, found {}", token), &token)),
            }
        }
    }

    fn index_integer(&mut self) -> Result<Option<i64>> {
        let token = self.tokens.peek()?;
        if token.kind != TokenKind::Literal {
            return Ok(None);
        }
        match parse_integer(&token.lexeme) {
            Some(value) => {
                self.tokens.next()?;
                Ok(Some(value))
            }
            None => {
                let token = self.tokens.next()?;
                Err(self.fail(format!("array index must be an integer, found {}", token), &token))
            }
        }
    }

    /// A name followed by `=`, `(` or `%` begins the next statement.
    fn at_statement_start(&mut self) -> Result<bool> {
        if self.tokens.peek()?.kind != TokenKind::Name {
            return Ok(false);
        }
        Ok(matches!(
            self.tokens.peek_nth(1)?.map(|t| t.kind),
            Some(TokenKind::Operator(Operator::Assign | Operator::LeftParen | Operator::Percent))
        ))
    }

    fn parse_values(&mut self, assign: Span) -> Result<ValueList> {
        let mut list = ValueList {
            values: Vec::new(),
            items: Vec::new(),
            end: assign,
        };
        let mut previous = Previous::Assign;

        loop {
            let kind = self.tokens.peek()?.kind;
            match kind {
                TokenKind::GroupEnd | TokenKind::Eof => break,
                TokenKind::Name if self.at_statement_start()? => break,
                TokenKind::Operator(Operator::Comma) => {
                    let comma = self.tokens.next()?;
                    if previous != Previous::Value {
                        list.values.push(Scalar::Unset);
                        list.items.push(ValueSpan::gap(Span { len: 0, ..comma.span }));
                    }
                    list.end = comma.span;
                    previous = Previous::Comma;
                }
                TokenKind::Operator(Operator::LeftParen) => {
                    let (value, span) = self.parse_complex()?;
                    list.values.push(value);
                    list.items.push(ValueSpan::single(span));
                    list.end = span;
                    previous = Previous::Value;
                }
                TokenKind::Literal | TokenKind::Name | TokenKind::String { .. } => {
                    let token = self.tokens.next()?;
                    let repeat = match parse_repeat_count(&token.lexeme) {
                        Some(count) if self.tokens.peek()?.is_operator(Operator::Star) => Some(count),
                        _ => None,
                    };
                    let span = match repeat {
                        Some(count) => self.parse_repeat(count, &token, &mut list)?,
                        None => {
                            list.values.push(classify(&token, self.config.strict_logical)?);
                            list.items.push(ValueSpan::single(token.span));
                            token.span
                        }
                    };
                    list.end = span;
                    previous = Previous::Value;
                }
                _ => {
                    let token = self.tokens.next()?;
                    return Err(self.fail(format!("unexpected {} in value list", token), &token));
                }
            }
        }

        // `x =` with nothing after it assigns a single null.
        if previous == Previous::Assign {
            list.values.push(Scalar::Unset);
            list.items.push(ValueSpan::gap(Span {
                offset: assign.end(),
                len: 0,
                line: assign.line,
                column: assign.column + assign.len,
            }));
        }
        Ok(list)
    }

    /// `N*value` or `N*`; the count token is already consumed and the
    /// next token is `*`. The value must follow the `*` directly.
    fn parse_repeat(&mut self, count: usize, count_token: &Token, list: &mut ValueList) -> Result<Span> {
        let star = self.tokens.next()?;
        let mut end = star.span;

        let adjacent = {
            let next = self.tokens.peek()?;
            next.span.offset == star.span.end()
                && matches!(
                    next.kind,
                    TokenKind::Literal
                        | TokenKind::Name
                        | TokenKind::String { .. }
                        | TokenKind::Operator(Operator::LeftParen)
                )
        };
        let value = if adjacent && !self.at_statement_start()? {
            if self.tokens.peek()?.is_operator(Operator::LeftParen) {
                let (value, span) = self.parse_complex()?;
                end = span;
                Some(value)
            } else {
                let token = self.tokens.next()?;
                end = token.span;
                Some(classify(&token, self.config.strict_logical)?)
            }
        } else {
            None
        };

        let span = count_token.span.to(&end);
        list.items.push(ValueSpan {
            span,
            repeat: true,
            count,
            null: value.is_none(),
        });
        list.values.extend(expand_repeat(count, value));
        Ok(span)
    }

    /// `(re, im)`
    fn parse_complex(&mut self) -> Result<(Scalar, Span)> {
        let open = self.tokens.next()?;
        let re = self.tokens.next()?;
        let comma = self.tokens.next()?;
        let im = self.tokens.next()?;
        let close = self.tokens.next()?;

        let well_formed = re.kind == TokenKind::Literal
            && comma.is_operator(Operator::Comma)
            && im.kind == TokenKind::Literal
            && close.is_operator(Operator::RightParen);
        let value = if well_formed {
            parse_complex(&re.lexeme, &im.lexeme)
        } else {
            None
        };
        match value {
            Some(value) => Ok((value, open.span.to(&close.span))),
            None => Err(self.fail("invalid complex value", &open)),
        }
    }
}

fn joined_names(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join("%")
}

/// Write one statement's values into the tree, returning the cogroup
/// member of the last key that received them.
fn store(
    root: &mut Namelist,
    group_key: &str,
    segments: &[Segment],
    values: Vec<Scalar>,
    config: &ParserConfig,
    at: Position,
) -> Result<usize> {
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err(NmlError::syntax("missing variable name", at)),
    };

    let mut node = root.insert_group(group_key);
    for segment in parents {
        node = match &segment.index {
            Some((index, _)) => {
                let position = match index.dims.as_slice() {
                    [bound] if index.is_element() => bound.start.unwrap_or(config.default_start_index),
                    _ => {
                        return Err(NmlError::syntax(
                            format!("derived type array '{}' takes a single element index", segment.name),
                            at,
                        ))
                    }
                };
                group_element_mut(node, &segment.name, position, config).map_err(|e| located(e, at))?
            }
            None => descend(node, &segment.name).map_err(|e| located(e, at))?,
        };
    }

    let result = match &last.index {
        Some((index, _)) => {
            check_capacity(&last.name, index, values.len(), at)?;
            write_indexed(node, &last.name, index, values, true, config)
        }
        None if node.start_index(&last.name).is_some() => {
            write_unindexed_over(node, &last.name, values, config)
        }
        None if node.contains_key(&last.name) => {
            node.push(&last.name, Value::from_scalars(values));
            Ok(())
        }
        None => {
            node.set(&last.name, Value::from_scalars(values));
            Ok(())
        }
    };
    result.map_err(|e| located(e, at))?;
    Ok(node
        .get(&last.name)
        .map_or(0, |v| v.members().len().saturating_sub(1)))
}

/// Nested node under `name`, created if absent.
fn descend<'n>(node: &'n mut Namelist, name: &str) -> Result<&'n mut Namelist> {
    if !node.contains_key(name) {
        node.set(name, Value::Group(Namelist::new()));
    }
    let value = match node.get_mut(name) {
        Some(Value::Cogroup(c)) => c.last_mut(),
        other => other,
    };
    match value {
        Some(Value::Group(g)) => Ok(g),
        _ => Err(NmlError::invalid_index(name, "not a derived type")),
    }
}

/// A fully bounded index holds a fixed number of elements.
fn check_capacity(name: &str, index: &Index, count: usize, at: Position) -> Result<()> {
    // Open bounds, and ranges too wide to count, put no limit on the list.
    let capacity = index.dims.iter().try_fold(1usize, |acc, b| match (b.start, b.end) {
        (Some(s), Some(e)) if e < s => Some(0),
        (Some(s), Some(e)) => {
            let len = e.checked_sub(s)?.checked_add(1)?;
            acc.checked_mul(usize::try_from(len).ok()?)
        }
        _ => None,
    });
    match capacity {
        Some(capacity) if count > capacity => Err(NmlError::syntax(
            format!("too many values for {}{}: {} given", name, index, count),
            at,
        )),
        _ => Ok(()),
    }
}

/// Attach the statement position to data model errors.
fn located(err: NmlError, at: Position) -> NmlError {
    match err {
        NmlError::InvalidIndex { variable, message } => {
            NmlError::syntax(format!("'{}': {}", variable, message), at)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Namelist {
        Parser::new().parse(text).unwrap()
    }

    fn ints(value: &Value) -> Vec<Option<i64>> {
        value
            .scalars()
            .unwrap()
            .into_iter()
            .map(|s| s.as_integer().ok())
            .collect()
    }

    #[test]
    fn test_simple_group() {
        let nml = parse("&data_nml\n  x = 1\n  y = 2.5\n  flag = .true.\n  name = 'abc'\n/\n");
        let group = nml.get_group("data_nml").unwrap();
        assert_eq!(group.get_i64("x"), Some(1));
        assert_eq!(group.get_f64("y"), Some(2.5));
        assert_eq!(group.get_bool("flag"), Some(true));
        assert_eq!(group.get_str("name"), Some("abc"));
    }

    #[test]
    fn test_value_lists() {
        let nml = parse("&g a = 1, 2, 3 b = 1 2 3 c = 1, , 3 d = , 2 e = 1, f = /");
        let g = nml.get_group("g").unwrap();
        assert_eq!(ints(g.get("a").unwrap()), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(ints(g.get("b").unwrap()), vec![Some(1), Some(2), Some(3)]);
        assert_eq!(ints(g.get("c").unwrap()), vec![Some(1), None, Some(3)]);
        assert_eq!(ints(g.get("d").unwrap()), vec![None, Some(2)]);
        assert_eq!(g.get_i64("e"), Some(1));
        assert!(g.get("f").unwrap().is_unset());
    }

    #[test]
    fn test_repeat_values() {
        let nml = parse("&g x = 5*1 y = 3* z = 2*'ab', 3\n/");
        let g = nml.get_group("g").unwrap();
        assert_eq!(ints(g.get("x").unwrap()), vec![Some(1); 5]);
        let y = g.get("y").unwrap().scalars().unwrap();
        assert_eq!(y.len(), 3);
        assert!(y.iter().all(|s| s.is_unset()));
        let z = g.get("z").unwrap().scalars().unwrap();
        assert_eq!(z[0].as_str().unwrap(), "ab");
        assert_eq!(z[2].as_integer().unwrap(), 3);
    }

    #[test]
    fn test_complex_values() {
        let nml = parse("&g z = (1.0, 2.0), (3, -4)\n/");
        let z = nml.get_group("g").unwrap().get("z").unwrap().scalars().unwrap();
        assert_eq!(z[0], &Scalar::Complex(1.0, 2.0));
        assert_eq!(z[1], &Scalar::Complex(3.0, -4.0));
    }

    #[test]
    fn test_index_union() {
        let nml = parse("&g x(3:4) = 1.0, 1.1\n x(6:7) = 1.2, 1.3\n/");
        let g = nml.get_group("g").unwrap();
        let x = g.get("x").unwrap().scalars().unwrap();
        let reals: Vec<Option<f64>> = x.iter().map(|s| s.as_real().ok()).collect();
        assert_eq!(reals, vec![Some(1.0), Some(1.1), None, Some(1.2), Some(1.3)]);
        assert_eq!(g.start_index("x"), Some(&vec![Some(3)]));
    }

    #[test]
    fn test_global_start_index() {
        let parser = Parser::with_config(ParserConfig::new().with_global_start_index(Some(1)));
        let nml = parser.parse("&g x(3:5) = 3, 4, 5 /").unwrap();
        let x = nml.get_group("g").unwrap().get("x").unwrap();
        assert_eq!(ints(x), vec![None, None, Some(3), Some(4), Some(5)]);
    }

    #[test]
    fn test_multidimensional() {
        let nml = parse("&g a(1:2, 1) = 1, 2\n a(1:2, 2) = 3, 4\n/");
        let a = nml.get_group("g").unwrap().get("a").unwrap().as_array().unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(ints(&a[1]), vec![Some(3), Some(4)]);
    }

    #[test]
    fn test_derived_types() {
        let nml = parse("&g p%x = 1\n p%y = 2\n t(2)%v = 5\n/");
        let g = nml.get_group("g").unwrap();
        let p = g.get("p").and_then(Value::as_group).unwrap();
        assert_eq!(p.get_i64("y"), Some(2));
        let t = g.get("t").and_then(Value::as_array).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(g.start_index("t"), Some(&vec![Some(2)]));
        assert_eq!(t[0].as_group().unwrap().get_i64("v"), Some(5));
    }

    #[test]
    fn test_duplicate_keys_and_groups() {
        let nml = parse("&run n = 1 n = 2 /\n&run n = 3 /");
        let runs = nml.get_groups("run");
        assert_eq!(runs.len(), 2);
        let first = runs[0].get("n").and_then(Value::as_cogroup).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(runs[1].get_i64("n"), Some(3));
    }

    #[test]
    fn test_case_insensitive_keys() {
        let nml = parse("&G steps = 1 STEPS = 2 Steps(3) = 3 /");
        let g = nml.get_group("g").unwrap();
        assert_eq!(g.keys().collect::<Vec<_>>(), vec!["steps"]);
    }

    #[test]
    fn test_alternate_delimiters() {
        let nml = parse("$grp x = 1 $end\n&other y = 2 &end\n$last z = 3 $");
        assert_eq!(nml.get_group("grp").unwrap().get_i64("x"), Some(1));
        assert_eq!(nml.get_group("other").unwrap().get_i64("y"), Some(2));
        assert_eq!(nml.get_group("last").unwrap().get_i64("z"), Some(3));
    }

    #[test]
    fn test_unterminated_string_reported_first() {
        let err = Parser::new().parse("&cfg\n x = 'unterminated").unwrap_err();
        assert!(matches!(err, NmlError::UnterminatedString { line: 2, .. }));
    }

    #[test]
    fn test_unterminated_group() {
        let err = Parser::new().parse("&cfg\n x = 1\n").unwrap_err();
        assert!(matches!(err, NmlError::UnterminatedGroup { ref group, .. } if group == "cfg"));
    }

    #[test]
    fn test_syntax_errors_carry_position() {
        let err = Parser::new().parse("&g\n x 1 /").unwrap_err();
        let pos = err.position().unwrap();
        assert_eq!((pos.line, pos.column), (2, 4));

        assert!(matches!(Parser::new().parse("&g = 1 /"), Err(NmlError::Syntax { .. })));
        assert!(matches!(Parser::new().parse("&g x(1:4:2) = 1 /"), Err(NmlError::Syntax { .. })));
        assert!(matches!(Parser::new().parse("&g x(1:2) = 1, 2, 3 /"), Err(NmlError::Syntax { .. })));
    }

    #[test]
    fn test_source_map_spans() {
        let text = "&g\n  x = 1, 2  ! c\n  y(2) = 5\n/\n";
        let (_, map) = Parser::new().parse_with_source_map(text).unwrap();
        assert_eq!(map.groups.len(), 1);
        assert_eq!(&text[map.groups[0].end.offset..map.groups[0].end.end()], "/");

        let x = &map.statements[0];
        assert_eq!(&text[x.span.offset..x.span.end()], "x = 1, 2");
        assert_eq!(x.values.len(), 2);
        let value = x.value_span().unwrap();
        assert_eq!(&text[value.offset..value.end()], "1, 2");

        let y = &map.statements[1];
        assert!(y.is_direct_index());
        let index = y.index.as_ref().unwrap();
        assert_eq!(&text[index.span.offset..index.span.end()], "(2)");
    }

    #[test]
    fn test_source_map_slots_and_members() {
        let text = "&g\n n = 1\n n = 2\n x = 1, , 3*4, 2*\n z =\n/\n";
        let (_, map) = Parser::new().parse_with_source_map(text).unwrap();
        let members: Vec<usize> = map.statements.iter().map(|s| s.member).collect();
        assert_eq!(members, vec![0, 1, 0, 0]);

        let x = &map.statements[2];
        assert_eq!(x.slot_count(), 7);
        let gap = x.values[1];
        assert!(gap.is_gap());
        assert_eq!(gap.span.len, 0);
        assert_eq!(&text[gap.span.offset..gap.span.offset + 1], ",");
        assert_eq!((x.values[2].count, x.values[2].null), (3, false));
        assert_eq!((x.values[3].count, x.values[3].null), (2, true));

        let z = &map.statements[3];
        assert_eq!(z.values.len(), 1);
        assert!(z.values[0].is_gap());
        assert_eq!(&text[..z.values[0].span.offset], "&g\n n = 1\n n = 2\n x = 1, , 3*4, 2*\n z =");
    }

    #[test]
    fn test_text_outside_groups_is_ignored() {
        let nml = parse("header text\n&g x = 1 /\ntrailing notes\n");
        assert_eq!(nml.len(), 1);
    }
}
