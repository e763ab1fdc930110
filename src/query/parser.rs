//! Query-string parser.
//!
//! Supported syntax, clauses separated by whitespace:
//!
//! - Terms: `hello`, analyzed against the default field
//! - Phrases: `"hello world"`
//! - Field-qualified clauses: `title:hello`, `title:"hello world"`
//! - Fuzzy terms: `helo~` (one edit) or `helo~2`, bare or field-qualified
//! - Numeric comparisons: `price>10`, `price>=10`, `price<10`, `price<=10`,
//!   also written `price:>10`
//! - Boosts: `title:hello^2.5`, applying to the whole preceding clause
//! - Occurrence prefixes: `+required`, `-excluded`; unprefixed clauses are
//!   optional
//!
//! `+` and `-` are operators only at the start of a clause; inside a term they
//! are ordinary characters. A backslash escapes the following character.
//!
//! # Examples
//!
//! ```
//! use glaive::query::{parse_query_string, Query};
//!
//! let query = parse_query_string("+title:rust -beta price>=10").unwrap();
//! assert_eq!(query.must.map(|m| m.conjuncts.len()), Some(1));
//! assert_eq!(query.must_not.map(|m| m.disjuncts.len()), Some(1));
//! assert!(matches!(
//!     &query.should.unwrap().disjuncts[0],
//!     Query::NumericRange(_)
//! ));
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{GlaiveError, Result};
use crate::query::{
    BooleanQuery, MatchPhraseQuery, MatchQuery, NumericRangeQuery, Query,
};

/// Parse a query string into a boolean query.
pub fn parse_query_string(input: &str) -> Result<BooleanQuery> {
    let tokens = Lexer::new(input).tokenize()?;
    if tokens.is_empty() {
        return Err(GlaiveError::syntax(0, "empty query string"));
    }
    QueryStringParser::new(tokens, input.len()).parse()
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Plus,
    Minus,
    Colon,
    Caret,
    Tilde,
    Gt,
    Gte,
    Lt,
    Lte,
    Word(String),
    Phrase(String),
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Caret => "'^'".to_string(),
            TokenKind::Tilde => "'~'".to_string(),
            TokenKind::Gt => "'>'".to_string(),
            TokenKind::Gte => "'>='".to_string(),
            TokenKind::Lt => "'<'".to_string(),
            TokenKind::Lte => "'<='".to_string(),
            TokenKind::Word(w) => format!("term '{w}'"),
            TokenKind::Phrase(p) => format!("phrase \"{p}\""),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    /// Byte offset of the token in the input.
    position: usize,
    /// Whether whitespace separates this token from the previous one.
    spaced: bool,
}

struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.char_indices().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut spaced = true;

        while let Some(&(position, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
                spaced = true;
                continue;
            }

            let kind = match c {
                '+' | '-' if spaced => {
                    self.chars.next();
                    if c == '+' {
                        TokenKind::Plus
                    } else {
                        TokenKind::Minus
                    }
                }
                ':' => self.single(TokenKind::Colon),
                '^' => self.single(TokenKind::Caret),
                '~' => self.single(TokenKind::Tilde),
                '>' | '<' => {
                    self.chars.next();
                    let inclusive = self.chars.next_if(|&(_, c)| c == '=').is_some();
                    match (c, inclusive) {
                        ('>', false) => TokenKind::Gt,
                        ('>', true) => TokenKind::Gte,
                        (_, false) => TokenKind::Lt,
                        (_, true) => TokenKind::Lte,
                    }
                }
                '"' => self.phrase(position)?,
                _ => self.word(position)?,
            };

            tokens.push(Token {
                kind,
                position,
                spaced,
            });
            spaced = false;
        }

        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.chars.next();
        kind
    }

    fn phrase(&mut self, start: usize) -> Result<TokenKind> {
        self.chars.next();
        let mut text = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '"' => return Ok(TokenKind::Phrase(text)),
                '\\' => match self.chars.next() {
                    Some((_, escaped)) => text.push(escaped),
                    None => break,
                },
                _ => text.push(c),
            }
        }
        Err(GlaiveError::syntax(start, "unterminated phrase"))
    }

    fn word(&mut self, start: usize) -> Result<TokenKind> {
        let mut text = String::new();
        while let Some(&(position, c)) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, ':' | '^' | '~' | '"' | '>' | '<') {
                break;
            }
            self.chars.next();
            if c == '\\' {
                match self.chars.next() {
                    Some((_, escaped)) => text.push(escaped),
                    None => {
                        return Err(GlaiveError::syntax(position, "dangling escape character"));
                    }
                }
            } else {
                text.push(c);
            }
        }
        if text.is_empty() {
            return Err(GlaiveError::syntax(start, "expected a term"));
        }
        Ok(TokenKind::Word(text))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Occur {
    Must,
    Should,
    MustNot,
}

struct QueryStringParser {
    tokens: Vec<Token>,
    cursor: usize,
    end: usize,
}

impl QueryStringParser {
    fn new(tokens: Vec<Token>, end: usize) -> Self {
        QueryStringParser {
            tokens,
            cursor: 0,
            end,
        }
    }

    fn parse(mut self) -> Result<BooleanQuery> {
        let mut query = BooleanQuery::default();
        while self.peek().is_some() {
            let (occur, clause) = self.parse_clause()?;
            match occur {
                Occur::Must => query.add_must(clause),
                Occur::Should => query.add_should(clause),
                Occur::MustNot => query.add_must_not(clause),
            }
        }
        Ok(query)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    /// The next token, if it directly follows the previous one.
    fn next_adjacent_if(&mut self, kind: &TokenKind) -> bool {
        match self.peek() {
            Some(token) if !token.spaced && &token.kind == kind => {
                self.cursor += 1;
                true
            }
            _ => false,
        }
    }

    fn unexpected(&self, token: Option<&Token>, expected: &str) -> GlaiveError {
        match token {
            Some(token) => GlaiveError::syntax(
                token.position,
                format!("unexpected {}, expected {expected}", token.kind.describe()),
            ),
            None => GlaiveError::syntax(self.end, format!("unexpected end of input, expected {expected}")),
        }
    }

    fn parse_clause(&mut self) -> Result<(Occur, Query)> {
        let occur = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Plus) => {
                self.cursor += 1;
                Occur::Must
            }
            Some(TokenKind::Minus) => {
                self.cursor += 1;
                Occur::MustNot
            }
            _ => Occur::Should,
        };

        if matches!(self.peek(), Some(t) if t.spaced && occur != Occur::Should) {
            let token = self.peek().cloned();
            return Err(self.unexpected(token.as_ref(), "a clause after the operator"));
        }

        let mut clause = self.parse_expression()?;

        if self.next_adjacent_if(&TokenKind::Caret) {
            let boost = self.parse_number("a boost value")?;
            clause.set_boost(boost);
        }

        Ok((occur, clause))
    }

    fn parse_expression(&mut self) -> Result<Query> {
        let token = self.next();
        match token.as_ref().map(|t| &t.kind) {
            Some(TokenKind::Phrase(phrase)) => Ok(MatchPhraseQuery::new(phrase.clone()).into()),
            Some(TokenKind::Word(word)) => {
                let word = word.clone();
                if self.next_adjacent_if(&TokenKind::Colon) {
                    return self.parse_field_value(word);
                }
                if let Some(range) = self.parse_comparison(&word)? {
                    return Ok(range);
                }
                self.parse_term(word, None)
            }
            _ => Err(self.unexpected(token.as_ref(), "a term or phrase")),
        }
    }

    fn parse_field_value(&mut self, field: String) -> Result<Query> {
        if let Some(range) = self.parse_comparison(&field)? {
            return Ok(range);
        }
        let token = match self.peek() {
            Some(token) if !token.spaced => self.next(),
            _ => None,
        };
        match token.as_ref().map(|t| &t.kind) {
            Some(TokenKind::Phrase(phrase)) => {
                Ok(MatchPhraseQuery::new(phrase.clone()).with_field(field).into())
            }
            Some(TokenKind::Word(word)) => self.parse_term(word.clone(), Some(field)),
            _ => {
                let token = token.or_else(|| self.peek().cloned());
                Err(self.unexpected(token.as_ref(), "a value after ':'"))
            }
        }
    }

    /// `>N`, `>=N`, `<N` or `<=N` directly after a field name.
    fn parse_comparison(&mut self, field: &str) -> Result<Option<Query>> {
        let op = match self.peek() {
            Some(token) if !token.spaced => token.kind.clone(),
            _ => return Ok(None),
        };
        let (lower, inclusive) = match op {
            TokenKind::Gt => (true, false),
            TokenKind::Gte => (true, true),
            TokenKind::Lt => (false, false),
            TokenKind::Lte => (false, true),
            _ => return Ok(None),
        };
        self.cursor += 1;
        let value = self.parse_number("a number")?;

        let query = if lower {
            NumericRangeQuery::new_inclusive(Some(value), None, inclusive, false)
        } else {
            NumericRangeQuery::new_inclusive(None, Some(value), true, inclusive)
        };
        Ok(Some(query.with_field(field).into()))
    }

    /// A match query for `word`, with an optional `~N` fuzziness suffix.
    fn parse_term(&mut self, word: String, field: Option<String>) -> Result<Query> {
        let mut query = MatchQuery::new(word);
        query.field = field;

        if self.next_adjacent_if(&TokenKind::Tilde) {
            let fuzziness = match self.peek() {
                Some(Token {
                    kind: TokenKind::Word(value),
                    spaced: false,
                    position,
                }) => {
                    let position = *position;
                    let fuzziness = value.parse::<u8>().map_err(|_| {
                        GlaiveError::syntax(position, format!("invalid fuzziness '{value}'"))
                    })?;
                    self.cursor += 1;
                    fuzziness
                }
                _ => 1,
            };
            query.fuzziness = fuzziness;
        }

        Ok(query.into())
    }

    fn parse_number(&mut self, expected: &str) -> Result<f64> {
        let token = match self.peek() {
            Some(token) if !token.spaced => self.next(),
            _ => None,
        };
        match token.as_ref().map(|t| &t.kind) {
            Some(TokenKind::Word(value)) => value.parse::<f64>().map_err(|_| {
                let position = token.as_ref().map_or(self.end, |t| t.position);
                GlaiveError::syntax(position, format!("expected {expected}, found '{value}'"))
            }),
            _ => {
                let token = token.or_else(|| self.peek().cloned());
                Err(self.unexpected(token.as_ref(), expected))
            }
        }
    }
}
