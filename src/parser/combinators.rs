use std::ops::{BitOr, Shr};
use std::rc::Rc;

use crate::lexer::Token;

use super::state::{ParseError, ParseResult, ParseState, Parser};

// === Boxed Parser for type erasure ===

pub struct BoxedParser<T> {
    parser: Rc<dyn Fn(&mut ParseState) -> ParseResult<T>>,
}

impl<T> Clone for BoxedParser<T> {
    fn clone(&self) -> Self {
        BoxedParser {
            parser: Rc::clone(&self.parser),
        }
    }
}

impl<T: 'static> BoxedParser<T> {
    pub fn new<P: Parser<T> + 'static>(parser: P) -> Self {
        BoxedParser {
            parser: Rc::new(move |state| parser.parse(state)),
        }
    }
}

impl<T> Parser<T> for BoxedParser<T> {
    fn parse(&self, state: &mut ParseState) -> ParseResult<T> {
        (self.parser)(state)
    }
}

// === Combinators as methods ===

impl<T: 'static> BoxedParser<T> {
    /// Map: transform result
    pub fn map<U: 'static, F: Fn(T) -> U + 'static>(self, f: F) -> BoxedParser<U> {
        BoxedParser::new(move |state: &mut ParseState| {
            let a = self.parse(state)?;
            Ok(f(a))
        })
    }

    /// Choice: try self, if it fails backtrack and try other
    pub fn or(self, other: BoxedParser<T>) -> BoxedParser<T> {
        BoxedParser::new(move |state: &mut ParseState| {
            let pos = state.position();
            match self.parse(state) {
                Ok(a) => Ok(a),
                Err(_) => {
                    state.restore(pos);
                    other.parse(state)
                }
            }
        })
    }
}

// === Operator Overloading ===

/// `|` for choice: A | B -> A or B
impl<T: 'static> BitOr<BoxedParser<T>> for BoxedParser<T> {
    type Output = BoxedParser<T>;

    fn bitor(self, rhs: BoxedParser<T>) -> Self::Output {
        self.or(rhs)
    }
}

/// `>>` for map: A >> fn -> B
impl<T: 'static, U: 'static, F: Fn(T) -> U + 'static> Shr<F> for BoxedParser<T> {
    type Output = BoxedParser<U>;

    fn shr(self, f: F) -> Self::Output {
        self.map(f)
    }
}

// === Primitive Parsers ===

/// Match a single token by predicate; records a structured error when the
/// upcoming token does not match.
pub fn token<F: Fn(&Token) -> bool + 'static>(
    predicate: F,
    expected: &'static str,
) -> BoxedParser<Token> {
    BoxedParser::new(move |state: &mut ParseState| match state.peek() {
        Some(tok) if predicate(tok) => Ok(state.advance().unwrap()),
        Some(tok) => {
            let err = ParseError::new("unexpected token")
                .expected(expected)
                .found(tok.describe())
                .at(tok.pos());
            state.record_error(err.clone());
            Err(err)
        }
        None => {
            let err = ParseError::new("unexpected end of input").expected(expected);
            state.record_error(err.clone());
            Err(err)
        }
    })
}

pub fn expect_let() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Let(_)), "'let'")
}

pub fn expect_in() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::In(_)), "'in'")
}

pub fn expect_fn() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Lambda(_)), "'fn'")
}

pub fn expect_dot() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Dot(_)), "'.'")
}

pub fn expect_where() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Where(_)), "'where'")
}

pub fn expect_within() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Within(_)), "'within'")
}

pub fn expect_and() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::And(_)), "'and'")
}

pub fn expect_rec() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Rec(_)), "'rec'")
}

pub fn expect_equals() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Equals(_)), "'='")
}

pub fn expect_arrow() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Arrow(_)), "'->'")
}

pub fn expect_bar() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Bar(_)), "'|'")
}

pub fn expect_aug() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Aug(_)), "'aug'")
}

pub fn expect_at() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::At(_)), "'@'")
}

pub fn expect_comma() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Comma(_)), "','")
}

pub fn expect_lparen() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::LParen(_)), "'('")
}

pub fn expect_rparen() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::RParen(_)), "')'")
}

pub fn expect_true() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::True(_)), "'true'")
}

pub fn expect_false() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::False(_)), "'false'")
}

pub fn expect_nil() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Nil(_)), "'nil'")
}

pub fn expect_dummy() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Dummy(_)), "'dummy'")
}

/// Parse an identifier, yielding its name.
pub fn ident() -> BoxedParser<String> {
    BoxedParser::new(|state: &mut ParseState| match state.peek() {
        Some(Token::Ident(_)) => {
            if let Some(Token::Ident(id)) = state.advance() {
                Ok(id.value)
            } else {
                unreachable!()
            }
        }
        Some(tok) => {
            let err = ParseError::new("unexpected token")
                .expected("identifier")
                .found(tok.describe())
                .at(tok.pos());
            state.record_error(err.clone());
            Err(err)
        }
        None => {
            let err = ParseError::new("unexpected end of input").expected("identifier");
            state.record_error(err.clone());
            Err(err)
        }
    })
}

/// Parse an integer literal, yielding its value.
pub fn integer() -> BoxedParser<i64> {
    BoxedParser::new(|state: &mut ParseState| match state.peek() {
        Some(Token::Integer(_)) => {
            if let Some(Token::Integer(int)) = state.advance() {
                int.value.parse().map_err(|_| {
                    ParseError::new("integer literal out of range")
                        .at(int.position)
                        .found(format!("'{}'", int.value))
                })
            } else {
                unreachable!()
            }
        }
        Some(tok) => {
            let err = ParseError::new("unexpected token")
                .expected("integer")
                .found(tok.describe())
                .at(tok.pos());
            state.record_error(err.clone());
            Err(err)
        }
        None => {
            let err = ParseError::new("unexpected end of input").expected("integer");
            state.record_error(err.clone());
            Err(err)
        }
    })
}

/// Parse a string literal, yielding its content with the surrounding
/// quotes removed. Escape sequences stay raw; only `Print` interprets them.
pub fn string_literal() -> BoxedParser<String> {
    BoxedParser::new(|state: &mut ParseState| match state.peek() {
        Some(Token::StringLiteral(_)) => {
            if let Some(Token::StringLiteral(s)) = state.advance() {
                Ok(s.value[1..s.value.len() - 1].to_string())
            } else {
                unreachable!()
            }
        }
        Some(tok) => {
            let err = ParseError::new("unexpected token")
                .expected("string")
                .found(tok.describe())
                .at(tok.pos());
            state.record_error(err.clone());
            Err(err)
        }
        None => {
            let err = ParseError::new("unexpected end of input").expected("string");
            state.record_error(err.clone());
            Err(err)
        }
    })
}

/// Parse one or more occurrences
pub fn many1<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Vec<T>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let first = parser.parse(state)?;
        let mut results = vec![first];
        loop {
            let pos = state.position();
            match parser.parse(state) {
                Ok(item) => results.push(item),
                Err(_) => {
                    state.restore(pos);
                    break;
                }
            }
        }
        Ok(results)
    })
}

/// Optional: parse zero or one
pub fn optional<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Option<T>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let pos = state.position();
        match parser.parse(state) {
            Ok(item) => Ok(Some(item)),
            Err(_) => {
                state.restore(pos);
                Ok(None)
            }
        }
    })
}
