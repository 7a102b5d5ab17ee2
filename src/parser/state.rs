//! # Parser State Management
//!
//! Infrastructure shared by all grammar rules:
//!
//! - **ParseState**: token stream position with backtracking support and
//!   furthest-error tracking
//! - **ParseError**: structured parse failure (message, span, expected/found)
//! - **Parser trait**: the interface every parser implements
//!
//! ## Backtracking
//!
//! Alternative-trying parsers save the position, attempt a branch, and
//! restore on failure:
//!
//! ```text
//! let pos = state.position();
//! match parser.parse(state) {
//!     Ok(result) => result,
//!     Err(_) => {
//!         state.restore(pos);
//!         alternative.parse(state)
//!     }
//! }
//! ```
//!
//! ## Furthest error
//!
//! When several alternatives fail, the useful diagnostic is usually the one
//! produced at the furthest position the parser reached. Primitive parsers
//! record their errors in the state; the entry point reports the furthest
//! one if the whole parse fails.

use lachs::Span;

use crate::lexer::Token;

/// Structured parse error with context information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Option<Box<Span>>,
    pub expected: Vec<String>,
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            span: None,
            expected: vec![],
            found: None,
        }
    }

    /// Add an expected token/construct to this error (chainable).
    pub fn expected(mut self, what: impl Into<String>) -> Self {
        self.expected.push(what.into());
        self
    }

    /// Set what was actually found (chainable).
    pub fn found(mut self, what: impl Into<String>) -> Self {
        self.found = Some(what.into());
        self
    }

    /// Set the source location for this error (chainable).
    pub fn at(mut self, span: Span) -> Self {
        self.span = Some(Box::new(span));
        self
    }

    /// Merge expected tokens from another error, for combining the
    /// failures of alternative parsers into one "expected A or B" message.
    pub fn merge_expected(mut self, other: &ParseError) -> Self {
        for exp in &other.expected {
            if !self.expected.contains(exp) {
                self.expected.push(exp.clone());
            }
        }
        self
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = if !self.expected.is_empty() {
            let expected_str = if self.expected.len() == 1 {
                self.expected[0].clone()
            } else {
                let (last, rest) = self.expected.split_last().unwrap();
                format!("{} or {}", rest.join(", "), last)
            };
            match &self.found {
                Some(found) => format!("expected {}, found {}", expected_str, found),
                None => format!("expected {}", expected_str),
            }
        } else {
            self.message.clone()
        };

        if let Some(span) = &self.span {
            write!(f, "{}", span.to_string(&msg))
        } else {
            write!(f, "Parse error: {}", msg)
        }
    }
}

impl std::error::Error for ParseError {}

/// Result type for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parser state: token stream, position, and furthest-error tracking.
pub struct ParseState {
    tokens: Vec<Token>,
    index: usize,
    furthest_error: Option<(usize, ParseError)>,
}

impl ParseState {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            furthest_error: None,
        }
    }

    /// Consume and return the next token, if any.
    pub fn advance(&mut self) -> Option<Token> {
        if self.has_next() {
            let token = self.tokens[self.index].clone();
            self.index += 1;
            Some(token)
        } else {
            None
        }
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    pub fn has_next(&self) -> bool {
        self.index < self.tokens.len()
    }

    pub fn position(&self) -> usize {
        self.index
    }

    /// Restore the parser to a previous position (backtracking).
    pub fn restore(&mut self, position: usize) {
        self.index = position;
    }

    /// Record an error, keeping the one at the furthest position reached.
    /// Errors at the same position have their expected-lists merged.
    pub fn record_error(&mut self, error: ParseError) {
        match &self.furthest_error {
            Some((pos, _)) if *pos > self.index => {}
            Some((pos, existing)) if *pos == self.index => {
                let merged = existing.clone().merge_expected(&error);
                self.furthest_error = Some((self.index, merged));
            }
            _ => {
                self.furthest_error = Some((self.index, error));
            }
        }
    }

    /// Take the furthest error recorded so far, if any.
    pub fn take_furthest_error(&mut self) -> Option<ParseError> {
        self.furthest_error.take().map(|(_, e)| e)
    }

    /// Create an error at the current position with span and `found` info
    /// taken from the upcoming token.
    pub fn error_here(&self, message: impl Into<String>) -> ParseError {
        let msg = message.into();
        match self.peek() {
            Some(tok) => ParseError::new(&msg).at(tok.pos()).found(tok.describe()),
            None => ParseError::new(msg).found("end of input".to_string()),
        }
    }
}

/// Generic parser trait; grammar rules and combinators all implement it.
pub trait Parser<T>: Sized {
    fn parse(&self, state: &mut ParseState) -> ParseResult<T>;
}

/// Allow plain functions and closures to be parsers.
impl<T, F: Fn(&mut ParseState) -> ParseResult<T>> Parser<T> for F {
    fn parse(&self, state: &mut ParseState) -> ParseResult<T> {
        self(state)
    }
}
