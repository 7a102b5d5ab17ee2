mod combinators;
mod grammar;
mod state;

pub use combinators::*;
pub use state::{ParseError, ParseResult, ParseState, Parser};

use crate::ast::Node;

/// Parse a complete program: one expression covering the whole token
/// stream. Trailing tokens are an error, and the furthest recorded error
/// is preferred as the diagnostic when the grammar rejects the input.
pub fn parse(state: &mut ParseState) -> ParseResult<Node> {
    match grammar::expression().parse(state) {
        Ok(node) => {
            if state.has_next() {
                let err = state
                    .error_here("unexpected trailing input")
                    .expected("end of input");
                return Err(err);
            }
            Ok(node)
        }
        Err(err) => Err(state.take_furthest_error().unwrap_or(err)),
    }
}
