//! Expression grammar for RPAL
//!
//! Each function corresponds to one precedence level, from `expression`
//! (let/fn/where) down to `operand` (literals and parenthesised
//! expressions). Left-associative chains are parsed with manual loops;
//! `**` and the conditional arms recurse for right associativity.

use crate::ast::{Node, NodeValue, OpKind};
use crate::lexer::Token;

use crate::parser::combinators::{
    BoxedParser, expect_arrow, expect_at, expect_aug, expect_bar, expect_comma, expect_dot,
    expect_dummy, expect_false, expect_fn, expect_in, expect_let, expect_lparen, expect_nil,
    expect_rparen, expect_true, expect_where, ident, integer, many1, optional, string_literal,
};
use crate::parser::state::{ParseState, Parser};

use super::declaration::{declaration, rec_declaration, variable_binding};

/// expression := "let" declaration "in" expression
///             | "fn" variable_binding+ "." expression
///             | where_expression
pub fn expression() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| match state.peek() {
        Some(Token::Let(_)) => {
            expect_let().parse(state)?;
            let defs = declaration().parse(state)?;
            expect_in().parse(state)?;
            let body = expression().parse(state)?;
            Ok(Node::new(NodeValue::Let, vec![defs, body]))
        }
        Some(Token::Lambda(_)) => {
            expect_fn().parse(state)?;
            let mut children = many1(variable_binding()).parse(state)?;
            expect_dot().parse(state)?;
            children.push(expression().parse(state)?);
            Ok(Node::new(NodeValue::Lambda, children))
        }
        _ => where_expression().parse(state),
    })
}

/// where_expression := tuple_expression ("where" rec_declaration)?
fn where_expression() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let body = tuple_expression().parse(state)?;
        if optional(expect_where()).parse(state)?.is_some() {
            let def = rec_declaration().parse(state)?;
            return Ok(Node::new(NodeValue::Where, vec![body, def]));
        }
        Ok(body)
    })
}

/// tuple_expression := augment_expression ("," augment_expression)*
///
/// Two or more arms build a `tau` node carrying the arity.
fn tuple_expression() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let first = augment_expression().parse(state)?;
        let mut arms = vec![first];
        while optional(expect_comma()).parse(state)?.is_some() {
            arms.push(augment_expression().parse(state)?);
        }
        if arms.len() == 1 {
            return Ok(arms.pop().unwrap());
        }
        Ok(Node::new(NodeValue::Tau(arms.len()), arms))
    })
}

/// augment_expression := conditional_expression ("aug" conditional_expression)*
fn augment_expression() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut node = conditional_expression().parse(state)?;
        while optional(expect_aug()).parse(state)?.is_some() {
            let rhs = conditional_expression().parse(state)?;
            node = Node::new(NodeValue::Op(OpKind::Aug), vec![node, rhs]);
        }
        Ok(node)
    })
}

/// conditional_expression := boolean_expression
///                           ("->" conditional_expression "|" conditional_expression)?
fn conditional_expression() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let condition = boolean_expression().parse(state)?;
        if optional(expect_arrow()).parse(state)?.is_some() {
            let then_branch = conditional_expression().parse(state)?;
            expect_bar().parse(state)?;
            let else_branch = conditional_expression().parse(state)?;
            return Ok(Node::new(
                NodeValue::Arrow,
                vec![condition, then_branch, else_branch],
            ));
        }
        Ok(condition)
    })
}

/// boolean_expression := boolean_term ("or" boolean_term)*
fn boolean_expression() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut node = boolean_term().parse(state)?;
        while matches!(state.peek(), Some(Token::Or(_))) {
            state.advance();
            let rhs = boolean_term().parse(state)?;
            node = Node::new(NodeValue::Op(OpKind::Or), vec![node, rhs]);
        }
        Ok(node)
    })
}

/// boolean_term := boolean_statement ("&" boolean_statement)*
fn boolean_term() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut node = boolean_statement().parse(state)?;
        while matches!(state.peek(), Some(Token::Amp(_))) {
            state.advance();
            let rhs = boolean_statement().parse(state)?;
            node = Node::new(NodeValue::Op(OpKind::And), vec![node, rhs]);
        }
        Ok(node)
    })
}

/// boolean_statement := "not" boolean_primary | boolean_primary
fn boolean_statement() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        if matches!(state.peek(), Some(Token::Not(_))) {
            state.advance();
            let operand = boolean_primary().parse(state)?;
            return Ok(Node::new(NodeValue::Not, vec![operand]));
        }
        boolean_primary().parse(state)
    })
}

/// The comparison operator starting at this token, if any. The symbolic
/// spellings normalise to the keyword forms.
fn comparison_op(token: &Token) -> Option<OpKind> {
    match token {
        Token::Gr(_) | Token::Greater(_) => Some(OpKind::Gr),
        Token::Ge(_) | Token::GreaterEqual(_) => Some(OpKind::Ge),
        Token::Ls(_) | Token::Less(_) => Some(OpKind::Ls),
        Token::Le(_) | Token::LessEqual(_) => Some(OpKind::Le),
        Token::EqKw(_) => Some(OpKind::Eq),
        Token::Ne(_) => Some(OpKind::Ne),
        _ => None,
    }
}

/// boolean_primary := arithmetic_expression (comparison arithmetic_expression)?
///
/// Comparisons do not chain.
fn boolean_primary() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let lhs = arithmetic_expression().parse(state)?;
        if let Some(op) = state.peek().and_then(comparison_op) {
            state.advance();
            let rhs = arithmetic_expression().parse(state)?;
            return Ok(Node::new(NodeValue::Op(op), vec![lhs, rhs]));
        }
        Ok(lhs)
    })
}

/// arithmetic_expression := ("+" | "-")? arithmetic_term
///                          (("+" | "-") arithmetic_term)*
///
/// A leading "-" negates the first term only.
fn arithmetic_expression() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut node = match state.peek() {
            Some(Token::Minus(_)) => {
                state.advance();
                let term = arithmetic_term().parse(state)?;
                Node::new(NodeValue::Neg, vec![term])
            }
            Some(Token::Plus(_)) => {
                state.advance();
                arithmetic_term().parse(state)?
            }
            _ => arithmetic_term().parse(state)?,
        };
        loop {
            let op = match state.peek() {
                Some(Token::Plus(_)) => OpKind::Add,
                Some(Token::Minus(_)) => OpKind::Sub,
                _ => break,
            };
            state.advance();
            let rhs = arithmetic_term().parse(state)?;
            node = Node::new(NodeValue::Op(op), vec![node, rhs]);
        }
        Ok(node)
    })
}

/// arithmetic_term := arithmetic_factor (("*" | "/") arithmetic_factor)*
fn arithmetic_term() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut node = arithmetic_factor().parse(state)?;
        loop {
            let op = match state.peek() {
                Some(Token::Star(_)) => OpKind::Mul,
                Some(Token::Slash(_)) => OpKind::Div,
                _ => break,
            };
            state.advance();
            let rhs = arithmetic_factor().parse(state)?;
            node = Node::new(NodeValue::Op(op), vec![node, rhs]);
        }
        Ok(node)
    })
}

/// arithmetic_factor := at_expression ("**" arithmetic_factor)?
///
/// Exponentiation associates to the right.
fn arithmetic_factor() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let base = at_expression().parse(state)?;
        if matches!(state.peek(), Some(Token::DoubleStar(_))) {
            state.advance();
            let exponent = arithmetic_factor().parse(state)?;
            return Ok(Node::new(NodeValue::Op(OpKind::Pow), vec![base, exponent]));
        }
        Ok(base)
    })
}

/// at_expression := application ("@" identifier application)*
fn at_expression() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut node = application().parse(state)?;
        while optional(expect_at()).parse(state)?.is_some() {
            let name = ident().parse(state)?;
            let rand = application().parse(state)?;
            node = Node::new(
                NodeValue::At,
                vec![node, Node::leaf(NodeValue::Id(name)), rand],
            );
        }
        Ok(node)
    })
}

/// True when the token can begin an operand, which makes juxtaposition
/// continue as function application.
fn starts_operand(token: Option<&Token>) -> bool {
    matches!(
        token,
        Some(
            Token::Ident(_)
                | Token::Integer(_)
                | Token::StringLiteral(_)
                | Token::True(_)
                | Token::False(_)
                | Token::Nil(_)
                | Token::Dummy(_)
                | Token::LParen(_)
        )
    )
}

/// application := operand operand*
///
/// Juxtaposition builds left-associated `gamma` nodes.
fn application() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut node = operand().parse(state)?;
        while starts_operand(state.peek()) {
            let rand = operand().parse(state)?;
            node = Node::new(NodeValue::Gamma, vec![node, rand]);
        }
        Ok(node)
    })
}

/// operand := identifier | integer | string | "true" | "false" | "nil"
///          | "dummy" | "(" expression ")"
fn operand() -> BoxedParser<Node> {
    let id = ident() >> |name| Node::leaf(NodeValue::Id(name));
    let int = integer() >> |value| Node::leaf(NodeValue::Int(value));
    let string = string_literal() >> |raw| Node::leaf(NodeValue::Str(raw));
    let truth = (expect_true() >> |_| Node::leaf(NodeValue::True))
        | (expect_false() >> |_| Node::leaf(NodeValue::False));
    let nil = expect_nil() >> |_| Node::leaf(NodeValue::Nil);
    let dummy = expect_dummy() >> |_| Node::leaf(NodeValue::Dummy);
    let parenthesised = BoxedParser::new(move |state: &mut ParseState| {
        expect_lparen().parse(state)?;
        let inner = expression().parse(state)?;
        expect_rparen().parse(state)?;
        Ok(inner)
    });

    id | int | string | truth | nil | dummy | parenthesised
}
