//! Declaration grammar for RPAL
//!
//! Declarations appear between `let`/`in` and after `where`. The raw AST
//! keeps them in sugar form (`within`, `and`, `rec`, `function_form`,
//! `=`); the standardizer rewrites them into lambda/gamma structure.

use crate::ast::{Node, NodeValue};
use crate::lexer::Token;

use crate::parser::combinators::{
    BoxedParser, expect_and, expect_comma, expect_equals, expect_lparen, expect_rec,
    expect_rparen, expect_within, ident, many1, optional,
};
use crate::parser::state::{ParseState, Parser};

use super::expression::expression;

/// declaration := and_declaration ("within" declaration)?
pub fn declaration() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let first = and_declaration().parse(state)?;
        if optional(expect_within()).parse(state)?.is_some() {
            let rest = declaration().parse(state)?;
            return Ok(Node::new(NodeValue::Within, vec![first, rest]));
        }
        Ok(first)
    })
}

/// and_declaration := rec_declaration ("and" rec_declaration)*
fn and_declaration() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let first = rec_declaration().parse(state)?;
        let mut defs = vec![first];
        while optional(expect_and()).parse(state)?.is_some() {
            defs.push(rec_declaration().parse(state)?);
        }
        if defs.len() == 1 {
            return Ok(defs.pop().unwrap());
        }
        Ok(Node::new(NodeValue::AndDef, defs))
    })
}

/// rec_declaration := "rec" basic_declaration | basic_declaration
pub fn rec_declaration() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        if optional(expect_rec()).parse(state)?.is_some() {
            let def = basic_declaration().parse(state)?;
            return Ok(Node::new(NodeValue::Rec, vec![def]));
        }
        basic_declaration().parse(state)
    })
}

/// basic_declaration := variable_list "=" expression
///                    | identifier variable_binding+ "=" expression
///                    | "(" declaration ")"
///
/// All three alternatives start differently enough to dispatch on the
/// token after the leading identifier: `,` or `=` means a plain binding,
/// anything else is a function form.
fn basic_declaration() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        if matches!(state.peek(), Some(Token::LParen(_))) {
            expect_lparen().parse(state)?;
            let inner = declaration().parse(state)?;
            expect_rparen().parse(state)?;
            return Ok(inner);
        }

        let name = ident().parse(state)?;
        match state.peek() {
            Some(Token::Comma(_)) => {
                let mut names = vec![Node::leaf(NodeValue::Id(name))];
                while optional(expect_comma()).parse(state)?.is_some() {
                    names.push(Node::leaf(NodeValue::Id(ident().parse(state)?)));
                }
                expect_equals().parse(state)?;
                let value = expression().parse(state)?;
                let binder = Node::new(NodeValue::Comma, names);
                Ok(Node::new(NodeValue::Equal, vec![binder, value]))
            }
            Some(Token::Equals(_)) => {
                state.advance();
                let value = expression().parse(state)?;
                Ok(Node::new(
                    NodeValue::Equal,
                    vec![Node::leaf(NodeValue::Id(name)), value],
                ))
            }
            _ => {
                let params = many1(variable_binding()).parse(state)?;
                expect_equals().parse(state)?;
                let body = expression().parse(state)?;
                let mut children = vec![Node::leaf(NodeValue::Id(name))];
                children.extend(params);
                children.push(body);
                Ok(Node::new(NodeValue::FunctionForm, children))
            }
        }
    })
}

/// variable_binding := identifier | "(" variable_list ")" | "()"
pub fn variable_binding() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| match state.peek() {
        Some(Token::Ident(_)) => {
            let name = ident().parse(state)?;
            Ok(Node::leaf(NodeValue::Id(name)))
        }
        Some(Token::LParen(_)) => {
            state.advance();
            if matches!(state.peek(), Some(Token::RParen(_))) {
                state.advance();
                return Ok(Node::leaf(NodeValue::EmptyParams));
            }
            let list = variable_list().parse(state)?;
            expect_rparen().parse(state)?;
            Ok(list)
        }
        _ => {
            let err = state.error_here("unexpected token").expected("parameter");
            state.record_error(err.clone());
            Err(err)
        }
    })
}

/// variable_list := identifier ("," identifier)*
fn variable_list() -> BoxedParser<Node> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut names = vec![Node::leaf(NodeValue::Id(ident().parse(state)?))];
        while optional(expect_comma()).parse(state)?.is_some() {
            names.push(Node::leaf(NodeValue::Id(ident().parse(state)?)));
        }
        if names.len() == 1 {
            return Ok(names.pop().unwrap());
        }
        Ok(Node::new(NodeValue::Comma, names))
    })
}
