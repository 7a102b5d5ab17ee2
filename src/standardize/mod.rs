//! Tree standardization - rewrite the raw AST into canonical form
//!
//! The parser produces a tree that still contains the language's binding
//! sugar: `let`, `where`, `within`, `and`, `rec`, `function_form` and `@`.
//! This module rewrites all of it into a tree built only from `lambda`,
//! `gamma`, `tau`, `->`, operators and literals, so the flattener has a
//! single small vocabulary to deal with.
//!
//! Traversal is post-order: children are standardized before their parent
//! is rewritten, so every rule can assume its subtrees are already in
//! canonical form. The rules:
//!
//! | Source | Rewrite |
//! |---|---|
//! | `let X = E1 in E2` | `gamma (lambda X E2) E1` |
//! | `E1 where X = E2` | `gamma (lambda X E1) E2` |
//! | `fn X1 .. Xn . E` | `lambda X1 (lambda X2 (.. (lambda Xn E)))` |
//! | `f V1 .. Vn = E` | `= f (lambda V1 (.. (lambda Vn E)))` |
//! | `D1 within X = E` | `= X (gamma (lambda X1 E) E1)` |
//! | `E1 @ N E2` | `gamma (gamma N E1) E2` |
//! | `X1 = E1 and .. and Xn = En` | `= (, X1 .. Xn) (tau E1 .. En)` |
//! | `rec X = E` | `= X (gamma Y* (lambda X E))` |
//!
//! Applying the pass to an already-standardized tree leaves it unchanged.

use std::fmt;

use crate::ast::{Node, NodeValue};

/// Structural error raised when a sugar node does not have the shape the
/// grammar guarantees. Seeing one of these means the parser produced a
/// malformed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardizeError {
    pub construct: &'static str,
    pub expected: &'static str,
}

impl StandardizeError {
    fn new(construct: &'static str, expected: &'static str) -> Self {
        Self {
            construct,
            expected,
        }
    }
}

impl fmt::Display for StandardizeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Standardize error: malformed `{}`: expected {}",
            self.construct, self.expected
        )
    }
}

impl std::error::Error for StandardizeError {}

/// Standardize a tree, consuming it and returning the canonical form.
pub fn standardize(node: Node) -> Result<Node, StandardizeError> {
    let Node { value, children } = node;
    let children = children
        .into_iter()
        .map(standardize)
        .collect::<Result<Vec<_>, _>>()?;
    let node = Node { value, children };

    match node.value {
        NodeValue::Let => rewrite_let(node),
        NodeValue::Where => rewrite_where(node),
        NodeValue::Lambda => curry_lambda(node),
        NodeValue::FunctionForm => rewrite_function_form(node),
        NodeValue::Within => rewrite_within(node),
        NodeValue::At => rewrite_at(node),
        NodeValue::AndDef => rewrite_and(node),
        NodeValue::Rec => rewrite_rec(node),
        _ => Ok(node),
    }
}

fn gamma(rator: Node, rand: Node) -> Node {
    Node::new(NodeValue::Gamma, vec![rator, rand])
}

fn lambda(param: Node, body: Node) -> Node {
    Node::new(NodeValue::Lambda, vec![param, body])
}

/// Take a `=` definition apart into its binder and its value.
fn split_binding(def: Node, construct: &'static str) -> Result<(Node, Node), StandardizeError> {
    if def.value != NodeValue::Equal || def.children.len() != 2 {
        return Err(StandardizeError::new(
            construct,
            "a '=' definition with a binder and a value",
        ));
    }
    let mut children = def.children;
    let value = children.pop().unwrap();
    let binder = children.pop().unwrap();
    Ok((binder, value))
}

/// `let X = E1 in E2` becomes `gamma (lambda X E2) E1`
fn rewrite_let(node: Node) -> Result<Node, StandardizeError> {
    let mut children = node.children;
    if children.len() != 2 {
        return Err(StandardizeError::new("let", "a definition and a body"));
    }
    let body = children.pop().unwrap();
    let def = children.pop().unwrap();
    let (binder, value) = split_binding(def, "let")?;
    Ok(gamma(lambda(binder, body), value))
}

/// `E1 where X = E2` becomes `gamma (lambda X E1) E2`
fn rewrite_where(node: Node) -> Result<Node, StandardizeError> {
    let mut children = node.children;
    if children.len() != 2 {
        return Err(StandardizeError::new("where", "a body and a definition"));
    }
    let def = children.pop().unwrap();
    let body = children.pop().unwrap();
    let (binder, value) = split_binding(def, "where")?;
    Ok(gamma(lambda(binder, body), value))
}

/// Curry a multi-parameter lambda into nested single-parameter lambdas.
/// Tuple patterns stay a single parameter: their binder is one `,` node.
fn curry_lambda(node: Node) -> Result<Node, StandardizeError> {
    let mut children = node.children;
    if children.len() < 2 {
        return Err(StandardizeError::new("lambda", "a parameter and a body"));
    }
    let mut result = children.pop().unwrap();
    while let Some(param) = children.pop() {
        result = lambda(param, result);
    }
    Ok(result)
}

/// `f V1 .. Vn = E` becomes `= f (lambda V1 (.. (lambda Vn E)))`
fn rewrite_function_form(node: Node) -> Result<Node, StandardizeError> {
    let mut children = node.children;
    if children.len() < 3 {
        return Err(StandardizeError::new(
            "function_form",
            "a name, at least one parameter, and a body",
        ));
    }
    let mut result = children.pop().unwrap();
    while children.len() > 1 {
        let param = children.pop().unwrap();
        result = lambda(param, result);
    }
    let name = children.pop().unwrap();
    Ok(Node::new(NodeValue::Equal, vec![name, result]))
}

/// `(X1 = E1) within (X2 = E2)` becomes `= X2 (gamma (lambda X1 E2) E1)`
fn rewrite_within(node: Node) -> Result<Node, StandardizeError> {
    let mut children = node.children;
    if children.len() != 2 {
        return Err(StandardizeError::new("within", "two definitions"));
    }
    let outer = children.pop().unwrap();
    let inner = children.pop().unwrap();
    let (inner_binder, inner_value) = split_binding(inner, "within")?;
    let (outer_binder, outer_value) = split_binding(outer, "within")?;
    Ok(Node::new(
        NodeValue::Equal,
        vec![
            outer_binder,
            gamma(lambda(inner_binder, outer_value), inner_value),
        ],
    ))
}

/// `E1 @ N E2` becomes `gamma (gamma N E1) E2`
fn rewrite_at(node: Node) -> Result<Node, StandardizeError> {
    let mut children = node.children;
    if children.len() != 3 {
        return Err(StandardizeError::new(
            "@",
            "an operand, a name, and an operand",
        ));
    }
    let rand = children.pop().unwrap();
    let name = children.pop().unwrap();
    let operand = children.pop().unwrap();
    Ok(gamma(gamma(name, operand), rand))
}

/// `X1 = E1 and .. and Xn = En` becomes `= (, X1 .. Xn) (tau E1 .. En)`
fn rewrite_and(node: Node) -> Result<Node, StandardizeError> {
    let defs = node.children;
    if defs.len() < 2 {
        return Err(StandardizeError::new("and", "at least two definitions"));
    }
    let mut binders = Vec::with_capacity(defs.len());
    let mut values = Vec::with_capacity(defs.len());
    for def in defs {
        let (binder, value) = split_binding(def, "and")?;
        binders.push(binder);
        values.push(value);
    }
    let arity = values.len();
    Ok(Node::new(
        NodeValue::Equal,
        vec![
            Node::new(NodeValue::Comma, binders),
            Node::new(NodeValue::Tau(arity), values),
        ],
    ))
}

/// `rec X = E` becomes `= X (gamma Y* (lambda X E))`
fn rewrite_rec(node: Node) -> Result<Node, StandardizeError> {
    let mut children = node.children;
    if children.len() != 1 {
        return Err(StandardizeError::new("rec", "a single definition"));
    }
    let def = children.pop().unwrap();
    let (binder, value) = split_binding(def, "rec")?;
    let rebound = binder.clone();
    Ok(Node::new(
        NodeValue::Equal,
        vec![
            binder,
            gamma(Node::leaf(NodeValue::YStar), lambda(rebound, value)),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Node {
        Node::leaf(NodeValue::Id(name.to_string()))
    }

    fn int(value: i64) -> Node {
        Node::leaf(NodeValue::Int(value))
    }

    #[test]
    fn let_becomes_gamma_lambda() {
        let tree = Node::new(
            NodeValue::Let,
            vec![
                Node::new(NodeValue::Equal, vec![id("X"), int(5)]),
                id("X"),
            ],
        );

        let result = standardize(tree).unwrap();

        let expected = Node::new(
            NodeValue::Gamma,
            vec![
                Node::new(NodeValue::Lambda, vec![id("X"), id("X")]),
                int(5),
            ],
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn multi_parameter_lambda_curries() {
        let tree = Node::new(NodeValue::Lambda, vec![id("X"), id("Y"), id("X")]);

        let result = standardize(tree).unwrap();

        let expected = Node::new(
            NodeValue::Lambda,
            vec![id("X"), Node::new(NodeValue::Lambda, vec![id("Y"), id("X")])],
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn rec_introduces_ystar() {
        let tree = Node::new(
            NodeValue::Rec,
            vec![Node::new(NodeValue::Equal, vec![id("F"), id("F")])],
        );

        let result = standardize(tree).unwrap();

        let expected = Node::new(
            NodeValue::Equal,
            vec![
                id("F"),
                Node::new(
                    NodeValue::Gamma,
                    vec![
                        Node::leaf(NodeValue::YStar),
                        Node::new(NodeValue::Lambda, vec![id("F"), id("F")]),
                    ],
                ),
            ],
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn and_builds_simultaneous_binding() {
        let tree = Node::new(
            NodeValue::AndDef,
            vec![
                Node::new(NodeValue::Equal, vec![id("A"), int(1)]),
                Node::new(NodeValue::Equal, vec![id("B"), int(2)]),
            ],
        );

        let result = standardize(tree).unwrap();

        let expected = Node::new(
            NodeValue::Equal,
            vec![
                Node::new(NodeValue::Comma, vec![id("A"), id("B")]),
                Node::new(NodeValue::Tau(2), vec![int(1), int(2)]),
            ],
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn standardized_tree_is_fixed_point() {
        let tree = Node::new(
            NodeValue::Let,
            vec![
                Node::new(NodeValue::Equal, vec![id("X"), int(5)]),
                Node::new(NodeValue::Gamma, vec![id("Print"), id("X")]),
            ],
        );

        let once = standardize(tree).unwrap();
        let twice = standardize(once.clone()).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn malformed_let_is_rejected() {
        let tree = Node::new(NodeValue::Let, vec![int(1), int(2)]);

        let result = standardize(tree);

        assert!(result.is_err());
    }
}
