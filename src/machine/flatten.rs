//! Control-structure flattening
//!
//! Walks the standardized tree and turns it into a family of flat token
//! sequences (the delta map). The body of every lambda and each branch of
//! every conditional becomes its own sequence; the sequences only get
//! stitched together at run time, when a closure is applied or a `beta`
//! picks a branch.
//!
//! Sequences are emitted in pre-order and stored in emission order. The
//! machine loads a sequence by appending it to the control stack and pops
//! from the end, so the last-emitted token executes first; with pre-order
//! emission that makes operands evaluate before their operator.

use std::collections::VecDeque;
use std::fmt;

use crate::ast::{Node, NodeValue};

use super::value::{Closure, Params, Value};

/// The delta map: a dense family of control sequences, indexed from 0
/// (the top-level program body).
#[derive(Debug, Clone, PartialEq)]
pub struct ControlStructures {
    deltas: Vec<Vec<Value>>,
}

impl ControlStructures {
    pub fn get(&self, index: usize) -> Option<&[Value]> {
        self.deltas.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenError {
    /// A sugar label survived standardization.
    LeftoverSugar(String),
    /// A lambda node without the parameter/body shape.
    MalformedLambda,
    /// A conditional node without condition/then/else children.
    MalformedConditional,
}

impl fmt::Display for FlattenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FlattenError::LeftoverSugar(label) => write!(
                f,
                "Flatten error: `{label}` node survived standardization"
            ),
            FlattenError::MalformedLambda => {
                write!(f, "Flatten error: lambda node without parameter and body")
            }
            FlattenError::MalformedConditional => write!(
                f,
                "Flatten error: conditional node without condition, then and else"
            ),
        }
    }
}

impl std::error::Error for FlattenError {}

/// Flatten a standardized tree into its delta map.
pub fn flatten(root: &Node) -> Result<ControlStructures, FlattenError> {
    let mut deltas = Vec::new();
    let mut pending: VecDeque<&Node> = VecDeque::new();
    let mut counter = 0;

    pending.push_back(root);
    while let Some(node) = pending.pop_front() {
        let mut sequence = Vec::new();
        emit(node, &mut sequence, &mut counter, &mut pending)?;
        deltas.push(sequence);
    }

    Ok(ControlStructures { deltas })
}

/// Emit one subtree into `sequence` in pre-order. Lambda bodies and
/// conditional branches are scheduled onto `pending` instead of being
/// descended into; the counter hands out their future indices, which match
/// the queue order because every reservation is paired with one enqueue.
fn emit<'a>(
    node: &'a Node,
    sequence: &mut Vec<Value>,
    counter: &mut usize,
    pending: &mut VecDeque<&'a Node>,
) -> Result<(), FlattenError> {
    match &node.value {
        NodeValue::Lambda => {
            if node.children.len() != 2 {
                return Err(FlattenError::MalformedLambda);
            }
            let params = param_spec(&node.children[0])?;
            *counter += 1;
            sequence.push(Value::Closure(Closure {
                params,
                body: *counter,
                env: None,
            }));
            pending.push_back(&node.children[1]);
            Ok(())
        }
        NodeValue::Arrow => {
            if node.children.len() != 3 {
                return Err(FlattenError::MalformedConditional);
            }
            let then_branch = *counter + 1;
            let else_branch = *counter + 2;
            *counter += 2;
            sequence.push(Value::Beta {
                then_branch,
                else_branch,
            });
            pending.push_back(&node.children[1]);
            pending.push_back(&node.children[2]);
            emit(&node.children[0], sequence, counter, pending)
        }
        NodeValue::Let
        | NodeValue::Where
        | NodeValue::Within
        | NodeValue::Rec
        | NodeValue::FunctionForm
        | NodeValue::AndDef
        | NodeValue::At
        | NodeValue::Equal
        | NodeValue::Comma
        | NodeValue::EmptyParams => Err(FlattenError::LeftoverSugar(node.value.to_string())),
        other => {
            sequence.push(token_for(other));
            for child in &node.children {
                emit(child, sequence, counter, pending)?;
            }
            Ok(())
        }
    }
}

/// Read a lambda's parameter child into a parameter spec.
fn param_spec(node: &Node) -> Result<Params, FlattenError> {
    match &node.value {
        NodeValue::Id(name) => Ok(Params::Single(name.clone())),
        NodeValue::EmptyParams => Ok(Params::Empty),
        NodeValue::Comma => {
            let mut names = Vec::with_capacity(node.children.len());
            for child in &node.children {
                match &child.value {
                    NodeValue::Id(name) => names.push(name.clone()),
                    _ => return Err(FlattenError::MalformedLambda),
                }
            }
            Ok(Params::List(names))
        }
        _ => Err(FlattenError::MalformedLambda),
    }
}

/// The control token for a non-structural node label.
fn token_for(value: &NodeValue) -> Value {
    match value {
        NodeValue::Id(name) => Value::Id(name.clone()),
        NodeValue::Int(v) => Value::Int(*v),
        NodeValue::Str(raw) => Value::Str(raw.clone()),
        NodeValue::True => Value::Truth(true),
        NodeValue::False => Value::Truth(false),
        NodeValue::Nil => Value::Nil,
        NodeValue::Dummy => Value::Dummy,
        NodeValue::Op(op) => Value::Op(*op),
        NodeValue::Neg => Value::Neg,
        NodeValue::Not => Value::Not,
        NodeValue::Gamma => Value::Gamma,
        NodeValue::Tau(arity) => Value::Tau(*arity),
        NodeValue::YStar => Value::YStar,
        // Structural labels are handled (or rejected) by the caller.
        _ => unreachable!("structural node handled in emit"),
    }
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
    fn lambda_body_gets_its_own_delta() {
        // gamma (lambda X X) 5
        let tree = Node::new(
            NodeValue::Gamma,
            vec![
                Node::new(NodeValue::Lambda, vec![id("X"), id("X")]),
                int(5),
            ],
        );

        let structures = flatten(&tree).unwrap();

        assert_eq!(structures.len(), 2);
        assert_eq!(
            structures.get(0).unwrap(),
            &[
                Value::Gamma,
                Value::Closure(Closure {
                    params: Params::Single("X".to_string()),
                    body: 1,
                    env: None,
                }),
                Value::Int(5),
            ]
        );
        assert_eq!(structures.get(1).unwrap(), &[Value::Id("X".to_string())]);
    }

    #[test]
    fn conditional_branches_get_their_own_deltas() {
        // true -> 1 | 2
        let tree = Node::new(
            NodeValue::Arrow,
            vec![Node::leaf(NodeValue::True), int(1), int(2)],
        );

        let structures = flatten(&tree).unwrap();

        assert_eq!(structures.len(), 3);
        assert_eq!(
            structures.get(0).unwrap(),
            &[
                Value::Beta {
                    then_branch: 1,
                    else_branch: 2,
                },
                Value::Truth(true),
            ]
        );
        assert_eq!(structures.get(1).unwrap(), &[Value::Int(1)]);
        assert_eq!(structures.get(2).unwrap(), &[Value::Int(2)]);
    }

    #[test]
    fn tuple_pattern_becomes_parameter_list() {
        let tree = Node::new(
            NodeValue::Lambda,
            vec![
                Node::new(NodeValue::Comma, vec![id("A"), id("B")]),
                id("A"),
            ],
        );

        let structures = flatten(&tree).unwrap();

        assert_eq!(
            structures.get(0).unwrap(),
            &[Value::Closure(Closure {
                params: Params::List(vec!["A".to_string(), "B".to_string()]),
                body: 1,
                env: None,
            })]
        );
    }

    #[test]
    fn leftover_sugar_is_rejected() {
        let tree = Node::new(
            NodeValue::Let,
            vec![
                Node::new(NodeValue::Equal, vec![id("X"), int(5)]),
                id("X"),
            ],
        );

        let result = flatten(&tree);

        assert_eq!(
            result,
            Err(FlattenError::LeftoverSugar("let".to_string()))
        );
    }
}
