//! Runtime error definitions for the CSE machine
//!
//! Every variant is fatal to the run: the machine has no continuation to
//! return to, so the driver reports the diagnostic and exits non-zero.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// An identifier resolved to neither a binding nor a built-in.
    UnboundIdentifier(String),

    /// An operator or built-in was applied to the wrong kind of value.
    TypeMismatch {
        during: &'static str,
        expected: &'static str,
        found: String,
    },

    /// 1-based tuple indexing outside the tuple's order.
    IndexOutOfRange { index: i64, order: usize },

    DivisionByZero,

    /// An integer operation left the representable range.
    ArithmeticOverflow(&'static str),

    /// The configured step cap was reached; the program may not terminate.
    StepCapExceeded(usize),

    /// The value stack ran dry while an operation needed operands.
    StackUnderflow { during: &'static str },

    /// An environment marker was consumed without its partner on the value
    /// stack directly beneath the return value.
    EnvironmentMismatch { expected: usize },

    /// The control stack was exhausted without leaving exactly one result.
    MalformedResult { values_left: usize },

    /// A control-structure index had no entry in the delta map.
    MissingControl(usize),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvalError::UnboundIdentifier(name) => {
                write!(f, "Runtime error: unbound identifier: {name}")
            }
            EvalError::TypeMismatch {
                during,
                expected,
                found,
            } => write!(
                f,
                "Runtime error: {during}: expected {expected}, found {found}"
            ),
            EvalError::IndexOutOfRange { index, order } => write!(
                f,
                "Runtime error: tuple index {index} out of range for a tuple of order {order}"
            ),
            EvalError::DivisionByZero => write!(f, "Runtime error: division by zero"),
            EvalError::ArithmeticOverflow(op) => {
                write!(f, "Runtime error: integer overflow in `{op}`")
            }
            EvalError::StepCapExceeded(cap) => write!(
                f,
                "Runtime error: step cap of {cap} exceeded; the program may not terminate"
            ),
            EvalError::StackUnderflow { during } => {
                write!(f, "Runtime error: value stack exhausted during {during}")
            }
            EvalError::EnvironmentMismatch { expected } => write!(
                f,
                "Runtime error: environment marker {expected} out of place on the value stack"
            ),
            EvalError::MalformedResult { values_left } => write!(
                f,
                "Runtime error: control exhausted with {values_left} values left on the stack"
            ),
            EvalError::MissingControl(index) => {
                write!(f, "Runtime error: missing control structure {index}")
            }
        }
    }
}

impl std::error::Error for EvalError {}
