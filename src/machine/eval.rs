//! The CSE machine's transition loop
//!
//! The machine runs three stacks: the control stack of tokens still to
//! execute, the value stack of computed results, and the environment stack
//! of active frame ids. One step pops a control token and dispatches on
//! its kind; the run halts when only the initial environment marker is
//! left on control.
//!
//! Operand convention: control sequences are appended in storage order and
//! popped from the end, so for every operator and built-in the first value
//! popped is the left (first-written) operand.

use crate::ast::OpKind;

use super::builtins::{self, Builtin};
use super::env::Environments;
use super::error::EvalError;
use super::flatten::ControlStructures;
use super::value::{Closure, Params, Value};

/// Default bound on the number of machine steps; a runaway program is cut
/// off with an error rather than looping forever.
pub const DEFAULT_STEP_CAP: usize = 5000;

/// The control-stack-environment machine.
pub struct Machine {
    structures: ControlStructures,
    envs: Environments,
    env_stack: Vec<usize>,
    current_env: usize,
    control: Vec<Value>,
    stack: Vec<Value>,
    output: String,
    print_called: bool,
    step_cap: usize,
}

impl Machine {
    pub fn new(structures: ControlStructures) -> Self {
        Self::with_step_cap(structures, DEFAULT_STEP_CAP)
    }

    pub fn with_step_cap(structures: ControlStructures, step_cap: usize) -> Self {
        Machine {
            structures,
            envs: Environments::new(),
            env_stack: vec![0],
            current_env: 0,
            control: vec![Value::Env(0)],
            stack: vec![Value::Env(0)],
            output: String::new(),
            print_called: false,
            step_cap,
        }
    }

    /// Run the program to completion. Returns the accumulated `Print`
    /// output, or the final value followed by a newline when `Print` was
    /// never invoked.
    pub fn run(mut self) -> Result<String, EvalError> {
        self.load_delta(0)?;
        let mut steps = 0;
        while self.control.len() > 1 {
            if steps >= self.step_cap {
                return Err(EvalError::StepCapExceeded(self.step_cap));
            }
            steps += 1;
            self.step()?;
        }
        self.finish()
    }

    /// Append a control sequence to the control stack. The sequence is
    /// stored first-token-first; popping from the end consumes it in the
    /// order the machine needs.
    fn load_delta(&mut self, index: usize) -> Result<(), EvalError> {
        let delta = self
            .structures
            .get(index)
            .ok_or(EvalError::MissingControl(index))?;
        self.control.extend_from_slice(delta);
        Ok(())
    }

    fn step(&mut self) -> Result<(), EvalError> {
        let token = self
            .control
            .pop()
            .expect("control holds at least the root marker inside the run loop");
        match token {
            Value::Id(name) => self.resolve(&name),
            Value::Op(op) => self.apply_binary(op),
            Value::Neg => self.apply_neg(),
            Value::Not => self.apply_not(),
            Value::Tau(arity) => self.build_tuple(arity),
            Value::Beta {
                then_branch,
                else_branch,
            } => self.branch(then_branch, else_branch),
            Value::Closure(mut closure) => {
                closure.env = Some(self.current_env);
                self.stack.push(Value::Closure(closure));
                Ok(())
            }
            Value::Gamma => self.apply_gamma(),
            Value::Env(id) => self.exit_env(id),
            // Literals and Y* push themselves onto the value stack.
            other => {
                self.stack.push(other);
                Ok(())
            }
        }
    }

    fn pop_value(&mut self, during: &'static str) -> Result<Value, EvalError> {
        self.stack
            .pop()
            .ok_or(EvalError::StackUnderflow { during })
    }

    fn pop_int(&mut self, during: &'static str) -> Result<i64, EvalError> {
        match self.pop_value(during)? {
            Value::Int(value) => Ok(value),
            other => Err(type_mismatch(during, "integer", &other)),
        }
    }

    fn pop_truth(&mut self, during: &'static str) -> Result<bool, EvalError> {
        match self.pop_value(during)? {
            Value::Truth(value) => Ok(value),
            other => Err(type_mismatch(during, "truth value", &other)),
        }
    }

    /// Resolve an identifier: user bindings first, then built-in names.
    fn resolve(&mut self, name: &str) -> Result<(), EvalError> {
        if let Some(value) = self.envs.lookup(self.current_env, name) {
            let value = value.clone();
            self.stack.push(value);
            return Ok(());
        }
        if let Some(builtin) = Builtin::from_name(name) {
            self.stack.push(Value::Builtin(builtin));
            return Ok(());
        }
        Err(EvalError::UnboundIdentifier(name.to_string()))
    }

    fn apply_binary(&mut self, op: OpKind) -> Result<(), EvalError> {
        let left = self.pop_value(op.symbol())?;
        let right = self.pop_value(op.symbol())?;
        let result = apply_operator(op, left, right)?;
        self.stack.push(result);
        Ok(())
    }

    fn apply_neg(&mut self) -> Result<(), EvalError> {
        let value = self.pop_int("neg")?;
        let negated = value
            .checked_neg()
            .ok_or(EvalError::ArithmeticOverflow("neg"))?;
        self.stack.push(Value::Int(negated));
        Ok(())
    }

    fn apply_not(&mut self) -> Result<(), EvalError> {
        let value = self.pop_truth("not")?;
        self.stack.push(Value::Truth(!value));
        Ok(())
    }

    /// Pop `arity` values and assemble a tuple; the first value popped
    /// becomes the first component.
    fn build_tuple(&mut self, arity: usize) -> Result<(), EvalError> {
        let mut components = Vec::with_capacity(arity);
        for _ in 0..arity {
            components.push(self.pop_value("tau")?);
        }
        self.stack.push(Value::Tuple(components));
        Ok(())
    }

    /// Pop the condition and load the chosen branch's control sequence.
    fn branch(&mut self, then_branch: usize, else_branch: usize) -> Result<(), EvalError> {
        let condition = self.pop_truth("beta")?;
        if condition {
            self.load_delta(then_branch)
        } else {
            self.load_delta(else_branch)
        }
    }

    /// Environment exit: the return value swaps with its marker, and the
    /// machine drops back to the enclosing environment.
    fn exit_env(&mut self, id: usize) -> Result<(), EvalError> {
        let result = self.pop_value("environment exit")?;
        match self.stack.pop() {
            Some(Value::Env(found)) if found == id => {}
            _ => return Err(EvalError::EnvironmentMismatch { expected: id }),
        }
        self.stack.push(result);
        self.env_stack.pop();
        self.current_env = *self
            .env_stack
            .last()
            .expect("the root environment is never exited");
        Ok(())
    }

    /// Application dispatch: pop the rator and act on its kind.
    fn apply_gamma(&mut self) -> Result<(), EvalError> {
        let rator = self.pop_value("gamma")?;
        match rator {
            Value::Closure(closure) => self.apply_closure(closure),
            Value::YStar => {
                // gamma(Y*, f) re-tags the closure f as an eta closure.
                match self.pop_value("Y*")? {
                    Value::Closure(closure) => {
                        self.stack.push(Value::Eta(closure));
                        Ok(())
                    }
                    other => Err(type_mismatch("Y*", "lambda closure", &other)),
                }
            }
            Value::Eta(closure) => {
                // Unroll one recursion level: the closure copy binds the
                // recursive name to the eta, the second gamma re-applies
                // the result to the original argument.
                self.stack.push(Value::Eta(closure.clone()));
                self.stack.push(Value::Closure(closure));
                self.control.push(Value::Gamma);
                self.control.push(Value::Gamma);
                Ok(())
            }
            Value::Tuple(components) => {
                let index = self.pop_int("tuple application")?;
                let order = components.len();
                if index < 1 || index as usize > order {
                    return Err(EvalError::IndexOutOfRange { index, order });
                }
                self.stack.push(components[index as usize - 1].clone());
                Ok(())
            }
            Value::Nil => {
                let index = self.pop_int("tuple application")?;
                Err(EvalError::IndexOutOfRange { index, order: 0 })
            }
            Value::Builtin(builtin) => self.apply_builtin(builtin),
            Value::Partial(builtin, first) => self.apply_partial(builtin, *first),
            other => Err(type_mismatch("gamma", "an applicable value", &other)),
        }
    }

    /// Apply a lambda closure: create a frame under its defining
    /// environment, bind the parameters, and enter the body.
    fn apply_closure(&mut self, closure: Closure) -> Result<(), EvalError> {
        let arg = self.pop_value("gamma")?;
        let parent = closure
            .env
            .expect("closures on the value stack carry their environment");
        let env_id = self.envs.push_frame(parent);

        match closure.params {
            Params::Empty => {}
            Params::Single(name) => self.envs.bind(env_id, name, arg),
            Params::List(names) => match arg {
                Value::Tuple(components) if components.len() == names.len() => {
                    for (name, component) in names.into_iter().zip(components) {
                        self.envs.bind(env_id, name, component);
                    }
                }
                other => {
                    return Err(EvalError::TypeMismatch {
                        during: "gamma",
                        expected: "a tuple matching the parameter pattern",
                        found: match other.order() {
                            Some(order) => format!("a tuple of order {order}"),
                            None => other.kind().to_string(),
                        },
                    });
                }
            },
        }

        self.env_stack.push(env_id);
        self.current_env = env_id;
        self.control.push(Value::Env(env_id));
        self.stack.push(Value::Env(env_id));
        self.load_delta(closure.body)
    }

    fn apply_builtin(&mut self, builtin: Builtin) -> Result<(), EvalError> {
        let arg = self.pop_value(builtin.name())?;
        let result = match builtin {
            Builtin::Print => {
                self.print_called = true;
                builtins::render(&arg, &mut self.output);
                Value::Dummy
            }
            Builtin::Conc => match arg {
                Value::Str(first) => Value::Partial(Builtin::Conc, Box::new(Value::Str(first))),
                other => return Err(type_mismatch("Conc", "string", &other)),
            },
            Builtin::Stem => match arg {
                Value::Str(raw) => match raw.chars().next() {
                    Some(first) => Value::Str(first.to_string()),
                    None => {
                        return Err(EvalError::TypeMismatch {
                            during: "Stem",
                            expected: "non-empty string",
                            found: "empty string".to_string(),
                        });
                    }
                },
                other => return Err(type_mismatch("Stem", "string", &other)),
            },
            Builtin::Stern => match arg {
                Value::Str(raw) => {
                    let mut chars = raw.chars();
                    if chars.next().is_none() {
                        return Err(EvalError::TypeMismatch {
                            during: "Stern",
                            expected: "non-empty string",
                            found: "empty string".to_string(),
                        });
                    }
                    Value::Str(chars.as_str().to_string())
                }
                other => return Err(type_mismatch("Stern", "string", &other)),
            },
            Builtin::Order => match arg.order() {
                Some(order) => Value::Int(order as i64),
                None => return Err(type_mismatch("Order", "tuple", &arg)),
            },
            Builtin::Null => Value::Truth(matches!(arg, Value::Nil)),
            Builtin::IsInteger => Value::Truth(matches!(arg, Value::Int(_))),
            Builtin::IsString => Value::Truth(matches!(arg, Value::Str(_))),
            Builtin::IsTruthValue => Value::Truth(matches!(arg, Value::Truth(_))),
            Builtin::IsTuple => Value::Truth(matches!(arg, Value::Tuple(_) | Value::Nil)),
            Builtin::IsDummy => Value::Truth(matches!(arg, Value::Dummy)),
            Builtin::IsFunction => Value::Truth(matches!(arg, Value::Closure(_))),
            Builtin::ItoS => match arg {
                Value::Int(value) => Value::Str(value.to_string()),
                other => return Err(type_mismatch("ItoS", "integer", &other)),
            },
        };
        self.stack.push(result);
        Ok(())
    }

    /// Complete a curried binary built-in. Only `Conc` produces partial
    /// applications.
    fn apply_partial(&mut self, builtin: Builtin, first: Value) -> Result<(), EvalError> {
        let second = self.pop_value(builtin.name())?;
        match (builtin, first, second) {
            (Builtin::Conc, Value::Str(a), Value::Str(b)) => {
                self.stack.push(Value::Str(format!("{a}{b}")));
                Ok(())
            }
            (_, _, found) => Err(type_mismatch("Conc", "string", &found)),
        }
    }

    /// Check the final machine state and produce the run's output.
    fn finish(mut self) -> Result<String, EvalError> {
        let result = self
            .stack
            .pop()
            .ok_or(EvalError::MalformedResult { values_left: 0 })?;
        if !matches!(self.stack.as_slice(), [Value::Env(0)]) {
            return Err(EvalError::MalformedResult {
                values_left: self.stack.len() + 1,
            });
        }
        if self.print_called {
            Ok(self.output)
        } else {
            Ok(format!("{result}\n"))
        }
    }
}

fn type_mismatch(during: &'static str, expected: &'static str, found: &Value) -> EvalError {
    EvalError::TypeMismatch {
        during,
        expected,
        found: found.kind().to_string(),
    }
}

/// Apply a binary operator. `left` is the first value popped from the
/// stack, which is the operator's first-written operand.
fn apply_operator(op: OpKind, left: Value, right: Value) -> Result<Value, EvalError> {
    match op {
        OpKind::Add => arithmetic(op, left, right, i64::checked_add),
        OpKind::Sub => arithmetic(op, left, right, i64::checked_sub),
        OpKind::Mul => arithmetic(op, left, right, i64::checked_mul),
        OpKind::Div => {
            let (a, b) = expect_ints(op, left, right)?;
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_div(b)
                .map(Value::Int)
                .ok_or(EvalError::ArithmeticOverflow(op.symbol()))
        }
        OpKind::Pow => {
            let (a, b) = expect_ints(op, left, right)?;
            let exponent = u32::try_from(b).map_err(|_| EvalError::TypeMismatch {
                during: "**",
                expected: "non-negative exponent",
                found: b.to_string(),
            })?;
            a.checked_pow(exponent)
                .map(Value::Int)
                .ok_or(EvalError::ArithmeticOverflow(op.symbol()))
        }
        OpKind::Gr => comparison(op, left, right, |a, b| a > b),
        OpKind::Ge => comparison(op, left, right, |a, b| a >= b),
        OpKind::Ls => comparison(op, left, right, |a, b| a < b),
        OpKind::Le => comparison(op, left, right, |a, b| a <= b),
        OpKind::Eq => Ok(Value::Truth(values_equal(op, &left, &right)?)),
        OpKind::Ne => Ok(Value::Truth(!values_equal(op, &left, &right)?)),
        OpKind::Or => {
            let (a, b) = expect_truths(op, left, right)?;
            Ok(Value::Truth(a || b))
        }
        OpKind::And => {
            let (a, b) = expect_truths(op, left, right)?;
            Ok(Value::Truth(a && b))
        }
        OpKind::Aug => match left {
            Value::Nil => Ok(Value::Tuple(vec![right])),
            Value::Tuple(mut components) => {
                components.push(right);
                Ok(Value::Tuple(components))
            }
            other => Err(type_mismatch("aug", "tuple", &other)),
        },
    }
}

fn arithmetic(
    op: OpKind,
    left: Value,
    right: Value,
    apply: fn(i64, i64) -> Option<i64>,
) -> Result<Value, EvalError> {
    let (a, b) = expect_ints(op, left, right)?;
    apply(a, b)
        .map(Value::Int)
        .ok_or(EvalError::ArithmeticOverflow(op.symbol()))
}

fn comparison(
    op: OpKind,
    left: Value,
    right: Value,
    apply: fn(i64, i64) -> bool,
) -> Result<Value, EvalError> {
    let (a, b) = expect_ints(op, left, right)?;
    Ok(Value::Truth(apply(a, b)))
}

fn expect_ints(op: OpKind, left: Value, right: Value) -> Result<(i64, i64), EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok((a, b)),
        (Value::Int(_), other) | (other, _) => Err(type_mismatch(op.symbol(), "integer", &other)),
    }
}

fn expect_truths(op: OpKind, left: Value, right: Value) -> Result<(bool, bool), EvalError> {
    match (left, right) {
        (Value::Truth(a), Value::Truth(b)) => Ok((a, b)),
        (Value::Truth(_), other) | (other, _) => {
            Err(type_mismatch(op.symbol(), "truth value", &other))
        }
    }
}

/// Equality over matching value kinds: integers, strings, or truth values.
fn values_equal(op: OpKind, left: &Value, right: &Value) -> Result<bool, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        (Value::Truth(a), Value::Truth(b)) => Ok(a == b),
        _ => Err(EvalError::TypeMismatch {
            during: op.symbol(),
            expected: "operands of matching type",
            found: format!("{} and {}", left.kind(), right.kind()),
        }),
    }
}
