//! CSE machine tests: delta-map invariants, operator semantics, built-ins,
//! and runtime failure modes

use rpal::ast::Node;
use rpal::lexer::{Token, strip_comments};
use rpal::machine::{ControlStructures, EvalError, Machine, Value, flatten};
use rpal::parser::{ParseState, parse};
use rpal::standardize::standardize;

fn standardized(input: &str) -> Node {
    let tokens = Token::lex(&strip_comments(input)).expect("lexing failed");
    let mut state = ParseState::new(tokens);
    let ast = parse(&mut state).expect("parsing failed");
    standardize(ast).expect("standardization failed")
}

fn structures_for(input: &str) -> ControlStructures {
    flatten(&standardized(input)).expect("flattening failed")
}

fn run(input: &str) -> String {
    Machine::new(structures_for(input))
        .run()
        .expect("evaluation failed")
}

fn run_error(input: &str) -> EvalError {
    match Machine::new(structures_for(input)).run() {
        Ok(output) => panic!("expected a runtime error, got output: {output}"),
        Err(e) => e,
    }
}

/// Every closure body and both branches of every beta must be valid
/// delta-map keys.
fn assert_indices_valid(structures: &ControlStructures) {
    for index in 0..structures.len() {
        for token in structures.get(index).unwrap() {
            match token {
                Value::Closure(c) => {
                    assert!(c.body < structures.len(), "closure body out of range");
                }
                Value::Beta {
                    then_branch,
                    else_branch,
                } => {
                    assert!(*then_branch < structures.len(), "then branch out of range");
                    assert!(*else_branch < structures.len(), "else branch out of range");
                }
                _ => {}
            }
        }
    }
}

#[test]
fn delta_indices_are_valid_for_nested_program() {
    let structures = structures_for(
        "let rec Fact N = N eq 0 -> 1 | N * Fact (N - 1) in Print (Fact 5)",
    );
    assert!(structures.len() >= 4);
    assert_indices_valid(&structures);
}

#[test]
fn delta_indices_are_valid_for_conditional_chain() {
    let structures = structures_for("A -> (B -> 1 | 2) | (fn X . X -> 3 | 4)");
    assert_indices_valid(&structures);
}

#[test]
fn arithmetic_operand_order() {
    assert_eq!(run("Print (10 - 3)"), "7");
    assert_eq!(run("Print (10 / 3)"), "3");
    assert_eq!(run("Print (2 ** 3)"), "8");
}

#[test]
fn comparison_operators() {
    assert_eq!(run("Print (5 gr 3, 3 ge 3, 2 ls 1, 2 le 2)"), "(true, true, false, true)");
    assert_eq!(run("Print (1 ne 2)"), "true");
}

#[test]
fn truth_operators() {
    assert_eq!(run("Print (true or false)"), "true");
    assert_eq!(run("Print (true & false)"), "false");
    assert_eq!(run("Print (not false)"), "true");
}

#[test]
fn negation_operator() {
    assert_eq!(run("Print (- 5 + 2)"), "-3");
}

#[test]
fn string_equality() {
    assert_eq!(run("Print ('ab' eq 'ab', 'ab' ne 'cd')"), "(true, true)");
}

#[test]
fn aug_laws_on_nil() {
    // Null (aug nil x) = false, Order (aug nil x) = 1, (aug nil x) 1 = x
    assert_eq!(run("Print (Null (nil aug 7))"), "false");
    assert_eq!(run("Print (Order (nil aug 7))"), "1");
    assert_eq!(run("Print ((nil aug 7) 1)"), "7");
}

#[test]
fn aug_appends_to_existing_tuple() {
    assert_eq!(run("Print ((1, 2) aug 3)"), "(1, 2, 3)");
}

#[test]
fn order_of_nil_is_zero() {
    assert_eq!(run("Print (Order nil)"), "0");
}

#[test]
fn tuple_indexing_is_one_based() {
    assert_eq!(run("let T = 10, 20, 30 in Print (T 1, T 3)"), "(10, 30)");
}

#[test]
fn stem_and_stern() {
    assert_eq!(run("Print (Stem 'abc')"), "a");
    assert_eq!(run("Print (Stern 'abc')"), "bc");
}

#[test]
fn conc_consumes_both_arguments() {
    assert_eq!(run("Print (Conc 'ab' 'cd')"), "abcd");
}

#[test]
fn itos_quotes_an_integer() {
    assert_eq!(run("Print (Conc (ItoS 42) '!')"), "42!");
}

#[test]
fn type_predicates() {
    assert_eq!(
        run("Print (Isinteger 1, Isstring 'a', Istruthvalue true, Istuple nil, Isdummy dummy, Isfunction (fn X . X))"),
        "(true, true, true, true, true, true)"
    );
    assert_eq!(run("Print (Isinteger 'a', Istuple 1)"), "(false, false)");
}

#[test]
fn print_interprets_escapes() {
    assert_eq!(run(r"Print 'a\nb\tc\\d'"), "a\nb\tc\\d");
}

#[test]
fn print_renders_closures() {
    assert_eq!(run("Print (fn X . X)"), "[lambda closure: X: 1]");
}

#[test]
fn lowercase_builtin_spellings() {
    assert_eq!(run("print 5"), "5");
    assert_eq!(run("Print (conc (stem 'xy') (stern 'xy'))"), "xy");
}

#[test]
fn user_binding_shadows_builtin() {
    assert_eq!(run("let Order = fn X . 99 in Print (Order nil)"), "99");
}

#[test]
fn empty_parameter_discards_argument() {
    assert_eq!(run("let F () = 7 in Print (F 1)"), "7");
}

#[test]
fn unbound_identifier_is_fatal() {
    assert_eq!(
        run_error("Print Missing"),
        EvalError::UnboundIdentifier("Missing".to_string())
    );
}

#[test]
fn division_by_zero_is_fatal() {
    assert_eq!(run_error("Print (1 / 0)"), EvalError::DivisionByZero);
}

#[test]
fn tuple_index_out_of_range_is_fatal() {
    assert_eq!(
        run_error("let T = 1, 2 in Print (T 5)"),
        EvalError::IndexOutOfRange { index: 5, order: 2 }
    );
}

#[test]
fn indexing_nil_is_fatal() {
    assert_eq!(
        run_error("Print (nil 1)"),
        EvalError::IndexOutOfRange { index: 1, order: 0 }
    );
}

#[test]
fn operator_type_mismatch_is_fatal() {
    assert!(matches!(
        run_error("Print (1 + 'a')"),
        EvalError::TypeMismatch { .. }
    ));
}

#[test]
fn tuple_pattern_arity_mismatch_is_fatal() {
    assert!(matches!(
        run_error("let F (A, B) = A in Print (F (1, 2, 3))"),
        EvalError::TypeMismatch { .. }
    ));
}

#[test]
fn step_cap_stops_runaway_recursion() {
    let structures = structures_for("let rec Loop X = Loop X in Print (Loop 1)");
    let result = Machine::with_step_cap(structures, 200).run();
    assert_eq!(result, Err(EvalError::StepCapExceeded(200)));
}

#[test]
fn default_step_cap_stops_runaway_recursion() {
    assert!(matches!(
        run_error("let rec Loop X = Loop X in Print (Loop 1)"),
        EvalError::StepCapExceeded(_)
    ));
}
