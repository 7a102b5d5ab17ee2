//! End-to-end tests: source text through the full pipeline to output

use rpal::lexer::{Token, strip_comments};
use rpal::machine::{Machine, flatten};
use rpal::parser::{ParseState, parse};
use rpal::standardize::standardize;

/// Lex, parse, standardize, flatten and evaluate a program, returning the
/// run's output.
fn run_program(input: &str) -> String {
    let tokens = Token::lex(&strip_comments(input)).expect("lexing failed");
    let mut state = ParseState::new(tokens);
    let ast = parse(&mut state).expect("parsing failed");
    let standardized = standardize(ast).expect("standardization failed");
    let structures = flatten(&standardized).expect("flattening failed");
    Machine::new(structures).run().expect("evaluation failed")
}

#[test]
fn e2e_let_binding() {
    assert_eq!(run_program("let X = 5 in Print X"), "5");
}

#[test]
fn e2e_recursive_factorial() {
    assert_eq!(
        run_program("let rec Fact N = N eq 0 -> 1 | N * Fact (N - 1) in Print (Fact 5)"),
        "120"
    );
}

#[test]
fn e2e_tuple_parameter() {
    assert_eq!(
        run_program("let Sum (A, B) = A + B in Print (Sum (3, 4))"),
        "7"
    );
}

#[test]
fn e2e_nested_closures_capture_lexically() {
    assert_eq!(
        run_program("let F X = let G Y = X + Y in G in Print ((F 10) 7)"),
        "17"
    );
}

#[test]
fn e2e_string_concatenation() {
    assert_eq!(run_program("Print (Conc 'ab' 'cd')"), "abcd");
}

#[test]
fn e2e_string_equality() {
    assert_eq!(run_program("Print ('hello' eq 'hello')"), "true");
}

#[test]
fn e2e_tuple_operations() {
    assert_eq!(
        run_program("let T = 1, 2, 3 in Print (Order T, Null nil, T 2)"),
        "(3, true, 2)"
    );
}

#[test]
fn e2e_final_value_without_print() {
    assert_eq!(run_program("let X = 5 in X + 1"), "6\n");
    assert_eq!(run_program("'kept'"), "'kept'\n");
}

#[test]
fn e2e_where_clause() {
    assert_eq!(run_program("Print (X + 2) where X = 10"), "12");
}

#[test]
fn e2e_within_declaration() {
    assert_eq!(
        run_program("let A = 2 within B = A * 3 in Print B"),
        "6"
    );
}

#[test]
fn e2e_simultaneous_definitions() {
    assert_eq!(run_program("let A = 1 and B = 2 in Print (A + B)"), "3");
}

#[test]
fn e2e_at_application() {
    assert_eq!(
        run_program("let Add X Y = X + Y in Print (2 @ Add 3)"),
        "5"
    );
}

#[test]
fn e2e_conditional_branches() {
    assert_eq!(
        run_program("let Sign N = N ls 0 -> 'neg' | (N eq 0 -> 'zero' | 'pos') in Print (Sign 7, Sign (- 3), Sign 0)"),
        "(pos, neg, zero)"
    );
}

#[test]
fn e2e_curried_application() {
    assert_eq!(
        run_program("let Add X Y = X + Y in let Inc = Add 1 in Print (Inc 41)"),
        "42"
    );
}

#[test]
fn e2e_recursion_over_tuples() {
    assert_eq!(
        run_program(
            "let rec Range N = N eq 0 -> nil | (Range (N - 1) aug N) in Print (Range 4)"
        ),
        "(1, 2, 3, 4)"
    );
}

#[test]
fn e2e_higher_order_function() {
    assert_eq!(
        run_program("let Twice F X = F (F X) in let Inc N = N + 1 in Print (Twice Inc 5)"),
        "7"
    );
}

#[test]
fn e2e_multiple_prints_accumulate() {
    assert_eq!(
        run_program("let D = Print 'a' in let E = Print 'b' in Print 'c'"),
        "abc"
    );
}

#[test]
fn e2e_comments_are_ignored() {
    assert_eq!(
        run_program("// leading comment\nlet X = 5 in // tail comment\nPrint X"),
        "5"
    );
}

#[test]
fn e2e_recursive_predicate() {
    assert_eq!(
        run_program(
            "let rec Even N = N eq 0 -> true | not (Even (N - 1)) in Print (Even 10, Even 7)"
        ),
        "(true, false)"
    );
}
