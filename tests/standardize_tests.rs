//! Standardization tests over the parsed surface syntax

use rpal::ast::Node;
use rpal::lexer::{Token, strip_comments};
use rpal::parser::{ParseState, parse};
use rpal::standardize::standardize;

fn standardized(input: &str) -> Node {
    let tokens = Token::lex(&strip_comments(input)).expect("lexing failed");
    let mut state = ParseState::new(tokens);
    let ast = parse(&mut state).expect("parsing failed");
    standardize(ast).expect("standardization failed")
}

#[test]
fn let_becomes_gamma_of_lambda() {
    let tree = standardized("let X = 5 in X");
    assert_eq!(
        tree.pretty(),
        "gamma\n.lambda\n..<ID:X>\n..<ID:X>\n.<INT:5>\n"
    );
}

#[test]
fn where_mirrors_let() {
    let tree = standardized("X where X = 3");
    assert_eq!(
        tree.pretty(),
        "gamma\n.lambda\n..<ID:X>\n..<ID:X>\n.<INT:3>\n"
    );
}

#[test]
fn fn_parameters_curry_right_associatively() {
    let tree = standardized("fn X Y Z . X");
    assert_eq!(
        tree.pretty(),
        "lambda\n.<ID:X>\n.lambda\n..<ID:Y>\n..lambda\n...<ID:Z>\n...<ID:X>\n"
    );
}

#[test]
fn tuple_pattern_stays_one_lambda() {
    let tree = standardized("let Sum (A, B) = A in Sum");
    assert_eq!(
        tree.pretty(),
        "gamma\n.lambda\n..<ID:Sum>\n..<ID:Sum>\n.lambda\n..,\n...<ID:A>\n...<ID:B>\n..<ID:A>\n"
    );
}

#[test]
fn function_form_becomes_curried_binding() {
    let tree = standardized("let Add X Y = X in Add");
    assert_eq!(
        tree.pretty(),
        "gamma\n.lambda\n..<ID:Add>\n..<ID:Add>\n.lambda\n..<ID:X>\n..lambda\n...<ID:Y>\n...<ID:X>\n"
    );
}

#[test]
fn within_pulls_the_inner_binding_through() {
    let tree = standardized("let A = 1 within B = A in B");
    assert_eq!(
        tree.pretty(),
        "gamma\n.lambda\n..<ID:B>\n..<ID:B>\n.gamma\n..lambda\n...<ID:A>\n...<ID:A>\n..<INT:1>\n"
    );
}

#[test]
fn and_builds_tuple_binding() {
    let tree = standardized("let A = 1 and B = 2 in A");
    assert_eq!(
        tree.pretty(),
        "gamma\n.lambda\n..,\n...<ID:A>\n...<ID:B>\n..<ID:A>\n.tau\n..<INT:1>\n..<INT:2>\n"
    );
}

#[test]
fn rec_introduces_the_fixpoint_marker() {
    let tree = standardized("let rec F X = F X in F");
    assert_eq!(
        tree.pretty(),
        "gamma\n.lambda\n..<ID:F>\n..<ID:F>\n.gamma\n..<Y*>\n..lambda\n...<ID:F>\n...lambda\n....<ID:X>\n....gamma\n.....<ID:F>\n.....<ID:X>\n"
    );
}

#[test]
fn at_becomes_nested_gammas() {
    let tree = standardized("2 @ Add 3");
    assert_eq!(
        tree.pretty(),
        "gamma\n.gamma\n..<ID:Add>\n..<INT:2>\n.<INT:3>\n"
    );
}

#[test]
fn conditional_survives_unchanged() {
    let tree = standardized("B -> 1 | 2");
    assert_eq!(tree.pretty(), "->\n.<ID:B>\n.<INT:1>\n.<INT:2>\n");
}

#[test]
fn standardization_is_idempotent() {
    let once = standardized("let rec F X = F X in F (1, 2) where G = fn A B . A @ G 3");
    let twice = standardize(once.clone()).expect("restandardization failed");
    assert_eq!(once, twice);
}
