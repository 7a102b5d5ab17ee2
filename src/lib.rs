//! RPAL - An interpreter for the RPAL applicative functional language
//!
//! This library provides the core components for lexing, parsing,
//! standardizing, and evaluating RPAL programs on a CSE machine.

pub mod ast;
pub mod lexer;
pub mod machine;
pub mod parser;
pub mod standardize;
