use std::env;
use std::fs;
use std::process;

use anyhow::Context;

use rpal::lexer::{Token, strip_comments};
use rpal::machine::{Machine, flatten};
use rpal::parser::{ParseState, parse};
use rpal::standardize::standardize;

const USAGE: &str = "usage: rpal [-ast] [-st] <file>";

struct Options {
    print_ast: bool,
    print_st: bool,
    file: String,
}

fn parse_args() -> Result<Options, String> {
    let mut print_ast = false;
    let mut print_st = false;
    let mut file = None;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-ast" => print_ast = true,
            "-st" => print_st = true,
            flag if flag.starts_with('-') => return Err(format!("unknown flag: {flag}")),
            _ => {
                if file.is_some() {
                    return Err(format!("unexpected extra argument: {arg}"));
                }
                file = Some(arg);
            }
        }
    }

    let file = file.ok_or_else(|| "missing input file".to_string())?;
    Ok(Options {
        print_ast,
        print_st,
        file,
    })
}

fn main() -> anyhow::Result<()> {
    let options = match parse_args() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    let source = fs::read_to_string(&options.file)
        .with_context(|| format!("could not read {}", options.file))?;

    let tokens = Token::lex(&strip_comments(&source))?;
    let mut state = ParseState::new(tokens);
    let ast = match parse(&mut state) {
        Ok(ast) => ast,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if options.print_ast {
        print!("{}", ast.pretty());
    }

    let standardized = match standardize(ast) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if options.print_st {
        print!("{}", standardized.pretty());
    }

    // The tree switches only inspect the pipeline; evaluation happens when
    // neither is given.
    if !options.print_ast && !options.print_st {
        let structures = match flatten(&standardized) {
            Ok(structures) => structures,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        };
        match Machine::new(structures).run() {
            Ok(output) => print!("{output}"),
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    }

    Ok(())
}
