mod environment;
mod error;
mod impls;
mod interpreter;
mod lexer;
mod parser;
mod syntax;
mod utils;

pub use environment::{Closure, Context};
pub use error::{Error, LexerError, ParseError, RuntimeError};
pub use impls::class::{Class, Instance, Method};
pub use impls::ops::Comparator;
pub use interpreter::{interpret, Exception, Execute};
pub use lexer::Lexer;
pub use parser::Parser;
pub use syntax::expr::{Expr, Literal};
pub use syntax::stmt::Stmt;
pub use syntax::token::Token;
pub use syntax::value::Value;

use std::io::{self, Write};

/// Runs a complete program, writing everything it prints to `output`.
pub fn run(source: &str, output: &mut dyn Write) -> Result<(), Error> {
    let mut closure = Closure::new();
    run_with(source, &mut closure, output)
}

/// Runs a program against an existing top-level closure, so callers like the
/// REPL can keep bindings between chunks.
pub fn run_with(source: &str, closure: &mut Closure, output: &mut dyn Write) -> Result<(), Error> {
    let lexer = Lexer::new(source.as_bytes())?;
    let program = Parser::new(lexer).parse()?;
    let mut context = Context::new(output);
    interpret(&program, closure, &mut context)?;
    Ok(())
}

/// Runs a script file against stdout.
pub fn run_file(path: &str) -> Result<(), Error> {
    let source = std::fs::read_to_string(path).map_err(RuntimeError::from)?;
    let stdout = io::stdout();
    run(&source, &mut stdout.lock())
}

/// REPL mode. A line ending in `:` opens a block that is submitted by a
/// blank line; `exit` or end of input quits.
pub fn run_prompt() {
    let mut closure = Closure::new();
    loop {
        print!(">> ");
        let _ = io::stdout().flush();

        let mut block = String::new();
        if read_line(&mut block) == 0 || block.trim() == "exit" {
            break;
        }
        if block.trim_end().ends_with(':') {
            loop {
                print!(".. ");
                let _ = io::stdout().flush();
                let mut line = String::new();
                if read_line(&mut line) == 0 || line.trim().is_empty() {
                    break;
                }
                block.push_str(&line);
            }
        }

        let stdout = io::stdout();
        if let Err(error) = run_with(&block, &mut closure, &mut stdout.lock()) {
            eprintln!("{error}");
        }
    }
}

fn read_line(buffer: &mut String) -> usize {
    io::stdin().read_line(buffer).unwrap_or(0)
}
