use std::{env, process};

use minipy::{run_file, run_prompt, Error};

fn main() {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        // No arguments: interactive prompt.
        1 => run_prompt(),
        // A script path: run it.
        2 => {
            if let Err(error) = run_file(&args[1]) {
                eprintln!("{error}");
                let code = match error {
                    Error::Lexer(_) | Error::Parse(_) => 65,
                    Error::Runtime(_) => 70,
                };
                process::exit(code);
            }
        }
        _ => {
            println!("Usage: minipy [script]");
            process::exit(64);
        }
    }
}
