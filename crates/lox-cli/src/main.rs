//! Command-line entry point: runs a script file, or drops into a REPL when
//! invoked with no arguments.

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use lox_core::{DiagnosticSink, Interpreter, StdErrSink, StdPrint};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => run_prompt(),
        2 => run_file(&args[1]),
        _ => {
            println!("Usage: lox [script]");
            ExitCode::from(1)
        }
    }
}

/// Runs a single source file to completion and exits with a status that
/// reflects whether it scanned, parsed, resolved, and ran cleanly.
fn run_file(path: &str) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error reading {path}: {err}");
            return ExitCode::from(66);
        }
    };

    let sink = StdErrSink::new();
    let mut printer = StdPrint;
    let mut interpreter = Interpreter::new();
    interpreter.run(&source, &sink, &mut printer);

    if sink.had_error() || sink.had_runtime_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Reads lines from stdin and evaluates each one against a persistent
/// interpreter, so a `var` or `fun` declared on one line stays visible to
/// the next. A line that fails to scan, parse, resolve, or run never ends
/// the session; only EOF does.
fn run_prompt() -> ExitCode {
    let sink = StdErrSink::new();
    let mut printer = StdPrint;
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return ExitCode::SUCCESS;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return ExitCode::SUCCESS, // EOF
            Ok(_) => {
                interpreter.run(&line, &sink, &mut printer);
                sink.reset();
            }
            Err(err) => {
                eprintln!("Error reading input: {err}");
                return ExitCode::from(74);
            }
        }
    }
}
