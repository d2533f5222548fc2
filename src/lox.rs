//! Pipeline driver: scanner → parser → resolver → interpreter.
//!
//! Lexical errors do not stop parsing, so one run reports both kinds.  Any
//! static error stops the pipeline before resolution (or, for resolver
//! errors, before execution).  A runtime error aborts the current
//! top‑level run and is reported once.

use std::io::Write;

use log::{debug, info};

use crate::error::{LoxError, Reporter, StderrReporter};
use crate::interpreter::Interpreter;
use crate::parser::{Parser, ReplInput};
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// How a [`Lox::run`] ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    StaticError,
    RuntimeError,
}

impl Outcome {
    /// Conventional process exit status.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::StaticError => 65,
            Outcome::RuntimeError => 70,
        }
    }
}

/// One interpreter session.  Globals persist across calls, so a REPL can
/// define something on one line and use it on the next.
pub struct Lox {
    interpreter: Interpreter,
    reporter: Box<dyn Reporter>,
    next_expr_id: usize,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// Session printing to stdout and reporting to stderr.
    pub fn new() -> Self {
        Self::with_io(Box::new(std::io::stdout()), Box::new(StderrReporter))
    }

    pub fn with_io(output: Box<dyn Write>, reporter: Box<dyn Reporter>) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
            reporter,
            next_expr_id: 0,
        }
    }

    /// Lex, parse, resolve and execute a whole program.
    pub fn run(&mut self, source: &str) -> Outcome {
        info!("Running program of {} bytes", source.len());

        let (tokens, lexed) = self.scan(source);

        let mut parser = Parser::with_first_id(&tokens, self.next_expr_id);
        let parsed = parser.parse();
        self.next_expr_id = parser.next_id();

        let statements = match parsed {
            Ok(statements) if lexed => statements,
            Ok(_) => return Outcome::StaticError,
            Err(errors) => {
                self.report_all(&errors);
                return Outcome::StaticError;
            }
        };

        let resolved = Resolver::new(&mut self.interpreter).resolve(&statements);
        if let Err(errors) = resolved {
            self.report_all(&errors);
            return Outcome::StaticError;
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => Outcome::Success,
            Err(e) => {
                debug!("Runtime error: {}", e);
                self.reporter.report(&e);
                Outcome::RuntimeError
            }
        }
    }

    /// Handle one interactive line.  A bare expression is evaluated and its
    /// rendering returned; statements run for effect and yield `None`, as
    /// does any error (which is reported).
    pub fn interpret_line(&mut self, source: &str) -> Option<String> {
        let (tokens, lexed) = self.scan(source);

        let mut parser = Parser::with_first_id(&tokens, self.next_expr_id);
        let parsed = parser.parse_repl();
        self.next_expr_id = parser.next_id();

        let input: ReplInput = match parsed {
            Ok(input) if lexed => input,
            Ok(_) => return None,
            Err(errors) => {
                self.report_all(&errors);
                return None;
            }
        };

        match input {
            ReplInput::Statements(statements) => {
                let resolved = Resolver::new(&mut self.interpreter).resolve(&statements);
                if let Err(errors) = resolved {
                    self.report_all(&errors);
                    return None;
                }

                if let Err(e) = self.interpreter.interpret(&statements) {
                    self.reporter.report(&e);
                }

                None
            }

            ReplInput::Expression(expr) => {
                let resolved = Resolver::new(&mut self.interpreter).resolve_expression(&expr);
                if let Err(errors) = resolved {
                    self.report_all(&errors);
                    return None;
                }

                match self.interpreter.evaluate(&expr) {
                    Ok(value) => Some(value.to_string()),
                    Err(e) => {
                        self.reporter.report(&e);
                        None
                    }
                }
            }
        }
    }

    /// Tokens (always ending in `EOF`) and whether the scan was clean.
    /// Lexical errors are reported here.
    fn scan(&mut self, source: &str) -> (Vec<Token>, bool) {
        let (tokens, errors) = Scanner::new(source).scan_all();
        self.report_all(&errors);

        (tokens, errors.is_empty())
    }

    fn report_all(&mut self, errors: &[LoxError]) {
        for error in errors {
            self.reporter.report(error);
        }
    }
}
