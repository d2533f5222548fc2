//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! Static failures (scanner, parser, resolver) and runtime failures are all
//! variants of [`LoxError`].  Static errors are collected and handed to a
//! [`Reporter`]; runtime errors propagate with `?` until the top-level entry
//! point catches them.
//!
//! The module **does not** print diagnostics itself, except through the
//! [`StderrReporter`] sink handed to it by the binary.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error bound to the offending token.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        /// ` at end` or ` at 'lexeme'`.
        location: String,
    },

    /// Static‑analysis failure (invalid `return`, self‑referential initializer, …).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }
}

fn location_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Diagnostic sink.  The core only decides *that* an error happened; the
/// sink decides how it is shown.
pub trait Reporter {
    fn report(&mut self, error: &LoxError);
}

/// Writes every diagnostic to standard error.
#[derive(Debug, Default)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn report(&mut self, error: &LoxError) {
        eprintln!("{}", error);
    }
}

/// Collects rendered diagnostics, mostly useful in tests.
impl Reporter for Vec<String> {
    fn report(&mut self, error: &LoxError) {
        self.push(error.to_string());
    }
}

/// Lets a caller keep a handle on a sink it gave away.
impl<R: Reporter> Reporter for Rc<RefCell<R>> {
    fn report(&mut self, error: &LoxError) {
        self.borrow_mut().report(error);
    }
}
