//! Things a call expression can invoke: native functions, user functions
//! (closures and bound methods) and classes (see [`crate::class`]).

use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Interpreter, Unwind};
use crate::token::Token;
use crate::value::Value;

/// Name the receiver is bound under, both by [`LoxFunction::bind`] and when
/// an initializer hands back its instance.
pub const RECEIVER: &str = "self";

pub trait Callable {
    /// Exact number of arguments a call must supply.
    fn arity(&self) -> usize;

    /// Invoke with already evaluated arguments.  `paren` locates the call
    /// site for error reporting.
    fn call(&self, interpreter: &mut Interpreter, paren: &Token, arguments: Vec<Value>)
        -> Result<Value>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Native functions
// ─────────────────────────────────────────────────────────────────────────────

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> std::result::Result<Value, String>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&arguments).map_err(|msg| LoxError::runtime(paren, msg))
    }
}

/// `clock()`: seconds since the Unix epoch, with sub‑second precision.
pub fn clock() -> NativeFunction {
    NativeFunction {
        name: "clock",
        arity: 0,
        func: |_args: &[Value]| {
            let micros: i64 = Utc::now().timestamp_micros();
            Ok(Value::Number(micros as f64 / 1_000_000.0))
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User functions
// ─────────────────────────────────────────────────────────────────────────────

/// A function declaration paired with the scope it closed over.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.declaration.name.as_ref().map(|t| t.lexeme.as_str())
    }

    /// Declared without a parameter list: runs on property access.
    pub fn is_getter(&self) -> bool {
        self.declaration.is_getter()
    }

    /// Same body, new one‑binding scope holding the receiver.  Each call
    /// makes its own scope, so instances never share one.
    pub fn bind(&self, receiver: Value) -> LoxFunction {
        let environment: EnvRef = Environment::new_ref(Some(Rc::clone(&self.closure)));
        environment.borrow_mut().define(RECEIVER, receiver);

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    fn receiver(&self) -> Value {
        self.closure
            .borrow()
            .get_local(RECEIVER)
            .unwrap_or(Value::Nil)
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LoxFunction({})", self.name().unwrap_or("<anonymous>"))
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.arity()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        _paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let name: &str = self.name().unwrap_or("<anonymous>");
        debug!("Calling user-defined function '{}'", name);

        let environment: EnvRef = Environment::new_ref(Some(Rc::clone(&self.closure)));

        if let Some(params) = &self.declaration.params {
            for (param, argument) in params.iter().zip(arguments) {
                environment.borrow_mut().define(&param.lexeme, argument);
            }
        }

        let returned: Value = match interpreter.execute_block(&self.declaration.body, environment)
        {
            Ok(()) => Value::Nil,
            Err(Unwind::Return(value)) => value,
            Err(Unwind::Error(e)) => return Err(e),
        };

        // An initializer always yields its instance, whatever `return` said.
        if self.is_initializer {
            return Ok(self.receiver());
        }

        info!("Function '{}' returned: {}", name, returned);

        Ok(returned)
    }
}
