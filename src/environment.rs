use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to one scope.  Closures keep these alive past the block
/// that created them, and every holder sees the others' writes.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// Fresh scope as a shared handle, optionally layered on `enclosing`.
    pub fn new_ref(enclosing: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing,
        }))
    }

    /// Insert or overwrite `name` in this scope only.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// `name` in this scope only, without walking outward.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Walk outward until `name` is found.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Walk outward until `name` is found, then overwrite it there.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }
}

/// The scope exactly `distance` hops out from `env` (0 = `env` itself).
pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
    let mut current: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let next: Option<EnvRef> = current.borrow().enclosing.clone();

        match next {
            Some(parent) => current = parent,
            None => {
                debug!("ancestor: chain ended before distance {}", distance);
                break;
            }
        }
    }

    current
}

/// Read `name` from the scope `distance` hops out, as recorded by the resolver.
pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
    let scope: EnvRef = ancestor(env, distance);
    let value: Option<Value> = scope.borrow().values.get(&name.lexeme).cloned();

    value.ok_or_else(|| undefined(name))
}

/// Overwrite `name` in the scope `distance` hops out.
pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
    let scope: EnvRef = ancestor(env, distance);
    let mut scope = scope.borrow_mut();

    let assigned: bool = match scope.values.get_mut(&name.lexeme) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    };

    if assigned {
        Ok(())
    } else {
        Err(undefined(name))
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}
