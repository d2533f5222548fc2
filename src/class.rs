//! Classes, their metaclasses, and instances.
//!
//! A class value answers two kinds of lookup:
//! * instance methods, found through [`LoxClass::find_method`] walking the
//!   superclass chain;
//! * class‑level methods, found on the **metaclass**: a second, lightweight
//!   `LoxClass` whose "instance" methods are the declaring class's
//!   `class`‑marked methods.  A subclass's metaclass inherits from its
//!   superclass's metaclass, so class‑level methods are inherited too.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, LoxFunction};
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

pub const INITIALIZER: &str = "init";

#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    methods: HashMap<String, Rc<LoxFunction>>,
    superclass: Option<Rc<LoxClass>>,
    metaclass: Option<Rc<LoxClass>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        methods: HashMap<String, Rc<LoxFunction>>,
        superclass: Option<Rc<LoxClass>>,
        metaclass: Option<Rc<LoxClass>>,
    ) -> Self {
        debug!("Creating class '{}' with {} method(s)", name, methods.len());

        Self {
            name,
            methods,
            superclass,
            metaclass,
        }
    }

    pub fn metaclass(&self) -> Option<&Rc<LoxClass>> {
        self.metaclass.as_ref()
    }

    /// Instance method `name`, searching this class then its ancestors.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self
                .superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name)),
        }
    }

    /// Class‑level method `name`, looked up on the metaclass chain.
    pub fn find_class_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.metaclass
            .as_ref()
            .and_then(|metaclass| metaclass.find_method(name))
    }
}

impl Callable for Rc<LoxClass> {
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER)
            .map_or(0, |initializer| initializer.arity())
    }

    /// Allocate an instance and run `init` on it, if declared.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(self))));

        if let Some(initializer) = self.find_method(INITIALIZER) {
            initializer
                .bind(Value::Instance(Rc::clone(&instance)))
                .call(interpreter, paren, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    /// Fields spring into existence on first assignment.
    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

// Fields may point back at the instance; print names only.
impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxInstance")
            .field("class", &self.class.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
