use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::callable::{self, Callable, LoxFunction, RECEIVER};
use crate::class::{LoxClass, INITIALIZER};
use crate::environment::{self, EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Why statement execution stopped early.  A `return` is not an error; it
/// only travels on the same channel until the enclosing call catches it.
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Error(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(error: LoxError) -> Self {
        Unwind::Error(error)
    }
}

/// Outcome of executing one statement.
pub type Exec = std::result::Result<(), Unwind>;

/// Deepest chain of nested Lox calls before the call is refused.
pub const MAX_CALL_DEPTH: usize = 1000;

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an Interpreter printing to stdout, with native functions
    /// such as `clock` defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an Interpreter whose `print` output goes to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new_ref(None);

        debug!("Defining native function 'clock'");
        globals
            .borrow_mut()
            .define("clock", Value::NativeFunction(Rc::new(callable::clock())));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            call_depth: 0,
        }
    }

    /// Record that the binding expression `id` lives `depth` scopes out.
    /// Called by the resolver; ids it never reports are globals.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error aborts the rest.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}
                Err(Unwind::Error(e)) => return Err(e),
                Err(Unwind::Return(value)) => {
                    // The resolver rejects top-level `return`.
                    debug!("Top-level return signal with value {} ignored", value);
                    return Ok(());
                }
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Exec {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value).map_err(LoxError::from)?;
                debug!("Printed value: {}", value);
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(())
            }

            Stmt::Block(statements) => {
                let scope: EnvRef = Environment::new_ref(Some(Rc::clone(&self.environment)));
                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }

            Stmt::Function(declaration) => {
                let name: String = declaration
                    .name
                    .as_ref()
                    .map(|t| t.lexeme.clone())
                    .unwrap_or_default();
                debug!("Defining function '{}'", name);

                // The closure is the defining scope, captured now.
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment
                    .borrow_mut()
                    .define(&name, Value::Function(Rc::new(function)));
                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Err(Unwind::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                class_methods,
            } => {
                self.declare_class(name, superclass.as_ref(), methods, class_methods)?;
                Ok(())
            }
        }
    }

    /// Run `statements` in `environment`, then put the previous scope back,
    /// whether the block finished, returned, or failed.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Exec {
        let previous: EnvRef = std::mem::replace(&mut self.environment, environment);

        let result: Exec = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;
        result
    }

    fn declare_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
        class_methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        debug!("Declaring class '{}'", name.lexeme);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let at: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(LoxError::runtime(at, "Superclass must be a class."));
                }
            },
            None => None,
        };

        // Methods close over a scope holding `super` when there is one.
        let closure: EnvRef = match &superclass {
            Some(class) => {
                let scope: EnvRef = Environment::new_ref(Some(Rc::clone(&self.environment)));
                scope
                    .borrow_mut()
                    .define("super", Value::Class(Rc::clone(class)));
                scope
            }
            None => Rc::clone(&self.environment),
        };

        let bind_all = |declarations: &[Rc<FunctionDecl>], allow_init: bool| {
            declarations
                .iter()
                .map(|declaration| {
                    let method_name: String = declaration
                        .name
                        .as_ref()
                        .map(|t| t.lexeme.clone())
                        .unwrap_or_default();
                    let is_initializer: bool = allow_init && method_name == INITIALIZER;
                    let function =
                        LoxFunction::new(Rc::clone(declaration), Rc::clone(&closure), is_initializer);
                    (method_name, Rc::new(function))
                })
                .collect::<HashMap<String, Rc<LoxFunction>>>()
        };

        // Metaclass first: its methods are the class-level ones.
        let metaclass = LoxClass::new(
            format!("{} metaclass", name.lexeme),
            bind_all(class_methods, false),
            superclass
                .as_ref()
                .and_then(|class| class.metaclass().cloned()),
            None,
        );

        let class = LoxClass::new(
            name.lexeme.clone(),
            bind_all(methods, true),
            superclass,
            Some(Rc::new(metaclass)),
        );

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Class(Rc::new(class)));

        info!("Class '{}' defined", name.lexeme);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                if operator.token_type == TokenType::OR {
                    if left_val.is_truthy() {
                        return Ok(left_val);
                    }
                } else if !left_val.is_truthy() {
                    return Ok(left_val);
                }

                self.evaluate(right)
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(distance) => {
                        environment::assign_at(&self.environment, *distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                debug!("Assigned value {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.invoke_callable(&callee_val, paren, arg_values)
            }

            Expr::Get { object, name } => {
                let object: Value = self.evaluate(object)?;
                self.get_property(object, name)
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(&name.lexeme, value.clone());
                Ok(value)
            }

            Expr::Function(declaration) => Ok(Value::Function(Rc::new(LoxFunction::new(
                Rc::clone(declaration),
                Rc::clone(&self.environment),
                false,
            )))),

            Expr::Self_ { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> Result<Value> {
        let right_val: Value = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => {
                    debug!("Unary minus on {}", other.type_name());
                    Err(LoxError::runtime(op, "Operand must be a number."))
                }
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(op, "Invalid unary operator.")),
        }
    }

    /// Evaluates a binary expression.  Operands are evaluated left then right
    /// before any type check.
    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                (a, b) => {
                    debug!("'+' on {} and {}", a.type_name(), b.type_name());
                    Err(LoxError::runtime(
                        op,
                        "Operands must be two numbers or two strings.",
                    ))
                }
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = number_operands(op, &left_val, &right_val)?;
                if b == 0.0 {
                    return Err(LoxError::runtime(op, "Division by zero."));
                }
                Ok(Value::Number(a / b))
            }

            TokenType::LESS
            | TokenType::LESS_EQUAL
            | TokenType::GREATER
            | TokenType::GREATER_EQUAL => {
                let ordering = match (&left_val, &right_val) {
                    (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                    (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                    _ => {
                        return Err(LoxError::runtime(
                            op,
                            "Operands must be two numbers or two strings.",
                        ))
                    }
                };

                // NaN compares false every way round.
                let result: bool = match ordering {
                    None => false,
                    Some(ordering) => match op.token_type {
                        TokenType::LESS => ordering.is_lt(),
                        TokenType::LESS_EQUAL => ordering.is_le(),
                        TokenType::GREATER => ordering.is_gt(),
                        _ => ordering.is_ge(),
                    },
                };

                Ok(Value::Bool(result))
            }

            _ => Err(LoxError::runtime(op, "Invalid binary operator.")),
        }
    }

    /// Resolved locals jump straight to their scope; everything else is a
    /// global.
    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(distance) => environment::get_at(&self.environment, *distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    /// Invokes a callable (native function, user function or class).
    fn invoke_callable(
        &mut self,
        callee_val: &Value,
        paren: &Token,
        arg_values: Vec<Value>,
    ) -> Result<Value> {
        let Some(callable) = callee_val.as_callable() else {
            return Err(LoxError::runtime(
                paren,
                "Can only call functions and classes.",
            ));
        };

        if arg_values.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arg_values.len()
                ),
            ));
        }

        self.call_guarded(callable, paren, arg_values)
    }

    /// Every Lox call goes through here, so runaway recursion becomes a
    /// runtime error instead of exhausting the native stack.
    fn call_guarded(
        &mut self,
        callable: &dyn Callable,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        if self.call_depth >= MAX_CALL_DEPTH {
            debug!("Call depth limit {} reached", MAX_CALL_DEPTH);
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        self.call_depth += 1;
        let result: Result<Value> = callable.call(self, paren, arguments);
        self.call_depth -= 1;

        result
    }

    /// `object.name`: instance fields, then instance methods; on a class
    /// value, its class‑level methods.  Getters run immediately.
    fn get_property(&mut self, object: Value, name: &Token) -> Result<Value> {
        let method: Option<Rc<LoxFunction>> = match &object {
            Value::Instance(instance) => {
                let instance = instance.borrow();

                if let Some(value) = instance.field(&name.lexeme) {
                    return Ok(value);
                }

                instance.class.find_method(&name.lexeme)
            }

            Value::Class(class) => class.find_class_method(&name.lexeme),

            _ => return Err(LoxError::runtime(name, "Only instances have properties.")),
        };

        match method {
            Some(method) => self.bind_method(&method, object, name),
            None => Err(LoxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    /// Bind `method` to `receiver`; a getter is called on the spot.
    fn bind_method(&mut self, method: &LoxFunction, receiver: Value, at: &Token) -> Result<Value> {
        let bound: LoxFunction = method.bind(receiver);

        if bound.is_getter() {
            debug!("Invoking getter '{}'", at.lexeme);
            return self.call_guarded(&bound, at, Vec::new());
        }

        Ok(Value::Function(Rc::new(bound)))
    }

    /// `super.method`: look up from the superclass of the executing method's
    /// class, bound to the current receiver.
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let Some(&distance) = self.locals.get(&id) else {
            return Err(LoxError::runtime(keyword, "Can't use 'super' here."));
        };

        let Value::Class(superclass) = environment::get_at(&self.environment, distance, keyword)?
        else {
            return Err(LoxError::runtime(keyword, "Superclass must be a class."));
        };

        // The receiver scope sits just inside the `super` scope.
        let receiver_name = Token::new(TokenType::SELF, RECEIVER, keyword.line);
        let receiver: Value =
            environment::get_at(&self.environment, distance.saturating_sub(1), &receiver_name)?;

        let found: Option<Rc<LoxFunction>> = match receiver {
            Value::Class(_) => superclass.find_class_method(&method.lexeme),
            _ => superclass.find_method(&method.lexeme),
        };

        match found {
            Some(function) => self.bind_method(&function, receiver, method),
            None => Err(LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }
}

fn number_operands(op: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => {
            debug!(
                "'{}' on {} and {}",
                op.lexeme,
                left.type_name(),
                right.type_name()
            );
            Err(LoxError::runtime(op, "Operands must be numbers."))
        }
    }
}
