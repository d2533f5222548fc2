//! Abstract syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Nodes are immutable once built.  Expressions that denote a variable
//! binding (`Variable`, `Assign`, `Self_`, `Super`) carry an [`ExprId`] handed
//! out by the parser; the resolver keys its scope‑distance table on that id,
//! so two structurally identical references stay distinct.

use std::rc::Rc;

use crate::token::Token;

/// Stable identity of a binding expression for the lifetime of a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExprId(pub usize);

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal.
    Nil,
}

/// A function body shared between its declaration and every closure built
/// from it.
#[derive(Debug, PartialEq)]
pub struct FunctionDecl {
    /// `None` for anonymous `fun (…) { … }` expressions.
    pub name: Option<Token>,

    /// `None` when the parameter list is absent altogether: a getter.
    pub params: Option<Vec<Token>>,

    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    pub fn arity(&self) -> usize {
        self.params.as_ref().map_or(0, Vec::len)
    }

    pub fn is_getter(&self) -> bool {
        self.params.is_none()
    }
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// Assignment expression: `identifier "=" expression`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Function‑ or method‑call expression
    Call {
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// Anonymous function: `fun (a, b) { … }`.
    Function(Rc<FunctionDecl>),

    /// The `self` keyword inside a method.
    Self_ { id: ExprId, keyword: Token },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop.  `for` loops are desugared into this.
    While { condition: Expr, body: Box<Stmt> },

    /// Named function declaration.
    Function(Rc<FunctionDecl>),

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    Class {
        name: Token,
        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
        /// Methods declared with a leading `class` marker.
        class_methods: Vec<Rc<FunctionDecl>>,
    },
}
