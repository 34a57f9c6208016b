//! Abstract syntax for Kaleidoscope top-level units

use std::fmt;

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary {
        op: char,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        else_: Box<Expr>,
    },
    /// `for var = start, end, step in body`; always yields 0.0
    For {
        var: String,
        start: Box<Expr>,
        end: Box<Expr>,
        step: Option<Box<Expr>>,
        body: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: char, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: callee.into(),
            args,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }
}

/// Function signature: a name and its parameter names
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub name: String,
    pub params: Vec<String>,
}

impl Prototype {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Prototype {
            name: name.into(),
            params,
        }
    }

    /// Signature used to wrap a bare expression; the driver names it
    pub fn anonymous() -> Self {
        Prototype {
            name: String::new(),
            params: Vec::new(),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Function definition: a prototype with a body
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub proto: Prototype,
    pub body: Expr,
}

impl Function {
    pub fn new(proto: Prototype, body: Expr) -> Self {
        Function { proto, body }
    }
}

/// Syntactic category of a top-level unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Definition,
    Extern,
    TopLevelExpression,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Definition => write!(f, "definition"),
            UnitKind::Extern => write!(f, "extern"),
            UnitKind::TopLevelExpression => write!(f, "top-level expression"),
        }
    }
}

/// One completely parsed top-level unit
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    Definition(Function),
    Extern(Prototype),
    /// Bare expression, pre-wrapped into a zero-argument function
    TopLevelExpression(Function),
}

impl Unit {
    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::Definition(_) => UnitKind::Definition,
            Unit::Extern(_) => UnitKind::Extern,
            Unit::TopLevelExpression(_) => UnitKind::TopLevelExpression,
        }
    }
}
