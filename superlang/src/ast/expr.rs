//! Statement and expression AST nodes

use super::{FunctionDef, Scope, Spanned};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// AST node.
///
/// Every variable occurrence already carries its frame-relative slot; the
/// interpreter only adds the active frame's base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    /// Block: `{ ... }`
    Scope(Scope),

    /// Binary operation
    BinaryOperation {
        op: BinOp,
        left: Box<Spanned<Node>>,
        right: Box<Spanned<Node>>,
    },

    /// Scalar literal
    Literal(Literal),

    /// Variable read
    Variable { name: String, slot: usize },

    /// `let name = value` (declaration) or `name = value`
    Assign {
        name: String,
        slot: usize,
        declaration: bool,
        value: Box<Spanned<Node>>,
    },

    /// Call by function name, falling back to the function value in `slot`
    Call {
        name: String,
        slot: Option<usize>,
        args: Vec<Spanned<Node>>,
    },

    /// Named function declaration: `fn name(params) { body }`
    Function(Rc<FunctionDef>),

    /// Function literal used as a value: `fn(params) { body }`
    FunctionLiteral(Rc<FunctionDef>),

    /// `return [expr]`
    Return(Option<Box<Spanned<Node>>>),

    /// `if (condition) { ... } [else { ... }]`
    Branch {
        condition: Box<Spanned<Node>>,
        then_scope: Scope,
        else_scope: Option<Scope>,
    },

    /// `while (condition) { ... }`
    Loop {
        condition: Box<Spanned<Node>>,
        body: Scope,
    },

    /// `[e1, e2, ...]`
    ArrayLiteral(Vec<Spanned<Node>>),
}

impl Node {
    /// Short variant name for logs and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Scope(_) => "scope",
            Node::BinaryOperation { .. } => "binary operation",
            Node::Literal(_) => "literal",
            Node::Variable { .. } => "variable",
            Node::Assign { declaration: true, .. } => "declaration",
            Node::Assign { .. } => "assignment",
            Node::Call { .. } => "call",
            Node::Function(_) => "function",
            Node::FunctionLiteral(_) => "function literal",
            Node::Return(_) => "return",
            Node::Branch { .. } => "if",
            Node::Loop { .. } => "while",
            Node::ArrayLiteral(_) => "array literal",
        }
    }
}

/// Literal value embedded in the AST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(String),
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    // Arithmetic; `Add` also concatenates strings
    Add,
    Sub,
    Mul,
    Div,

    // Comparison
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge)
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Eq => write!(f, "=="),
            BinOp::Lt => write!(f, "<"),
            BinOp::Gt => write!(f, ">"),
            BinOp::Le => write!(f, "<="),
            BinOp::Ge => write!(f, ">="),
        }
    }
}
