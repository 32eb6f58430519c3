//! Abstract Syntax Tree definitions

mod expr;
mod span;
mod types;

pub use expr::*;
pub use span::*;
pub use types::*;

use serde::{Deserialize, Serialize};

/// A block of statements together with its frame descriptor.
///
/// `base` is the first frame-relative slot the scope may claim and
/// `var_count` the number of slots it claims directly. Nested scopes start
/// at `base + var_count` of their parent at the point they open, and the
/// interpreter truncates the stack back to the entry height on exit, so
/// sibling scopes reuse the same slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scope {
    pub statements: Vec<Spanned<Node>>,
    pub base: usize,
    pub var_count: usize,
}

impl Scope {
    pub fn new(statements: Vec<Spanned<Node>>, base: usize, var_count: usize) -> Self {
        Self {
            statements,
            base,
            var_count,
        }
    }

    /// Frame-relative slots claimed by this scope
    pub fn slots(&self) -> std::ops::Range<usize> {
        self.base..self.base + self.var_count
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// User function: named declaration or anonymous literal.
///
/// Parameters occupy frame slots `0..params.len()`; the body scope starts
/// right after them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Scope,
}

impl FunctionDef {
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Name used on the call stack
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}
