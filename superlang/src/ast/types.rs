//! Inferred type contexts

use serde::{Deserialize, Serialize};

/// Value kind of an upcoming expression, inferred before it is parsed.
///
/// A bool context selects the comparison production; the others parse as
/// additive expressions. The context is recorded for every binding so later
/// scans can use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeContext {
    Number,
    String,
    Bool,
    /// Not statically known: parameters, function values, arrays, call results
    Any,
}

impl TypeContext {
    pub fn is_known(self) -> bool {
        self != TypeContext::Any
    }
}
