//! Runtime errors for the interpreter

use std::fmt;

/// Runtime error during interpretation
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Plain assignment to a slot that does not exist yet
    AssignUndeclared,
    /// Read of a slot whose declaration never completed
    UninitializedVariable,
    /// Call target is neither a function nor a function value
    UndefinedFunction,
    /// Operand kinds do not support the operator
    TypeError,
    /// Integer division by zero
    DivisionByZero,
    /// Argument count mismatch
    ArityMismatch,
    /// A call used as an expression produced no value
    NoValue,
    /// Index out of bounds
    IndexOutOfBounds,
    /// Output sink failed
    IoError,
    /// Call depth limit reached
    StackOverflow,
    /// `exit(code)` was called
    Exit(i32),
}

impl RuntimeError {
    pub fn assign_undeclared(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::AssignUndeclared,
            message: format!("failed to assign, variable '{name}' does not exist in current scope"),
        }
    }

    pub fn uninitialized(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UninitializedVariable,
            message: format!("variable '{name}' was never initialized"),
        }
    }

    pub fn undefined_function(name: &str, hint: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UndefinedFunction,
            message: format!("undefined function: {name}{hint}"),
        }
    }

    pub fn not_callable(name: &str, type_name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UndefinedFunction,
            message: format!("'{name}' holds a {type_name}, not a function"),
        }
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeError,
            message: format!("type error: expected {expected}, got {got}"),
        }
    }

    pub fn operator_error(op: impl fmt::Display, left: &str, right: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeError,
            message: format!("operator `{op}` not supported for {left} and {right}"),
        }
    }

    pub fn division_by_zero() -> Self {
        RuntimeError {
            kind: ErrorKind::DivisionByZero,
            message: "division by zero".to_string(),
        }
    }

    pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::ArityMismatch,
            message: format!("function {name} expects {expected} argument(s), got {got}"),
        }
    }

    pub fn no_value(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::NoValue,
            message: format!("call to {name} produced no value"),
        }
    }

    pub fn index_out_of_bounds(index: i32, len: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::IndexOutOfBounds,
            message: format!("index {index} out of bounds for length {len}"),
        }
    }

    pub fn io_error(msg: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::IoError,
            message: format!("IO error: {msg}"),
        }
    }

    pub fn stack_overflow(limit: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::StackOverflow,
            message: format!("stack overflow: call depth exceeded {limit}"),
        }
    }

    pub fn exit(code: i32) -> Self {
        RuntimeError {
            kind: ErrorKind::Exit(code),
            message: format!("exit requested with code {code}"),
        }
    }

    /// Fatal errors unwind the whole run instead of aborting one statement
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::StackOverflow | ErrorKind::Exit(_))
    }

    /// Process exit code requested by `exit`, if any
    pub fn exit_code(&self) -> Option<i32> {
        match self.kind {
            ErrorKind::Exit(code) => Some(code),
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::io_error(&err.to_string())
    }
}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_undeclared() {
        let err = RuntimeError::assign_undeclared("x");
        assert_eq!(err.kind, ErrorKind::AssignUndeclared);
        assert!(err.message.contains("'x'"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_operator_error_names_operands() {
        let err = RuntimeError::operator_error("-", "string", "int");
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert!(err.message.contains("`-`"));
        assert!(err.message.contains("string and int"));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = RuntimeError::arity_mismatch("add", 2, 1);
        assert_eq!(err.kind, ErrorKind::ArityMismatch);
        assert!(err.message.contains("expects 2"));
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(RuntimeError::exit(3).is_fatal());
        assert_eq!(RuntimeError::exit(3).exit_code(), Some(3));
        assert!(RuntimeError::stack_overflow(10).is_fatal());
        assert!(!RuntimeError::division_by_zero().is_fatal());
        assert_eq!(RuntimeError::division_by_zero().exit_code(), None);
    }

    #[test]
    fn test_display() {
        let err = RuntimeError::index_out_of_bounds(5, 3);
        assert_eq!(
            err.to_string(),
            "Runtime error: index 5 out of bounds for length 3"
        );
    }
}
