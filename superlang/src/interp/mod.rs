//! Stack-machine interpreter
//!
//! Executes a slot-resolved AST against a single value stack, with a call
//! stack of frames and a table of user functions and native intrinsics.

mod builtins;
mod error;
mod eval;
mod stack;
mod value;

pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{eval_binary, Callee, Interpreter, IntrinsicFn, DEFAULT_MAX_CALL_DEPTH};
pub use stack::{CallFrame, ValueStack};
pub use value::{ArrayRef, Number, Value};
