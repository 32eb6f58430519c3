//! SuperLanguage Library
//!
//! A small imperative scripting language: a slot-resolving recursive-descent
//! parser and a stack-machine tree-walking interpreter.

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod repl;
pub mod session;
pub mod util;

pub use ast::Span;
pub use error::{CompileError, Result};
pub use session::{Session, SessionError};
