//! Incremental parse-and-run session
//!
//! One parser and one interpreter that live across source fragments: a file
//! run and every REPL line after it share the same top-level symbols, stack
//! and function table.

use crate::error::CompileError;
use crate::interp::{Interpreter, RuntimeError, Value};
use crate::lexer::tokenize;
use crate::parser::Parser;
use thiserror::Error;
use tracing::debug;

/// Why a fragment did not run to completion
#[derive(Debug, Error)]
pub enum SessionError {
    /// Lexical, syntax or resolution error; nothing was executed
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Fatal runtime condition (`exit` or call-depth overflow)
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl SessionError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionError::Compile(_) => 1,
            SessionError::Runtime(err) => err.exit_code().unwrap_or(1),
        }
    }
}

pub struct Session {
    parser: Parser,
    interpreter: Interpreter,
    fragments: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    /// Start from a preconfigured interpreter (output sink, intrinsics,
    /// call depth)
    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Self {
            parser: Parser::new(),
            interpreter,
            fragments: 0,
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Tokenize, parse and run `source` as the next top-level fragment.
    ///
    /// A compile error leaves the session exactly as it was. Recoverable
    /// runtime errors do not fail the fragment; they are collected in the
    /// interpreter's diagnostics.
    pub fn run_source(&mut self, source: &str) -> Result<(), SessionError> {
        let tokens = tokenize(source)?;
        let scope = self.parser.parse(tokens)?;
        self.fragments += 1;
        debug!(
            fragment = self.fragments,
            base = scope.base,
            vars = scope.var_count,
            "fragment parsed"
        );
        self.interpreter.run(&scope)?;
        Ok(())
    }

    /// Current value of a top-level variable
    pub fn global(&self, name: &str) -> Option<&Value> {
        let symbol = self.parser.symbols().lookup(name)?;
        self.interpreter.global(symbol.slot)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
