//! Statement executor and expression evaluator

use super::builtins::register_builtins;
use super::error::{InterpResult, RuntimeError};
use super::stack::{CallFrame, ValueStack};
use super::value::{Number, Value};
use crate::ast::{BinOp, FunctionDef, Node, Scope, Spanned};
use crate::util::{find_similar_name, format_suggestion_hint};
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use tracing::{debug, error, trace, warn};

/// Default call depth limit
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// Stack growth parameters for deep recursion
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// Native function: receives the interpreter and the evaluated arguments
/// (the callee frame's slots), may return a value.
pub type IntrinsicFn = Rc<dyn Fn(&mut Interpreter, &[Value]) -> InterpResult<Option<Value>>>;

/// Entry of the function table
#[derive(Clone)]
pub enum Callee {
    User(Rc<FunctionDef>),
    Internal(IntrinsicFn),
}

/// How a statement finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    Return,
}

/// The interpreter
pub struct Interpreter {
    stack: ValueStack,
    call_stack: Vec<CallFrame>,
    /// User functions and intrinsics, by name
    functions: HashMap<String, Callee>,
    /// Value staged by `return` until the call protocol collects it
    pending_return: Option<Value>,
    max_call_depth: usize,
    output: Box<dyn Write>,
    /// Recovered runtime errors, oldest first
    diagnostics: Vec<RuntimeError>,
}

impl Interpreter {
    /// Create a new interpreter writing to stdout
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Create a new interpreter with a custom output sink
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let mut interp = Interpreter {
            stack: ValueStack::new(),
            call_stack: Vec::new(),
            functions: HashMap::new(),
            pending_return: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            output,
            diagnostics: Vec::new(),
        };
        register_builtins(&mut interp);
        interp
    }

    pub fn set_max_call_depth(&mut self, depth: usize) {
        self.max_call_depth = depth;
    }

    /// Register a native function under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&mut Interpreter, &[Value]) -> InterpResult<Option<Value>> + 'static,
    {
        self.functions
            .insert(name.to_string(), Callee::Internal(Rc::new(f)));
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn stack(&self) -> &ValueStack {
        &self.stack
    }

    /// Active frames, innermost last
    pub fn call_stack(&self) -> &[CallFrame] {
        &self.call_stack
    }

    /// Output sink used by `print` and `dump_callstack`
    pub fn output(&mut self) -> &mut dyn Write {
        &mut *self.output
    }

    pub fn diagnostics(&self) -> &[RuntimeError] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<RuntimeError> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Value of a top-level slot (for the REPL and tests)
    pub fn global(&self, slot: usize) -> Option<&Value> {
        self.stack.get(slot)
    }

    /// Run a top-level scope.
    ///
    /// Top-level slots are absolute and are not reclaimed afterwards, so a
    /// later fragment parsed by the same parser can keep using them.
    /// Recoverable errors are recorded in [`Interpreter::diagnostics`];
    /// only fatal errors are returned.
    pub fn run(&mut self, program: &Scope) -> InterpResult<()> {
        debug!(
            base = program.base,
            vars = program.var_count,
            statements = program.statements.len(),
            "running top-level scope"
        );
        let result = self.exec_statements(&program.statements);
        self.pending_return = None;
        self.call_stack.clear();
        result.map(|_| ())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// Execute statements in order. Each statement is a recovery boundary:
    /// on a recoverable error the stack is cut back to the statement's entry
    /// height and execution continues with the next one.
    fn exec_statements(&mut self, statements: &[Spanned<Node>]) -> InterpResult<Flow> {
        for stmt in statements {
            let height = self.stack.len();
            match self.exec_statement(stmt) {
                Ok(Flow::Next) => {}
                Ok(Flow::Return) => return Ok(Flow::Return),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    error!(
                        line = stmt.span.line,
                        column = stmt.span.column,
                        statement = stmt.node.kind(),
                        "{}",
                        err.message
                    );
                    self.stack.truncate(height);
                    self.diagnostics.push(err);
                    // a failed return still ends the body, with no value
                    if matches!(stmt.node, Node::Return(_)) {
                        self.pending_return = None;
                        return Ok(Flow::Return);
                    }
                }
            }
        }
        Ok(Flow::Next)
    }

    /// Nested scope: net-zero on the stack
    fn exec_scope(&mut self, scope: &Scope) -> InterpResult<Flow> {
        let entry = self.stack.len();
        trace!(base = scope.base, vars = scope.var_count, entry, "enter scope");
        let flow = self.exec_statements(&scope.statements);
        self.stack.truncate(entry);
        trace!(entry, "exit scope");
        flow
    }

    fn exec_statement(&mut self, stmt: &Spanned<Node>) -> InterpResult<Flow> {
        match &stmt.node {
            Node::Scope(scope) => self.exec_scope(scope),

            Node::Assign {
                name,
                slot,
                declaration,
                value,
            } => {
                self.exec_assign(name, *slot, *declaration, value)?;
                Ok(Flow::Next)
            }

            // result, if any, is discarded
            Node::Call { name, slot, args } => {
                self.call(name, *slot, args)?;
                Ok(Flow::Next)
            }

            Node::Function(def) => {
                self.define_function(def);
                Ok(Flow::Next)
            }

            Node::Return(value) => {
                self.pending_return = match value {
                    Some(expr) => Some(self.eval(expr)?),
                    None => None,
                };
                Ok(Flow::Return)
            }

            Node::Branch {
                condition,
                then_scope,
                else_scope,
            } => {
                if self.eval_condition(condition)? {
                    self.exec_scope(then_scope)
                } else if let Some(else_scope) = else_scope {
                    self.exec_scope(else_scope)
                } else {
                    Ok(Flow::Next)
                }
            }

            Node::Loop { condition, body } => {
                while self.eval_condition(condition)? {
                    if self.exec_scope(body)? == Flow::Return {
                        return Ok(Flow::Return);
                    }
                }
                Ok(Flow::Next)
            }

            Node::FunctionLiteral(_)
            | Node::BinaryOperation { .. }
            | Node::Literal(_)
            | Node::Variable { .. }
            | Node::ArrayLiteral(_) => {
                self.eval(stmt)?;
                Ok(Flow::Next)
            }
        }
    }

    fn exec_assign(
        &mut self,
        name: &str,
        slot: usize,
        declaration: bool,
        value: &Spanned<Node>,
    ) -> InterpResult<()> {
        let value = self.eval(value)?;
        let addr = self.address(slot);
        if declaration {
            debug!(var = name, addr, value = %value, "declare");
            self.stack.declare(addr, value);
            Ok(())
        } else {
            debug!(var = name, addr, value = %value, "assign");
            if self.stack.assign(addr, value) {
                Ok(())
            } else {
                Err(RuntimeError::assign_undeclared(name))
            }
        }
    }

    /// Register a named declaration; a later declaration replaces it
    fn define_function(&mut self, def: &Rc<FunctionDef>) {
        let Some(name) = def.name.as_deref() else {
            return;
        };
        let previous = self
            .functions
            .insert(name.to_string(), Callee::User(Rc::clone(def)));
        if previous.is_some() {
            warn!(function = name, "function redefined");
        } else {
            debug!(function = name, params = def.param_count(), "function registered");
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Evaluate an expression with automatic stack growth for deep recursion
    fn eval(&mut self, expr: &Spanned<Node>) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr))
    }

    fn eval_inner(&mut self, expr: &Spanned<Node>) -> InterpResult<Value> {
        match &expr.node {
            Node::Literal(literal) => Ok(Value::from(literal)),

            Node::Variable { name, slot } => {
                let addr = self.address(*slot);
                self.stack
                    .get(addr)
                    .cloned()
                    .ok_or_else(|| RuntimeError::uninitialized(name))
            }

            // left first, then right
            Node::BinaryOperation { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                eval_binary(*op, &left, &right)
            }

            Node::Call { name, slot, args } => self
                .call(name, *slot, args)?
                .ok_or_else(|| RuntimeError::no_value(name)),

            Node::FunctionLiteral(def) => Ok(Value::Function(Rc::clone(def))),

            Node::ArrayLiteral(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.eval(element)?);
                }
                Ok(Value::array(items))
            }

            other => Err(RuntimeError::type_error("expression", other.kind())),
        }
    }

    fn eval_condition(&mut self, condition: &Spanned<Node>) -> InterpResult<bool> {
        let value = self.eval(condition)?;
        value
            .as_bool()
            .ok_or_else(|| RuntimeError::type_error("bool condition", value.type_name()))
    }

    /// Absolute stack index of a frame-relative slot
    fn address(&self, slot: usize) -> usize {
        self.call_stack.last().map_or(0, |frame| frame.base) + slot
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    /// Call protocol.
    ///
    /// Arguments are pushed from the current stack top and become the
    /// callee's slots `0..n`. On return the stack is cut back to that base
    /// and the staged return value (if any) is handed to the caller.
    fn call(
        &mut self,
        name: &str,
        slot: Option<usize>,
        args: &[Spanned<Node>],
    ) -> InterpResult<Option<Value>> {
        let callee = self.resolve_callee(name, slot)?;
        let base = self.stack.len();

        for arg in args {
            let value = self.eval(arg)?;
            self.stack.push(value);
        }

        if let Callee::User(def) = &callee {
            if def.param_count() != args.len() {
                self.stack.truncate(base);
                return Err(RuntimeError::arity_mismatch(
                    name,
                    def.param_count(),
                    args.len(),
                ));
            }
        }

        if self.call_stack.len() >= self.max_call_depth {
            self.stack.truncate(base);
            return Err(RuntimeError::stack_overflow(self.max_call_depth));
        }

        self.call_stack.push(CallFrame::new(name, base));
        debug!(function = name, base, depth = self.call_stack.len(), "push frame");

        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.invoke(&callee, base)
        });

        self.call_stack.pop();
        let staged = self.pending_return.take();
        self.stack.truncate(base);
        debug!(function = name, depth = self.call_stack.len(), "pop frame");

        Ok(result?.or(staged))
    }

    fn invoke(&mut self, callee: &Callee, base: usize) -> InterpResult<Option<Value>> {
        match callee {
            Callee::User(def) => {
                self.exec_scope(&def.body)?;
                Ok(self.pending_return.take())
            }
            Callee::Internal(f) => {
                let args = self.stack.values_from(base);
                let f = Rc::clone(f);
                f(self, &args)
            }
        }
    }

    /// By name first, then a function value held in the resolved slot
    fn resolve_callee(&self, name: &str, slot: Option<usize>) -> InterpResult<Callee> {
        if let Some(callee) = self.functions.get(name) {
            return Ok(callee.clone());
        }

        if let Some(slot) = slot {
            match self.stack.get(self.address(slot)) {
                Some(Value::Function(def)) => return Ok(Callee::User(Rc::clone(def))),
                Some(other) => return Err(RuntimeError::not_callable(name, other.type_name())),
                None => {}
            }
        }

        let names = self.function_names();
        let hint = format_suggestion_hint(find_similar_name(name, &names, 2));
        Err(RuntimeError::undefined_function(name, &hint))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Binary operator dispatch.
///
/// Two numbers follow C-like promotion (int with int stays int, anything
/// with a float is float); comparisons always yield bool. Otherwise only
/// string `+` string is defined.
pub fn eval_binary(op: BinOp, left: &Value, right: &Value) -> InterpResult<Value> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return eval_numeric(op, a, b);
    }

    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::string(joined))
        }
        _ => Err(RuntimeError::operator_error(
            op,
            left.type_name(),
            right.type_name(),
        )),
    }
}

fn eval_numeric(op: BinOp, left: Number, right: Number) -> InterpResult<Value> {
    match (left, right) {
        // integer arithmetic wraps
        (Number::Int(a), Number::Int(b)) => match op {
            BinOp::Add => Ok(Value::Int(a.wrapping_add(b))),
            BinOp::Sub => Ok(Value::Int(a.wrapping_sub(b))),
            BinOp::Mul => Ok(Value::Int(a.wrapping_mul(b))),
            BinOp::Div if b == 0 => Err(RuntimeError::division_by_zero()),
            BinOp::Div => Ok(Value::Int(a.wrapping_div(b))),
            BinOp::Eq => Ok(Value::Bool(a == b)),
            BinOp::Lt => Ok(Value::Bool(a < b)),
            BinOp::Gt => Ok(Value::Bool(a > b)),
            BinOp::Le => Ok(Value::Bool(a <= b)),
            BinOp::Ge => Ok(Value::Bool(a >= b)),
        },
        _ => {
            let (a, b) = (left.as_f32(), right.as_f32());
            Ok(match op {
                BinOp::Add => Value::Float(a + b),
                BinOp::Sub => Value::Float(a - b),
                BinOp::Mul => Value::Float(a * b),
                BinOp::Div => Value::Float(a / b),
                BinOp::Eq => Value::Bool(a == b),
                BinOp::Lt => Value::Bool(a < b),
                BinOp::Gt => Value::Bool(a > b),
                BinOp::Le => Value::Bool(a <= b),
                BinOp::Ge => Value::Bool(a >= b),
            })
        }
    }
}
