//! Built-in intrinsics
//!
//! Registered by [`Interpreter::new`] through the same table host code uses
//! via [`Interpreter::register`], so they follow the ordinary call protocol.

use super::error::{InterpResult, RuntimeError};
use super::eval::Interpreter;
use super::value::{ArrayRef, Value};
use std::io::Write;

pub(super) fn register_builtins(interp: &mut Interpreter) {
    interp.register("print", builtin_print);
    interp.register("exit", builtin_exit);
    interp.register("dump_callstack", builtin_dump_callstack);
    interp.register("len", builtin_len);
    interp.register("get", builtin_get);
    interp.register("set", builtin_set);
    interp.register("push", builtin_push);
    interp.register("pop", builtin_pop);
}

fn expect_args(name: &str, args: &[Value], count: usize) -> InterpResult<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(RuntimeError::arity_mismatch(name, count, args.len()))
    }
}

fn array_arg(value: &Value) -> InterpResult<&ArrayRef> {
    value
        .as_array()
        .ok_or_else(|| RuntimeError::type_error("array", value.type_name()))
}

fn index_arg(value: &Value, len: usize) -> InterpResult<usize> {
    let index = value
        .as_int()
        .ok_or_else(|| RuntimeError::type_error("int index", value.type_name()))?;
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| RuntimeError::index_out_of_bounds(index, len))
}

fn length_value(len: usize) -> Value {
    Value::Int(i32::try_from(len).unwrap_or(i32::MAX))
}

/// print(args...): all arguments concatenated, then a newline
fn builtin_print(interp: &mut Interpreter, args: &[Value]) -> InterpResult<Option<Value>> {
    let line: String = args.iter().map(ToString::to_string).collect();
    let out = interp.output();
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(None)
}

/// exit([code]): unwinds the whole run with the requested code
fn builtin_exit(_: &mut Interpreter, args: &[Value]) -> InterpResult<Option<Value>> {
    let code = match args.first() {
        None => 0,
        Some(value) => value
            .as_int()
            .ok_or_else(|| RuntimeError::type_error("int exit code", value.type_name()))?,
    };
    Err(RuntimeError::exit(code))
}

/// dump_callstack(): the caller's frames, innermost last
fn builtin_dump_callstack(interp: &mut Interpreter, _: &[Value]) -> InterpResult<Option<Value>> {
    let frames = interp.call_stack();
    // the last frame is this intrinsic itself
    let lines: Vec<String> = frames[..frames.len().saturating_sub(1)]
        .iter()
        .map(ToString::to_string)
        .collect();

    let out = interp.output();
    writeln!(out, "call stack ({} frames):", lines.len())?;
    for line in &lines {
        writeln!(out, "  {line}")?;
    }
    out.flush()?;
    Ok(None)
}

/// len(array | string)
fn builtin_len(_: &mut Interpreter, args: &[Value]) -> InterpResult<Option<Value>> {
    expect_args("len", args, 1)?;
    match &args[0] {
        Value::Array(items) => Ok(Some(length_value(items.borrow().len()))),
        Value::Str(s) => Ok(Some(length_value(s.chars().count()))),
        other => Err(RuntimeError::type_error("array or string", other.type_name())),
    }
}

/// get(array, index)
fn builtin_get(_: &mut Interpreter, args: &[Value]) -> InterpResult<Option<Value>> {
    expect_args("get", args, 2)?;
    let items = array_arg(&args[0])?.borrow();
    let index = index_arg(&args[1], items.len())?;
    Ok(Some(items[index].clone()))
}

/// set(array, index, value): mutates the shared array in place
fn builtin_set(_: &mut Interpreter, args: &[Value]) -> InterpResult<Option<Value>> {
    expect_args("set", args, 3)?;
    let mut items = array_arg(&args[0])?.borrow_mut();
    let index = index_arg(&args[1], items.len())?;
    items[index] = args[2].clone();
    Ok(None)
}

/// push(array, value)
fn builtin_push(_: &mut Interpreter, args: &[Value]) -> InterpResult<Option<Value>> {
    expect_args("push", args, 2)?;
    array_arg(&args[0])?.borrow_mut().push(args[1].clone());
    Ok(None)
}

/// pop(array): removes and returns the last element
fn builtin_pop(_: &mut Interpreter, args: &[Value]) -> InterpResult<Option<Value>> {
    expect_args("pop", args, 1)?;
    let popped = array_arg(&args[0])?.borrow_mut().pop();
    popped
        .map(Some)
        .ok_or_else(|| RuntimeError::index_out_of_bounds(0, 0))
}
