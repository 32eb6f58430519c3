//! Value stack and call frames
//!
//! Every local variable, parameter and call argument lives in one growable
//! stack of slots. Variables are addressed as `frame base + slot`, where the
//! slot was assigned by the parser. Scopes and calls truncate the stack back
//! to their entry height when they finish, so slot reuse is safe.

use super::Value;
use std::fmt;

/// Growable slot stack.
///
/// A slot holds `None` when it was claimed (the stack grew past it) but its
/// declaration never stored a value.
#[derive(Debug, Default)]
pub struct ValueStack {
    slots: Vec<Option<Value>>,
}

impl ValueStack {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn push(&mut self, value: Value) {
        self.slots.push(Some(value));
    }

    /// Drop every slot at or above `len`
    pub fn truncate(&mut self, len: usize) {
        self.slots.truncate(len);
    }

    /// Value stored at `addr`; `None` for a hole or an address past the top
    pub fn get(&self, addr: usize) -> Option<&Value> {
        self.slots.get(addr).and_then(Option::as_ref)
    }

    /// Store a freshly declared value, growing the stack as needed
    pub fn declare(&mut self, addr: usize, value: Value) {
        if addr >= self.slots.len() {
            self.slots.resize(addr, None);
            self.slots.push(Some(value));
        } else {
            self.slots[addr] = Some(value);
        }
    }

    /// Overwrite an existing slot. Returns `false`, leaving the stack
    /// untouched, when `addr` is past the top.
    pub fn assign(&mut self, addr: usize, value: Value) -> bool {
        match self.slots.get_mut(addr) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    /// Values from `start` to the top, holes skipped
    pub fn values_from(&self, start: usize) -> Vec<Value> {
        self.slots
            .get(start..)
            .unwrap_or_default()
            .iter()
            .flatten()
            .cloned()
            .collect()
    }
}

/// One active function invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    pub name: String,
    /// Absolute stack index of the frame's slot 0
    pub base: usize,
}

impl CallFrame {
    pub fn new(name: impl Into<String>, base: usize) -> Self {
        Self {
            name: name.into(),
            base,
        }
    }
}

impl fmt::Display for CallFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (base {})", self.name, self.base)
    }
}
