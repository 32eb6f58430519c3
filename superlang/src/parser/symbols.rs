//! Compile-time symbol table
//!
//! Maps names to frame-relative stack slots and inferred type contexts.
//! Scopes are kept as a stack, innermost last. A function scope holds the
//! parameters (a namespace of its own, so a body `let` may shadow a
//! parameter) and bounds every lookup made from inside that function.

use crate::ast::TypeContext;
use std::collections::HashMap;

/// A resolved binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub slot: usize,
    pub context: TypeContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScopeKind {
    Block,
    /// Parameter namespace of the named (or anonymous) function
    Function(String),
}

#[derive(Debug, Clone)]
struct SymbolScope {
    kind: ScopeKind,
    symbols: HashMap<String, Symbol>,
}

impl SymbolScope {
    fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            symbols: HashMap::new(),
        }
    }
}

/// Saved slot counter of an enclosing block
#[derive(Debug, Clone, Copy)]
pub struct BlockMark {
    base: usize,
}

/// Saved slot counter of the enclosing frame
#[derive(Debug, Clone, Copy)]
pub struct FunctionMark {
    outer_next_slot: usize,
}

/// Top-level state captured before an incremental parse
#[derive(Debug, Clone)]
pub struct Snapshot {
    top_level: SymbolScope,
    next_slot: usize,
}

/// Symbol table: scope stack plus the slot counter of the current frame
#[derive(Debug, Clone)]
pub struct SymbolTable {
    /// Index 0 is the top-level program scope
    scopes: Vec<SymbolScope>,
    next_slot: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![SymbolScope::new(ScopeKind::Block)],
            next_slot: 0,
        }
    }

    /// Next free slot in the current frame
    pub fn next_slot(&self) -> usize {
        self.next_slot
    }

    /// Claim the next slot for `name` in the innermost scope.
    /// Redeclaring a name in the same scope claims a fresh slot.
    pub fn declare(&mut self, name: &str, context: TypeContext) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        if let Some(scope) = self.scopes.last_mut() {
            scope.symbols.insert(name.to_string(), Symbol { slot, context });
        }
        slot
    }

    /// Look a name up from the innermost scope outward, stopping after the
    /// parameter namespace of the enclosing function.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        for scope in self.scopes.iter().rev() {
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(*symbol);
            }
            if matches!(scope.kind, ScopeKind::Function(_)) {
                break;
            }
        }
        None
    }

    /// Names visible from the current position (for suggestions)
    pub fn visible_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for scope in self.scopes.iter().rev() {
            names.extend(scope.symbols.keys().map(String::as_str));
            if matches!(scope.kind, ScopeKind::Function(_)) {
                break;
            }
        }
        names
    }

    /// Name of the innermost enclosing function, if any
    pub fn current_function(&self) -> Option<&str> {
        self.scopes.iter().rev().find_map(|scope| match &scope.kind {
            ScopeKind::Function(name) => Some(name.as_str()),
            ScopeKind::Block => None,
        })
    }

    pub fn enter_block(&mut self) -> BlockMark {
        self.scopes.push(SymbolScope::new(ScopeKind::Block));
        BlockMark {
            base: self.next_slot,
        }
    }

    /// Close a block; returns `(base, var_count)` for its frame descriptor.
    /// The counter goes back to the block's base so siblings reuse slots.
    pub fn exit_block(&mut self, mark: BlockMark) -> (usize, usize) {
        self.scopes.pop();
        let count = self.next_slot - mark.base;
        self.next_slot = mark.base;
        (mark.base, count)
    }

    /// Open a new frame: parameters take slots `0..params.len()`.
    pub fn enter_function(&mut self, name: &str, params: &[String]) -> FunctionMark {
        let mark = FunctionMark {
            outer_next_slot: self.next_slot,
        };
        self.scopes
            .push(SymbolScope::new(ScopeKind::Function(name.to_string())));
        self.next_slot = 0;
        for param in params {
            self.declare(param, TypeContext::Any);
        }
        mark
    }

    pub fn exit_function(&mut self, mark: FunctionMark) {
        self.scopes.pop();
        self.next_slot = mark.outer_next_slot;
    }

    /// Capture the top-level scope. Only meaningful between statements at
    /// top level.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            top_level: self.scopes[0].clone(),
            next_slot: self.next_slot,
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.scopes.truncate(1);
        self.scopes[0] = snapshot.top_level;
        self.next_slot = snapshot.next_slot;
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
