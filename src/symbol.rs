//! Symbol table.
//!
//! Stands in for the external symbol manager a front end would supply:
//! the lexer, parser, and semantic analyzer that populate it are out of
//! scope here. What the codegen engine needs from it is narrow —
//! resolve a name to an opaque, stable handle, and push/pop per-scope
//! visibility as a block is entered and left — so that's all this
//! module provides.

use std::collections::HashMap;

use crate::types::SourceType;

/// What a resolved name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Constant,
    Function,
}

/// A resolved symbol. Immutable once created; see [`SymbolId`] for the
/// handle codegen actually carries around.
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: SourceType,
    /// 0 = global, >0 = local/parameter (nesting depth is not tracked
    /// beyond "global or not" because this grammar subset has no nested
    /// functions).
    pub level: usize,
}

impl SymbolEntry {
    pub fn is_global(&self) -> bool {
        self.level == 0
    }
}

/// Opaque handle to a [`SymbolEntry`]. Stable for the lifetime of the
/// [`SymbolManager`] that minted it; safe to use as a hash map key in
/// the codegen engine's local-slot map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(u32);

/// Resolves names to symbols and tracks which names are currently
/// visible, scope by scope.
///
/// Scope 0 always exists and holds global declarations. Entering a
/// function, a compound statement, or a `for` loop's implicit scope
/// pushes a fresh scope; leaving it pops the scope (and with it, every
/// name declared inside), exposing whatever was shadowed again.
pub struct SymbolManager {
    entries: Vec<SymbolEntry>,
    scopes: Vec<HashMap<String, SymbolId>>,
}

impl Default for SymbolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolManager {
    pub fn new() -> Self {
        SymbolManager {
            entries: Vec::new(),
            scopes: vec![HashMap::new()],
        }
    }

    /// Current scope level; 0 means only the global scope is open.
    pub fn level(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Push a new, initially-empty scope.
    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope, discarding the visibility of every name
    /// declared in it. Symbol entries themselves are not destroyed —
    /// only their current-scope visibility is removed — matching the
    /// "reconstruct on enter / remove on exit" shape of a real front
    /// end's symbol table, minus the data this engine never needs back.
    pub fn exit_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }

    /// Declare a new symbol in the innermost scope and return its handle.
    pub fn declare(&mut self, name: impl Into<String>, kind: SymbolKind, ty: SourceType) -> SymbolId {
        let name = name.into();
        let level = self.level();
        let id = SymbolId(self.entries.len() as u32);
        self.entries.push(SymbolEntry {
            name: name.clone(),
            kind,
            ty,
            level,
        });
        self.scopes
            .last_mut()
            .expect("at least the global scope is always open")
            .insert(name, id);
        id
    }

    /// Resolve a name against the innermost scope outward, as ordinary
    /// lexical shadowing requires.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .copied()
    }

    pub fn entry(&self, id: SymbolId) -> &SymbolEntry {
        &self.entries[id.0 as usize]
    }
}
