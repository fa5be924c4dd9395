//! Scope context stack and RAII scope guards.
//!
//! Every lowering function that opens a block — a program, a function
//! body, a compound statement, a for-loop — needs to push a context
//! (global or local) and a fresh symbol-table scope on entry and pop
//! both on exit. With `?` early-returns scattered through those
//! functions, a hand-paired push/pop is exactly the kind of invariant
//! that silently breaks the first time someone adds one more return
//! path. A `Drop` guard makes the pop unconditional instead of
//! something every call site has to remember.

use crate::symbol::SymbolManager;

/// Which kind of block is currently open. Global storage (program-level
/// `var` declarations) is addressed by name; local storage (everything
/// inside a function body) is addressed by its alloca's SSA number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Local,
}

#[derive(Debug)]
pub struct ContextStack(Vec<Scope>);

impl Default for ContextStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStack {
    pub fn new() -> Self {
        ContextStack(vec![Scope::Global])
    }

    pub fn is_global(&self) -> bool {
        matches!(self.0.last(), Some(Scope::Global))
    }

    pub fn is_local(&self) -> bool {
        !self.is_global()
    }

    fn push(&mut self, scope: Scope) {
        self.0.push(scope);
    }

    fn pop(&mut self) {
        debug_assert!(self.0.len() > 1, "cannot pop the program-level scope");
        self.0.pop();
    }
}

/// Opens a context-stack scope and a symbol-table scope together, and
/// closes both when dropped — on every exit path, including an early
/// `?` return from inside the scope.
pub struct ScopeGuard {
    context: *mut ContextStack,
    symbols: *mut SymbolManager,
}

impl ScopeGuard {
    pub fn enter(context: &mut ContextStack, symbols: &mut SymbolManager, scope: Scope) -> Self {
        context.push(scope);
        symbols.enter_scope();
        ScopeGuard {
            context: context as *mut ContextStack,
            symbols: symbols as *mut SymbolManager,
        }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        // SAFETY: these pointers are derived from the `&mut` references passed
        // to `enter`, which stay valid for the guard's lifetime (the guard
        // does not outlive the borrows it was constructed from, since it has
        // no lifetime parameter tying it to them, but callers always hold
        // `cg` — and therefore the pointed-to fields — alive until the guard
        // drops). No other access to these fields happens concurrently with
        // this dereference.
        unsafe {
            (*self.symbols).exit_scope();
            (*self.context).pop();
        }
    }
}
