//! Symbol-to-storage mapping for the function currently being lowered.
//!
//! Keeps a map from a resolved symbol to the SSA number of the
//! `alloca` that holds it, reset at the start of every function —
//! offsets are per-function, not per-module, since parameter and local
//! numbering always restarts at the function's own first non-parameter
//! number.

use std::collections::HashMap;

use crate::symbol::SymbolId;

#[derive(Debug, Default)]
pub struct LocalSlots(HashMap<SymbolId, u32>);

impl LocalSlots {
    pub fn new() -> Self {
        LocalSlots(HashMap::new())
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn bind(&mut self, symbol: SymbolId, slot: u32) {
        self.0.insert(symbol, slot);
    }

    pub fn get(&self, symbol: SymbolId) -> Option<u32> {
        self.0.get(&symbol).copied()
    }
}
