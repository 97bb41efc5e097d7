//! Memoized definition lookup.
//!
//! Boxing resolves the definition of every head and symbol it meets. The
//! cache remembers each resolution, including "no definition", until the
//! entry is invalidated by a redefinition.

use crate::definitions::{DefinitionRegistry, OperatorDefinition, SymbolDefinition};
use canon_ast::{Operator, SymbolId};
use rustc_hash::FxHashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingStats {
    pub hits: usize,
    pub misses: usize,
}

#[derive(Debug, Default)]
pub struct BindingCache {
    operators: FxHashMap<Operator, Option<Arc<OperatorDefinition>>>,
    symbols: FxHashMap<SymbolId, Option<Arc<SymbolDefinition>>>,
    stats: BindingStats,
}

impl BindingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve_operator(
        &mut self,
        registry: &DefinitionRegistry,
        op: Operator,
    ) -> Option<Arc<OperatorDefinition>> {
        if let Some(binding) = self.operators.get(&op) {
            self.stats.hits += 1;
            return binding.clone();
        }
        self.stats.misses += 1;
        let binding = registry.lookup_operator(op);
        self.operators.insert(op, binding.clone());
        binding
    }

    pub fn resolve_symbol(
        &mut self,
        registry: &DefinitionRegistry,
        symbol: SymbolId,
    ) -> Option<Arc<SymbolDefinition>> {
        if let Some(binding) = self.symbols.get(&symbol) {
            self.stats.hits += 1;
            return binding.clone();
        }
        self.stats.misses += 1;
        let binding = registry.lookup_symbol(symbol);
        self.symbols.insert(symbol, binding.clone());
        binding
    }

    pub fn invalidate_operator(&mut self, op: Operator) {
        self.operators.remove(&op);
    }

    pub fn invalidate_symbol(&mut self, symbol: SymbolId) {
        self.symbols.remove(&symbol);
    }

    pub fn stats(&self) -> BindingStats {
        self.stats
    }
}
