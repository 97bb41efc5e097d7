//! The engine: an expression arena plus the definitions that give its
//! operators meaning.

use crate::binding::BindingCache;
use crate::cost::{default_cost, CostFunction};
use crate::definitions::{DefinitionRegistry, OperatorDefinition, SymbolDefinition};
use crate::error::EngineError;
use crate::library;
use crate::options::EngineOptions;
use crate::rule::Rule;
use canon_ast::{is_valid_identifier, Context, ExprId, Operator, SymbolId};
use canon_numeric::NumericValue;
use canon_parser::{parse_with, ParseOptions};
use std::sync::Arc;
use tracing::debug;

pub struct Engine {
    pub context: Context,
    pub options: EngineOptions,
    pub(crate) registry: DefinitionRegistry,
    pub(crate) bindings: BindingCache,
    pub(crate) cost: CostFunction,
    pub(crate) standard_rules: Option<Vec<Rule>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        let mut context = Context::new();
        let registry = library::standard_library(&mut context);
        debug!(
            operators = registry.operator_count(),
            symbols = registry.symbol_count(),
            "engine_created"
        );
        Engine {
            context,
            options,
            registry,
            bindings: BindingCache::new(),
            cost: Arc::new(default_cost),
            standard_rules: None,
        }
    }

    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    pub fn bindings(&self) -> &BindingCache {
        &self.bindings
    }

    pub(crate) fn operator_definition(&mut self, op: Operator) -> Option<Arc<OperatorDefinition>> {
        self.bindings.resolve_operator(&self.registry, op)
    }

    pub(crate) fn symbol_definition(&mut self, symbol: SymbolId) -> Option<Arc<SymbolDefinition>> {
        self.bindings.resolve_symbol(&self.registry, symbol)
    }

    /// Define (or redefine) an operator by name.
    pub fn define_operator(&mut self, def: OperatorDefinition) -> Operator {
        let op = self.context.operator_of(&def.name);
        debug!(operator = %def.name, "define_operator");
        self.registry.insert_operator(op, def);
        self.bindings.invalidate_operator(op);
        self.context.invalidate_canonical();
        op
    }

    /// Define (or redefine) a symbol.
    pub fn define_symbol(
        &mut self,
        name: &str,
        def: SymbolDefinition,
    ) -> Result<SymbolId, EngineError> {
        if !is_valid_identifier(name) {
            return Err(EngineError::InvalidIdentifier(name.to_string()));
        }
        let symbol = self.context.symbols_mut().intern(name);
        if let Some(existing) = self.registry.lookup_symbol(symbol) {
            if existing.constant {
                return Err(EngineError::ConstantSymbol(name.to_string()));
            }
        }
        self.registry.insert_symbol(symbol, def);
        self.bindings.invalidate_symbol(symbol);
        self.context.invalidate_canonical();
        Ok(symbol)
    }

    /// Give a variable a value, substituted by `evaluate` and `n`.
    pub fn assign(&mut self, name: &str, value: ExprId) -> Result<(), EngineError> {
        let value = self.try_canonical(value)?;
        self.define_symbol(name, SymbolDefinition::variable(value))
            .map(|_| ())
    }

    /// Remove a variable's definition. Constants cannot be forgotten.
    pub fn forget(&mut self, name: &str) -> Result<(), EngineError> {
        let Some(symbol) = self.context.symbols().get_id(name) else {
            return Ok(());
        };
        if self
            .registry
            .lookup_symbol(symbol)
            .map_or(false, |def| def.constant)
        {
            return Err(EngineError::ConstantSymbol(name.to_string()));
        }
        self.registry.remove_symbol(symbol);
        self.bindings.invalidate_symbol(symbol);
        self.context.invalidate_canonical();
        Ok(())
    }

    /// Replace the structural cost used by `simplify`.
    pub fn set_cost_function(&mut self, cost: CostFunction) {
        self.cost = cost;
    }

    pub fn cost(&self, id: ExprId) -> f64 {
        (self.cost)(&self.context, id)
    }

    // ---- construction -------------------------------------------------

    /// Parse infix text and box the result.
    pub fn parse(&mut self, text: &str) -> Result<ExprId, EngineError> {
        let options = ParseOptions {
            precision: self.options.precision,
            ..ParseOptions::default()
        };
        let raw = parse_with(text, &mut self.context, &options)?;
        self.try_canonical(raw)
    }

    /// A validated symbol.
    pub fn symbol(&mut self, name: &str) -> Result<ExprId, EngineError> {
        if !is_valid_identifier(name) {
            return Err(EngineError::InvalidIdentifier(name.to_string()));
        }
        let raw = self.context.var(name);
        self.try_canonical(raw)
    }

    pub fn number(&mut self, value: NumericValue) -> ExprId {
        self.context.num(value)
    }

    pub fn integer(&mut self, n: i64) -> ExprId {
        self.context.integer(n)
    }

    /// Display helper for logs and tests.
    pub fn show(&self, id: ExprId) -> String {
        self.context.display(id).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_and_forget() {
        let mut engine = Engine::new();
        let five = engine.integer(5);
        engine.assign("a", five).unwrap();
        let a = engine.symbol("a").unwrap();
        assert_eq!(engine.evaluate(a), five);
        engine.forget("a").unwrap();
        assert_eq!(engine.evaluate(a), a);
    }

    #[test]
    fn constants_are_read_only() {
        let mut engine = Engine::new();
        let one = engine.integer(1);
        assert!(matches!(
            engine.assign("Pi", one),
            Err(EngineError::ConstantSymbol(_))
        ));
        assert!(engine.forget("Pi").is_err());
        assert!(matches!(
            engine.symbol("2x"),
            Err(EngineError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn redefinition_invalidates_canonical_forms() {
        let mut engine = Engine::new();
        let x = engine.context.var("x");
        let gx = engine.context.call("g", vec![x]);
        let ggx = engine.context.call("g", vec![gx]);
        let boxed = engine.canonical(ggx);
        assert_eq!(engine.show(boxed), "g(g(x))");
        assert!(engine.context.is_canonical(boxed));

        engine.define_operator(OperatorDefinition::new("g").involution());
        assert!(!engine.context.is_canonical(boxed));
        assert_eq!(engine.canonical(ggx), x);
    }

    #[test]
    fn parse_boxes() {
        let mut engine = Engine::new();
        let e = engine.parse("3*y + 2*x*3").unwrap();
        assert_eq!(engine.show(e), "6*x + 3*y");
        assert!(engine.context.is_canonical(e));
    }
}
