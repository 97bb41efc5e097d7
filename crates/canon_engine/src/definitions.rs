//! Operator and symbol definitions.
//!
//! A definition carries the static facts the boxing pipeline needs
//! (associativity, commutativity, hold policy, arity) plus optional hooks for
//! canonical form, evaluation and sign. Hooks are shared closures so that a
//! definition can be looked up and invoked while the engine is mutably
//! borrowed.

use crate::engine::Engine;
use crate::error::EngineError;
use crate::sign::Sign;
use canon_ast::{ExprId, Operator, SymbolId};
use canon_numeric::NumericValue;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Builds the canonical form from operands already boxed per the hold policy.
pub type CanonicalHook =
    Arc<dyn Fn(&mut Engine, &[ExprId]) -> Result<ExprId, EngineError> + Send + Sync>;

/// Evaluates from evaluated operands; `None` leaves the call unevaluated.
pub type EvaluateHook =
    Arc<dyn Fn(&mut Engine, &[ExprId], EvalMode) -> Option<ExprId> + Send + Sync>;

/// Sign of a call, when decidable.
pub type SgnHook = Arc<dyn Fn(&mut Engine, &[ExprId]) -> Option<Sign> + Send + Sync>;

/// Exact evaluation keeps radicals and rationals; numeric evaluation
/// approximates everything it can.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvalMode {
    #[default]
    Exact,
    Numeric,
}

/// Which operands are left un-boxed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HoldPolicy {
    #[default]
    None,
    All,
    First,
    Rest,
    Last,
    AllButLast,
}

impl HoldPolicy {
    pub fn holds(self, index: usize, len: usize) -> bool {
        match self {
            HoldPolicy::None => false,
            HoldPolicy::All => true,
            HoldPolicy::First => index == 0,
            HoldPolicy::Rest => index > 0,
            HoldPolicy::Last => index + 1 == len,
            HoldPolicy::AllButLast => index + 1 < len,
        }
    }
}

/// Accepted operand count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const ANY: Arity = Arity { min: 0, max: None };

    pub fn exactly(n: usize) -> Self {
        Arity {
            min: n,
            max: Some(n),
        }
    }

    pub fn at_least(n: usize) -> Self {
        Arity { min: n, max: None }
    }

    pub fn range(min: usize, max: usize) -> Self {
        Arity {
            min,
            max: Some(max),
        }
    }

    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min && self.max.map_or(true, |max| n <= max)
    }
}

impl Default for Arity {
    fn default() -> Self {
        Arity::ANY
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", max),
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "at least {}", self.min),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperatorFlags {
    /// `f(a, f(b, c)) = f(a, b, c)`
    pub associative: bool,
    /// Operand order is irrelevant; operands are sorted.
    pub commutative: bool,
    /// `f(f(x)) = f(x)`
    pub idempotent: bool,
    /// `f(f(x)) = x`
    pub involution: bool,
    /// No side effects; results may be cached.
    pub pure: bool,
    /// Operands are evaluated by the hook, not before it.
    pub lazy: bool,
}

#[derive(Clone, Default)]
pub struct OperatorDefinition {
    pub name: String,
    pub flags: OperatorFlags,
    pub hold: HoldPolicy,
    pub arity: Arity,
    pub canonical: Option<CanonicalHook>,
    pub evaluate: Option<EvaluateHook>,
    pub sgn: Option<SgnHook>,
}

impl OperatorDefinition {
    pub fn new(name: &str) -> Self {
        OperatorDefinition {
            name: name.to_string(),
            flags: OperatorFlags {
                pure: true,
                ..OperatorFlags::default()
            },
            ..OperatorDefinition::default()
        }
    }

    pub fn associative(mut self) -> Self {
        self.flags.associative = true;
        self
    }

    pub fn commutative(mut self) -> Self {
        self.flags.commutative = true;
        self
    }

    pub fn idempotent(mut self) -> Self {
        self.flags.idempotent = true;
        self
    }

    pub fn involution(mut self) -> Self {
        self.flags.involution = true;
        self
    }

    pub fn lazy(mut self) -> Self {
        self.flags.lazy = true;
        self
    }

    pub fn impure(mut self) -> Self {
        self.flags.pure = false;
        self
    }

    pub fn with_hold(mut self, hold: HoldPolicy) -> Self {
        self.hold = hold;
        self
    }

    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    pub fn with_canonical<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Engine, &[ExprId]) -> Result<ExprId, EngineError> + Send + Sync + 'static,
    {
        self.canonical = Some(Arc::new(hook));
        self
    }

    pub fn with_evaluate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Engine, &[ExprId], EvalMode) -> Option<ExprId> + Send + Sync + 'static,
    {
        self.evaluate = Some(Arc::new(hook));
        self
    }

    pub fn with_sgn<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Engine, &[ExprId]) -> Option<Sign> + Send + Sync + 'static,
    {
        self.sgn = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for OperatorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorDefinition")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("hold", &self.hold)
            .field("arity", &self.arity)
            .field("canonical", &self.canonical.is_some())
            .field("evaluate", &self.evaluate.is_some())
            .field("sgn", &self.sgn.is_some())
            .finish()
    }
}

/// When a symbol's value replaces the symbol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HoldUntil {
    /// Substituted as soon as the symbol is boxed.
    Never,
    /// Substituted by `evaluate` and `n`.
    #[default]
    Evaluate,
    /// Substituted only by `n`.
    N,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SymbolDefinition {
    pub value: Option<ExprId>,
    /// Approximation used by `n` when there is no symbolic value.
    pub numeric_value: Option<NumericValue>,
    pub hold_until: HoldUntil,
    /// Constants cannot be reassigned.
    pub constant: bool,
}

impl SymbolDefinition {
    pub fn constant(numeric_value: Option<NumericValue>) -> Self {
        SymbolDefinition {
            value: None,
            numeric_value,
            hold_until: HoldUntil::N,
            constant: true,
        }
    }

    pub fn variable(value: ExprId) -> Self {
        SymbolDefinition {
            value: Some(value),
            ..SymbolDefinition::default()
        }
    }
}

/// Definitions by operator head and by symbol.
#[derive(Clone, Debug, Default)]
pub struct DefinitionRegistry {
    operators: FxHashMap<Operator, Arc<OperatorDefinition>>,
    symbols: FxHashMap<SymbolId, Arc<SymbolDefinition>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup_operator(&self, op: Operator) -> Option<Arc<OperatorDefinition>> {
        self.operators.get(&op).cloned()
    }

    pub fn lookup_symbol(&self, symbol: SymbolId) -> Option<Arc<SymbolDefinition>> {
        self.symbols.get(&symbol).cloned()
    }

    pub fn insert_operator(&mut self, op: Operator, def: OperatorDefinition) {
        self.operators.insert(op, Arc::new(def));
    }

    pub fn insert_symbol(&mut self, symbol: SymbolId, def: SymbolDefinition) {
        self.symbols.insert(symbol, Arc::new(def));
    }

    pub fn remove_symbol(&mut self, symbol: SymbolId) -> Option<Arc<SymbolDefinition>> {
        self.symbols.remove(&symbol)
    }

    pub fn is_commutative(&self, op: Operator) -> bool {
        self.operators
            .get(&op)
            .map_or(false, |def| def.flags.commutative)
    }

    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_policies() {
        assert!(!HoldPolicy::None.holds(0, 2));
        assert!(HoldPolicy::All.holds(1, 2));
        assert!(HoldPolicy::First.holds(0, 3) && !HoldPolicy::First.holds(1, 3));
        assert!(HoldPolicy::Rest.holds(2, 3) && !HoldPolicy::Rest.holds(0, 3));
        assert!(HoldPolicy::Last.holds(2, 3) && !HoldPolicy::Last.holds(1, 3));
        assert!(HoldPolicy::AllButLast.holds(1, 3) && !HoldPolicy::AllButLast.holds(2, 3));
    }

    #[test]
    fn arity() {
        assert!(Arity::exactly(2).accepts(2));
        assert!(!Arity::exactly(2).accepts(3));
        assert!(Arity::at_least(1).accepts(7));
        assert!(!Arity::range(1, 2).accepts(0));
        assert_eq!(Arity::exactly(2).to_string(), "2");
        assert_eq!(Arity::range(1, 2).to_string(), "1..2");
    }

    #[test]
    fn builder_sets_flags() {
        let def = OperatorDefinition::new("f")
            .associative()
            .commutative()
            .with_arity(Arity::at_least(1));
        assert!(def.flags.associative && def.flags.commutative && def.flags.pure);
        assert!(!def.flags.idempotent);
        assert!(def.canonical.is_none());
        let mut registry = DefinitionRegistry::new();
        let op = Operator::Add;
        registry.insert_operator(op, def);
        assert!(registry.is_commutative(op));
        assert!(!registry.is_commutative(Operator::Power));
    }
}
