//! Canonicalization, evaluation and rule-based rewriting of expressions.
//!
//! An [`Engine`] owns the expression [`Context`](canon_ast::Context) and the
//! definitions that give operators and symbols their meaning. Expressions
//! are boxed into canonical form on construction:
//!
//! ```
//! use canon_engine::Engine;
//!
//! let mut engine = Engine::new();
//! let e = engine.parse("Multiply(2, x, 3, y)").unwrap();
//! assert_eq!(engine.show(e), "6*x*y");
//! ```

pub mod arithmetic;
mod binding;
mod boxing;
pub mod cost;
pub mod definitions;
mod engine;
pub mod error;
mod evaluate;
mod library;
pub mod options;
pub mod pattern;
pub mod rule;
mod rules;
pub mod sign;
mod simplify;

pub use binding::{BindingCache, BindingStats};
pub use cost::{default_cost, CostFunction};
pub use definitions::{
    Arity, CanonicalHook, DefinitionRegistry, EvalMode, EvaluateHook, HoldPolicy, HoldUntil,
    OperatorDefinition, OperatorFlags, SgnHook, SymbolDefinition,
};
pub use engine::Engine;
pub use error::EngineError;
pub use options::{
    EngineOptions, MatchOptions, ReplaceOptions, SimplifyOptions, DEFAULT_COST_EXEMPT_RULES,
};
pub use pattern::{Capture, Substitution};
pub use rule::{Condition, ConditionFn, ReplaceFn, Replacement, Rule};
pub use sign::Sign;
