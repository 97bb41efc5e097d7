//! Expression representation for the canon engine.
//!
//! Expressions are immutable nodes in a hash-consed arena ([`Context`]) and
//! are referenced by [`ExprId`]. Structural equality is id equality.

pub mod context;
pub mod display;
pub mod error;
pub mod expr;
pub mod operator;
pub mod ordering;
pub mod symbol;
pub mod traversal;

pub use context::{Context, ContextStats, WellKnown};
pub use display::DisplayExpr;
pub use error::AstError;
pub use expr::{Expr, ExprId};
pub use operator::{Operator, OperatorClass};
pub use ordering::{compare_expr, polynomial_order, sort_operands, sort_terms, total_degree};
pub use symbol::{
    is_valid_identifier, wildcard_kind, wildcard_name, SymbolId, SymbolTable, WildcardKind,
};
