//! Infix notation for canon expressions.
//!
//! The engine itself works on expression trees; this crate only exists so
//! that rules and tests can be written as `"a*x -> 2*x; x > 0"` instead of
//! being assembled node by node.

pub mod error;
pub mod parser;

pub use error::ParseError;
pub use parser::{parse, parse_rule, parse_with, ParseOptions, RuleSyntax};
