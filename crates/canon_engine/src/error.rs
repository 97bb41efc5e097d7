use canon_ast::AstError;
use canon_parser::ParseError;
use thiserror::Error;

/// Construction-time failures.
///
/// Arithmetic never fails (NaN and complex infinity propagate instead), and
/// in non-strict mode malformed input degrades to `Error(...)` nodes rather
/// than producing one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),
    #[error("'{operator}' expects {expected} argument(s), got {got}")]
    Arity {
        operator: String,
        expected: String,
        got: usize,
    },
    #[error("Symbol '{0}' is a constant and cannot be redefined")]
    ConstantSymbol(String),
    #[error("Rule syntax: {0}")]
    RuleSyntax(#[from] ParseError),
    #[error("Hook for '{operator}' failed: {message}")]
    Hook { operator: String, message: String },
    #[error(transparent)]
    Ast(#[from] AstError),
}

impl EngineError {
    /// Code stored in the `Error` node that replaces a failed construction.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidIdentifier(_) => "invalid-identifier",
            EngineError::UnknownOperator(_) => "unknown-operator",
            EngineError::Arity { .. } => "incompatible-arity",
            EngineError::ConstantSymbol(_) => "constant-symbol",
            EngineError::RuleSyntax(_) => "syntax-error",
            EngineError::Hook { .. } => "hook-failure",
            EngineError::Ast(_) => "invalid-expression",
        }
    }
}
