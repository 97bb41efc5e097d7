//! Error types for canon_ast crate.

use thiserror::Error;

/// Errors that can occur while building expressions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AstError {
    /// Symbol names must start with a letter or `_`
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    /// Dictionary keys must be unique
    #[error("duplicate dictionary key `{0}`")]
    DuplicateKey(String),
}
