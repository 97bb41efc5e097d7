//! Error types for canon_numeric.

use thiserror::Error;

/// Errors raised while reading numeric literals.
///
/// Arithmetic itself never fails; see [`crate::NumericValue`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    /// The text is not a decimal number, `NaN` or a signed infinity
    #[error("invalid numeric literal: {0}")]
    InvalidLiteral(String),

    /// A persisted rational carried a zero denominator
    #[error("rational literal with zero denominator")]
    ZeroDenominator,
}
