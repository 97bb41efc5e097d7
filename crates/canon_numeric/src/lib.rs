//! Numeric values for the canon expression engine.
//!
//! The central type is [`NumericValue`], a closed union over exact values
//! (rational × square root of a small integer), machine complex numbers and
//! arbitrary-precision decimals. Arithmetic picks the most exact
//! representation able to hold the result and never fails: indeterminate
//! results are reported through the NaN and complex-infinity sentinels.

pub mod decimal;
pub mod error;
pub mod exact;
pub mod integer;
pub mod literal;
pub mod rational;
pub mod value;

pub use decimal::BigDecimal;
pub use error::NumericError;
pub use exact::ExactValue;
pub use literal::SerializedNumber;
pub use rational::Rational;
pub use value::NumericValue;

/// Default working precision, in significant decimal digits.
pub const DEFAULT_PRECISION: u32 = 300;

/// Significant decimal digits a machine double carries reliably.
pub const MACHINE_PRECISION: u32 = 15;
