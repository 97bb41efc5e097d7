//! Persisted form of number literals and digit-string parsing.
//!
//! A literal is stored as a JSON number, a `[numerator, denominator]` pair, or
//! a digit string for values a double cannot hold.

use crate::decimal::BigDecimal;
use crate::error::NumericError;
use crate::rational::Rational;
use crate::value::NumericValue;
use crate::MACHINE_PRECISION;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SerializedNumber {
    Machine(f64),
    Rational(i64, i64),
    BigRational(String, String),
    Digits(String),
}

impl NumericValue {
    /// Parse a digit string.
    ///
    /// Integers become exact. Decimals with at most 15 significant digits
    /// become machine numbers; longer ones keep `precision` digits.
    pub fn parse(text: &str, precision: u32) -> Result<Self, NumericError> {
        let s = text.trim();
        match s {
            "NaN" => return Ok(Self::nan()),
            "Infinity" | "+Infinity" => return Ok(Self::positive_infinity()),
            "-Infinity" => return Ok(Self::negative_infinity()),
            "ComplexInfinity" => return Ok(Self::complex_infinity()),
            _ => {}
        }
        let unsigned = s.strip_prefix(|c| c == '+' || c == '-').unwrap_or(s);
        if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
            let n: BigInt = s
                .trim_start_matches('+')
                .parse()
                .map_err(|_| NumericError::InvalidLiteral(text.to_string()))?;
            return Ok(Self::from_bigint(n));
        }
        if let Some((n, d)) = s.split_once('/') {
            let n: BigInt = n
                .trim()
                .parse()
                .map_err(|_| NumericError::InvalidLiteral(text.to_string()))?;
            let d: BigInt = d
                .trim()
                .parse()
                .map_err(|_| NumericError::InvalidLiteral(text.to_string()))?;
            return Rational::reduced(n, d)
                .map(Self::from_rational)
                .ok_or(NumericError::ZeroDenominator);
        }
        let decimal = BigDecimal::parse(s, precision)?;
        if decimal.significant_digits() <= MACHINE_PRECISION {
            return Ok(Self::machine(decimal.to_f64()));
        }
        Ok(Self::big(decimal))
    }

    pub fn from_serialized(
        literal: &SerializedNumber,
        precision: u32,
    ) -> Result<Self, NumericError> {
        match literal {
            SerializedNumber::Machine(x) => Ok(Self::machine(*x)),
            SerializedNumber::Rational(n, d) => Rational::new(*n, *d)
                .map(Self::from_rational)
                .ok_or(NumericError::ZeroDenominator),
            SerializedNumber::BigRational(n, d) => {
                let parse = |s: &str| {
                    s.parse::<BigInt>()
                        .map_err(|_| NumericError::InvalidLiteral(s.to_string()))
                };
                Rational::reduced(parse(n)?, parse(d)?)
                    .map(Self::from_rational)
                    .ok_or(NumericError::ZeroDenominator)
            }
            SerializedNumber::Digits(s) => Self::parse(s, precision),
        }
    }

    /// Persisted form; `None` for radicals and complex values.
    pub fn to_serialized(&self) -> Option<SerializedNumber> {
        if self.is_nan() {
            return Some(SerializedNumber::Digits("NaN".into()));
        }
        if self.is_positive_infinity() {
            return Some(SerializedNumber::Digits("+Infinity".into()));
        }
        if self.is_negative_infinity() {
            return Some(SerializedNumber::Digits("-Infinity".into()));
        }
        if !self.is_real() {
            return None;
        }
        match self {
            NumericValue::Exact(e) if e.is_rational() => {
                let r = e.rational();
                Some(match r.as_machine() {
                    Some((n, d)) => SerializedNumber::Rational(n, d),
                    None if r.is_integer() => SerializedNumber::Digits(r.numer().to_string()),
                    None => SerializedNumber::BigRational(r.numer().to_string(), r.denom().to_string()),
                })
            }
            NumericValue::Exact(_) | NumericValue::ExactComplex { .. } => None,
            NumericValue::Machine(c) => Some(SerializedNumber::Machine(c.re)),
            NumericValue::Big { re, .. } => Some(SerializedNumber::Digits(re.to_string())),
        }
    }
}
