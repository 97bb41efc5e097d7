//! Arbitrary-precision reals backed by `astro_float::BigFloat`.
//!
//! A [`BigDecimal`] carries its precision in significant decimal digits.
//! Arithmetic runs at the matching binary precision (see [`nominal_bits`]);
//! rendering converts back to decimal and rounds to that many digits.

use crate::error::NumericError;
use astro_float::{BigFloat, RoundingMode, Word};
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

const ROUNDING: RoundingMode = RoundingMode::ToEven;

/// Largest decimal exponent a literal may carry.
pub const MAX_EXPONENT: i64 = 100_000;

/// Binary precision for `precision` decimal digits: whole 64-bit words plus
/// one guard word, never below two words.
pub fn nominal_bits(precision: u32) -> usize {
    let base = (f64::from(precision) * std::f64::consts::LOG2_10).ceil() as usize;
    (((base + 63) & !63) + 64).max(128)
}

#[derive(Clone, Debug)]
pub struct BigDecimal {
    value: BigFloat,
    precision: u32,
}

impl BigDecimal {
    fn from_float(value: BigFloat, precision: u32) -> Self {
        Self {
            value,
            precision: precision.max(1),
        }
    }

    pub fn zero(precision: u32) -> Self {
        Self::from_float(BigFloat::from_i32(0, nominal_bits(precision)), precision)
    }

    pub fn one(precision: u32) -> Self {
        Self::from_float(BigFloat::from_i32(1, nominal_bits(precision)), precision)
    }

    pub fn from_bigint(n: BigInt, precision: u32) -> Self {
        Self::from_float(bigint_to_float(&n, nominal_bits(precision)), precision)
    }

    /// Shortest decimal rendering of a finite double; `None` for NaN/±∞.
    pub fn from_f64(x: f64, precision: u32) -> Option<Self> {
        if !x.is_finite() {
            return None;
        }
        Self::parse(&format!("{:e}", x), precision).ok()
    }

    pub fn from_ratio(numer: &BigInt, denom: &BigInt, precision: u32) -> Option<Self> {
        Self::from_bigint(numer.clone(), precision)
            .div(&Self::from_bigint(denom.clone(), precision))
    }

    /// Parse `[+-]digits[.digits][e[+-]digits]`.
    ///
    /// Exponents beyond [`MAX_EXPONENT`] are rejected.
    pub fn parse(text: &str, precision: u32) -> Result<Self, NumericError> {
        let invalid = || NumericError::InvalidLiteral(text.to_string());
        let s = text.trim();
        let (negative, s) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (body, exp_part) = match s.find(|c| c == 'e' || c == 'E') {
            Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
            None => (s, None),
        };
        let (int_part, frac_part) = match body.find('.') {
            Some(pos) => (&body[..pos], &body[pos + 1..]),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let written: i64 = match exp_part {
            Some(e) => e.parse().map_err(|_| invalid())?,
            None => 0,
        };
        if written.abs() > MAX_EXPONENT {
            return Err(invalid());
        }
        let frac_len = i64::try_from(frac_part.len()).map_err(|_| invalid())?;
        let exponent = written - frac_len;

        let digits = format!("{}{}", int_part, frac_part);
        let mantissa: BigInt = digits.parse().map_err(|_| invalid())?;
        let bits = nominal_bits(precision);
        let mut value = bigint_to_float(&mantissa, bits);
        if exponent != 0 {
            let scale = usize::try_from(exponent.unsigned_abs()).map_err(|_| invalid())?;
            let power = BigFloat::from_i32(10, bits).powi(scale, bits, ROUNDING);
            value = if exponent > 0 {
                value.mul(&power, bits, ROUNDING)
            } else {
                value.div(&power, bits, ROUNDING)
            };
        }
        if value.is_inf() || value.is_nan() {
            return Err(invalid());
        }
        if negative {
            value = value.neg();
        }
        Ok(Self::from_float(value, precision))
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    fn bits(&self, other: &Self) -> (u32, usize) {
        let precision = self.precision.max(other.precision);
        (precision, nominal_bits(precision))
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.value.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.value.is_positive()
    }

    pub fn signum(&self) -> i32 {
        if self.is_negative() {
            -1
        } else if self.is_zero() {
            0
        } else {
            1
        }
    }

    pub fn is_one(&self) -> bool {
        *self == Self::one(self.precision)
    }

    pub fn is_negative_one(&self) -> bool {
        self.neg().is_one()
    }

    /// Significant digits of the rendered value.
    pub fn significant_digits(&self) -> u32 {
        let (_, digits, _) = self.to_decimal();
        u32::try_from(digits.len()).unwrap_or(u32::MAX)
    }

    pub fn add(&self, other: &Self) -> Self {
        let (precision, bits) = self.bits(other);
        Self::from_float(self.value.add(&other.value, bits, ROUNDING), precision)
    }

    pub fn sub(&self, other: &Self) -> Self {
        let (precision, bits) = self.bits(other);
        Self::from_float(self.value.sub(&other.value, bits, ROUNDING), precision)
    }

    pub fn mul(&self, other: &Self) -> Self {
        let (precision, bits) = self.bits(other);
        Self::from_float(self.value.mul(&other.value, bits, ROUNDING), precision)
    }

    /// `None` when dividing by zero.
    pub fn div(&self, other: &Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        let (precision, bits) = self.bits(other);
        Some(Self::from_float(
            self.value.div(&other.value, bits, ROUNDING),
            precision,
        ))
    }

    pub fn neg(&self) -> Self {
        Self::from_float(self.value.neg(), self.precision)
    }

    pub fn abs(&self) -> Self {
        Self::from_float(self.value.abs(), self.precision)
    }

    pub fn inv(&self) -> Option<Self> {
        Self::one(self.precision).div(self)
    }

    /// `None` for negative values.
    pub fn sqrt(&self) -> Option<Self> {
        if self.is_negative() {
            return None;
        }
        let bits = nominal_bits(self.precision);
        Some(Self::from_float(self.value.sqrt(bits, ROUNDING), self.precision))
    }

    /// `None` for a negative power of zero or a result out of range.
    pub fn powi(&self, exp: i64) -> Option<Self> {
        if exp == 0 {
            return Some(Self::one(self.precision));
        }
        let bits = nominal_bits(self.precision);
        let n = usize::try_from(exp.unsigned_abs()).ok()?;
        let power = self.value.powi(n, bits, ROUNDING);
        if power.is_inf() || power.is_nan() {
            return None;
        }
        let power = Self::from_float(power, self.precision);
        if exp < 0 {
            power.inv()
        } else {
            Some(power)
        }
    }

    pub fn to_f64(&self) -> f64 {
        let (negative, digits, exponent) = self.to_decimal();
        let sign = if negative { "-" } else { "" };
        format!("{}{}e{}", sign, digits, exponent)
            .parse()
            .unwrap_or(f64::NAN)
    }

    /// `(negative, digits, exponent)` with the value equal to
    /// `±digits × 10^exponent`, rounded to `precision` significant digits and
    /// without trailing zeros. Zero is `(false, "0", 0)`.
    fn to_decimal(&self) -> (bool, String, i64) {
        let zero = (false, "0".to_string(), 0);
        let Some((words, _, sign, exponent, _)) = self.value.as_raw_parts() else {
            return zero;
        };
        let mantissa = mantissa_of(words);
        if mantissa.is_zero() {
            return zero;
        }
        // value = mantissa × 2^shift
        let shift = exponent as i64 - word_bits(words);
        let precision = i64::from(self.precision);
        let (scaled, mut exp10) = if shift >= 0 {
            (mantissa << shift as usize, 0)
        } else {
            let magnitude = ((mantissa.bits() as i64 + shift) as f64
                * std::f64::consts::LOG10_2)
                .floor() as i64;
            let k = (precision + 2 - magnitude).max(0);
            let divisor = BigUint::one() << (-shift) as usize;
            let numer = mantissa * BigUint::from(10u32).pow(k as u32);
            ((numer + (&divisor >> 1usize)) / divisor, -k)
        };

        let mut digits = scaled.to_string();
        let len = digits.len() as i64;
        if len > precision {
            let drop = (len - precision) as u32;
            let divisor = BigUint::from(10u32).pow(drop);
            let (q, r) = scaled.div_rem(&divisor);
            let q = if r * 2u32 >= divisor { q + 1u32 } else { q };
            digits = q.to_string();
            exp10 += i64::from(drop);
        }
        let trimmed = digits.trim_end_matches('0').len();
        exp10 += (digits.len() - trimmed) as i64;
        digits.truncate(trimmed);
        if digits.is_empty() {
            return zero;
        }
        (sign.is_negative(), digits, exp10)
    }
}

fn word_bits(words: &[Word]) -> i64 {
    (words.len() * Word::BITS as usize) as i64
}

fn mantissa_of(words: &[Word]) -> BigUint {
    BigUint::from_bytes_le(
        &words
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect::<Vec<u8>>(),
    )
}

fn bigint_to_float(n: &BigInt, bits: usize) -> BigFloat {
    let (sign, limbs) = n.to_u64_digits();
    let base = BigFloat::from_i128(1i128 << 64, bits);
    let mut value = BigFloat::from_i32(0, bits);
    for limb in limbs.iter().rev() {
        value = value
            .mul(&base, bits, ROUNDING)
            .add(&BigFloat::from_i128(i128::from(*limb), bits), bits, ROUNDING);
    }
    if sign == Sign::Minus {
        value.neg()
    } else {
        value
    }
}

impl PartialEq for BigDecimal {
    fn eq(&self, other: &Self) -> bool {
        self.value.partial_cmp(&other.value) == Some(Ordering::Equal)
    }
}

impl Eq for BigDecimal {}

impl Hash for BigDecimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the binary value with trailing zero bits shifted out, so
        // equal values at different precisions agree.
        match self.value.as_raw_parts() {
            Some((words, _, sign, exponent, _)) => {
                let mantissa = mantissa_of(words);
                if mantissa.is_zero() {
                    0u8.hash(state);
                    return;
                }
                let trailing = mantissa.trailing_zeros().unwrap_or(0);
                (&mantissa >> trailing).hash(state);
                (exponent as i64 - word_bits(words) + trailing as i64).hash(state);
                sign.is_negative().hash(state);
            }
            None => 1u8.hash(state),
        }
    }
}

impl PartialOrd for BigDecimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigDecimal {
    fn cmp(&self, other: &Self) -> Ordering {
        // Values are always finite, so the binary comparison is total.
        self.value
            .partial_cmp(&other.value)
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (negative, digits, exponent) = self.to_decimal();
        let sign = if negative { "-" } else { "" };
        let len = digits.len() as i64;
        let point = len + exponent;
        if exponent >= 0 && point <= 40 {
            return write!(f, "{}{}{}", sign, digits, "0".repeat(exponent as usize));
        }
        if exponent < 0 && point > 0 {
            let (int, frac) = digits.split_at(point as usize);
            return write!(f, "{}{}.{}", sign, int, frac);
        }
        if exponent < 0 && point > -20 {
            return write!(f, "{}0.{}{}", sign, "0".repeat((-point) as usize), digits);
        }
        let (lead, rest) = digits.split_at(1);
        let adjusted = point - 1;
        if rest.is_empty() {
            write!(f, "{}{}e{:+}", sign, lead, adjusted)
        } else {
            write!(f, "{}{}.{}e{:+}", sign, lead, rest, adjusted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::parse(s, 30).expect("valid literal")
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(dec("1.2500").to_string(), "1.25");
        assert_eq!(dec("-0.001").to_string(), "-0.001");
        assert_eq!(dec("12e3").to_string(), "12000");
        assert_eq!(dec("0").to_string(), "0");
        assert_eq!(dec("1e-30").to_string(), "1e-30");
        assert!(BigDecimal::parse("1.2.3", 30).is_err());
        assert!(BigDecimal::parse("", 30).is_err());
        assert!(BigDecimal::parse("abc", 30).is_err());
    }

    #[test]
    fn oversized_exponents_are_rejected() {
        assert!(matches!(
            BigDecimal::parse("1e999999999", 30),
            Err(NumericError::InvalidLiteral(_))
        ));
        assert!(BigDecimal::parse("1e-999999999", 30).is_err());
        assert!(BigDecimal::parse("1e99999999999999999999", 30).is_err());
        assert_eq!(dec("1e100").to_string(), "1e+100");
    }

    #[test]
    fn equality_ignores_trailing_zeros() {
        assert_eq!(dec("1.50"), dec("1.5"));
        assert_eq!(dec("100"), dec("1e2"));
    }

    #[test]
    fn arithmetic() {
        assert_eq!(dec("0.1").add(&dec("0.2")).to_string(), "0.3");
        assert_eq!(dec("1.5").mul(&dec("-2")), dec("-3"));
        assert!(dec("1").sub(&dec("1")).is_zero());
        assert_eq!(dec("1").div(&dec("4")), Some(dec("0.25")));
        assert!(dec("1").div(&dec("0")).is_none());
    }

    #[test]
    fn division_rounds_to_precision() {
        let third = dec("1").div(&dec("3")).expect("nonzero");
        assert_eq!(third.significant_digits(), 30);
        assert_eq!(third.to_string(), format!("0.{}", "3".repeat(30)));
        let two_thirds = dec("2").div(&dec("3")).expect("nonzero");
        assert!(two_thirds.to_string().ends_with('7'));
    }

    #[test]
    fn square_roots() {
        assert_eq!(dec("16").sqrt(), Some(dec("4")));
        assert_eq!(dec("0.25").sqrt(), Some(dec("0.5")));
        let root2 = dec("2").sqrt().expect("positive");
        assert!(root2.to_string().starts_with("1.41421356237309504880168872"));
        assert!(dec("-2").sqrt().is_none());
    }

    #[test]
    fn integer_powers() {
        assert_eq!(dec("2").powi(10), Some(dec("1024")));
        assert_eq!(dec("2").powi(-2), Some(dec("0.25")));
        assert!(dec("0").powi(-1).is_none());
    }

    #[test]
    fn ordering() {
        assert!(dec("1.5") < dec("2"));
        assert!(dec("-3") < dec("-2.5"));
        assert!(dec("1e10") > dec("999999999"));
        assert_eq!(dec("2.0").cmp(&dec("2")), Ordering::Equal);
    }

    #[test]
    fn conversions() {
        assert_eq!(dec("0.125").to_f64(), 0.125);
        assert_eq!(BigDecimal::from_f64(0.1, 30), Some(dec("0.1")));
        assert!(BigDecimal::from_f64(f64::NAN, 30).is_none());
        let big = BigInt::from(10).pow(30) + 1;
        assert_eq!(
            BigDecimal::from_bigint(big, 50).to_string(),
            "1000000000000000000000000000001"
        );
    }

    #[test]
    fn distant_magnitudes_keep_the_larger() {
        let big = dec("1e100");
        let tiny = dec("1e-100");
        assert_eq!(big.add(&tiny).to_string(), "1e+100");
    }

    #[test]
    fn nominal_bits_are_word_aligned() {
        assert_eq!(nominal_bits(1), 128);
        assert_eq!(nominal_bits(30), 192);
        assert_eq!(nominal_bits(300) % 64, 0);
    }
}
