//! Exact values `rational * √radical`.
//!
//! The radical is square-free and at most [`SMALL_INTEGER`]; the rational is
//! reduced. Operations whose result leaves that set return `None` and the
//! caller widens to an approximate representation.

use crate::decimal::BigDecimal;
use crate::integer::{canonical_integer, checked_big_pow, digit_count, exact_root, SMALL_INTEGER};
use crate::rational::Rational;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;

/// Digit ceiling for exact integer powers before widening.
const MAX_EXACT_DIGITS: u32 = 10_000;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExactValue {
    rational: Rational,
    radical: u64,
}

impl ExactValue {
    /// `rational * √radical`, extracting square factors from the radical.
    /// `None` when the square-free part exceeds `SMALL_INTEGER`.
    pub fn new(rational: Rational, radical: u64) -> Option<Self> {
        if radical == 0 || rational.is_zero() {
            return Some(Self::zero());
        }
        let (factor, rest) = canonical_integer(radical, 2);
        if rest > SMALL_INTEGER {
            return None;
        }
        let rational = if factor == 1 {
            rational
        } else {
            &rational * &Rational::from_bigint(BigInt::from(factor))
        };
        Some(Self {
            rational,
            radical: rest,
        })
    }

    pub fn from_rational(rational: Rational) -> Self {
        Self {
            rational,
            radical: 1,
        }
    }

    pub fn from_integer(n: i64) -> Self {
        Self::from_rational(Rational::from_integer(n))
    }

    pub fn zero() -> Self {
        Self::from_rational(Rational::zero())
    }

    pub fn one() -> Self {
        Self::from_rational(Rational::one())
    }

    pub fn rational(&self) -> &Rational {
        &self.rational
    }

    pub fn radical(&self) -> u64 {
        self.radical
    }

    pub fn is_zero(&self) -> bool {
        self.rational.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.radical == 1 && self.rational.is_one()
    }

    pub fn is_negative_one(&self) -> bool {
        self.radical == 1 && self.rational.is_negative_one()
    }

    /// No radical part.
    pub fn is_rational(&self) -> bool {
        self.radical == 1
    }

    pub fn is_integer(&self) -> bool {
        self.radical == 1 && self.rational.is_integer()
    }

    pub fn signum(&self) -> i32 {
        self.rational.signum()
    }

    pub fn neg(&self) -> Self {
        Self {
            rational: -&self.rational,
            radical: self.radical,
        }
    }

    pub fn abs(&self) -> Self {
        Self {
            rational: self.rational.abs(),
            radical: self.radical,
        }
    }

    /// Sum, when both terms share a radical.
    pub fn add(&self, other: &Self) -> Option<Self> {
        if other.is_zero() {
            return Some(self.clone());
        }
        if self.is_zero() {
            return Some(other.clone());
        }
        if self.radical != other.radical {
            return None;
        }
        let rational = &self.rational + &other.rational;
        if rational.is_zero() {
            return Some(Self::zero());
        }
        Some(Self {
            rational,
            radical: self.radical,
        })
    }

    pub fn mul(&self, other: &Self) -> Option<Self> {
        if self.is_zero() || other.is_zero() {
            return Some(Self::zero());
        }
        let rational = &self.rational * &other.rational;
        let radical = self.radical.checked_mul(other.radical)?;
        Self::new(rational, radical)
    }

    /// `1 / (q√r) = √r / (q·r)`; `None` for zero.
    pub fn inv(&self) -> Option<Self> {
        let scaled = &self.rational * &Rational::from_bigint(BigInt::from(self.radical));
        Some(Self {
            rational: scaled.inv()?,
            radical: self.radical,
        })
    }

    pub fn div(&self, other: &Self) -> Option<Self> {
        self.mul(&other.inv()?)
    }

    /// Integer power; `None` for `0^-n` or results too large to keep exact.
    pub fn pow_int(&self, exp: i64) -> Option<Self> {
        if exp == 0 {
            return Some(Self::one());
        }
        if exp < 0 {
            return self.inv()?.pow_int(exp.checked_neg()?);
        }
        let e = u32::try_from(exp).ok()?;
        let numer = checked_big_pow(&self.rational.numer(), e, MAX_EXACT_DIGITS)?;
        let denom = checked_big_pow(&self.rational.denom(), e, MAX_EXACT_DIGITS)?;
        let mut rational = Rational::reduced(numer, denom)?;
        // (√r)^e = r^(e/2) · √r^(e mod 2)
        let half = checked_big_pow(&BigInt::from(self.radical), e / 2, MAX_EXACT_DIGITS)?;
        rational = &rational * &Rational::from_bigint(half);
        let radical = if e % 2 == 1 { self.radical } else { 1 };
        Some(Self { rational, radical })
    }

    /// Square root of a non-negative rational value.
    pub fn sqrt(&self) -> Option<Self> {
        if self.is_zero() {
            return Some(Self::zero());
        }
        if !self.is_rational() || self.rational.is_negative() {
            return None;
        }
        let numer = self.rational.numer();
        let denom = self.rational.denom();
        if let (Some(n), Some(d)) = (exact_root(&numer, 2), exact_root(&denom, 2)) {
            return Some(Self::from_rational(Rational::reduced(n, d)?));
        }
        // √(n/d) = √(n·d) / d
        let product = (&numer * &denom).to_u64()?;
        if product > SMALL_INTEGER * SMALL_INTEGER {
            return None;
        }
        let (factor, rest) = canonical_integer(product, 2);
        if rest > SMALL_INTEGER {
            return None;
        }
        let rational = Rational::reduced(BigInt::from(factor), denom)?;
        Some(Self {
            rational,
            radical: rest,
        })
    }

    /// Exact `n`-th root of a rational value (odd roots of negatives included).
    pub fn root(&self, n: u32) -> Option<Self> {
        match n {
            0 => None,
            1 => Some(self.clone()),
            2 => self.sqrt(),
            _ => {
                if !self.is_rational() {
                    return None;
                }
                let numer = exact_root(&self.rational.numer(), n)?;
                let denom = exact_root(&self.rational.denom(), n)?;
                Some(Self::from_rational(Rational::reduced(numer, denom)?))
            }
        }
    }

    pub fn to_f64(&self) -> f64 {
        let r = self.rational.to_f64();
        if self.radical == 1 {
            r
        } else {
            r * (self.radical as f64).sqrt()
        }
    }

    pub fn to_big_decimal(&self, precision: u32) -> BigDecimal {
        let r = BigDecimal::from_ratio(&self.rational.numer(), &self.rational.denom(), precision)
            .unwrap_or_else(|| BigDecimal::zero(precision));
        if self.radical == 1 {
            return r;
        }
        match BigDecimal::from_bigint(BigInt::from(self.radical), precision).sqrt() {
            Some(root) => r.mul(&root),
            None => r,
        }
    }

    /// Exact comparison through squares of magnitudes.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        let (sa, sb) = (self.signum(), other.signum());
        if sa != sb {
            return sa.cmp(&sb);
        }
        if self.radical == other.radical {
            return self.rational.cmp(&other.rational);
        }
        let square = |v: &Self| {
            let q = v.rational.abs();
            &(&q * &q) * &Rational::from_bigint(BigInt::from(v.radical))
        };
        let by_magnitude = square(self).cmp(&square(other));
        if sa < 0 {
            by_magnitude.reverse()
        } else {
            by_magnitude
        }
    }

    /// Decimal digits in the rational part; used to decide when to widen.
    pub fn digit_size(&self) -> u32 {
        digit_count(&self.rational.numer()) + digit_count(&self.rational.denom())
    }
}

impl Default for ExactValue {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Rational> for ExactValue {
    fn from(r: Rational) -> Self {
        Self::from_rational(r)
    }
}

impl fmt::Display for ExactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.radical == 1 {
            return write!(f, "{}", self.rational);
        }
        let numer = self.rational.numer();
        let denom = self.rational.denom();
        if numer == BigInt::from(-1) {
            write!(f, "-")?;
        } else if numer != BigInt::from(1) {
            write!(f, "{}", numer)?;
        }
        write!(f, "√{}", self.radical)?;
        if !denom.is_zero() && denom != BigInt::from(1) {
            write!(f, "/{}", denom)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64, d: i64) -> Rational {
        Rational::new(n, d).expect("valid")
    }

    fn radical(n: i64, d: i64, r: u64) -> ExactValue {
        ExactValue::new(q(n, d), r).expect("small radical")
    }

    #[test]
    fn radicals_are_square_free() {
        let v = radical(1, 1, 12);
        assert_eq!(v.rational(), &q(2, 1));
        assert_eq!(v.radical(), 3);
        assert!(radical(3, 1, 4).is_integer());
    }

    #[test]
    fn addition_requires_matching_radicals() {
        assert_eq!(radical(1, 1, 2).add(&radical(2, 1, 2)), Some(radical(3, 1, 2)));
        assert_eq!(radical(1, 1, 2).add(&radical(1, 1, 3)), None);
        assert_eq!(radical(1, 1, 2).add(&radical(-1, 1, 2)), Some(ExactValue::zero()));
    }

    #[test]
    fn multiplication_merges_radicals() {
        assert_eq!(radical(1, 1, 2).mul(&radical(1, 1, 2)), Some(ExactValue::from_integer(2)));
        assert_eq!(radical(1, 1, 2).mul(&radical(1, 1, 6)), Some(radical(2, 1, 3)));
    }

    #[test]
    fn division_rationalizes() {
        // 1/√2 = √2/2
        assert_eq!(ExactValue::one().div(&radical(1, 1, 2)), Some(radical(1, 2, 2)));
        // √12 / √3 = 2
        assert_eq!(
            radical(1, 1, 12).div(&radical(1, 1, 3)),
            Some(ExactValue::from_integer(2))
        );
        assert_eq!(ExactValue::one().div(&ExactValue::zero()), None);
    }

    #[test]
    fn integer_powers() {
        assert_eq!(radical(1, 1, 2).pow_int(2), Some(ExactValue::from_integer(2)));
        assert_eq!(radical(1, 1, 2).pow_int(3), Some(radical(2, 1, 2)));
        assert_eq!(radical(2, 3, 1).pow_int(-2), Some(radical(9, 4, 1)));
    }

    #[test]
    fn roots() {
        assert_eq!(ExactValue::from_integer(8).sqrt(), Some(radical(2, 1, 2)));
        assert_eq!(ExactValue::from_rational(q(1, 2)).sqrt(), Some(radical(1, 2, 2)));
        assert_eq!(ExactValue::from_rational(q(9, 4)).sqrt(), Some(radical(3, 2, 1)));
        assert_eq!(ExactValue::from_integer(-4).sqrt(), None);
        assert_eq!(ExactValue::from_integer(-27).root(3), Some(ExactValue::from_integer(-3)));
        assert_eq!(ExactValue::from_integer(10).root(3), None);
    }

    #[test]
    fn large_radicands_are_not_factored() {
        // A prime just below 2^64.
        let prime = BigInt::from(18_446_744_073_709_551_557u64);
        let prime = ExactValue::from_rational(Rational::from_bigint(prime));
        assert_eq!(prime.sqrt(), None);
        let over = ExactValue::from_rational(q(1, 1_000_001));
        assert_eq!(over.sqrt(), None);
        assert_eq!(ExactValue::from_integer(999_999_000_000).sqrt().map(|v| v.radical()), Some(111_111));
    }

    #[test]
    fn decimal_conversion() {
        assert_eq!(radical(1, 4, 1).to_big_decimal(30).to_string(), "0.25");
        assert!(radical(1, 1, 2).to_big_decimal(30).to_string().starts_with("1.414213562373095048801688"));
    }

    #[test]
    fn comparison_is_exact() {
        assert_eq!(radical(1, 1, 2).cmp_value(&radical(3, 2, 1)), Ordering::Less);
        assert_eq!(radical(-1, 1, 2).cmp_value(&radical(-3, 2, 1)), Ordering::Greater);
        assert_eq!(radical(2, 1, 1).cmp_value(&radical(1, 1, 3)), Ordering::Greater);
    }

    #[test]
    fn display() {
        assert_eq!(radical(1, 1, 2).to_string(), "√2");
        assert_eq!(radical(-1, 2, 2).to_string(), "-√2/2");
        assert_eq!(radical(3, 1, 5).to_string(), "3√5");
        assert_eq!(radical(7, 2, 1).to_string(), "7/2");
    }
}
