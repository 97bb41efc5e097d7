//! Rationals stored as machine pairs when they fit, big rationals otherwise.
//!
//! Every constructor reduces to lowest terms with a positive denominator, so
//! derived equality and hashing are value equality.

use crate::integer::{gcd_big, lcm_big};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// A reduced rational number.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Rational {
    /// Numerator and (positive) denominator that fit in `i64`
    Machine(i64, i64),
    /// Values whose reduced parts do not fit in `i64`
    Big(BigRational),
}

impl Rational {
    /// `n / d` in lowest terms; `None` for a zero denominator.
    pub fn new(n: i64, d: i64) -> Option<Self> {
        Self::from_i128(i128::from(n), i128::from(d))
    }

    pub fn from_integer(n: i64) -> Self {
        if n == i64::MIN {
            return Self::Big(BigRational::from_integer(BigInt::from(n)));
        }
        Self::Machine(n, 1)
    }

    pub fn from_bigint(n: BigInt) -> Self {
        Self::from_big_rational(BigRational::from_integer(n))
    }

    /// Reduce `n / d`; `None` for a zero denominator.
    pub fn reduced(n: BigInt, d: BigInt) -> Option<Self> {
        if d.is_zero() {
            return None;
        }
        Some(Self::from_big_rational(BigRational::new(n, d)))
    }

    /// Demote to the machine representation when both parts fit.
    pub fn from_big_rational(r: BigRational) -> Self {
        match (r.numer().to_i64(), r.denom().to_i64()) {
            (Some(n), Some(d)) if n != i64::MIN => Self::Machine(n, d),
            _ => Self::Big(r),
        }
    }

    fn from_i128(n: i128, d: i128) -> Option<Self> {
        if d == 0 {
            return None;
        }
        let g = n.gcd(&d);
        let (mut n, mut d) = (n / g, d / g);
        if d < 0 {
            n = -n;
            d = -d;
        }
        match (i64::try_from(n), i64::try_from(d)) {
            (Ok(n), Ok(d)) if n != i64::MIN => Some(Self::Machine(n, d)),
            _ => Some(Self::Big(BigRational::new(BigInt::from(n), BigInt::from(d)))),
        }
    }

    pub fn zero() -> Self {
        Self::Machine(0, 1)
    }

    pub fn one() -> Self {
        Self::Machine(1, 1)
    }

    pub fn negative_one() -> Self {
        Self::Machine(-1, 1)
    }

    pub fn half() -> Self {
        Self::Machine(1, 2)
    }

    pub fn numer(&self) -> BigInt {
        match self {
            Self::Machine(n, _) => BigInt::from(*n),
            Self::Big(r) => r.numer().clone(),
        }
    }

    pub fn denom(&self) -> BigInt {
        match self {
            Self::Machine(_, d) => BigInt::from(*d),
            Self::Big(r) => r.denom().clone(),
        }
    }

    pub fn to_big(&self) -> BigRational {
        match self {
            Self::Machine(n, d) => BigRational::new_raw(BigInt::from(*n), BigInt::from(*d)),
            Self::Big(r) => r.clone(),
        }
    }

    /// Machine parts `(numerator, denominator)` when available.
    pub fn as_machine(&self) -> Option<(i64, i64)> {
        match self {
            Self::Machine(n, d) => Some((*n, *d)),
            Self::Big(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<BigInt> {
        if self.is_integer() {
            Some(self.numer())
        } else {
            None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Machine(n, 1) => Some(*n),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Machine(0, _))
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Self::Machine(1, 1))
    }

    pub fn is_negative_one(&self) -> bool {
        matches!(self, Self::Machine(-1, 1))
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Self::Machine(_, d) => *d == 1,
            Self::Big(r) => r.is_integer(),
        }
    }

    pub fn is_negative(&self) -> bool {
        self.signum() < 0
    }

    pub fn is_positive(&self) -> bool {
        self.signum() > 0
    }

    pub fn signum(&self) -> i32 {
        match self {
            Self::Machine(n, _) => n.signum() as i32,
            Self::Big(r) => {
                if r.is_negative() {
                    -1
                } else if r.is_zero() {
                    0
                } else {
                    1
                }
            }
        }
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() {
            -self
        } else {
            self.clone()
        }
    }

    /// Multiplicative inverse; `None` for zero.
    pub fn inv(&self) -> Option<Self> {
        match self {
            Self::Machine(n, d) => Self::from_i128(i128::from(*d), i128::from(*n)),
            Self::Big(r) => {
                if r.is_zero() {
                    None
                } else {
                    Some(Self::from_big_rational(r.recip()))
                }
            }
        }
    }

    /// Division; `None` when `other` is zero.
    pub fn checked_div(&self, other: &Self) -> Option<Self> {
        other.inv().map(|inv| self * &inv)
    }

    /// Integer power; `None` for `0^-n`.
    pub fn pow(&self, exp: i32) -> Option<Self> {
        if exp == 0 {
            return Some(Self::one());
        }
        let magnitude = exp.unsigned_abs();
        let n = self.numer().pow(magnitude);
        let d = self.denom().pow(magnitude);
        if exp > 0 {
            Self::reduced(n, d)
        } else {
            Self::reduced(d, n)
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Self::Machine(n, d) => *n as f64 / *d as f64,
            Self::Big(r) => r.to_f64().unwrap_or(f64::NAN),
        }
    }

    /// `gcd(a/b, c/d) = gcd(a, c) / lcm(b, d)`.
    pub fn gcd(&self, other: &Self) -> Self {
        let n = gcd_big(&self.numer(), &other.numer());
        let d = lcm_big(&self.denom(), &other.denom());
        Self::reduced(n, d).unwrap_or_else(Self::zero)
    }

    /// `lcm(a/b, c/d) = lcm(a, c) / gcd(b, d)`.
    pub fn lcm(&self, other: &Self) -> Self {
        let n = lcm_big(&self.numer(), &other.numer());
        let d = gcd_big(&self.denom(), &other.denom());
        Self::reduced(n, d).unwrap_or_else(Self::zero)
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Self::from_integer(n)
    }
}

impl From<BigInt> for Rational {
    fn from(n: BigInt) -> Self {
        Self::from_bigint(n)
    }
}

impl<'a> Add<&'a Rational> for &'a Rational {
    type Output = Rational;

    fn add(self, other: &'a Rational) -> Rational {
        match (self, other) {
            (Rational::Machine(a, b), Rational::Machine(c, d)) => {
                let (a, b, c, d) = (i128::from(*a), i128::from(*b), i128::from(*c), i128::from(*d));
                // Both denominators are positive, so the product is never zero.
                Rational::from_i128(a * d + c * b, b * d).unwrap_or_else(Rational::zero)
            }
            _ => Rational::from_big_rational(self.to_big() + other.to_big()),
        }
    }
}

impl<'a> Sub<&'a Rational> for &'a Rational {
    type Output = Rational;

    fn sub(self, other: &'a Rational) -> Rational {
        self + &(-other)
    }
}

impl<'a> Mul<&'a Rational> for &'a Rational {
    type Output = Rational;

    fn mul(self, other: &'a Rational) -> Rational {
        match (self, other) {
            (Rational::Machine(a, b), Rational::Machine(c, d)) => Rational::from_i128(
                i128::from(*a) * i128::from(*c),
                i128::from(*b) * i128::from(*d),
            )
            .unwrap_or_else(Rational::zero),
            _ => Rational::from_big_rational(self.to_big() * other.to_big()),
        }
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        match self {
            Rational::Machine(n, d) => Rational::Machine(-n, *d),
            Rational::Big(r) => Rational::from_big_rational(-r.clone()),
        }
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        -&self
    }
}

macro_rules! forward_owned_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<Rational> for Rational {
            type Output = Rational;

            fn $method(self, other: Rational) -> Rational {
                (&self).$method(&other)
            }
        }
    };
}

forward_owned_binop!(Add, add);
forward_owned_binop!(Sub, sub);
forward_owned_binop!(Mul, mul);

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Rational::Machine(a, b), Rational::Machine(c, d)) => {
                (i128::from(*a) * i128::from(*d)).cmp(&(i128::from(*c) * i128::from(*b)))
            }
            _ => self.to_big().cmp(&other.to_big()),
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rational::Machine(n, 1) => write!(f, "{}", n),
            Rational::Machine(n, d) => write!(f, "{}/{}", n, d),
            Rational::Big(r) if r.denom().is_one() => write!(f, "{}", r.numer()),
            Rational::Big(r) => write!(f, "{}/{}", r.numer(), r.denom()),
        }
    }
}
