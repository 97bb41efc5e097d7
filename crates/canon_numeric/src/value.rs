//! `NumericValue`: the closed set of number representations.
//!
//! Results always use the most exact representation that holds them:
//! exact values (real, or complex with exact parts) stay exact until an
//! operation cannot keep them so, at which point they widen to machine complex
//! numbers. Arbitrary-precision values only come from long digit literals;
//! once one is involved, real results stay arbitrary-precision.
//!
//! NaN and the infinities are machine values with fixed bit patterns:
//! `(NaN, 0)`, `(±∞, 0)` and complex infinity `(+∞, +∞)`. Constructors
//! normalize to these, so bitwise equality is value identity.

use crate::decimal::BigDecimal;
use crate::exact::ExactValue;
use crate::integer::MAX_SAFE_INTEGER;
use crate::rational::Rational;
use crate::DEFAULT_PRECISION;
use num_bigint::BigInt;
use num_complex::Complex64;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Clone, Debug)]
pub enum NumericValue {
    /// `rational * √radical`
    Exact(ExactValue),
    /// `re + im·i` with exact parts; `im` is never zero
    ExactComplex { re: ExactValue, im: ExactValue },
    /// Machine complex number (real values have a zero imaginary part)
    Machine(Complex64),
    /// Arbitrary-precision real part with a machine imaginary part
    Big { re: BigDecimal, im: f64 },
}

use NumericValue::{Big, Exact, ExactComplex, Machine};

/// Real and imaginary parts of an exact value.
type Parts = (ExactValue, ExactValue);

impl NumericValue {
    // ---- construction ---------------------------------------------------

    pub fn zero() -> Self {
        Exact(ExactValue::zero())
    }

    pub fn one() -> Self {
        Exact(ExactValue::one())
    }

    pub fn negative_one() -> Self {
        Self::from_integer(-1)
    }

    pub fn two() -> Self {
        Self::from_integer(2)
    }

    pub fn half() -> Self {
        Self::from_rational(Rational::half())
    }

    pub fn nan() -> Self {
        Machine(Complex64::new(f64::NAN, 0.0))
    }

    pub fn positive_infinity() -> Self {
        Machine(Complex64::new(f64::INFINITY, 0.0))
    }

    pub fn negative_infinity() -> Self {
        Machine(Complex64::new(f64::NEG_INFINITY, 0.0))
    }

    pub fn complex_infinity() -> Self {
        Machine(Complex64::new(f64::INFINITY, f64::INFINITY))
    }

    pub fn from_integer(n: i64) -> Self {
        Exact(ExactValue::from_integer(n))
    }

    pub fn from_bigint(n: BigInt) -> Self {
        Self::from_rational(Rational::from_bigint(n))
    }

    pub fn from_rational(r: Rational) -> Self {
        Exact(ExactValue::from_rational(r))
    }

    /// `n / d`; a zero denominator gives NaN or complex infinity.
    pub fn rational(n: i64, d: i64) -> Self {
        match Rational::new(n, d) {
            Some(r) => Self::from_rational(r),
            None if n == 0 => Self::nan(),
            None => Self::complex_infinity(),
        }
    }

    pub fn from_exact(e: ExactValue) -> Self {
        Exact(e)
    }

    /// `re + im·i`; a zero imaginary part gives a real value.
    pub fn exact_complex(re: ExactValue, im: ExactValue) -> Self {
        if im.is_zero() {
            Exact(re)
        } else {
            ExactComplex { re, im }
        }
    }

    fn from_parts((re, im): Parts) -> Self {
        Self::exact_complex(re, im)
    }

    /// Integral doubles within the safe range become exact integers.
    pub fn from_f64(x: f64) -> Self {
        if x.is_finite() && x.fract() == 0.0 && x.abs() <= MAX_SAFE_INTEGER as f64 {
            return Self::from_integer(x as i64);
        }
        Self::machine(x)
    }

    /// A machine real, even when integral.
    pub fn machine(x: f64) -> Self {
        Self::complex(x, 0.0)
    }

    pub fn complex(re: f64, im: f64) -> Self {
        if re.is_nan() || im.is_nan() {
            return Self::nan();
        }
        if im.is_infinite() || (re.is_infinite() && im != 0.0) {
            return Self::complex_infinity();
        }
        // `+ 0.0` folds negative zero into positive zero.
        Machine(Complex64::new(re + 0.0, im + 0.0))
    }

    fn from_complex(c: Complex64) -> Self {
        Self::complex(c.re, c.im)
    }

    pub fn big(re: BigDecimal) -> Self {
        Big { re, im: 0.0 }
    }

    fn big_complex(re: BigDecimal, im: f64) -> Self {
        if im.is_nan() {
            return Self::nan();
        }
        if im.is_infinite() {
            return Self::complex_infinity();
        }
        Big { re, im: im + 0.0 }
    }

    // ---- predicates -----------------------------------------------------

    pub fn is_nan(&self) -> bool {
        matches!(self, Machine(c) if c.re.is_nan())
    }

    pub fn is_complex_infinity(&self) -> bool {
        matches!(self, Machine(c) if c.re.is_infinite() && c.im.is_infinite())
    }

    pub fn is_positive_infinity(&self) -> bool {
        matches!(self, Machine(c) if c.re == f64::INFINITY && c.im == 0.0)
    }

    pub fn is_negative_infinity(&self) -> bool {
        matches!(self, Machine(c) if c.re == f64::NEG_INFINITY && c.im == 0.0)
    }

    /// Any of `+∞`, `-∞` or complex infinity.
    pub fn is_infinity(&self) -> bool {
        matches!(self, Machine(c) if c.re.is_infinite())
    }

    pub fn is_finite(&self) -> bool {
        !self.is_nan() && !self.is_infinity()
    }

    /// Exact real or exact complex.
    pub fn is_exact(&self) -> bool {
        matches!(self, Exact(_) | ExactComplex { .. })
    }

    /// Exact with no radical part.
    pub fn is_rational(&self) -> bool {
        matches!(self, Exact(e) if e.is_rational())
    }

    /// Exact integer.
    pub fn is_integer(&self) -> bool {
        matches!(self, Exact(e) if e.is_integer())
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Exact(e) => e.is_zero(),
            ExactComplex { .. } => false,
            Machine(c) => c.re == 0.0 && c.im == 0.0,
            Big { re, im } => re.is_zero() && *im == 0.0,
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Exact(e) => e.is_one(),
            ExactComplex { .. } => false,
            Machine(c) => c.re == 1.0 && c.im == 0.0,
            Big { re, im } => *im == 0.0 && re.is_one(),
        }
    }

    pub fn is_negative_one(&self) -> bool {
        match self {
            Exact(e) => e.is_negative_one(),
            ExactComplex { .. } => false,
            Machine(c) => c.re == -1.0 && c.im == 0.0,
            Big { re, im } => *im == 0.0 && re.is_negative_one(),
        }
    }

    /// Finite or infinite value on the real line (NaN is not real).
    pub fn is_real(&self) -> bool {
        match self {
            Exact(_) => true,
            ExactComplex { .. } => false,
            Machine(c) => !c.re.is_nan() && c.im == 0.0,
            Big { im, .. } => *im == 0.0,
        }
    }

    /// Finite value with a nonzero imaginary part.
    pub fn is_complex(&self) -> bool {
        self.is_finite() && self.im() != 0.0
    }

    /// Sign of a real value; `None` for NaN and non-real values.
    pub fn sign(&self) -> Option<i32> {
        if !self.is_real() {
            return None;
        }
        Some(match self {
            Exact(e) => e.signum(),
            Big { re, .. } => re.signum(),
            ExactComplex { .. } => return None,
            Machine(c) => {
                if c.re > 0.0 {
                    1
                } else if c.re < 0.0 {
                    -1
                } else {
                    0
                }
            }
        })
    }

    pub fn is_positive(&self) -> bool {
        self.sign() == Some(1)
    }

    pub fn is_negative(&self) -> bool {
        self.sign() == Some(-1)
    }

    // ---- accessors ------------------------------------------------------

    pub fn as_exact(&self) -> Option<&ExactValue> {
        match self {
            Exact(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_rational(&self) -> Option<&Rational> {
        match self {
            Exact(e) if e.is_rational() => Some(e.rational()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<BigInt> {
        self.as_rational().and_then(Rational::as_integer)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_rational().and_then(Rational::as_i64)
    }

    /// Real part as a double.
    pub fn re(&self) -> f64 {
        match self {
            Exact(e) => e.to_f64(),
            ExactComplex { re, .. } => re.to_f64(),
            Machine(c) => c.re,
            Big { re, .. } => re.to_f64(),
        }
    }

    pub fn im(&self) -> f64 {
        match self {
            Exact(_) => 0.0,
            ExactComplex { im, .. } => im.to_f64(),
            Machine(c) => c.im,
            Big { im, .. } => *im,
        }
    }

    pub fn to_f64(&self) -> f64 {
        self.re()
    }

    pub fn to_complex(&self) -> Complex64 {
        Complex64::new(self.re(), self.im())
    }

    fn precision(&self) -> Option<u32> {
        match self {
            Big { re, .. } => Some(re.precision()),
            _ => None,
        }
    }

    /// Real part at `precision` digits plus the imaginary part, for finite values.
    fn big_parts(&self, precision: u32) -> (BigDecimal, f64) {
        match self {
            Exact(e) => (e.to_big_decimal(precision), 0.0),
            ExactComplex { re, im } => (re.to_big_decimal(precision), im.to_f64()),
            Machine(c) => (
                BigDecimal::from_f64(c.re, precision).unwrap_or_else(|| BigDecimal::zero(precision)),
                c.im,
            ),
            Big { re, im } => (re.clone(), *im),
        }
    }

    fn exact_parts(&self) -> Option<Parts> {
        match self {
            Exact(e) => Some((e.clone(), ExactValue::zero())),
            ExactComplex { re, im } => Some((re.clone(), im.clone())),
            _ => None,
        }
    }

    fn any_big(&self, other: &Self) -> Option<u32> {
        match (self.precision(), other.precision()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(p), None) | (None, Some(p)) => Some(p),
            (None, None) => None,
        }
    }

    /// Approximate form: exact values become machine numbers.
    pub fn to_approximate(&self) -> Self {
        match self {
            Exact(e) if e.digit_size() > 30 => Self::big(e.to_big_decimal(DEFAULT_PRECISION)),
            Exact(e) => Self::machine(e.to_f64()),
            ExactComplex { re, im } => Self::complex(re.to_f64(), im.to_f64()),
            other => other.clone(),
        }
    }

    // ---- arithmetic -----------------------------------------------------

    pub fn neg(&self) -> Self {
        match self {
            Exact(e) => Exact(e.neg()),
            ExactComplex { re, im } => Self::exact_complex(re.neg(), im.neg()),
            Machine(c) => Self::complex(-c.re, -c.im),
            Big { re, im } => Self::big_complex(re.neg(), -im),
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        if self.is_nan() || other.is_nan() {
            return Self::nan();
        }
        if self.is_infinity() || other.is_infinity() {
            return Self::add_infinite(self, other);
        }
        if let (Exact(a), Exact(b)) = (self, other) {
            return match a.add(b) {
                Some(sum) => Exact(sum),
                None => Self::machine(a.to_f64() + b.to_f64()),
            };
        }
        if let (Some(a), Some(b)) = (self.exact_parts(), other.exact_parts()) {
            if let Some(sum) = parts_add(&a, &b) {
                return Self::from_parts(sum);
            }
        }
        if let Some(precision) = self.any_big(other) {
            let (ar, ai) = self.big_parts(precision);
            let (br, bi) = other.big_parts(precision);
            return Self::big_complex(ar.add(&br), ai + bi);
        }
        Self::from_complex(self.to_complex() + other.to_complex())
    }

    fn add_infinite(a: &Self, b: &Self) -> Self {
        match (a.is_infinity(), b.is_infinity()) {
            (true, true) => {
                if a.is_complex_infinity() || b.is_complex_infinity() {
                    Self::nan()
                } else if a.sign() == b.sign() {
                    a.clone()
                } else {
                    Self::nan()
                }
            }
            (true, false) => Self::complex(a.re(), a.im() + b.im()),
            _ => Self::complex(b.re(), b.im() + a.im()),
        }
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Self) -> Self {
        if self.is_nan() || other.is_nan() {
            return Self::nan();
        }
        if self.is_infinity() || other.is_infinity() {
            if self.is_zero() || other.is_zero() {
                return Self::nan();
            }
            return match (self.sign(), other.sign()) {
                (Some(a), Some(b)) if a * b > 0 => Self::positive_infinity(),
                (Some(_), Some(_)) => Self::negative_infinity(),
                _ => Self::complex_infinity(),
            };
        }
        if let (Exact(a), Exact(b)) = (self, other) {
            return match a.mul(b) {
                Some(product) => Exact(product),
                None => Self::machine(a.to_f64() * b.to_f64()),
            };
        }
        if let (Some(a), Some(b)) = (self.exact_parts(), other.exact_parts()) {
            if let Some(product) = parts_mul(&a, &b) {
                return Self::from_parts(product);
            }
        }
        if let Some(precision) = self.any_big(other) {
            let (ar, ai) = self.big_parts(precision);
            let (br, bi) = other.big_parts(precision);
            let (arf, brf) = (ar.to_f64(), br.to_f64());
            let re = match BigDecimal::from_f64(ai * bi, precision) {
                Some(cross) => ar.mul(&br).sub(&cross),
                None => ar.mul(&br),
            };
            return Self::big_complex(re, arf * bi + ai * brf);
        }
        Self::from_complex(self.to_complex() * other.to_complex())
    }

    pub fn div(&self, other: &Self) -> Self {
        if self.is_nan() || other.is_nan() {
            return Self::nan();
        }
        if other.is_zero() {
            return if self.is_zero() {
                Self::nan()
            } else {
                Self::complex_infinity()
            };
        }
        match (self.is_infinity(), other.is_infinity()) {
            (true, true) => return Self::nan(),
            (false, true) => return Self::zero(),
            (true, false) => {
                return match (self.sign(), other.sign()) {
                    (Some(a), Some(b)) if a * b > 0 => Self::positive_infinity(),
                    (Some(_), Some(_)) => Self::negative_infinity(),
                    _ => Self::complex_infinity(),
                };
            }
            (false, false) => {}
        }
        if let (Exact(a), Exact(b)) = (self, other) {
            return match a.div(b) {
                Some(quotient) => Exact(quotient),
                None => Self::machine(a.to_f64() / b.to_f64()),
            };
        }
        if let (Some(a), Some(b)) = (self.exact_parts(), other.exact_parts()) {
            if let Some(quotient) = parts_inv(&b).and_then(|inv| parts_mul(&a, &inv)) {
                return Self::from_parts(quotient);
            }
        }
        if let Some(precision) = self.any_big(other) {
            if self.is_real() && other.is_real() {
                let (ar, _) = self.big_parts(precision);
                let (br, _) = other.big_parts(precision);
                if let Some(q) = ar.div(&br) {
                    return Self::big(q);
                }
            }
        }
        Self::from_complex(self.to_complex() / other.to_complex())
    }

    pub fn inv(&self) -> Self {
        Self::one().div(self)
    }

    pub fn abs(&self) -> Self {
        if self.is_nan() {
            return Self::nan();
        }
        if self.is_infinity() {
            return Self::positive_infinity();
        }
        match self {
            Exact(e) => Exact(e.abs()),
            ExactComplex { re, im } => parts_norm(&(re.clone(), im.clone()))
                .and_then(|norm| norm.sqrt())
                .map(Exact)
                .unwrap_or_else(|| Self::machine(self.to_complex().norm())),
            Big { re, im } if *im == 0.0 => Self::big(re.abs()),
            _ => Self::machine(self.to_complex().norm()),
        }
    }

    /// gcd of two rationals; `1` for anything else.
    pub fn gcd(&self, other: &Self) -> Self {
        match (self.as_rational(), other.as_rational()) {
            (Some(a), Some(b)) => Self::from_rational(a.gcd(b)),
            _ => Self::one(),
        }
    }

    /// Extended-real power.
    ///
    /// `x^0 = 1` (including `0^0`), `x^1 = x`, `0^-1` is complex infinity,
    /// `∞^-1 = 0`, `0^∞ = 0`, `1^∞ = (-1)^∞ = NaN`.
    pub fn pow(&self, exp: &Self) -> Self {
        if self.is_nan() || exp.is_nan() {
            return Self::nan();
        }
        if exp.is_zero() {
            return Self::one();
        }
        if exp.is_one() {
            return self.clone();
        }
        if exp.is_negative_one() {
            if self.is_zero() {
                return Self::complex_infinity();
            }
            if self.is_infinity() {
                return Self::zero();
            }
            return self.inv();
        }
        if exp.is_positive_infinity() {
            return self.pow_to_infinity();
        }
        if exp.is_negative_infinity() {
            if self.is_zero() {
                return Self::complex_infinity();
            }
            return self.inv().pow_to_infinity();
        }
        if exp.is_complex_infinity() {
            return Self::nan();
        }
        if self.is_zero() {
            return match exp.sign() {
                Some(1) => Self::zero(),
                Some(-1) => Self::complex_infinity(),
                _ => Self::nan(),
            };
        }
        if self.is_infinity() {
            return match exp.sign() {
                Some(-1) => Self::zero(),
                Some(1) if self.is_positive_infinity() => Self::positive_infinity(),
                Some(1) if self.is_negative_infinity() => match exp.as_integer() {
                    Some(n) if n.bit(0) => Self::negative_infinity(),
                    Some(_) => Self::positive_infinity(),
                    None => Self::complex_infinity(),
                },
                Some(1) => Self::complex_infinity(),
                _ => Self::nan(),
            };
        }

        if let (Exact(base), Some(e)) = (self, exp.as_rational()) {
            if let Some(result) = Self::exact_rational_power(base, e) {
                return result;
            }
        }
        if let (ExactComplex { re, im }, Some(n)) = (self, exp.as_i64()) {
            if let Some(power) = parts_powi(&(re.clone(), im.clone()), n) {
                return Self::from_parts(power);
            }
        }
        if let (Big { re, im }, Some(n)) = (self, exp.as_i64()) {
            if *im == 0.0 {
                if let Some(p) = re.powi(n) {
                    return Self::big(p);
                }
            }
        }
        if let Big { re, im } = self {
            if *im == 0.0 && !re.is_negative() && exp.as_rational() == Some(&Rational::half()) {
                if let Some(root) = re.sqrt() {
                    return Self::big(root);
                }
            }
        }
        self.approximate_power(exp)
    }

    /// `q^(p/r)` kept exact when the root and power both stay exact.
    fn exact_rational_power(base: &ExactValue, e: &Rational) -> Option<Self> {
        if let Some(n) = e.as_i64() {
            return base.pow_int(n).map(Exact);
        }
        let (p, q) = e.as_machine()?;
        let q = u32::try_from(q).ok()?;
        if base.signum() < 0 && q % 2 == 0 {
            return None;
        }
        let root = base.root(q)?;
        root.pow_int(p).map(Exact)
    }

    fn approximate_power(&self, exp: &Self) -> Self {
        if self.is_real() && exp.is_real() {
            let (b, e) = (self.re(), exp.re());
            if b >= 0.0 || e.fract() == 0.0 {
                return Self::machine(b.powf(e));
            }
        }
        Self::from_complex(self.to_complex().powc(exp.to_complex()))
    }

    fn pow_to_infinity(&self) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        if self.is_one() || self.is_negative_one() {
            return Self::nan();
        }
        if self.is_infinity() {
            return if self.is_positive_infinity() {
                Self::positive_infinity()
            } else {
                Self::complex_infinity()
            };
        }
        let magnitude = match self {
            Exact(e) => e.abs().cmp_value(&ExactValue::one()),
            _ => self
                .to_complex()
                .norm()
                .partial_cmp(&1.0)
                .unwrap_or(Ordering::Equal),
        };
        match magnitude {
            Ordering::Greater if self.is_positive() => Self::positive_infinity(),
            Ordering::Greater => Self::complex_infinity(),
            Ordering::Less => Self::zero(),
            Ordering::Equal => Self::nan(),
        }
    }

    /// Principal `n`-th root; odd roots of negative reals stay real.
    pub fn root(&self, n: u32) -> Self {
        match n {
            0 => return Self::nan(),
            1 => return self.clone(),
            _ => {}
        }
        if self.is_nan() {
            return Self::nan();
        }
        if self.is_zero() {
            return Self::zero();
        }
        if self.is_infinity() {
            return if self.is_positive_infinity() {
                Self::positive_infinity()
            } else if self.is_negative_infinity() && n % 2 == 1 {
                Self::negative_infinity()
            } else {
                Self::complex_infinity()
            };
        }
        if let Exact(e) = self {
            if let Some(root) = e.root(n) {
                return Exact(root);
            }
        }
        if let Big { re, im } = self {
            if *im == 0.0 && n == 2 && !re.is_negative() {
                if let Some(root) = re.sqrt() {
                    return Self::big(root);
                }
            }
        }
        let degree = f64::from(n);
        if self.is_real() {
            let x = self.re();
            if x >= 0.0 {
                return Self::machine(x.powf(1.0 / degree));
            }
            if n % 2 == 1 {
                return Self::machine(-(-x).powf(1.0 / degree));
            }
        }
        Self::from_complex(self.to_complex().powc(Complex64::new(1.0 / degree, 0.0)))
    }

    pub fn sqrt(&self) -> Self {
        self.root(2)
    }

    // ---- comparison -----------------------------------------------------

    /// Order of two real values; `None` when either is NaN or non-real.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if !self.is_real() || !other.is_real() {
            return None;
        }
        if let (Exact(a), Exact(b)) = (self, other) {
            return Some(a.cmp_value(b));
        }
        if self.is_finite() && other.is_finite() {
            if let Some(precision) = self.any_big(other) {
                let (a, _) = self.big_parts(precision);
                let (b, _) = other.big_parts(precision);
                return Some(a.cmp(&b));
            }
        }
        self.re().partial_cmp(&other.re())
    }

    /// Numeric equality across representations (`2 == 2.0`).
    pub fn eq_value(&self, other: &Self) -> bool {
        if self.is_nan() || other.is_nan() {
            return false;
        }
        if self.is_real() && other.is_real() {
            return self.compare(other) == Some(Ordering::Equal);
        }
        self.to_complex() == other.to_complex()
    }
}

impl Default for NumericValue {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i64> for NumericValue {
    fn from(n: i64) -> Self {
        Self::from_integer(n)
    }
}

impl From<Rational> for NumericValue {
    fn from(r: Rational) -> Self {
        Self::from_rational(r)
    }
}

impl From<ExactValue> for NumericValue {
    fn from(e: ExactValue) -> Self {
        Exact(e)
    }
}

impl PartialEq for NumericValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Exact(a), Exact(b)) => a == b,
            (ExactComplex { re: a, im: ai }, ExactComplex { re: b, im: bi }) => a == b && ai == bi,
            (Machine(a), Machine(b)) => {
                a.re.to_bits() == b.re.to_bits() && a.im.to_bits() == b.im.to_bits()
            }
            (Big { re: a, im: ai }, Big { re: b, im: bi }) => {
                a == b && ai.to_bits() == bi.to_bits()
            }
            _ => false,
        }
    }
}

impl Eq for NumericValue {}

impl Hash for NumericValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Exact(e) => e.hash(state),
            ExactComplex { re, im } => {
                re.hash(state);
                im.hash(state);
            }
            Machine(c) => {
                c.re.to_bits().hash(state);
                c.im.to_bits().hash(state);
            }
            Big { re, im } => {
                re.hash(state);
                im.to_bits().hash(state);
            }
        }
    }
}

fn parts_add((a, b): &Parts, (c, d): &Parts) -> Option<Parts> {
    Some((a.add(c)?, b.add(d)?))
}

fn parts_mul((a, b): &Parts, (c, d): &Parts) -> Option<Parts> {
    let re = a.mul(c)?.add(&b.mul(d)?.neg())?;
    let im = a.mul(d)?.add(&b.mul(c)?)?;
    Some((re, im))
}

/// `re² + im²`, always rational.
fn parts_norm((a, b): &Parts) -> Option<ExactValue> {
    a.mul(a)?.add(&b.mul(b)?)
}

/// `1/z = conj(z) / |z|²`
fn parts_inv(z: &Parts) -> Option<Parts> {
    let norm = parts_norm(z)?;
    Some((z.0.div(&norm)?, z.1.neg().div(&norm)?))
}

/// Largest exponent raised exactly by repeated squaring.
const MAX_COMPLEX_POWER: u64 = 1024;

fn parts_powi(z: &Parts, n: i64) -> Option<Parts> {
    let mut e = n.unsigned_abs();
    if e > MAX_COMPLEX_POWER {
        return None;
    }
    let mut base = if n < 0 { parts_inv(z)? } else { z.clone() };
    let mut acc = (ExactValue::one(), ExactValue::zero());
    while e > 0 {
        if e & 1 == 1 {
            acc = parts_mul(&acc, &base)?;
        }
        e >>= 1;
        if e > 0 {
            base = parts_mul(&base, &base)?;
        }
    }
    Some(acc)
}

fn fmt_f64(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

fn fmt_imaginary(f: &mut fmt::Formatter<'_>, im: f64) -> fmt::Result {
    if im < 0.0 {
        write!(f, "-{}i", fmt_f64(-im))
    } else {
        write!(f, "+{}i", fmt_f64(im))
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nan() {
            return write!(f, "NaN");
        }
        if self.is_complex_infinity() {
            return write!(f, "ComplexInfinity");
        }
        if self.is_positive_infinity() {
            return write!(f, "+Infinity");
        }
        if self.is_negative_infinity() {
            return write!(f, "-Infinity");
        }
        match self {
            Exact(e) => write!(f, "{}", e),
            ExactComplex { re, im } => {
                if !re.is_zero() {
                    write!(f, "{}", re)?;
                }
                let sign = if im.signum() < 0 {
                    "-"
                } else if re.is_zero() {
                    ""
                } else {
                    "+"
                };
                let im = im.abs();
                if im.is_one() {
                    write!(f, "{}i", sign)
                } else if im.is_integer() {
                    write!(f, "{}{}i", sign, im)
                } else {
                    write!(f, "{}({})i", sign, im)
                }
            }
            Machine(c) if c.im == 0.0 => write!(f, "{}", fmt_f64(c.re)),
            Machine(c) if c.re == 0.0 => write!(f, "{}i", fmt_f64(c.im)),
            Machine(c) => {
                write!(f, "{}", fmt_f64(c.re))?;
                fmt_imaginary(f, c.im)
            }
            Big { re, im } => {
                write!(f, "{}", re)?;
                if *im != 0.0 {
                    fmt_imaginary(f, *im)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> NumericValue {
        NumericValue::from_integer(n)
    }

    fn sqrt_of(n: i64) -> NumericValue {
        int(n).sqrt()
    }

    #[test]
    fn integer_and_rational_arithmetic_stays_exact() {
        assert_eq!(int(2).add(&int(3)), int(5));
        assert_eq!(int(1).add(&NumericValue::half()), NumericValue::rational(3, 2));
        assert_eq!(int(6).div(&int(4)), NumericValue::rational(3, 2));
        assert!(int(7).mul(&NumericValue::rational(1, 7)).is_one());
    }

    #[test]
    fn radicals_fold_or_widen() {
        let r2 = sqrt_of(2);
        assert!(r2.is_exact());
        assert_eq!(r2.mul(&r2), int(2));
        assert_eq!(sqrt_of(12).div(&sqrt_of(3)), int(2));
        let sum = sqrt_of(2).add(&sqrt_of(3));
        assert!(!sum.is_exact());
        assert!((sum.to_f64() - (2f64.sqrt() + 3f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn division_sentinels() {
        assert!(int(0).div(&int(0)).is_nan());
        assert!(int(3).div(&int(0)).is_complex_infinity());
        assert!(NumericValue::nan().add(&int(1)).is_nan());
        assert!(int(1).div(&NumericValue::positive_infinity()).is_zero());
    }

    #[test]
    fn infinity_arithmetic() {
        let inf = NumericValue::positive_infinity();
        let ninf = NumericValue::negative_infinity();
        assert!(inf.add(&ninf).is_nan());
        assert!(inf.add(&int(5)).is_positive_infinity());
        assert!(inf.mul(&int(-2)).is_negative_infinity());
        assert!(inf.mul(&int(0)).is_nan());
        assert!(NumericValue::complex_infinity().mul(&int(2)).is_complex_infinity());
    }

    #[test]
    fn power_conventions() {
        let inf = NumericValue::positive_infinity();
        assert!(int(0).pow(&inf).is_zero());
        assert!(int(1).pow(&inf).is_nan());
        assert!(int(-1).pow(&inf).is_nan());
        assert!(int(2).pow(&inf).is_positive_infinity());
        assert!(int(-2).pow(&inf).is_complex_infinity());
        assert!(NumericValue::half().pow(&inf).is_zero());
        assert!(int(2).pow(&NumericValue::negative_infinity()).is_zero());
        assert!(int(0).pow(&int(0)).is_one());
        assert!(NumericValue::machine(3.5).pow(&int(0)).is_one());
        assert_eq!(NumericValue::machine(3.5).pow(&int(1)), NumericValue::machine(3.5));
        assert!(int(0).pow(&int(-1)).is_complex_infinity());
        assert!(inf.pow(&int(-1)).is_zero());
        assert!(int(0).pow(&int(-2)).is_complex_infinity());
    }

    #[test]
    fn exact_powers() {
        assert_eq!(int(2).pow(&int(10)), int(1024));
        assert_eq!(int(2).pow(&int(-2)), NumericValue::rational(1, 4));
        assert_eq!(int(8).pow(&NumericValue::rational(2, 3)), int(4));
        assert_eq!(int(4).pow(&NumericValue::half()), int(2));
        assert_eq!(int(8).pow(&NumericValue::half()), int(2).mul(&sqrt_of(2)));
    }

    #[test]
    fn negative_base_fractional_power_is_complex() {
        let v = int(-4).pow(&NumericValue::half());
        assert!(v.is_complex());
        assert!((v.im() - 2.0).abs() < 1e-12);
        assert_eq!(int(-27).root(3), int(-3));
        let cube = NumericValue::machine(-8.0).root(3);
        assert!((cube.re() + 2.0).abs() < 1e-12);
    }

    #[test]
    fn representation_identity() {
        assert_ne!(NumericValue::machine(2.0), int(2));
        assert!(NumericValue::machine(2.0).eq_value(&int(2)));
        assert_eq!(NumericValue::machine(-0.0), NumericValue::machine(0.0));
        assert_eq!(NumericValue::from_f64(3.0), int(3));
        assert_eq!(NumericValue::complex(f64::NAN, 1.0), NumericValue::nan());
    }

    #[test]
    fn comparisons() {
        assert_eq!(sqrt_of(2).compare(&NumericValue::rational(3, 2)), Some(Ordering::Less));
        assert_eq!(
            NumericValue::negative_infinity().compare(&int(-1000)),
            Some(Ordering::Less)
        );
        assert_eq!(NumericValue::nan().compare(&int(0)), None);
    }

    #[test]
    fn big_values_stay_big() {
        let big = NumericValue::big(
            BigDecimal::parse("1.00000000000000000001", 30).expect("valid"),
        );
        let sum = big.add(&int(1));
        assert!(matches!(sum, Big { .. }));
        assert_eq!(sum.to_string(), "2.00000000000000000001");
    }

    fn exact_i(re: (i64, i64), im: (i64, i64)) -> NumericValue {
        let part = |(n, d): (i64, i64)| ExactValue::from_rational(Rational::new(n, d).expect("valid"));
        NumericValue::exact_complex(part(re), part(im))
    }

    #[test]
    fn exact_complex_arithmetic() {
        let z = exact_i((1, 10), (1, 1));
        assert!(z.is_exact());
        assert!(z.is_complex());
        assert_eq!(z.mul(&int(3)), exact_i((3, 10), (3, 1)));
        // (1 + i)(1 - i) = 2
        assert_eq!(exact_i((1, 1), (1, 1)).mul(&exact_i((1, 1), (-1, 1))), int(2));
        // i² = -1
        let i = exact_i((0, 1), (1, 1));
        assert_eq!(i.pow(&int(2)), int(-1));
        assert_eq!(i.pow(&int(-1)), exact_i((0, 1), (-1, 1)));
        assert_eq!(int(1).div(&exact_i((1, 1), (1, 1))), exact_i((1, 2), (-1, 2)));
        assert_eq!(z.add(&z.neg()), int(0));
        assert_eq!(exact_i((3, 1), (4, 1)).abs(), int(5));
        assert_eq!(NumericValue::exact_complex(ExactValue::one(), ExactValue::zero()), int(1));
    }

    #[test]
    fn exact_complex_widens_with_machine_operands() {
        let z = exact_i((1, 2), (1, 1)).add(&NumericValue::machine(0.25));
        assert!(matches!(z, Machine(_)));
        assert!((z.re() - 0.75).abs() < 1e-12);
        assert!(exact_i((1, 2), (1, 1)).sign().is_none());
        assert_eq!(exact_i((1, 2), (1, 1)).compare(&int(0)), None);
    }

    #[test]
    fn display() {
        assert_eq!(exact_i((1, 10), (1, 1)).to_string(), "1/10+i");
        assert_eq!(exact_i((0, 1), (-3, 1)).to_string(), "-3i");
        assert_eq!(exact_i((2, 1), (-1, 2)).to_string(), "2-(1/2)i");
        assert_eq!(NumericValue::rational(-3, 4).to_string(), "-3/4");
        assert_eq!(NumericValue::machine(2.0).to_string(), "2.0");
        assert_eq!(NumericValue::complex(1.0, -2.0).to_string(), "1.0-2.0i");
        assert_eq!(NumericValue::complex_infinity().to_string(), "ComplexInfinity");
        assert_eq!(sqrt_of(8).to_string(), "2√2");
    }
}
