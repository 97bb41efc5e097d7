//! Integer helpers: gcd/lcm and factoring into `factor^k * rest`.
//!
//! Radical simplification relies on [`canonical_integer`]: `√72` becomes
//! `6√2` because `72 = 6^2 * 2`.

use num_bigint::BigInt;
use num_integer::{Integer, Roots};
use num_traits::{One, Signed, Zero};

/// Largest radicand (and trial-division bound) handled exactly.
pub const SMALL_INTEGER: u64 = 1_000_000;

/// Largest integer exactly representable by an IEEE-754 double.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Non-negative gcd of two machine integers.
#[inline]
pub fn gcd_i64(a: i64, b: i64) -> i64 {
    a.gcd(&b)
}

/// Least common multiple, `None` on overflow.
pub fn lcm_i64(a: i64, b: i64) -> Option<i64> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    let g = gcd_i64(a, b);
    (a / g).checked_mul(b).map(i64::abs)
}

/// Non-negative gcd of two big integers.
#[inline]
pub fn gcd_big(a: &BigInt, b: &BigInt) -> BigInt {
    a.gcd(b)
}

/// Non-negative lcm of two big integers.
pub fn lcm_big(a: &BigInt, b: &BigInt) -> BigInt {
    if a.is_zero() || b.is_zero() {
        return BigInt::zero();
    }
    a.lcm(b).abs()
}

/// Split `n` into `(factor, rest)` with `n = factor^k * rest` and `rest`
/// free of k-th powers.
///
/// Trial division by candidates up to `SMALL_INTEGER`, so values up to
/// `SMALL_INTEGER^2` factor completely. A larger cofactor left after the
/// bound is returned inside `rest` unfactored.
pub fn canonical_integer(n: u64, k: u32) -> (u64, u64) {
    if k <= 1 {
        return (n, 1);
    }
    if n < 2 {
        return (n, 1);
    }

    let mut remaining = n;
    let mut factor = 1u64;
    let mut rest = 1u64;
    let mut p = 2u64;
    while p <= SMALL_INTEGER && p.saturating_mul(p) <= remaining {
        if remaining % p == 0 {
            let mut multiplicity = 0u32;
            while remaining % p == 0 {
                remaining /= p;
                multiplicity += 1;
            }
            factor *= p.pow(multiplicity / k);
            rest *= p.pow(multiplicity % k);
        }
        p += if p == 2 { 1 } else { 2 };
    }
    // Whatever is left is a prime with multiplicity one.
    if remaining > 1 {
        rest *= remaining;
    }
    (factor, rest)
}

/// Exact k-th root of `n`, if `n` is a perfect k-th power.
///
/// Negative `n` only has a real root for odd `k`.
pub fn exact_root(n: &BigInt, k: u32) -> Option<BigInt> {
    if k == 0 {
        return None;
    }
    if k == 1 {
        return Some(n.clone());
    }
    if n.is_negative() {
        if k % 2 == 0 {
            return None;
        }
        return exact_root(&-n, k).map(|r| -r);
    }
    let root = n.nth_root(k);
    if root.pow(k) == *n {
        Some(root)
    } else {
        None
    }
}

/// True when `n` is a perfect square (negative values never are).
pub fn is_perfect_square(n: &BigInt) -> bool {
    !n.is_negative() && {
        let r = n.sqrt();
        &r * &r == *n
    }
}

/// `10^n` as a big integer.
pub fn pow10(n: u32) -> BigInt {
    BigInt::from(10u32).pow(n)
}

/// Number of decimal digits of `|n|` (zero has one digit).
pub fn digit_count(n: &BigInt) -> u32 {
    if n.is_zero() {
        return 1;
    }
    // bits * log10(2) is a lower bound that is at most one short.
    let bits = n.bits();
    let estimate = ((bits as f64 - 1.0) * std::f64::consts::LOG10_2).floor() as u32 + 1;
    let magnitude = n.abs();
    if magnitude >= pow10(estimate) {
        estimate + 1
    } else {
        estimate
    }
}

/// `base^exp` for a non-negative exponent, `None` above `limit` digits.
pub fn checked_big_pow(base: &BigInt, exp: u32, limit: u32) -> Option<BigInt> {
    if exp == 0 {
        return Some(BigInt::one());
    }
    let estimate = u64::from(digit_count(base)) * u64::from(exp);
    if estimate > u64::from(limit) {
        return None;
    }
    Some(base.pow(exp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_integer_extracts_squares() {
        assert_eq!(canonical_integer(72, 2), (6, 2));
        assert_eq!(canonical_integer(12, 2), (2, 3));
        assert_eq!(canonical_integer(49, 2), (7, 1));
        assert_eq!(canonical_integer(30, 2), (1, 30));
    }

    #[test]
    fn canonical_integer_extracts_cubes() {
        assert_eq!(canonical_integer(54, 3), (3, 2));
        assert_eq!(canonical_integer(1000, 3), (10, 1));
    }

    #[test]
    fn canonical_integer_trivial_inputs() {
        assert_eq!(canonical_integer(0, 2), (0, 1));
        assert_eq!(canonical_integer(1, 2), (1, 1));
        assert_eq!(canonical_integer(97, 2), (1, 97));
        assert_eq!(canonical_integer(18, 1), (18, 1));
    }

    #[test]
    fn trial_division_is_bounded() {
        let prime = 18_446_744_073_709_551_557u64;
        assert_eq!(canonical_integer(prime, 2), (1, prime));
    }

    #[test]
    fn gcd_and_lcm() {
        assert_eq!(gcd_i64(12, 18), 6);
        assert_eq!(gcd_i64(-12, 18), 6);
        assert_eq!(lcm_i64(4, 6), Some(12));
        assert_eq!(lcm_i64(i64::MAX, i64::MAX - 1), None);
        assert_eq!(gcd_big(&BigInt::from(21), &BigInt::from(-14)), BigInt::from(7));
        assert_eq!(lcm_big(&BigInt::from(-4), &BigInt::from(6)), BigInt::from(12));
    }

    #[test]
    fn exact_roots() {
        assert_eq!(exact_root(&BigInt::from(27), 3), Some(BigInt::from(3)));
        assert_eq!(exact_root(&BigInt::from(-27), 3), Some(BigInt::from(-3)));
        assert_eq!(exact_root(&BigInt::from(-4), 2), None);
        assert_eq!(exact_root(&BigInt::from(10), 2), None);
        assert!(is_perfect_square(&BigInt::from(144)));
        assert!(!is_perfect_square(&BigInt::from(145)));
    }

    #[test]
    fn digit_counts() {
        assert_eq!(digit_count(&BigInt::from(0)), 1);
        assert_eq!(digit_count(&BigInt::from(9)), 1);
        assert_eq!(digit_count(&BigInt::from(10)), 2);
        assert_eq!(digit_count(&BigInt::from(-999)), 3);
        assert_eq!(digit_count(&pow10(40)), 41);
    }
}
