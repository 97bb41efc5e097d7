//! Multiplicative accumulator.
//!
//! A `Product` collects a numeric coefficient and a list of `(base,
//! exponent)` factors with rational exponents. Like bases merge their
//! exponents, so `a^4 / a^2` accumulates to `a^2` before anything is built.

use super::{build, canonical_negate, canonical_power};
use canon_ast::traversal::is_constant_expression;
use canon_ast::{sort_operands, Context, Expr, ExprId, Operator};
use canon_numeric::{NumericValue, Rational};
use smallvec::SmallVec;

#[derive(Debug, Clone)]
pub struct Product {
    coefficient: NumericValue,
    /// Inline for the usual handful of factors.
    factors: SmallVec<[(ExprId, Rational); 8]>,
}

impl Default for Product {
    fn default() -> Self {
        Self::new()
    }
}

impl Product {
    pub fn new() -> Self {
        Product {
            coefficient: NumericValue::one(),
            factors: SmallVec::new(),
        }
    }

    pub fn coefficient(&self) -> &NumericValue {
        &self.coefficient
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn mul(&mut self, ctx: &Context, term: ExprId) {
        self.mul_pow(ctx, term, &Rational::one());
    }

    pub fn div(&mut self, ctx: &Context, term: ExprId) {
        self.mul_pow(ctx, term, &Rational::negative_one());
    }

    /// Multiply by `term^exp`.
    ///
    /// Products, quotients, negations and powers inside `term` are split up
    /// only when `exp` is an integer, where `(a*b)^n = a^n * b^n` holds.
    pub fn mul_pow(&mut self, ctx: &Context, term: ExprId, exp: &Rational) {
        if self.coefficient.is_nan() {
            return;
        }
        if exp.is_zero() {
            if ctx.as_number(term).map_or(false, NumericValue::is_zero) {
                self.coefficient = NumericValue::nan();
            }
            return;
        }
        let integral = exp.is_integer();
        let (op, ops) = match ctx.get(term) {
            Expr::Number(n) => return self.mul_number(ctx, term, n, exp),
            Expr::Function(op, ops) if integral => (*op, ops.as_slice()),
            _ => return self.push_factor(ctx, term, exp),
        };
        match (op, ops) {
            (Operator::Multiply, _) => {
                for &factor in ops {
                    self.mul_pow(ctx, factor, exp);
                }
            }
            (Operator::Divide, &[num, den]) => {
                self.mul_pow(ctx, num, exp);
                self.mul_pow(ctx, den, &-exp);
            }
            (Operator::Negate, &[inner]) => {
                if is_odd(exp) {
                    self.coefficient = self.coefficient.neg();
                }
                self.mul_pow(ctx, inner, exp);
            }
            (Operator::Power, &[base, power]) => {
                match ctx.as_number(power).and_then(NumericValue::as_rational) {
                    Some(r) => self.mul_pow(ctx, base, &(exp * r)),
                    None => self.push_factor(ctx, term, exp),
                }
            }
            (Operator::Sqrt, &[radicand]) => {
                self.mul_pow(ctx, radicand, &(exp * &Rational::half()));
            }
            (Operator::Root, &[radicand, index]) => {
                let scaled = ctx
                    .as_number(index)
                    .and_then(NumericValue::as_rational)
                    .and_then(|n| exp.checked_div(n));
                match scaled {
                    Some(e) => self.mul_pow(ctx, radicand, &e),
                    None => self.push_factor(ctx, term, exp),
                }
            }
            _ => self.push_factor(ctx, term, exp),
        }
    }

    fn mul_number(&mut self, ctx: &Context, term: ExprId, n: &NumericValue, exp: &Rational) {
        if n.is_nan() {
            self.coefficient = NumericValue::nan();
            return;
        }
        // A zero coefficient absorbs everything except infinities.
        if self.coefficient.is_zero() {
            if n.is_infinity() || (n.is_zero() && exp.is_negative()) {
                self.coefficient = NumericValue::nan();
            }
            return;
        }
        let e = NumericValue::from_rational(exp.clone());
        let value = n.pow(&e);
        if exp.is_integer() || value.is_exact() || !n.is_exact() {
            self.coefficient = self.coefficient.mul(&value);
        } else {
            // 2^(1/3) and friends stay symbolic.
            self.push_factor(ctx, term, exp);
        }
    }

    fn push_factor(&mut self, ctx: &Context, term: ExprId, exp: &Rational) {
        if let Some(entry) = self.factors.iter_mut().find(|(base, _)| *base == term) {
            let merged = &entry.1 + exp;
            // Cancelling a constant expression could hide 0/0.
            if !(merged.is_zero() && is_constant_expression(ctx, term)) {
                entry.1 = merged;
                return;
            }
        }
        self.factors.push((term, exp.clone()));
    }

    /// Bases grouped by exponent, in ascending exponent order. Cancelled
    /// factors (exponent zero) are left out.
    pub fn grouped_by_degrees(&self) -> Vec<(Rational, Vec<ExprId>)> {
        let mut groups: Vec<(Rational, Vec<ExprId>)> = Vec::new();
        for (base, exp) in &self.factors {
            if exp.is_zero() {
                continue;
            }
            match groups.iter_mut().find(|(degree, _)| degree == exp) {
                Some((_, bases)) => bases.push(*base),
                None => groups.push((exp.clone(), vec![*base])),
            }
        }
        groups.sort_by(|a, b| a.0.cmp(&b.0));
        groups
    }

    /// Split into `(numerator, denominator)`.
    ///
    /// Positive powers and the numerator of a rational coefficient go above
    /// the line; negative powers (as positive powers) and the coefficient's
    /// denominator go below. Other coefficients stay in the numerator, signed.
    pub fn as_numerator_denominator(mut self, ctx: &mut Context) -> (ExprId, ExprId) {
        let (negative, numer, denom) = self.split(ctx);
        let numer = if negative {
            canonical_negate(ctx, numer)
        } else {
            numer
        };
        (numer, denom)
    }

    /// Build the canonical expression for the accumulated product.
    ///
    /// With a symbolic denominator the result is a `Divide` of the two halves
    /// of [`Self::as_numerator_denominator`]; otherwise the coefficient
    /// multiplies the powers, and a lone `±1/a` stays the power `±a^-1`.
    pub fn as_expression(mut self, ctx: &mut Context) -> ExprId {
        if self.coefficient.is_nan() {
            return ctx.nan();
        }
        if self.coefficient.is_zero() {
            return ctx.zero();
        }
        let groups = self.grouped_by_degrees();
        let has_denominator = groups.iter().any(|(exp, _)| exp.is_negative());
        let has_numerator = groups.iter().any(|(exp, _)| exp.is_positive());
        let unit = self.coefficient.is_one() || self.coefficient.is_negative_one();

        if !has_denominator || (!has_numerator && unit) {
            let mut factors = Vec::new();
            for (exp, bases) in groups {
                for base in bases {
                    factors.extend(self.power(ctx, base, &exp, false));
                }
            }
            if self.coefficient.is_nan() {
                return ctx.nan();
            }
            if self.coefficient.is_zero() {
                return ctx.zero();
            }
            return assemble(ctx, &self.coefficient, factors);
        }

        let (negative, numer, denom) = self.split(ctx);
        if ctx.as_number(numer).map_or(false, NumericValue::is_nan) {
            return ctx.nan();
        }
        let quotient = if ctx.as_number(denom).map_or(false, NumericValue::is_one) {
            numer
        } else {
            build(ctx, Operator::Divide, vec![numer, denom])
        };
        if !negative {
            quotient
        } else if ctx.is_function(quotient, Operator::Divide) {
            build(ctx, Operator::Negate, vec![quotient])
        } else {
            canonical_negate(ctx, quotient)
        }
    }

    /// `(negative, |numerator|, denominator)` as described in
    /// [`Self::as_numerator_denominator`].
    fn split(&mut self, ctx: &mut Context) -> (bool, ExprId, ExprId) {
        if self.coefficient.is_nan() {
            return (false, ctx.nan(), ctx.one());
        }
        let mut above = Vec::new();
        let mut below = Vec::new();
        for (exp, bases) in self.grouped_by_degrees() {
            for base in bases {
                if exp.is_positive() {
                    above.extend(self.power(ctx, base, &exp, false));
                } else {
                    below.extend(self.power(ctx, base, &-&exp, true));
                }
            }
        }
        self.factors.clear();
        if self.coefficient.is_nan() {
            return (false, ctx.nan(), ctx.one());
        }
        if self.coefficient.is_zero() {
            return (false, ctx.zero(), ctx.one());
        }

        let negative = self.coefficient.is_negative();
        let magnitude = if negative {
            self.coefficient.neg()
        } else {
            self.coefficient.clone()
        };
        let (c_above, c_below) = match magnitude.as_rational() {
            Some(r) => (
                NumericValue::from_bigint(r.numer()),
                NumericValue::from_bigint(r.denom()),
            ),
            None => (magnitude.clone(), NumericValue::one()),
        };
        let numer = assemble(ctx, &c_above, above);
        let denom = assemble(ctx, &c_below, below);
        (negative, numer, denom)
    }

    /// `base^exp` as a factor; numeric results and signs fold into the
    /// coefficient (dividing it when the factor sits `below` the line).
    fn power(&mut self, ctx: &mut Context, base: ExprId, exp: &Rational, below: bool) -> Option<ExprId> {
        let exp = ctx.num(NumericValue::from_rational(exp.clone()));
        let mut factor = canonical_power(ctx, base, exp);
        if let Some(n) = ctx.as_number(factor) {
            self.coefficient = if below {
                self.coefficient.div(n)
            } else {
                self.coefficient.mul(n)
            };
            return None;
        }
        if let Expr::Function(Operator::Negate, ops) = ctx.get(factor) {
            if let [inner] = ops.as_slice() {
                self.coefficient = self.coefficient.neg();
                factor = *inner;
            }
        }
        Some(factor)
    }
}

fn is_odd(exp: &Rational) -> bool {
    exp.as_integer().map_or(false, |n| n.bit(0))
}

fn multiply_all(ctx: &mut Context, mut factors: Vec<ExprId>) -> ExprId {
    if factors.len() == 1 {
        return factors[0];
    }
    sort_operands(ctx, &mut factors);
    build(ctx, Operator::Multiply, factors)
}

/// `coefficient * factors`, with a coefficient of -1 written as negation.
fn assemble(ctx: &mut Context, coefficient: &NumericValue, mut factors: Vec<ExprId>) -> ExprId {
    if factors.is_empty() {
        return ctx.num(coefficient.clone());
    }
    sort_operands(ctx, &mut factors);
    if coefficient.is_one() {
        return multiply_all(ctx, factors);
    }
    if coefficient.is_negative_one() {
        let inner = multiply_all(ctx, factors);
        if ctx.is_function(inner, Operator::Add) {
            return canonical_negate(ctx, inner);
        }
        return build(ctx, Operator::Negate, vec![inner]);
    }
    let mut ops = Vec::with_capacity(factors.len() + 1);
    ops.push(ctx.num(coefficient.clone()));
    ops.extend(factors);
    build(ctx, Operator::Multiply, ops)
}
