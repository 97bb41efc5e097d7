use super::{build, canonical_divide, canonical_multiply, canonical_negate};
use canon_ast::{Context, Expr, ExprId, Operator};
use canon_numeric::{NumericValue, Rational};

/// Canonical power `base^exp`.
///
/// Numeric powers are folded when the result stays exact (or either side is
/// already inexact); `a^(1/n)` becomes a root; integer exponents distribute
/// over products, quotients, negations and nested powers.
pub fn canonical_power(ctx: &mut Context, base: ExprId, exp: ExprId) -> ExprId {
    let b = ctx.as_number(base).cloned();
    let e = ctx.as_number(exp).cloned();
    if b.as_ref().map_or(false, NumericValue::is_nan) || e.as_ref().map_or(false, NumericValue::is_nan) {
        return ctx.nan();
    }
    if let Some(e) = &e {
        if e.is_zero() {
            // 0^0 is indeterminate here; the runtime convention 0^0 = 1
            // belongs to NumericValue::pow.
            return if b.as_ref().map_or(false, NumericValue::is_zero) {
                ctx.nan()
            } else {
                ctx.one()
            };
        }
        if e.is_one() {
            return base;
        }
    }
    if let Some(b) = &b {
        if b.is_zero() {
            return match e.as_ref().map(|e| e.sign()) {
                Some(Some(1)) => ctx.zero(),
                Some(Some(-1)) => ctx.complex_infinity(),
                Some(_) => ctx.nan(),
                None => build(ctx, Operator::Power, vec![base, exp]),
            };
        }
        if b.is_one() {
            return match &e {
                Some(e) => ctx.num(b.pow(e)),
                None => ctx.one(),
            };
        }
    }

    if let (Some(b), Some(e)) = (&b, &e) {
        let value = b.pow(e);
        if value.is_exact() || !b.is_exact() || !e.is_exact() {
            return ctx.num(value);
        }
    }

    let exponent = e.as_ref().and_then(NumericValue::as_rational).cloned();
    if let Some(r) = &exponent {
        if let Some((1, q)) = r.as_machine() {
            if let Ok(q) = u32::try_from(q) {
                return canonical_root(ctx, base, q);
            }
        }
    }

    if let Some(n) = exponent.as_ref().filter(|r| r.is_integer()) {
        if let Some(result) = distribute(ctx, base, exp, n) {
            return result;
        }
    }

    build(ctx, Operator::Power, vec![base, exp])
}

/// `(a^b)^n`, `√a^n`, `(a*b)^n`, `(a/b)^n`, `(-a)^n` and `i^n` for integer `n`.
fn distribute(ctx: &mut Context, base: ExprId, exp: ExprId, n: &Rational) -> Option<ExprId> {
    let result = match ctx.get(base).clone() {
        Expr::Function(Operator::Power, ops) if ops.len() == 2 => {
            let product = canonical_multiply(ctx, &[ops[1], exp]);
            canonical_power(ctx, ops[0], product)
        }
        Expr::Function(Operator::Sqrt, ops) if ops.len() == 1 => {
            let half = n * &Rational::half();
            let e = ctx.num(NumericValue::from_rational(half));
            canonical_power(ctx, ops[0], e)
        }
        Expr::Function(Operator::Root, ops) if ops.len() == 2 => {
            let index = ctx.as_number(ops[1]).and_then(NumericValue::as_rational)?;
            let scaled = n.checked_div(index)?;
            let e = ctx.num(NumericValue::from_rational(scaled));
            canonical_power(ctx, ops[0], e)
        }
        Expr::Function(Operator::Multiply, ops) => {
            let factors: Vec<ExprId> = ops.iter().map(|&op| canonical_power(ctx, op, exp)).collect();
            canonical_multiply(ctx, &factors)
        }
        Expr::Function(Operator::Divide, ops) if ops.len() == 2 => {
            let numer = canonical_power(ctx, ops[0], exp);
            let denom = canonical_power(ctx, ops[1], exp);
            canonical_divide(ctx, numer, denom)
        }
        Expr::Function(Operator::Negate, ops) if ops.len() == 1 => {
            let p = canonical_power(ctx, ops[0], exp);
            if n.as_integer().map_or(false, |k| k.bit(0)) {
                canonical_negate(ctx, p)
            } else {
                p
            }
        }
        Expr::Symbol(_) if base == ctx.imaginary_unit() => {
            match n.as_i64()?.rem_euclid(4) {
                0 => ctx.one(),
                1 => base,
                2 => ctx.negative_one(),
                _ => canonical_negate(ctx, base),
            }
        }
        _ => return None,
    };
    Some(result)
}

/// Canonical `n`-th root.
///
/// Exact roots of literals are evaluated (`√12` → `2√3`), the square root of
/// a negative rational becomes an imaginary multiple, and anything else is
/// kept as `Sqrt(x)` or `Root(x, n)`.
pub fn canonical_root(ctx: &mut Context, base: ExprId, n: u32) -> ExprId {
    match n {
        0 => return ctx.nan(),
        1 => return base,
        _ => {}
    }
    if let Some(b) = ctx.as_number(base).cloned() {
        if b.is_exact() && b.is_negative() && n % 2 == 0 {
            if n == 2 {
                let positive = ctx.num(b.neg());
                let root = canonical_root(ctx, positive, 2);
                let i = ctx.imaginary_unit();
                return canonical_multiply(ctx, &[root, i]);
            }
        } else {
            let value = b.root(n);
            if value.is_exact() || !b.is_exact() {
                return ctx.num(value);
            }
        }
    }
    if n == 2 {
        build(ctx, Operator::Sqrt, vec![base])
    } else {
        let index = ctx.num(NumericValue::from_integer(i64::from(n)));
        build(ctx, Operator::Root, vec![base, index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(ctx: &Context, id: ExprId) -> String {
        ctx.display(id).to_string()
    }

    #[test]
    fn nested_powers_multiply_exponents() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let two = ctx.two();
        let three = ctx.integer(3);
        let x2 = canonical_power(&mut ctx, x, two);
        let x6 = canonical_power(&mut ctx, x2, three);
        assert_eq!(show(&ctx, x6), "x^6");
    }

    #[test]
    fn zero_and_one_exponents() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let zero = ctx.zero();
        let one = ctx.one();
        assert_eq!(canonical_power(&mut ctx, x, zero), ctx.one());
        assert_eq!(canonical_power(&mut ctx, x, one), x);
        assert_eq!(canonical_power(&mut ctx, zero, zero), ctx.nan());
        let m1 = ctx.negative_one();
        assert_eq!(canonical_power(&mut ctx, zero, m1), ctx.complex_infinity());
    }

    #[test]
    fn roots() {
        let mut ctx = Context::new();
        let twelve = ctx.integer(12);
        let r = canonical_root(&mut ctx, twelve, 2);
        assert_eq!(ctx.as_number(r), Some(&NumericValue::from_integer(12).sqrt()));
        assert!(ctx.as_number(r).map_or(false, NumericValue::is_exact));

        let two = ctx.two();
        let cube = canonical_root(&mut ctx, two, 3);
        assert_eq!(show(&ctx, cube), "root(2, 3)");

        let minus_four = ctx.integer(-4);
        let r = canonical_root(&mut ctx, minus_four, 2);
        assert_eq!(show(&ctx, r), "2*ImaginaryUnit");

        let half = ctx.half();
        let x = ctx.var("x");
        let sqrt_x = canonical_power(&mut ctx, x, half);
        assert_eq!(show(&ctx, sqrt_x), "sqrt(x)");
        let squared = canonical_power(&mut ctx, sqrt_x, two);
        assert_eq!(squared, x);
    }

    #[test]
    fn distributes_integer_exponents() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let two = ctx.two();
        let three = ctx.integer(3);
        let two_x = canonical_multiply(&mut ctx, &[two, x]);
        let cubed = canonical_power(&mut ctx, two_x, three);
        assert_eq!(show(&ctx, cubed), "8*x^3");

        let neg = canonical_negate(&mut ctx, x);
        let sq = canonical_power(&mut ctx, neg, two);
        assert_eq!(show(&ctx, sq), "x^2");
        let cb = canonical_power(&mut ctx, neg, three);
        assert_eq!(show(&ctx, cb), "-x^3");

        let i = ctx.imaginary_unit();
        assert_eq!(canonical_power(&mut ctx, i, two), ctx.negative_one());
    }

    #[test]
    fn symbolic_exponents_are_kept() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let y = ctx.var("y");
        let two = ctx.two();
        let x2 = canonical_power(&mut ctx, x, two);
        let p = canonical_power(&mut ctx, x2, y);
        assert_eq!(show(&ctx, p), "(x^2)^y");
    }
}
