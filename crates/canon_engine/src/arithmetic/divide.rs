use super::{build, canonical_multiply, canonical_negate, canonical_power, Product};
use canon_ast::traversal::is_constant_expression;
use canon_ast::{Context, Expr, ExprId, Operator};
use canon_numeric::{ExactValue, NumericValue, Rational};

/// Canonical quotient `num / den`.
///
/// In order: NaN and division by zero, `(-a)/(-b)`, nested quotients, the
/// identities `a/1`, `a/-1` and `1/a`, `a/a`, quotients of square roots of
/// literals, and finally the general product with a negative power.
pub fn canonical_divide(ctx: &mut Context, num: ExprId, den: ExprId) -> ExprId {
    let n = ctx.as_number(num).cloned();
    let d = ctx.as_number(den).cloned();
    if n.as_ref().map_or(false, NumericValue::is_nan) || d.as_ref().map_or(false, NumericValue::is_nan) {
        return ctx.nan();
    }
    let num_is_zero = n.as_ref().map_or(false, NumericValue::is_zero);
    if d.as_ref().map_or(false, NumericValue::is_zero) {
        return if num_is_zero {
            ctx.nan()
        } else {
            ctx.complex_infinity()
        };
    }
    if num_is_zero {
        if is_constant_expression(ctx, den) {
            return build(ctx, Operator::Divide, vec![num, den]);
        }
        return ctx.zero();
    }

    if let (Some(a), Some(b)) = (negated(ctx, num), negated(ctx, den)) {
        return canonical_divide(ctx, a, b);
    }

    match (quotient(ctx, num), quotient(ctx, den)) {
        (Some((a, b)), Some((c, d))) => {
            let numer = canonical_multiply(ctx, &[a, d]);
            let denom = canonical_multiply(ctx, &[b, c]);
            return canonical_divide(ctx, numer, denom);
        }
        (Some((a, b)), None) => {
            let denom = canonical_multiply(ctx, &[b, den]);
            return canonical_divide(ctx, a, denom);
        }
        (None, Some((b, c))) => {
            let numer = canonical_multiply(ctx, &[num, c]);
            return canonical_divide(ctx, numer, b);
        }
        (None, None) => {}
    }

    if let Some(d) = &d {
        if d.is_one() {
            return num;
        }
        if d.is_negative_one() {
            return canonical_negate(ctx, num);
        }
    }
    if n.as_ref().map_or(false, NumericValue::is_one) && d.is_none() {
        let minus_one = ctx.negative_one();
        return canonical_power(ctx, den, minus_one);
    }

    if num == den {
        if is_constant_expression(ctx, num) {
            return build(ctx, Operator::Divide, vec![num, den]);
        }
        return ctx.one();
    }

    if let Some(value) = radical_quotient(ctx, num, den) {
        return ctx.num(NumericValue::from_exact(value));
    }

    if let (Some(n), Some(d)) = (&n, &d) {
        return ctx.num(n.div(d));
    }

    let mut product = Product::new();
    product.mul(ctx, num);
    product.div(ctx, den);
    product.as_expression(ctx)
}

fn negated(ctx: &Context, id: ExprId) -> Option<ExprId> {
    match ctx.get(id) {
        Expr::Function(Operator::Negate, ops) if ops.len() == 1 => Some(ops[0]),
        _ => None,
    }
}

fn quotient(ctx: &Context, id: ExprId) -> Option<(ExprId, ExprId)> {
    match ctx.get(id) {
        Expr::Function(Operator::Divide, ops) if ops.len() == 2 => Some((ops[0], ops[1])),
        _ => None,
    }
}

/// `(value, is_root)` for an exact rational literal or the square root of one.
fn radical_part(ctx: &Context, id: ExprId) -> Option<(Rational, bool)> {
    match ctx.get(id) {
        Expr::Number(n) => n.as_rational().map(|r| (r.clone(), false)),
        Expr::Function(Operator::Sqrt, ops) if ops.len() == 1 => ctx
            .as_number(ops[0])
            .and_then(NumericValue::as_rational)
            .filter(|r| !r.is_negative())
            .map(|r| (r.clone(), true)),
        _ => None,
    }
}

/// `√a/√b`, `√a/b` and `a/√b` as `±√(q)`, when that root is exact.
fn radical_quotient(ctx: &Context, num: ExprId, den: ExprId) -> Option<ExactValue> {
    let (a, a_root) = radical_part(ctx, num)?;
    let (b, b_root) = radical_part(ctx, den)?;
    if !a_root && !b_root {
        return None;
    }
    let square = |r: &Rational, is_root: bool| if is_root { r.clone() } else { r * r };
    let negative = (!a_root && a.is_negative()) != (!b_root && b.is_negative());
    let q = square(&a, a_root).checked_div(&square(&b, b_root))?;
    let root = ExactValue::from_rational(q).sqrt()?;
    Some(if negative { root.neg() } else { root })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(ctx: &Context, id: ExprId) -> String {
        ctx.display(id).to_string()
    }

    #[test]
    fn division_by_zero() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let zero = ctx.zero();
        let one = ctx.one();
        assert_eq!(canonical_divide(&mut ctx, zero, zero), ctx.nan());
        assert_eq!(canonical_divide(&mut ctx, one, zero), ctx.complex_infinity());
        assert_eq!(canonical_divide(&mut ctx, x, zero), ctx.complex_infinity());
        assert_eq!(canonical_divide(&mut ctx, zero, x), ctx.zero());
    }

    #[test]
    fn signs_and_identities() {
        let mut ctx = Context::new();
        let a = ctx.var("a");
        let b = ctx.var("b");
        let na = canonical_negate(&mut ctx, a);
        let nb = canonical_negate(&mut ctx, b);
        let q = canonical_divide(&mut ctx, na, nb);
        assert_eq!(show(&ctx, q), "a/b");
        let one = ctx.one();
        let inv = canonical_divide(&mut ctx, one, a);
        assert_eq!(show(&ctx, inv), "a^(-1)");
        assert_eq!(canonical_divide(&mut ctx, a, a), ctx.one());
        let m1 = ctx.negative_one();
        assert_eq!(canonical_divide(&mut ctx, a, m1), na);
    }

    #[test]
    fn nested_quotients() {
        let mut ctx = Context::new();
        let a = ctx.var("a");
        let b = ctx.var("b");
        let c = ctx.var("c");
        let ab = canonical_divide(&mut ctx, a, b);
        let q = canonical_divide(&mut ctx, ab, c);
        assert_eq!(show(&ctx, q), "a/(b*c)");
    }

    #[test]
    fn numeric_coefficient_stays_in_front() {
        let mut ctx = Context::new();
        let pi = ctx.pi();
        let four = ctx.integer(4);
        let q = canonical_divide(&mut ctx, pi, four);
        assert_eq!(show(&ctx, q), "1/4*Pi");
        assert!(ctx.is_function(q, Operator::Multiply));
    }

    #[test]
    fn constant_expression_over_itself_is_kept() {
        let mut ctx = Context::new();
        let two = ctx.two();
        let sin2 = build(&mut ctx, Operator::Sin, vec![two]);
        let q = canonical_divide(&mut ctx, sin2, sin2);
        assert!(ctx.is_function(q, Operator::Divide));
    }

    #[test]
    fn radicals() {
        let mut ctx = Context::new();
        let big = ctx.num(NumericValue::from_integer(8_000_012));
        let small = ctx.num(NumericValue::from_integer(2_000_003));
        let big_root = build(&mut ctx, Operator::Sqrt, vec![big]);
        let small_root = build(&mut ctx, Operator::Sqrt, vec![small]);
        let q = canonical_divide(&mut ctx, big_root, small_root);
        assert_eq!(q, ctx.two());

        let two = ctx.two();
        let r8 = ctx.num(NumericValue::from_integer(8).sqrt());
        let q = canonical_divide(&mut ctx, r8, two);
        assert_eq!(ctx.as_number(q), Some(&NumericValue::two().sqrt()));
    }
}
