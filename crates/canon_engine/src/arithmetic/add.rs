use super::{build, canonical_multiply, canonical_negate, to_numeric_value};
use canon_ast::traversal::is_constant_expression;
use canon_ast::{sort_terms, Context, ExprId, Operator};
use canon_numeric::NumericValue;

struct Term {
    rest: ExprId,
    coefficient: NumericValue,
    /// Constant expressions are never combined with other terms.
    mergeable: bool,
}

/// Canonical sum.
///
/// Nested sums are flattened, literal zeros dropped, number literals folded
/// into trailing constants and like terms collected (`2x + x` → `3x`).
/// The remaining terms are sorted in polynomial order.
pub fn canonical_add(ctx: &mut Context, ops: &[ExprId]) -> ExprId {
    let mut flat = Vec::with_capacity(ops.len());
    for &op in ops {
        if ctx.is_function(op, Operator::Add) {
            flat.extend_from_slice(ctx.ops(op));
        } else {
            flat.push(op);
        }
    }

    let mut constants: Vec<NumericValue> = Vec::new();
    let mut terms: Vec<Term> = Vec::new();
    for op in flat {
        if let Some(n) = ctx.as_number(op) {
            if n.is_nan() {
                return ctx.nan();
            }
            add_constant(&mut constants, n);
            continue;
        }
        if is_constant_expression(ctx, op) {
            terms.push(Term {
                rest: op,
                coefficient: NumericValue::one(),
                mergeable: false,
            });
            continue;
        }
        let (coefficient, rest) = to_numeric_value(ctx, op);
        match terms.iter_mut().find(|t| t.mergeable && t.rest == rest) {
            Some(term) => term.coefficient = term.coefficient.add(&coefficient),
            None => terms.push(Term {
                rest,
                coefficient,
                mergeable: true,
            }),
        }
    }
    if constants.iter().any(NumericValue::is_nan) {
        return ctx.nan();
    }

    let mut result = Vec::with_capacity(terms.len() + 1);
    for term in terms {
        if term.coefficient.is_zero() {
            continue;
        }
        result.push(scale(ctx, &term.coefficient, term.rest));
    }
    constants.retain(|c| !c.is_zero());
    if constants.is_empty() && result.is_empty() {
        return ctx.zero();
    }
    for c in constants {
        result.push(ctx.num(c));
    }
    if result.len() == 1 {
        return result[0];
    }
    sort_terms(ctx, &mut result);
    build(ctx, Operator::Add, result)
}

/// Fold `n` into the first constant it adds to without losing exactness;
/// `√2 + 1/3` stays two constants.
fn add_constant(constants: &mut Vec<NumericValue>, n: &NumericValue) {
    for c in constants.iter_mut() {
        let sum = c.add(n);
        if sum.is_exact() || !c.is_exact() || !n.is_exact() {
            *c = sum;
            return;
        }
    }
    constants.push(n.clone());
}

fn scale(ctx: &mut Context, coefficient: &NumericValue, rest: ExprId) -> ExprId {
    if coefficient.is_one() {
        rest
    } else if coefficient.is_negative_one() {
        canonical_negate(ctx, rest)
    } else {
        let c = ctx.num(coefficient.clone());
        canonical_multiply(ctx, &[c, rest])
    }
}

/// `a - b - c ...` as a canonical sum; a single operand is negated.
pub fn canonical_subtract(ctx: &mut Context, ops: &[ExprId]) -> ExprId {
    match ops {
        [] => ctx.zero(),
        [a] => canonical_negate(ctx, *a),
        [first, rest @ ..] => {
            let mut terms = Vec::with_capacity(ops.len());
            terms.push(*first);
            for &op in rest {
                terms.push(canonical_negate(ctx, op));
            }
            canonical_add(ctx, &terms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(ctx: &Context, id: ExprId) -> String {
        ctx.display(id).to_string()
    }

    #[test]
    fn folds_numbers_and_collects_terms() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let one = ctx.one();
        let half = ctx.half();
        let two = ctx.two();
        let two_x = canonical_multiply(&mut ctx, &[two, x]);
        let sum = canonical_add(&mut ctx, &[one, x, half, two_x]);
        assert_eq!(show(&ctx, sum), "3*x + 3/2");
    }

    #[test]
    fn cancels_to_zero_and_drops_zeros() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let zero = ctx.zero();
        let diff = canonical_subtract(&mut ctx, &[x, x]);
        assert_eq!(diff, ctx.zero());
        let same = canonical_add(&mut ctx, &[zero, x]);
        assert_eq!(same, x);
    }

    #[test]
    fn polynomial_order() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let one = ctx.one();
        let two = ctx.two();
        let x2 = build(&mut ctx, Operator::Power, vec![x, two]);
        let sum = canonical_add(&mut ctx, &[one, x, x2]);
        assert_eq!(show(&ctx, sum), "x^2 + x + 1");
    }

    #[test]
    fn constant_expressions_are_not_cancelled() {
        let mut ctx = Context::new();
        let one = ctx.one();
        let sin1 = build(&mut ctx, Operator::Sin, vec![one]);
        let diff = canonical_subtract(&mut ctx, &[sin1, sin1]);
        assert!(ctx.is_function(diff, Operator::Add));
        assert_eq!(ctx.ops(diff).len(), 2);
    }

    #[test]
    fn nan_propagates() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let nan = ctx.nan();
        assert_eq!(canonical_add(&mut ctx, &[x, nan]), ctx.nan());
        let inf = ctx.positive_infinity();
        let ninf = ctx.negative_infinity();
        assert_eq!(canonical_add(&mut ctx, &[inf, ninf]), ctx.nan());
    }
}
