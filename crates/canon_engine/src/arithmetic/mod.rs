//! Canonical forms of the arithmetic operators.
//!
//! Every function here takes operands that are already canonical and returns
//! a canonical expression. Nodes created along the way are marked canonical
//! directly so they never go through the boxing pipeline again.

mod add;
mod divide;
mod multiply;
mod power;
mod product;

pub use add::{canonical_add, canonical_subtract};
pub use divide::canonical_divide;
pub use multiply::{canonical_multiply, canonical_negate};
pub use power::{canonical_power, canonical_root};
pub use product::Product;

use canon_ast::{Context, Expr, ExprId, Operator};
use canon_numeric::NumericValue;

/// Function node that is canonical by construction.
pub(crate) fn build(ctx: &mut Context, op: Operator, ops: Vec<ExprId>) -> ExprId {
    let id = ctx.function(op, ops);
    ctx.mark_canonical(id);
    id
}

/// Split a canonical expression into its numeric coefficient and the rest.
///
/// `3*x*y` gives `(3, x*y)`, `-x` gives `(-1, x)` and a literal `n` gives
/// `(n, 1)`. Anything else has coefficient 1.
pub fn to_numeric_value(ctx: &mut Context, id: ExprId) -> (NumericValue, ExprId) {
    match ctx.get(id).clone() {
        Expr::Number(n) => (n, ctx.one()),
        Expr::Function(Operator::Negate, ops) if ops.len() == 1 => {
            let (coefficient, rest) = to_numeric_value(ctx, ops[0]);
            (coefficient.neg(), rest)
        }
        Expr::Function(Operator::Multiply, ops) => {
            let mut coefficient = NumericValue::one();
            let mut rest = Vec::with_capacity(ops.len());
            for op in ops {
                match ctx.as_number(op) {
                    Some(n) => coefficient = coefficient.mul(n),
                    None => rest.push(op),
                }
            }
            let rest = match rest.len() {
                0 => ctx.one(),
                1 => rest[0],
                _ => build(ctx, Operator::Multiply, rest),
            };
            (coefficient, rest)
        }
        _ => (NumericValue::one(), id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_coefficients() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let y = ctx.var("y");
        let three = ctx.integer(3);
        let term = build(&mut ctx, Operator::Multiply, vec![three, x, y]);
        let (c, rest) = to_numeric_value(&mut ctx, term);
        assert_eq!(c, NumericValue::from_integer(3));
        assert_eq!(ctx.display(rest).to_string(), "x*y");

        let neg = build(&mut ctx, Operator::Negate, vec![x]);
        assert_eq!(
            to_numeric_value(&mut ctx, neg),
            (NumericValue::negative_one(), x)
        );

        let half = ctx.half();
        let one = ctx.one();
        assert_eq!(to_numeric_value(&mut ctx, half), (NumericValue::half(), one));
    }
}
