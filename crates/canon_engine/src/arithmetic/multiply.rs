use super::{build, canonical_add, Product};
use canon_ast::{Context, Expr, ExprId, Operator};

/// Canonical product: numbers fold into one leading coefficient, like
/// bases merge exponents and a remaining denominator becomes a `Divide`.
pub fn canonical_multiply(ctx: &mut Context, ops: &[ExprId]) -> ExprId {
    match ops {
        [] => return ctx.one(),
        [single] => return *single,
        _ => {}
    }
    let mut product = Product::new();
    for &op in ops {
        product.mul(ctx, op);
    }
    product.as_expression(ctx)
}

/// Canonical negation. Distributes over sums and folds into numeric
/// coefficients: `-(x + 1)` → `-x - 1`, `-(2x)` → `-2x`.
pub fn canonical_negate(ctx: &mut Context, x: ExprId) -> ExprId {
    match ctx.get(x).clone() {
        Expr::Number(n) => ctx.num(n.neg()),
        Expr::Function(Operator::Negate, ops) if ops.len() == 1 => ops[0],
        Expr::Function(Operator::Add, ops) => {
            let negated: Vec<ExprId> = ops.iter().map(|&op| canonical_negate(ctx, op)).collect();
            canonical_add(ctx, &negated)
        }
        Expr::Function(Operator::Multiply | Operator::Divide, _) => {
            let minus_one = ctx.negative_one();
            canonical_multiply(ctx, &[minus_one, x])
        }
        _ => build(ctx, Operator::Negate, vec![x]),
    }
}
