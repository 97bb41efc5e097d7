//! Expression cost used to accept or reject rewrites.

use canon_ast::{Context, Expr, ExprId, Operator};
use canon_numeric::NumericValue;
use std::sync::Arc;

pub type CostFunction = Arc<dyn Fn(&Context, ExprId) -> f64 + Send + Sync>;

fn number_cost(n: &NumericValue) -> f64 {
    if n.is_zero() || n.is_one() || n.is_negative_one() {
        return 1.0;
    }
    if let Some(k) = n.as_i64() {
        // one unit per decimal digit
        return (k.unsigned_abs() as f64).log10().floor() + 1.0;
    }
    if n.is_rational() {
        return 3.0;
    }
    if n.is_exact() {
        return 4.0;
    }
    if n.is_complex() {
        return 5.0;
    }
    2.0
}

fn node_cost(ctx: &Context, node: &Expr) -> f64 {
    match node {
        Expr::Number(n) => number_cost(n),
        Expr::Symbol(_) | Expr::String(_) => 1.0,
        Expr::Dictionary(entries) => 1.0 + entries.len() as f64,
        Expr::Function(op, ops) => match op {
            Operator::Add | Operator::Multiply => (ops.len().max(2) - 1) as f64,
            Operator::Negate => 1.0,
            Operator::Divide => 2.0,
            Operator::Power => match ops.get(1).and_then(|e| ctx.as_number(*e)) {
                Some(n) if n.is_integer() => 1.0,
                _ => 2.0,
            },
            Operator::Sqrt | Operator::Abs => 2.0,
            Operator::Root => 3.0,
            _ => 3.0,
        },
    }
}

/// Complexity-weighted node count: every node contributes a weight that
/// grows with how much it costs to read (literal size, operator kind).
pub fn default_cost(ctx: &Context, root: ExprId) -> f64 {
    let mut total = 0.0;
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let node = ctx.get(id);
        total += node_cost(ctx, node);
        if let Expr::Function(_, ops) = node {
            stack.extend(ops.iter().copied());
        } else if let Expr::Dictionary(entries) = node {
            stack.extend(entries.iter().map(|(_, v)| *v));
        }
    }
    total
}
