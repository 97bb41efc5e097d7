//! Canonical order of expressions.
//!
//! [`compare_expr`] is a strict total order consistent with structural
//! equality: it returns `Equal` only for identical ids. Nodes are bucketed by
//! rank first (numbers, rationals, radicals, complex numbers, constants,
//! symbols, products, sums, transcendental functions, other functions,
//! powers, strings, dictionaries, everything else); within a rank each kind
//! has its own tie-break.
//!
//! [`polynomial_order`] arranges the terms of a sum by decreasing total degree
//! with numeric terms last, so `1 + x + x^2` and `x^2 + x + 1` sort alike.
//! Terms of equal degree are in graded reverse-lexicographic order:
//! `x^2 + x*y + y^2`.
//!
//! Both comparators recurse on children; expressions nested deeper than a few
//! thousand levels are not supported.

use crate::context::Context;
use crate::expr::{Expr, ExprId};
use crate::operator::{Operator, OperatorClass};
use crate::traversal::leaf_count;
use canon_numeric::{NumericValue, Rational};
use std::cmp::Ordering;

pub fn compare_expr(ctx: &Context, a: ExprId, b: ExprId) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let rank_a = get_rank(ctx, a);
    let rank_b = get_rank(ctx, b);
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (ctx.get(a), ctx.get(b)) {
        (Expr::Number(n1), Expr::Number(n2)) => compare_numbers(n1, n2),
        (Expr::Symbol(s1), Expr::Symbol(s2)) => ctx.symbol_name(*s1).cmp(ctx.symbol_name(*s2)),
        (Expr::String(s1), Expr::String(s2)) => s1.cmp(s2),
        (Expr::Dictionary(d1), Expr::Dictionary(d2)) => d1
            .len()
            .cmp(&d2.len())
            .then_with(|| {
                d1.iter()
                    .zip(d2.iter())
                    .map(|((k1, v1), (k2, v2))| {
                        k1.cmp(k2).then_with(|| compare_expr(ctx, *v1, *v2))
                    })
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            }),
        (Expr::Function(op1, args1), Expr::Function(op2, args2)) => {
            compare_functions(ctx, (*op1, args1.as_slice()), (*op2, args2.as_slice()))
        }
        // Ranks separate every other combination.
        _ => Ordering::Equal,
    }
}

fn get_rank(ctx: &Context, id: ExprId) -> u8 {
    match ctx.get(id) {
        Expr::Number(n) => match n.as_exact() {
            Some(e) if e.is_integer() => 0,
            Some(e) if e.is_rational() => 1,
            Some(_) => 2,
            None if n.is_complex() => 3,
            None => 0,
        },
        Expr::Symbol(s) => {
            if ctx.is_constant_symbol(*s) {
                4
            } else {
                5
            }
        }
        Expr::Function(op, _) => match op.class() {
            OperatorClass::Product => 6,
            OperatorClass::Sum => 7,
            OperatorClass::Transcendental => 8,
            OperatorClass::Other => match op {
                Operator::Error | Operator::Sequence | Operator::Hold => 13,
                _ => 9,
            },
            OperatorClass::Power => 10,
        },
        Expr::String(_) => 11,
        Expr::Dictionary(_) => 12,
    }
}

/// Value order, then representation for equal values (`2` before `2.0`).
fn compare_numbers(a: &NumericValue, b: &NumericValue) -> Ordering {
    let by_value = match a.compare(b) {
        Some(ord) => ord,
        None => a
            .re()
            .total_cmp(&b.re())
            .then_with(|| a.im().total_cmp(&b.im())),
    };
    by_value
        .then_with(|| representation_rank(a).cmp(&representation_rank(b)))
        .then_with(|| a.to_string().cmp(&b.to_string()))
}

fn representation_rank(n: &NumericValue) -> u8 {
    match n {
        NumericValue::Exact(_) | NumericValue::ExactComplex { .. } => 0,
        NumericValue::Big { .. } => 1,
        NumericValue::Machine(_) => 2,
    }
}

fn compare_functions(
    ctx: &Context,
    (op1, args1): (Operator, &[ExprId]),
    (op2, args2): (Operator, &[ExprId]),
) -> Ordering {
    let by_args = |ctx: &Context| compare_args(ctx, args1, args2);
    match op1.class() {
        OperatorClass::Product => total_degree_of(ctx, op1, args1)
            .cmp(&total_degree_of(ctx, op2, args2))
            .then_with(|| args1.len().cmp(&args2.len()))
            .then_with(|| by_args(ctx))
            .then_with(|| op1.cmp(&op2)),
        OperatorClass::Sum => args1
            .len()
            .cmp(&args2.len())
            .then_with(|| by_args(ctx))
            .then_with(|| op1.cmp(&op2)),
        OperatorClass::Power => {
            // Base first, then degree (exponent), then the rest.
            let base1 = args1.first().copied();
            let base2 = args2.first().copied();
            let by_base = match (base1, base2) {
                (Some(b1), Some(b2)) => compare_expr(ctx, b1, b2),
                _ => Ordering::Equal,
            };
            by_base
                .then_with(|| {
                    total_degree_of(ctx, op1, args1).cmp(&total_degree_of(ctx, op2, args2))
                })
                .then_with(|| op1.cmp(&op2))
                .then_with(|| by_args(ctx))
        }
        OperatorClass::Transcendental | OperatorClass::Other => ctx
            .operator_name(op1)
            .cmp(ctx.operator_name(op2))
            .then_with(|| op1.cmp(&op2))
            .then_with(|| args1.len().cmp(&args2.len()))
            .then_with(|| {
                let leaves1: usize = args1.iter().map(|&a| leaf_count(ctx, a)).sum();
                let leaves2: usize = args2.iter().map(|&a| leaf_count(ctx, a)).sum();
                leaves1.cmp(&leaves2)
            })
            .then_with(|| by_args(ctx)),
    }
}

fn compare_args(ctx: &Context, args1: &[ExprId], args2: &[ExprId]) -> Ordering {
    for (a1, a2) in args1.iter().zip(args2.iter()) {
        match compare_expr(ctx, *a1, *a2) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    args1.len().cmp(&args2.len())
}

/// Sort operands of a commutative operator in canonical order.
pub fn sort_operands(ctx: &Context, ops: &mut [ExprId]) {
    ops.sort_by(|a, b| compare_expr(ctx, *a, *b));
}

/// Order of the terms of a sum: higher total degree first, numbers last.
pub fn polynomial_order(ctx: &Context, a: ExprId, b: ExprId) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    match (ctx.is_number(a), ctx.is_number(b)) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (true, true) => return compare_expr(ctx, a, b),
        (false, false) => {}
    }
    let by_degree = total_degree(ctx, b).cmp(&total_degree(ctx, a));
    if by_degree != Ordering::Equal {
        return by_degree;
    }
    reverse_lexicographic(ctx, &exponents(ctx, a), &exponents(ctx, b))
        .then_with(|| compare_expr(ctx, a, b))
}

/// Walking the variables from the last in canonical order, the term with the
/// smaller exponent on the first differing variable comes first.
fn reverse_lexicographic(
    ctx: &Context,
    a: &[(ExprId, Rational)],
    b: &[(ExprId, Rational)],
) -> Ordering {
    let mut variables: Vec<ExprId> = a.iter().chain(b).map(|(v, _)| *v).collect();
    sort_operands(ctx, &mut variables);
    variables.dedup();
    let exponent_in = |term: &[(ExprId, Rational)], v: ExprId| {
        term.iter()
            .find(|(u, _)| *u == v)
            .map_or_else(Rational::zero, |(_, e)| e.clone())
    };
    variables
        .iter()
        .rev()
        .map(|&v| exponent_in(a, v).cmp(&exponent_in(b, v)))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Exponent vector of a term: `(base, exponent)` for each factor of its
/// monomial, like bases merged.
fn exponents(ctx: &Context, id: ExprId) -> Vec<(ExprId, Rational)> {
    let mut out: Vec<(ExprId, Rational)> = Vec::new();
    for factor in monomial(ctx, id) {
        let (base, exp) = power_of(ctx, factor);
        match out.iter_mut().find(|(b, _)| *b == base) {
            Some(entry) => entry.1 = &entry.1 + &exp,
            None => out.push((base, exp)),
        }
    }
    out
}

fn power_of(ctx: &Context, id: ExprId) -> (ExprId, Rational) {
    let rational = |n: ExprId| ctx.as_number(n).and_then(NumericValue::as_rational).cloned();
    match ctx.get(id) {
        Expr::Function(Operator::Power, ops) => match ops.as_slice() {
            [base, exp] => match rational(*exp) {
                Some(r) => (*base, r),
                None => (id, Rational::one()),
            },
            _ => (id, Rational::one()),
        },
        Expr::Function(Operator::Sqrt, ops) => match ops.as_slice() {
            [base] => (*base, Rational::half()),
            _ => (id, Rational::one()),
        },
        Expr::Function(Operator::Root, ops) => match ops.as_slice() {
            [base, n] => match rational(*n).and_then(|n| Rational::one().checked_div(&n)) {
                Some(r) => (*base, r),
                None => (id, Rational::one()),
            },
            _ => (id, Rational::one()),
        },
        _ => (id, Rational::one()),
    }
}

/// Sort the terms of a sum in polynomial order.
pub fn sort_terms(ctx: &Context, terms: &mut [ExprId]) {
    terms.sort_by(|a, b| polynomial_order(ctx, *a, *b));
}

/// Factors of a term without its numeric coefficient or sign.
fn monomial(ctx: &Context, id: ExprId) -> Vec<ExprId> {
    match ctx.get(id) {
        Expr::Function(Operator::Negate, ops) => match ops.as_slice() {
            [inner] => monomial(ctx, *inner),
            _ => vec![id],
        },
        Expr::Function(Operator::Multiply, ops) => {
            ops.iter().copied().filter(|&op| !ctx.is_number(op)).collect()
        }
        _ => vec![id],
    }
}

/// Polynomial degree summed over all variables; constants have degree 0.
pub fn total_degree(ctx: &Context, id: ExprId) -> Rational {
    match ctx.get(id) {
        Expr::Symbol(s) if !ctx.is_constant_symbol(*s) => Rational::one(),
        Expr::Function(op, ops) => total_degree_of(ctx, *op, ops),
        _ => Rational::zero(),
    }
}

fn total_degree_of(ctx: &Context, op: Operator, ops: &[ExprId]) -> Rational {
    match (op, ops) {
        (Operator::Power, [base, exp]) => match ctx.as_number(*exp).and_then(|n| n.as_rational()) {
            Some(r) => &total_degree(ctx, *base) * r,
            None => Rational::zero(),
        },
        (Operator::Sqrt, [base]) => &total_degree(ctx, *base) * &Rational::half(),
        (Operator::Root, [base, n]) => match ctx.as_number(*n).and_then(|n| n.as_rational()) {
            Some(r) => total_degree(ctx, *base)
                .checked_div(r)
                .unwrap_or_else(Rational::zero),
            None => Rational::zero(),
        },
        (Operator::Multiply, ops) => ops
            .iter()
            .fold(Rational::zero(), |acc, &op| &acc + &total_degree(ctx, op)),
        (Operator::Negate, [x]) => total_degree(ctx, *x),
        (Operator::Divide, [n, d]) => &total_degree(ctx, *n) - &total_degree(ctx, *d),
        (Operator::Add, ops) | (Operator::Subtract, ops) => ops
            .iter()
            .map(|&op| total_degree(ctx, op))
            .max()
            .unwrap_or_else(Rational::zero),
        _ => Rational::zero(),
    }
}
