//! Stack-safe traversal utilities.
//!
//! These use explicit stacks so that very deep trees cannot overflow the call
//! stack.

use crate::context::Context;
use crate::expr::{Expr, ExprId};
use crate::symbol::SymbolId;
use std::collections::BTreeSet;

fn push_children(node: &Expr, stack: &mut Vec<ExprId>) {
    match node {
        Expr::Function(_, ops) => stack.extend(ops.iter().rev().copied()),
        Expr::Dictionary(entries) => stack.extend(entries.iter().rev().map(|(_, v)| *v)),
        _ => {}
    }
}

/// Count all nodes in an expression tree (shared subtrees count each time).
pub fn count_all_nodes(ctx: &Context, root: ExprId) -> usize {
    count_nodes_matching(ctx, root, |_| true)
}

/// Count nodes matching a predicate.
pub fn count_nodes_matching<F>(ctx: &Context, root: ExprId, mut pred: F) -> usize
where
    F: FnMut(&Expr) -> bool,
{
    let mut count = 0;
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let node = ctx.get(id);
        if pred(node) {
            count += 1;
        }
        push_children(node, &mut stack);
    }

    count
}

/// Number of leaves: numbers, symbols, strings and empty function calls.
pub fn leaf_count(ctx: &Context, root: ExprId) -> usize {
    count_nodes_matching(ctx, root, |node| node.children().is_empty())
}

/// Depth of the tree; a leaf has depth 1.
pub fn max_depth(ctx: &Context, root: ExprId) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(root, 1usize)];
    while let Some((id, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        for child in ctx.get(id).children() {
            stack.push((child, depth + 1));
        }
    }
    deepest
}

/// All symbols occurring in the tree, constants included, in id order.
pub fn collect_symbols(ctx: &Context, root: ExprId) -> BTreeSet<SymbolId> {
    let mut symbols = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let node = ctx.get(id);
        if let Expr::Symbol(s) = node {
            symbols.insert(*s);
        }
        push_children(node, &mut stack);
    }
    symbols
}

pub fn has_symbols(ctx: &Context, root: ExprId) -> bool {
    count_nodes_matching(ctx, root, Expr::is_symbol) > 0
}

/// An expression with no symbols that is not itself a number literal, such
/// as `1 - 1` or `Sqrt(2) - Sqrt(2)`.
///
/// Canonicalization refuses to cancel these to zero, since they may hide an
/// indeterminate form elsewhere in the tree.
pub fn is_constant_expression(ctx: &Context, id: ExprId) -> bool {
    !ctx.is_number(id) && !has_symbols(ctx, id)
}

/// True when `needle` occurs in the tree rooted at `root`.
pub fn contains(ctx: &Context, root: ExprId, needle: ExprId) -> bool {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if id == needle {
            return true;
        }
        push_children(ctx.get(id), &mut stack);
    }
    false
}

/// Pre-order list of every node id (duplicates kept).
pub fn preorder(ctx: &Context, root: ExprId) -> Vec<ExprId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        out.push(id);
        push_children(ctx.get(id), &mut stack);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Operator;

    #[test]
    fn counts() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let y = ctx.var("y");
        let sum = ctx.function(Operator::Add, vec![x, y, x]);
        let f = ctx.call("f", vec![sum]);
        assert_eq!(count_all_nodes(&ctx, f), 5);
        assert_eq!(leaf_count(&ctx, f), 3);
        assert_eq!(max_depth(&ctx, f), 3);
        assert_eq!(preorder(&ctx, f), vec![f, sum, x, y, x]);
    }

    #[test]
    fn symbols_and_constants() {
        let mut ctx = Context::new();
        let one = ctx.one();
        let x = ctx.var("x");
        let zero_ish = ctx.function(Operator::Subtract, vec![one, one]);
        assert!(is_constant_expression(&ctx, zero_ish));
        assert!(!is_constant_expression(&ctx, one));
        let with_x = ctx.function(Operator::Add, vec![x, one]);
        assert!(!is_constant_expression(&ctx, with_x));
        let pi_minus_pi = ctx.function(Operator::Subtract, vec![ctx.pi(), ctx.pi()]);
        assert!(!is_constant_expression(&ctx, pi_minus_pi));
        assert_eq!(collect_symbols(&ctx, with_x).len(), 1);
        assert!(contains(&ctx, with_x, x));
        assert!(!contains(&ctx, zero_ish, x));
    }
}
