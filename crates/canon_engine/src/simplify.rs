//! Rule-driven simplification.
//!
//! Each pass rewrites bottom-up, trying the rules in order at every node
//! and keeping the first rewrite whose cost stays within the tolerance.
//! The loop stops at a fixed point, when an expression recurs, or at the
//! iteration ceiling.

use crate::engine::Engine;
use crate::options::SimplifyOptions;
use crate::rule::Rule;
use crate::rules::standard_rules;
use canon_ast::{Expr, ExprId, Operator};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

impl Engine {
    /// Simplify with the standard rule set and default options.
    pub fn simplify(&mut self, expr: ExprId) -> ExprId {
        let rules = self.standard_rules();
        self.simplify_with(expr, &rules, &SimplifyOptions::default())
    }

    /// The standard rules, compiled on first use.
    pub fn standard_rules(&mut self) -> Vec<Rule> {
        if let Some(rules) = &self.standard_rules {
            return rules.clone();
        }
        let rules = standard_rules(self);
        self.standard_rules = Some(rules.clone());
        rules
    }

    pub fn simplify_with(
        &mut self,
        expr: ExprId,
        rules: &[Rule],
        options: &SimplifyOptions,
    ) -> ExprId {
        let mut current = self.canonical(expr);
        let mut seen = FxHashSet::default();
        seen.insert(current);
        let mut best = current;
        let mut best_cost = self.cost(current);

        for iteration in 0..options.max_iterations {
            let Some(next) = self.simplify_pass(current, rules, options) else {
                debug!(target: "simplify", iteration, result = %self.show(current), "phase_end");
                return current;
            };
            if !seen.insert(next) {
                warn!(target: "simplify", iteration, expr = %self.show(next), "cycle_detected");
                return best;
            }
            current = next;
            let cost = self.cost(current);
            if cost < best_cost {
                best = current;
                best_cost = cost;
            }
        }
        warn!(target: "simplify", limit = options.max_iterations, "iteration_limit");
        current
    }

    fn simplify_pass(
        &mut self,
        expr: ExprId,
        rules: &[Rule],
        options: &SimplifyOptions,
    ) -> Option<ExprId> {
        let mut current = expr;
        if let Expr::Function(op, ops) = self.context.get(expr).clone() {
            if op != Operator::Hold {
                let mut changed = false;
                let mut rebuilt = Vec::with_capacity(ops.len());
                for operand in ops {
                    match self.simplify_pass(operand, rules, options) {
                        Some(new) => {
                            changed = true;
                            rebuilt.push(new);
                        }
                        None => rebuilt.push(operand),
                    }
                }
                if changed {
                    current = self.function(op, rebuilt);
                }
            }
        }
        match self.rewrite_node(current, rules, options) {
            Some(rewritten) => Some(rewritten),
            None => (current != expr).then_some(current),
        }
    }

    /// First rule whose rewrite is accepted at `expr`. Calls to impure
    /// operators are left alone.
    fn rewrite_node(
        &mut self,
        expr: ExprId,
        rules: &[Rule],
        options: &SimplifyOptions,
    ) -> Option<ExprId> {
        if let Some(op) = self.context.op(expr) {
            if self
                .operator_definition(op)
                .map_or(false, |def| !def.flags.pure)
            {
                return None;
            }
        }
        let before = self.cost(expr);
        for rule in rules {
            let Some(candidate) = self.apply_rule(rule, expr) else {
                continue;
            };
            if candidate == expr {
                continue;
            }
            let after = self.cost(candidate);
            if after <= before * options.cost_tolerance || options.is_cost_exempt(&rule.name) {
                return Some(candidate);
            }
            debug!(
                target: "simplify",
                rule = %rule.name,
                before,
                after,
                "rewrite_rejected"
            );
        }
        None
    }
}
