//! Rewrite rules and the `replace` operation.

use crate::engine::Engine;
use crate::error::EngineError;
use crate::options::{MatchOptions, ReplaceOptions};
use crate::pattern::Substitution;
use canon_ast::{wildcard_kind, Expr, ExprId, Operator};
use canon_parser::parse_rule;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// Builds the replacement from the matched expression and its captures.
/// `None` means the rule does not apply after all.
pub type ReplaceFn =
    Arc<dyn Fn(&mut Engine, ExprId, &Substitution) -> Option<ExprId> + Send + Sync>;

pub type ConditionFn =
    Arc<dyn Fn(&mut Engine, &Substitution) -> Result<bool, EngineError> + Send + Sync>;

#[derive(Clone)]
pub enum Replacement {
    /// Expression whose wildcards are filled in from the substitution.
    Template(ExprId),
    Function(ReplaceFn),
}

#[derive(Clone)]
pub enum Condition {
    /// Fires only when the substituted expression evaluates to `True`.
    Template(ExprId),
    Function(ConditionFn),
}

#[derive(Clone)]
pub struct Rule {
    pub name: String,
    pub pattern: ExprId,
    pub replacement: Replacement,
    pub condition: Option<Condition>,
    pub match_options: MatchOptions,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field(
                "replacement",
                &match self.replacement {
                    Replacement::Template(id) => format!("{:?}", id),
                    Replacement::Function(_) => "<fn>".to_string(),
                },
            )
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}

impl Rule {
    pub fn with_match_options(mut self, options: MatchOptions) -> Self {
        self.match_options = options;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

impl Engine {
    /// Compile a rule from `match -> replacement` with an optional
    /// `; condition`. Single-letter names other than `e` and `i` are
    /// wildcards.
    pub fn rule(&mut self, name: &str, text: &str) -> Result<Rule, EngineError> {
        let syntax = parse_rule(text, &mut self.context)?;
        let pattern = self.normalize_pattern(syntax.pattern);
        Ok(Rule {
            name: name.to_string(),
            pattern,
            replacement: Replacement::Template(syntax.replacement),
            condition: syntax.condition.map(Condition::Template),
            match_options: MatchOptions::default(),
        })
    }

    pub fn rule_from_parts(
        &mut self,
        name: &str,
        pattern: ExprId,
        replacement: Replacement,
        condition: Option<Condition>,
    ) -> Rule {
        let pattern = self.normalize_pattern(pattern);
        Rule {
            name: name.to_string(),
            pattern,
            replacement,
            condition,
            match_options: MatchOptions::default(),
        }
    }

    /// Bring a raw pattern into the shape canonical subjects have, without
    /// merging anything a wildcard could stand for: sums and products are
    /// flattened, `a - b` becomes `a + (-b)`, `Exp(x)` becomes `e^x`, and
    /// wildcard-free sub-patterns are canonicalized outright.
    pub fn normalize_pattern(&mut self, pattern: ExprId) -> ExprId {
        if !self.has_wildcards(pattern) {
            return self.canonical(pattern);
        }
        let Expr::Function(op, ops) = self.context.get(pattern).clone() else {
            return pattern;
        };
        let ops: Vec<ExprId> = ops.into_iter().map(|p| self.normalize_pattern(p)).collect();
        match (op, ops.as_slice()) {
            (Operator::Subtract, [a]) => self.normalize_negate(*a),
            (Operator::Subtract, [a, b]) => {
                let negated = self.normalize_negate(*b);
                self.flatten_pattern(Operator::Add, vec![*a, negated])
            }
            (Operator::Negate, [a]) => self.normalize_negate(*a),
            (Operator::Add | Operator::Multiply, _) => self.flatten_pattern(op, ops),
            (Operator::Exp, [x]) => {
                let e = self.context.e();
                self.context.function(Operator::Power, vec![e, *x])
            }
            (Operator::Power, [base, exponent]) => match self.root_index(*exponent) {
                Some(2) => self.context.function(Operator::Sqrt, vec![*base]),
                Some(n) => {
                    let index = self.context.integer(n);
                    self.context.function(Operator::Root, vec![*base, index])
                }
                None => self.context.function(op, ops),
            },
            _ => self.context.function(op, ops),
        }
    }

    /// `n` when `exponent` is the literal `1/n`, `n > 1`.
    fn root_index(&self, exponent: ExprId) -> Option<i64> {
        let r = self.context.as_number(exponent)?.as_rational()?;
        if !r.is_positive() || r.is_integer() {
            return None;
        }
        r.inv()?.as_i64()
    }

    fn normalize_negate(&mut self, operand: ExprId) -> ExprId {
        if let Some(n) = self.context.as_number(operand) {
            let negated = n.neg();
            return self.context.num(negated);
        }
        if let Expr::Function(Operator::Negate, inner) = self.context.get(operand) {
            return inner[0];
        }
        self.context.function(Operator::Negate, vec![operand])
    }

    fn flatten_pattern(&mut self, op: Operator, ops: Vec<ExprId>) -> ExprId {
        let mut flat = Vec::with_capacity(ops.len());
        for p in ops {
            if self.context.is_function(p, op) {
                flat.extend_from_slice(self.context.ops(p));
            } else {
                flat.push(p);
            }
        }
        self.context.function(op, flat)
    }

    fn has_wildcards(&self, id: ExprId) -> bool {
        canon_ast::traversal::collect_symbols(&self.context, id)
            .into_iter()
            .any(|s| wildcard_kind(self.context.symbol_name(s)).is_some())
    }

    /// Apply one rule at the root of `expr`. Returns the canonical
    /// replacement when the pattern matches and the condition holds.
    pub fn apply_rule(&mut self, rule: &Rule, expr: ExprId) -> Option<ExprId> {
        let sub = self.match_pattern(expr, rule.pattern, &rule.match_options)?;
        if let Some(condition) = &rule.condition {
            match self.check_condition(condition, &sub) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => {
                    warn!(rule = %rule.name, error = %e, "condition_failed");
                    return None;
                }
            }
        }
        let raw = match &rule.replacement {
            Replacement::Template(template) => self.substitute(*template, &sub),
            Replacement::Function(f) => {
                let f = Arc::clone(f);
                f(self, expr, &sub)?
            }
        };
        let result = self.canonical(raw);
        trace!(rule = %rule.name, before = %self.show(expr), after = %self.show(result), "rule_fired");
        Some(result)
    }

    fn check_condition(
        &mut self,
        condition: &Condition,
        sub: &Substitution,
    ) -> Result<bool, EngineError> {
        match condition {
            Condition::Template(template) => {
                let predicate = self.substitute(*template, sub);
                let predicate = self.try_canonical(predicate)?;
                let value = self.evaluate(predicate);
                Ok(value == self.context.true_())
            }
            Condition::Function(f) => {
                let f = Arc::clone(f);
                f(self, sub)
            }
        }
    }

    /// Rewrite `expr` with `rules` until no rule applies, the options say
    /// stop, or the iteration limit is hit.
    pub fn replace(&mut self, expr: ExprId, rules: &[Rule], options: &ReplaceOptions) -> ExprId {
        let mut current = self.canonical(expr);
        for _ in 0..options.iteration_limit {
            let next = if options.recursive {
                self.replace_pass(current, rules)
            } else {
                self.replace_root(current, rules)
            };
            match next {
                Some(next) => current = next,
                None => return current,
            }
            if options.once {
                return current;
            }
        }
        warn!(limit = options.iteration_limit, "replace_iteration_limit");
        current
    }

    fn replace_root(&mut self, expr: ExprId, rules: &[Rule]) -> Option<ExprId> {
        rules
            .iter()
            .find_map(|rule| self.apply_rule(rule, expr).filter(|&r| r != expr))
    }

    /// One bottom-up pass: operands first, then the rebuilt node itself.
    fn replace_pass(&mut self, expr: ExprId, rules: &[Rule]) -> Option<ExprId> {
        let mut current = expr;
        if let Expr::Function(op, ops) = self.context.get(expr).clone() {
            if op != Operator::Hold {
                let mut changed = false;
                let ops: Vec<ExprId> = ops
                    .into_iter()
                    .map(|operand| match self.replace_pass(operand, rules) {
                        Some(new) => {
                            changed = true;
                            new
                        }
                        None => operand,
                    })
                    .collect();
                if changed {
                    current = self.function(op, ops);
                }
            }
        }
        match self.replace_root(current, rules) {
            Some(rewritten) => Some(rewritten),
            None => (current != expr).then_some(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Capture;

    #[test]
    fn rule_with_condition() {
        let mut engine = Engine::new();
        let rule = engine.rule("halve", "2*x -> x; x > 0").unwrap();
        let positive = engine.parse("2*Pi").unwrap();
        let pi = engine.context.pi();
        assert_eq!(engine.apply_rule(&rule, positive), Some(pi));
        let unknown = engine.parse("2*t").unwrap();
        assert_eq!(engine.apply_rule(&rule, unknown), None);
    }

    #[test]
    fn malformed_rule_is_an_error() {
        let mut engine = Engine::new();
        assert!(matches!(
            engine.rule("bad", "x + 1"),
            Err(EngineError::RuleSyntax(_))
        ));
    }

    #[test]
    fn divide_pattern_is_not_collapsed() {
        let mut engine = Engine::new();
        let rule = engine.rule("self-quotient", "x/x -> 1").unwrap();
        assert!(engine.context.is_function(rule.pattern, Operator::Divide));
    }

    #[test]
    fn closure_rules() {
        let mut engine = Engine::new();
        let p = engine.context.var("_x");
        let pattern = engine.context.call("double", vec![p]);
        let rule = engine.rule_from_parts(
            "double",
            pattern,
            Replacement::Function(Arc::new(|engine: &mut Engine, _: ExprId, sub: &Substitution| {
                let x = sub.expr("x")?;
                let two = engine.context.two();
                Some(engine.context.function(Operator::Multiply, vec![two, x]))
            })),
            None,
        )
        .with_condition(Condition::Function(Arc::new(|engine: &mut Engine, sub: &Substitution| {
            match sub.get("x") {
                Some(Capture::One(x)) => Ok(engine.context.is_number(*x)),
                _ => Err(EngineError::Hook {
                    operator: "double".into(),
                    message: "no capture".into(),
                }),
            }
        })));
        let e = engine.parse("double(21)").unwrap();
        let forty_two = engine.integer(42);
        assert_eq!(engine.apply_rule(&rule, e), Some(forty_two));
        let e = engine.parse("double(y)").unwrap();
        assert_eq!(engine.apply_rule(&rule, e), None);
    }

    #[test]
    fn replace_recursive_and_once() {
        let mut engine = Engine::new();
        let rules = vec![engine.rule("f-to-g", "f(x) -> g(x)").unwrap()];
        let e = engine.parse("h(f(f(1)), f(2))").unwrap();
        let all = engine.replace(e, &rules, &ReplaceOptions::default());
        assert_eq!(engine.show(all), "h(g(g(1)), g(2))");

        let root_only = ReplaceOptions {
            recursive: false,
            ..ReplaceOptions::default()
        };
        assert_eq!(engine.replace(e, &rules, &root_only), e);

        let once = ReplaceOptions {
            once: true,
            ..ReplaceOptions::default()
        };
        let f = engine.parse("f(f(1))").unwrap();
        let first = engine.replace(f, &rules, &once);
        assert_eq!(engine.show(first), "g(g(1))");
    }

    #[test]
    fn replace_stops_at_iteration_limit() {
        let mut engine = Engine::new();
        let rules = vec![engine.rule("grow", "f(x) -> f(x + 1)").unwrap()];
        let e = engine.parse("f(0)").unwrap();
        let options = ReplaceOptions {
            iteration_limit: 5,
            ..ReplaceOptions::default()
        };
        let out = engine.replace(e, &rules, &options);
        assert_eq!(engine.show(out), "f(5)");
    }

    #[test]
    fn rule_match_options_enable_variations() {
        let mut engine = Engine::new();
        let plain = engine.rule("pow", "x^n -> p(x, n)").unwrap();
        let varied = plain.clone().with_match_options(MatchOptions {
            use_variations: true,
            ..MatchOptions::default()
        });
        let t = engine.parse("t").unwrap();
        assert_eq!(engine.apply_rule(&plain, t), None);
        let out = engine.apply_rule(&varied, t).unwrap();
        assert_eq!(engine.show(out), "p(t, 1)");
    }
}
