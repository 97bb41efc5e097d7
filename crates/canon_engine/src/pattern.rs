//! Structural pattern matching with wildcards.
//!
//! A pattern is an expression whose symbols named `_x`, `__x` or `___x`
//! capture one operand, a run of one or more operands, or a run of zero or
//! more operands. Matching is a recursive descent over (subject, pattern)
//! pairs that threads a [`Substitution`] through; operands of commutative
//! operators are matched in any order.

use crate::arithmetic::{canonical_add, canonical_multiply, canonical_negate, canonical_power};
use crate::definitions::DefinitionRegistry;
use crate::engine::Engine;
use crate::options::MatchOptions;
use canon_ast::{wildcard_kind, wildcard_name, Context, Expr, ExprId, Operator, WildcardKind};
use canon_numeric::NumericValue;
use std::collections::BTreeMap;
use tracing::trace;

/// What a wildcard captured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Capture {
    One(ExprId),
    Many(Vec<ExprId>),
}

/// Wildcard captures, keyed by the wildcard name without underscores.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitution {
    captures: BTreeMap<String, Capture>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Capture> {
        self.captures.get(name)
    }

    /// The single expression captured under `name`.
    pub fn expr(&self, name: &str) -> Option<ExprId> {
        match self.captures.get(name)? {
            Capture::One(id) => Some(*id),
            Capture::Many(ids) if ids.len() == 1 => Some(ids[0]),
            Capture::Many(_) => None,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, capture: Capture) {
        self.captures.insert(name.into(), capture);
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Capture)> {
        self.captures.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn bind(&self, name: &str, capture: Capture) -> Option<Substitution> {
        if name.is_empty() {
            return Some(self.clone());
        }
        match self.captures.get(name) {
            Some(existing) if *existing == capture => Some(self.clone()),
            // `_x` and a one-element `__x` capture agree
            Some(Capture::One(a)) if capture == Capture::Many(vec![*a]) => Some(self.clone()),
            Some(Capture::Many(v)) if v.len() == 1 && capture == Capture::One(v[0]) => {
                Some(self.clone())
            }
            Some(_) => None,
            None => {
                let mut next = self.clone();
                next.captures.insert(name.to_string(), capture);
                Some(next)
            }
        }
    }
}

struct Matcher<'a> {
    ctx: &'a mut Context,
    registry: &'a DefinitionRegistry,
    options: &'a MatchOptions,
    tolerance: f64,
    steps: usize,
}

impl Matcher<'_> {
    fn step(&mut self) -> Option<()> {
        self.steps += 1;
        if self.steps > self.options.max_steps {
            if self.steps == self.options.max_steps + 1 {
                trace!(steps = self.options.max_steps, "match_step_limit");
            }
            return None;
        }
        Some(())
    }

    fn wildcard(&self, id: ExprId) -> Option<(WildcardKind, String)> {
        let name = self.ctx.symbol_str(id)?;
        let kind = wildcard_kind(name)?;
        Some((kind, wildcard_name(name)?.to_string()))
    }

    fn sequence_wildcard(&self, id: ExprId) -> Option<(WildcardKind, String)> {
        self.wildcard(id)
            .filter(|(kind, _)| *kind != WildcardKind::Single)
    }

    fn match_expr(
        &mut self,
        subject: ExprId,
        pattern: ExprId,
        sub: &Substitution,
    ) -> Option<Substitution> {
        self.step()?;
        if let Some((kind, name)) = self.wildcard(pattern) {
            return match kind {
                WildcardKind::Single => sub.bind(&name, Capture::One(subject)),
                _ => sub.bind(&name, Capture::Many(vec![subject])),
            };
        }
        if subject == pattern {
            return Some(sub.clone());
        }
        match self.ctx.get(pattern).clone() {
            Expr::Number(p) => {
                let s = self.ctx.as_number(subject)?;
                self.numbers_match(s, &p).then(|| sub.clone())
            }
            Expr::Symbol(_) | Expr::String(_) => None,
            Expr::Dictionary(pattern_entries) => {
                let Expr::Dictionary(subject_entries) = self.ctx.get(subject).clone() else {
                    return None;
                };
                if subject_entries.len() != pattern_entries.len() {
                    return None;
                }
                let mut acc = sub.clone();
                for ((sk, sv), (pk, pv)) in subject_entries.iter().zip(&pattern_entries) {
                    if sk != pk {
                        return None;
                    }
                    acc = self.match_expr(*sv, *pv, &acc)?;
                }
                Some(acc)
            }
            Expr::Function(op, pattern_ops) => {
                if let Expr::Function(subject_op, subject_ops) = self.ctx.get(subject).clone() {
                    if subject_op == op {
                        if let Some(found) = self.match_arguments(op, &subject_ops, &pattern_ops, sub)
                        {
                            return Some(found);
                        }
                    }
                }
                self.match_equivalent(subject, op, &pattern_ops, sub)
                    .or_else(|| {
                        if self.options.use_variations {
                            self.match_variation(subject, op, &pattern_ops, sub)
                        } else {
                            None
                        }
                    })
            }
        }
    }

    fn numbers_match(&self, s: &NumericValue, p: &NumericValue) -> bool {
        if s.eq_value(p) {
            return true;
        }
        if s.is_exact() && p.is_exact() {
            return false;
        }
        s.is_real()
            && p.is_real()
            && s.is_finite()
            && p.is_finite()
            && (s.re() - p.re()).abs() <= self.tolerance
    }

    fn match_arguments(
        &mut self,
        op: Operator,
        subjects: &[ExprId],
        patterns: &[ExprId],
        sub: &Substitution,
    ) -> Option<Substitution> {
        if self.registry.is_commutative(op) {
            let (sequences, singles): (Vec<ExprId>, Vec<ExprId>) = patterns
                .iter()
                .partition(|&&p| self.sequence_wildcard(p).is_some());
            self.match_unordered(subjects.to_vec(), &singles, &sequences, sub)
        } else {
            self.match_operands(subjects, patterns, sub)
        }
    }

    /// Ordered operand lists; sequence wildcards take the shortest run first.
    fn match_operands(
        &mut self,
        subjects: &[ExprId],
        patterns: &[ExprId],
        sub: &Substitution,
    ) -> Option<Substitution> {
        self.step()?;
        let Some((&first, rest)) = patterns.split_first() else {
            return subjects.is_empty().then(|| sub.clone());
        };
        match self.sequence_wildcard(first) {
            Some((kind, name)) => {
                let min = usize::from(kind == WildcardKind::Sequence);
                for take in min..=subjects.len() {
                    let Some(bound) = sub.bind(&name, Capture::Many(subjects[..take].to_vec()))
                    else {
                        continue;
                    };
                    if let Some(found) = self.match_operands(&subjects[take..], rest, &bound) {
                        return Some(found);
                    }
                }
                None
            }
            None => {
                let (&subject, remaining) = subjects.split_first()?;
                let bound = self.match_expr(subject, first, sub)?;
                self.match_operands(remaining, rest, &bound)
            }
        }
    }

    /// Each non-sequence pattern takes any one remaining subject operand;
    /// sequence wildcards then share what is left, in subject order.
    fn match_unordered(
        &mut self,
        remaining: Vec<ExprId>,
        singles: &[ExprId],
        sequences: &[ExprId],
        sub: &Substitution,
    ) -> Option<Substitution> {
        self.step()?;
        let Some((&pattern, rest)) = singles.split_first() else {
            return self.match_operands(&remaining, sequences, sub);
        };
        for i in 0..remaining.len() {
            let Some(bound) = self.match_expr(remaining[i], pattern, sub) else {
                continue;
            };
            let mut left = remaining.clone();
            left.remove(i);
            if let Some(found) = self.match_unordered(left, rest, sequences, &bound) {
                return Some(found);
            }
        }
        None
    }

    /// Forms that canonicalization rewrites away: `Negate` of literals and
    /// coefficients, `Subtract` against a sum (and a sum against `a - b`),
    /// `Divide` against negative powers and rational coefficients, and a
    /// product against `a / b`.
    fn match_equivalent(
        &mut self,
        subject: ExprId,
        op: Operator,
        patterns: &[ExprId],
        sub: &Substitution,
    ) -> Option<Substitution> {
        match (op, patterns) {
            (Operator::Negate, [p]) => {
                let negative = match self.ctx.get(subject) {
                    Expr::Number(n) => n.is_negative(),
                    Expr::Function(Operator::Multiply, ops) => ops
                        .first()
                        .and_then(|c| self.ctx.as_number(*c))
                        .map_or(false, NumericValue::is_negative),
                    _ => false,
                };
                if !negative {
                    return None;
                }
                let negated = canonical_negate(self.ctx, subject);
                self.match_expr(negated, *p, sub)
            }
            (Operator::Subtract, [a, b]) => {
                let Expr::Function(Operator::Add, terms) = self.ctx.get(subject).clone() else {
                    return None;
                };
                for i in (0..terms.len()).rev() {
                    let mut rest = terms.clone();
                    let taken = rest.remove(i);
                    let minuend = canonical_add(self.ctx, &rest);
                    let subtrahend = canonical_negate(self.ctx, taken);
                    let Some(bound) = self.match_expr(minuend, *a, sub) else {
                        continue;
                    };
                    if let Some(found) = self.match_expr(subtrahend, *b, &bound) {
                        return Some(found);
                    }
                }
                None
            }
            (Operator::Divide, [a, b]) => {
                let (numerator, denominator) = self.as_quotient(subject)?;
                let bound = self.match_expr(numerator, *a, sub)?;
                self.match_expr(denominator, *b, &bound)
            }
            (Operator::Add, _) => {
                let Expr::Function(Operator::Subtract, ops) = self.ctx.get(subject).clone() else {
                    return None;
                };
                let [minuend, subtrahend] = ops.as_slice() else {
                    return None;
                };
                let negated = canonical_negate(self.ctx, *subtrahend);
                self.match_arguments(Operator::Add, &[*minuend, negated], patterns, sub)
            }
            (Operator::Multiply, _) => {
                let Expr::Function(Operator::Divide, ops) = self.ctx.get(subject).clone() else {
                    return None;
                };
                let [numerator, denominator] = ops.as_slice() else {
                    return None;
                };
                let minus_one = self.ctx.negative_one();
                let reciprocal = canonical_power(self.ctx, *denominator, minus_one);
                self.match_arguments(Operator::Multiply, &[*numerator, reciprocal], patterns, sub)
            }
            _ => None,
        }
    }

    fn as_quotient(&mut self, subject: ExprId) -> Option<(ExprId, ExprId)> {
        match self.ctx.get(subject).clone() {
            Expr::Number(n) => {
                let r = n.as_rational()?;
                if r.is_integer() {
                    return None;
                }
                let numer = NumericValue::from_bigint(r.numer());
                let denom = NumericValue::from_bigint(r.denom());
                Some((self.ctx.num(numer), self.ctx.num(denom)))
            }
            Expr::Function(Operator::Power, ops) => {
                let [base, exponent] = ops.as_slice() else {
                    return None;
                };
                let exponent = self.ctx.as_number(*exponent)?.clone();
                if !exponent.is_negative() {
                    return None;
                }
                let positive = self.ctx.num(exponent.neg());
                let denominator = canonical_power(self.ctx, *base, positive);
                Some((self.ctx.one(), denominator))
            }
            Expr::Function(Operator::Multiply, ops) => {
                let (&coefficient, rest) = ops.split_first()?;
                let r = self.ctx.as_number(coefficient)?.as_rational()?.clone();
                if r.is_integer() {
                    return None;
                }
                let numer = self.ctx.num(NumericValue::from_bigint(r.numer()));
                let denom = self.ctx.num(NumericValue::from_bigint(r.denom()));
                let mut factors = Vec::with_capacity(ops.len());
                factors.push(numer);
                factors.extend_from_slice(rest);
                let numerator = canonical_multiply(self.ctx, &factors);
                Some((numerator, denom))
            }
            _ => None,
        }
    }

    /// Identity-element variants: `x` as `x + 0`, `1*x`, `x^1`; roots as
    /// fractional powers; `-x` as `-1*x`.
    fn match_variation(
        &mut self,
        subject: ExprId,
        op: Operator,
        patterns: &[ExprId],
        sub: &Substitution,
    ) -> Option<Substitution> {
        let subject_node = self.ctx.get(subject).clone();
        let candidates: Vec<Vec<ExprId>> = match op {
            Operator::Add => vec![vec![subject, self.ctx.zero()]],
            Operator::Multiply => {
                let mut v = vec![vec![self.ctx.one(), subject]];
                if let Expr::Function(Operator::Negate, ops) = &subject_node {
                    if let [inner] = ops.as_slice() {
                        v.push(vec![self.ctx.negative_one(), *inner]);
                    }
                }
                v
            }
            Operator::Power => match &subject_node {
                Expr::Function(Operator::Sqrt, ops) => match ops.as_slice() {
                    [radicand] => vec![vec![*radicand, self.ctx.half()]],
                    _ => Vec::new(),
                },
                Expr::Function(Operator::Root, ops) => match ops.as_slice() {
                    [radicand, index] => match self.ctx.as_number(*index).map(NumericValue::inv) {
                        Some(inv) => vec![vec![*radicand, self.ctx.num(inv)]],
                        None => Vec::new(),
                    },
                    _ => Vec::new(),
                },
                _ => vec![vec![subject, self.ctx.one()]],
            },
            _ => Vec::new(),
        };
        for operands in candidates {
            let matched = if op == Operator::Power {
                self.match_operands(&operands, patterns, sub)
            } else {
                self.match_arguments(op, &operands, patterns, sub)
            };
            if matched.is_some() {
                return matched;
            }
        }
        None
    }
}

impl Engine {
    /// Match `subject` against `pattern`. Neither is canonicalized here:
    /// callers pass canonical subjects when they want canonical semantics.
    pub fn match_pattern(
        &mut self,
        subject: ExprId,
        pattern: ExprId,
        options: &MatchOptions,
    ) -> Option<Substitution> {
        let tolerance = options.numeric_tolerance.unwrap_or(self.options.tolerance);
        let mut matcher = Matcher {
            ctx: &mut self.context,
            registry: &self.registry,
            options,
            tolerance,
            steps: 0,
        };
        let found = matcher.match_expr(subject, pattern, &Substitution::new());
        trace!(steps = matcher.steps, matched = found.is_some(), "match_pattern");
        found
    }

    /// Replace the wildcards of `template` by their captures. Sequence
    /// captures are spliced into the enclosing operand list. The result is
    /// not canonical.
    pub fn substitute(&mut self, template: ExprId, sub: &Substitution) -> ExprId {
        match self.context.get(template).clone() {
            Expr::Symbol(_) => match self.capture_of(template, sub) {
                Some(Capture::One(id)) => id,
                Some(Capture::Many(ids)) if ids.len() == 1 => ids[0],
                Some(Capture::Many(ids)) => self.context.function(Operator::Sequence, ids),
                None => template,
            },
            Expr::Function(op, ops) => {
                let mut out = Vec::with_capacity(ops.len());
                for op_id in &ops {
                    match self.capture_of(*op_id, sub) {
                        Some(Capture::Many(ids)) => out.extend(ids),
                        _ => out.push(self.substitute(*op_id, sub)),
                    }
                }
                if out == ops {
                    template
                } else {
                    self.context.function(op, out)
                }
            }
            Expr::Dictionary(entries) => {
                let entries: Vec<(String, ExprId)> = entries
                    .into_iter()
                    .map(|(k, v)| (k, self.substitute(v, sub)))
                    .collect();
                self.context.dictionary(entries).unwrap_or(template)
            }
            Expr::Number(_) | Expr::String(_) => template,
        }
    }

    fn capture_of(&self, id: ExprId, sub: &Substitution) -> Option<Capture> {
        let name = self.context.symbol_str(id)?;
        let name = wildcard_name(name)?;
        sub.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(engine: &mut Engine, text: &str) -> ExprId {
        let rule = format!("{} -> 0", text);
        canon_parser::parse_rule(&rule, &mut engine.context)
            .unwrap()
            .pattern
    }

    #[test]
    fn repeated_wildcard_must_agree() {
        let mut engine = Engine::new();
        let a = engine.context.var("_a");
        let fx = engine.parse("f(x)").unwrap();
        let gx = engine.parse("g(x)").unwrap();
        let p = engine.context.function(Operator::Divide, vec![a, a]);
        let same = engine.context.function(Operator::Divide, vec![fx, fx]);
        let different = engine.context.function(Operator::Divide, vec![fx, gx]);

        let sub = engine
            .match_pattern(same, p, &MatchOptions::default())
            .unwrap();
        assert_eq!(sub.expr("a"), Some(fx));
        assert_eq!(sub.len(), 1);
        assert!(engine
            .match_pattern(different, p, &MatchOptions::default())
            .is_none());
    }

    #[test]
    fn commutative_operands_match_in_any_order() {
        let mut engine = Engine::new();
        let p = pattern(&mut engine, "sin(x)^2 + 1");
        let subject = engine.parse("1 + sin(y)^2").unwrap();
        let sub = engine
            .match_pattern(subject, p, &MatchOptions::default())
            .unwrap();
        let y = engine.context.var("y");
        assert_eq!(sub.expr("x"), Some(y));
    }

    #[test]
    fn sequence_wildcards() {
        let mut engine = Engine::new();
        let subject = engine.parse("f(a, b, c)").unwrap();

        let p = pattern(&mut engine, "f(__h, x)");
        let sub = engine
            .match_pattern(subject, p, &MatchOptions::default())
            .unwrap();
        let (a, b, c) = (
            engine.context.var("a"),
            engine.context.var("b"),
            engine.context.var("c"),
        );
        assert_eq!(sub.get("h"), Some(&Capture::Many(vec![a, b])));
        assert_eq!(sub.expr("x"), Some(c));

        // `___` may be empty, `__` may not
        let p = pattern(&mut engine, "f(a, b, c, ___r)");
        let sub = engine
            .match_pattern(subject, p, &MatchOptions::default())
            .unwrap();
        assert_eq!(sub.get("r"), Some(&Capture::Many(vec![])));
        let p = pattern(&mut engine, "f(a, b, c, __r)");
        assert!(engine
            .match_pattern(subject, p, &MatchOptions::default())
            .is_none());
    }

    #[test]
    fn sequence_capture_in_commutative_sum() {
        let mut engine = Engine::new();
        let p = pattern(&mut engine, "sin(x)^2 + cos(x)^2 + ___r");
        let p = engine.normalize_pattern(p);
        let subject = engine.parse("a + cos(t)^2 + b + sin(t)^2").unwrap();
        let sub = engine
            .match_pattern(subject, p, &MatchOptions::default())
            .unwrap();
        match sub.get("r") {
            Some(Capture::Many(rest)) => assert_eq!(rest.len(), 2),
            other => panic!("unexpected capture {:?}", other),
        }
    }

    #[test]
    fn negation_matches_negative_coefficients() {
        let mut engine = Engine::new();
        let p = pattern(&mut engine, "sin(-x)");
        let subject = engine.parse("sin(-2*y)").unwrap();
        let sub = engine
            .match_pattern(subject, p, &MatchOptions::default())
            .unwrap();
        let x = sub.expr("x").unwrap();
        assert_eq!(engine.show(x), "2*y");

        let subject = engine.parse("sin(-3)").unwrap();
        let sub = engine
            .match_pattern(subject, p, &MatchOptions::default())
            .unwrap();
        assert_eq!(engine.show(sub.expr("x").unwrap()), "3");
    }

    #[test]
    fn subtraction_matches_sums() {
        let mut engine = Engine::new();
        let p = pattern(&mut engine, "x - y");
        let subject = engine.parse("a - b").unwrap();
        let sub = engine
            .match_pattern(subject, p, &MatchOptions::default())
            .unwrap();
        assert_eq!(engine.show(sub.expr("x").unwrap()), "a");
        assert_eq!(engine.show(sub.expr("y").unwrap()), "b");
    }

    #[test]
    fn division_matches_rational_coefficient() {
        let mut engine = Engine::new();
        let p = pattern(&mut engine, "x / y");
        let subject = engine.parse("Pi/4").unwrap();
        let sub = engine
            .match_pattern(subject, p, &MatchOptions::default())
            .unwrap();
        assert_eq!(engine.show(sub.expr("x").unwrap()), "Pi");
        assert_eq!(engine.show(sub.expr("y").unwrap()), "4");
    }

    #[test]
    fn sum_pattern_matches_raw_difference() {
        let mut engine = Engine::new();
        let p = pattern(&mut engine, "x + y");
        let a = engine.context.var("a");
        let b = engine.context.var("b");
        let subject = engine.context.function(Operator::Subtract, vec![a, b]);
        let sub = engine
            .match_pattern(subject, p, &MatchOptions::default())
            .unwrap();
        assert_eq!(sub.expr("x"), Some(a));
        assert_eq!(engine.show(sub.expr("y").unwrap()), "-b");
    }

    #[test]
    fn product_pattern_matches_raw_quotient() {
        let mut engine = Engine::new();
        let p = pattern(&mut engine, "x * y");
        let a = engine.context.var("a");
        let b = engine.context.var("b");
        let subject = engine.context.function(Operator::Divide, vec![a, b]);
        let sub = engine
            .match_pattern(subject, p, &MatchOptions::default())
            .unwrap();
        assert_eq!(sub.expr("x"), Some(a));
        assert_eq!(engine.show(sub.expr("y").unwrap()), "b^(-1)");
    }

    #[test]
    fn malformed_subjects_do_not_match() {
        let mut engine = Engine::new();
        let a = engine.context.var("a");
        let lone_power = engine.context.function(Operator::Power, vec![a]);
        let p = pattern(&mut engine, "x / y");
        assert!(engine
            .match_pattern(lone_power, p, &MatchOptions::default())
            .is_none());
        let lone_sqrt = engine.context.function(Operator::Sqrt, vec![]);
        let options = MatchOptions {
            use_variations: true,
            ..MatchOptions::default()
        };
        let p = pattern(&mut engine, "x^n");
        assert!(engine.match_pattern(lone_sqrt, p, &options).is_none());
    }

    #[test]
    fn variations_are_opt_in() {
        let mut engine = Engine::new();
        let p = pattern(&mut engine, "2*x + y");
        let subject = engine.parse("2*t").unwrap();
        assert!(engine
            .match_pattern(subject, p, &MatchOptions::default())
            .is_none());
        let options = MatchOptions {
            use_variations: true,
            ..MatchOptions::default()
        };
        let sub = engine.match_pattern(subject, p, &options).unwrap();
        assert_eq!(engine.show(sub.expr("y").unwrap()), "0");

        let p = pattern(&mut engine, "x^n");
        let subject = engine.parse("sqrt(t)").unwrap();
        let sub = engine.match_pattern(subject, p, &options).unwrap();
        assert_eq!(engine.show(sub.expr("n").unwrap()), "1/2");
    }

    #[test]
    fn numeric_tolerance() {
        let mut engine = Engine::new();
        let p = engine.parse("0.5").unwrap();
        let subject = engine.parse("0.50000000001").unwrap();
        assert!(engine
            .match_pattern(subject, p, &MatchOptions::default())
            .is_some());
        let strict = MatchOptions {
            numeric_tolerance: Some(0.0),
            ..MatchOptions::default()
        };
        assert!(engine.match_pattern(subject, p, &strict).is_none());
    }

    #[test]
    fn step_limit_gives_up() {
        let mut engine = Engine::new();
        let p = pattern(&mut engine, "f(___a, ___b, ___c, z)");
        let subject = engine.parse("f(a, b, c, d, e, g, h)").unwrap();
        let options = MatchOptions {
            max_steps: 5,
            ..MatchOptions::default()
        };
        assert!(engine.match_pattern(subject, p, &options).is_none());
    }

    #[test]
    fn substitute_splices_sequences() {
        let mut engine = Engine::new();
        let subject = engine.parse("f(a, b, c)").unwrap();
        let p = pattern(&mut engine, "f(x, __rest)");
        let sub = engine
            .match_pattern(subject, p, &MatchOptions::default())
            .unwrap();
        let template = canon_parser::parse_rule("g(__rest, x) -> 0", &mut engine.context)
            .unwrap()
            .pattern;
        let out = engine.substitute(template, &sub);
        assert_eq!(engine.show(out), "g(b, c, a)");
    }
}
