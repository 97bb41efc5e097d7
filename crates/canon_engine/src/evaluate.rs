//! Exact and numeric evaluation.
//!
//! `evaluate` keeps exact arithmetic exact: rationals and square-root
//! radicals stay symbolic-exact, and transcendental functions of exact
//! arguments are only folded at their special values. `n` approximates
//! every literal and constant before re-boxing, so the same pipeline folds
//! the result to a number.

use crate::definitions::{EvalMode, HoldPolicy, HoldUntil};
use crate::engine::Engine;
use canon_ast::{Expr, ExprId, Operator, SymbolId};
use tracing::trace;

impl Engine {
    pub fn evaluate(&mut self, id: ExprId) -> ExprId {
        let id = self.canonical(id);
        self.eval(id, EvalMode::Exact)
    }

    /// Numeric approximation.
    pub fn n(&mut self, id: ExprId) -> ExprId {
        let id = self.canonical(id);
        self.eval(id, EvalMode::Numeric)
    }

    pub(crate) fn eval(&mut self, id: ExprId, mode: EvalMode) -> ExprId {
        match self.context.get(id).clone() {
            Expr::Number(n) => {
                if mode == EvalMode::Numeric && n.is_exact() {
                    self.context.num(n.to_approximate())
                } else {
                    id
                }
            }
            Expr::String(_) => id,
            Expr::Symbol(s) => self.eval_symbol(id, s, mode),
            Expr::Dictionary(entries) => {
                let entries = entries
                    .into_iter()
                    .map(|(k, v)| (k, self.eval(v, mode)))
                    .collect();
                match self.context.dictionary(entries) {
                    Ok(result) => {
                        self.context.mark_canonical(result);
                        result
                    }
                    Err(_) => id,
                }
            }
            Expr::Function(op, ops) => self.eval_function(op, ops, mode),
        }
    }

    fn eval_symbol(&mut self, id: ExprId, symbol: SymbolId, mode: EvalMode) -> ExprId {
        let Some(def) = self.symbol_definition(symbol) else {
            return id;
        };
        if let Some(value) = def.value {
            let release = match def.hold_until {
                HoldUntil::Never | HoldUntil::Evaluate => true,
                HoldUntil::N => mode == EvalMode::Numeric,
            };
            if release {
                let value = self.canonical(value);
                return self.eval(value, mode);
            }
        }
        if mode == EvalMode::Numeric {
            if let Some(n) = &def.numeric_value {
                return self.context.num(n.clone());
            }
        }
        id
    }

    fn eval_function(&mut self, op: Operator, ops: Vec<ExprId>, mode: EvalMode) -> ExprId {
        if matches!(op, Operator::Hold | Operator::Error) {
            return self.context.function(op, ops);
        }
        let def = self.operator_definition(op);
        let lazy = def.as_ref().map_or(false, |d| d.flags.lazy);
        let hold = def.as_ref().map_or(HoldPolicy::None, |d| d.hold);
        let mut args = Vec::with_capacity(ops.len());
        for (i, &arg) in ops.iter().enumerate() {
            if lazy || hold.holds(i, ops.len()) {
                args.push(arg);
            } else {
                args.push(self.eval(arg, mode));
            }
        }

        if let Some(hook) = def.as_ref().and_then(|d| d.evaluate.clone()) {
            if let Some(result) = hook(self, &args, mode) {
                trace!(operator = %self.context.operator_name(op), "evaluated");
                return self.canonical(result);
            }
        }
        self.function(op, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::OperatorDefinition;
    use canon_numeric::NumericValue;

    #[test]
    fn exact_evaluation_keeps_radicals() {
        let mut engine = Engine::new();
        // √2 + 1/3 has no single exact representation.
        let e = engine.parse("sqrt(8)/2 + 1/3").unwrap();
        assert_eq!(engine.evaluate(e), e);
        let v = engine.n(e);
        let value = engine.context.as_number(v).unwrap().to_f64();
        assert!((value - (std::f64::consts::SQRT_2 + 1.0 / 3.0)).abs() < 1e-12);
        let e = engine.parse("sin(0) + cos(0)").unwrap();
        assert_eq!(engine.evaluate(e), engine.context.one());
        let e = engine.parse("sin(1)").unwrap();
        assert_eq!(engine.evaluate(e), e);
    }

    #[test]
    fn numeric_evaluation() {
        let mut engine = Engine::new();
        let e = engine.parse("2*Pi").unwrap();
        let v = engine.n(e);
        let value = engine.context.as_number(v).unwrap().to_f64();
        assert!((value - std::f64::consts::TAU).abs() < 1e-12);

        let e = engine.parse("sqrt(2)").unwrap();
        let v = engine.n(e);
        assert_eq!(
            engine.context.as_number(v),
            Some(&NumericValue::machine(std::f64::consts::SQRT_2))
        );
    }

    #[test]
    fn pi_is_held_until_n() {
        let mut engine = Engine::new();
        let pi = engine.context.pi();
        assert_eq!(engine.evaluate(pi), pi);
        let approx = engine.n(pi);
        assert!(engine.context.is_number(approx));
    }

    #[test]
    fn lazy_operators_see_raw_operands() {
        let mut engine = Engine::new();
        engine.define_operator(
            OperatorDefinition::new("quote")
                .lazy()
                .with_evaluate(|_, ops, _| ops.first().copied()),
        );
        engine.define_operator(
            OperatorDefinition::new("first").with_evaluate(|_, ops, _| ops.first().copied()),
        );
        let pi = engine.context.pi();
        let quoted = engine.parse("quote(Pi)").unwrap();
        assert_eq!(engine.n(quoted), pi);
        let eager = engine.parse("first(Pi)").unwrap();
        let approx = engine.n(eager);
        assert!(engine.context.is_number(approx));
    }

    #[test]
    fn held_operands_are_not_boxed() {
        let mut engine = Engine::new();
        engine.define_operator(OperatorDefinition::new("keep").with_hold(HoldPolicy::First));
        let e = engine.parse("keep(1 + 1, 1 + 1)").unwrap();
        let ops = engine.context.ops(e).to_vec();
        assert!(engine.context.is_function(ops[0], Operator::Add));
        assert_eq!(ops[1], engine.integer(2));
    }
}
