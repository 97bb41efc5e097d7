//! The boxing pipeline: raw construction requests in, canonical nodes out.
//!
//! For a function node the steps are, in order:
//! 1. structural pseudo-operators (`Hold`, `Error`, `Negate`, `Rational`,
//!    `Complex`, `String`, `Symbol`, `Number`);
//! 2. definition lookup, falling back to an uninterpreted call;
//! 3. operands boxed per the hold policy, `Sequence`s spliced in;
//! 4. arity validation;
//! 5. the definition's canonical hook, when it has one;
//! 6. otherwise the generic path: flatten, involution, idempotence, sort.

use crate::arithmetic::{
    build, canonical_add, canonical_divide, canonical_multiply, canonical_negate,
};
use crate::definitions::{Arity, HoldPolicy, HoldUntil, OperatorDefinition};
use crate::engine::Engine;
use crate::error::EngineError;
use canon_ast::{is_valid_identifier, sort_operands, Expr, ExprId, Operator, SymbolId};
use canon_numeric::NumericValue;
use tracing::{trace, warn};

impl Engine {
    /// Canonical form of `id`. Never fails: in strict mode a construction
    /// error becomes an `Error(code, id)` node and is logged.
    pub fn canonical(&mut self, id: ExprId) -> ExprId {
        match self.try_canonical(id) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "canonicalization failed");
                self.context.error(e.code(), Some(id))
            }
        }
    }

    pub fn try_canonical(&mut self, id: ExprId) -> Result<ExprId, EngineError> {
        if self.context.is_canonical(id) {
            return Ok(id);
        }
        match self.context.get(id).clone() {
            Expr::Number(_) | Expr::String(_) => Ok(id),
            Expr::Symbol(s) => self.canonical_symbol(id, s),
            Expr::Dictionary(entries) => {
                let mut boxed = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    boxed.push((key, self.try_canonical(value)?));
                }
                let result = self.context.dictionary(boxed)?;
                self.context.mark_canonical(result);
                Ok(result)
            }
            Expr::Function(op, ops) => self.try_function(op, ops),
        }
    }

    fn canonical_symbol(&mut self, id: ExprId, symbol: SymbolId) -> Result<ExprId, EngineError> {
        let name = self.context.symbol_name(symbol);
        if !is_valid_identifier(name) {
            let name = name.to_string();
            if self.options.strict {
                return Err(EngineError::InvalidIdentifier(name));
            }
            return Ok(self.context.error("invalid-identifier", Some(id)));
        }
        if let Some(def) = self.symbol_definition(symbol) {
            if def.hold_until == HoldUntil::Never {
                if let Some(value) = def.value {
                    return self.try_canonical(value);
                }
            }
        }
        self.context.mark_canonical(id);
        Ok(id)
    }

    /// Boxed function call. Never fails; see [`Engine::canonical`].
    pub fn function(&mut self, op: Operator, ops: Vec<ExprId>) -> ExprId {
        match self.try_function(op, ops.clone()) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "function construction failed");
                let raw = self.context.function(op, ops);
                self.context.error(e.code(), Some(raw))
            }
        }
    }

    /// Boxed call to an operator looked up by name.
    pub fn call(&mut self, name: &str, ops: Vec<ExprId>) -> ExprId {
        let op = self.context.operator_of(name);
        self.function(op, ops)
    }

    pub fn try_function(&mut self, op: Operator, ops: Vec<ExprId>) -> Result<ExprId, EngineError> {
        if let Some(result) = self.box_structural(op, &ops)? {
            return Ok(result);
        }

        let Some(def) = self.operator_definition(op) else {
            if self.options.strict {
                let name = self.context.operator_name(op).to_string();
                return Err(EngineError::UnknownOperator(name));
            }
            let ops = self.box_operands(&ops, HoldPolicy::None)?;
            return Ok(build(&mut self.context, op, ops));
        };

        let ops = self.box_operands(&ops, def.hold)?;
        let ops = self.check_arity(op, def.arity, ops)?;

        if let Some(hook) = def.canonical.clone() {
            return Ok(match hook(self, &ops) {
                Ok(result) => {
                    self.context.mark_canonical(result);
                    result
                }
                Err(e) => {
                    warn!(
                        operator = %def.name,
                        error = %e,
                        "canonical hook failed, keeping the call as written"
                    );
                    self.context.function(op, ops)
                }
            });
        }

        Ok(self.generic_canonical(op, &def, ops))
    }

    fn box_operands(&mut self, ops: &[ExprId], hold: HoldPolicy) -> Result<Vec<ExprId>, EngineError> {
        let mut boxed = Vec::with_capacity(ops.len());
        for (i, &op) in ops.iter().enumerate() {
            if hold.holds(i, ops.len()) {
                boxed.push(op);
                continue;
            }
            let op = self.try_canonical(op)?;
            if self.context.is_function(op, Operator::Sequence) {
                boxed.extend_from_slice(self.context.ops(op));
            } else {
                boxed.push(op);
            }
        }
        Ok(boxed)
    }

    /// Missing operands become `Error("missing")` and surplus ones are
    /// wrapped in `Error("unexpected-argument", x)`; strict mode fails instead.
    fn check_arity(
        &mut self,
        op: Operator,
        arity: Arity,
        mut ops: Vec<ExprId>,
    ) -> Result<Vec<ExprId>, EngineError> {
        if arity.accepts(ops.len()) {
            return Ok(ops);
        }
        if self.options.strict {
            return Err(EngineError::Arity {
                operator: self.context.operator_name(op).to_string(),
                expected: arity.to_string(),
                got: ops.len(),
            });
        }
        trace!(operator = %self.context.operator_name(op), got = ops.len(), "arity mismatch");
        while ops.len() < arity.min {
            let missing = self.context.error("missing", None);
            ops.push(missing);
        }
        if let Some(max) = arity.max {
            for op in ops.iter_mut().skip(max) {
                *op = self.context.error("unexpected-argument", Some(*op));
            }
        }
        Ok(ops)
    }

    fn generic_canonical(
        &mut self,
        op: Operator,
        def: &OperatorDefinition,
        ops: Vec<ExprId>,
    ) -> ExprId {
        let mut ops = ops;
        if def.flags.associative {
            let mut flat = Vec::with_capacity(ops.len());
            for id in ops {
                if self.context.is_function(id, op) {
                    flat.extend_from_slice(self.context.ops(id));
                } else {
                    flat.push(id);
                }
            }
            ops = flat;
        }
        if let [inner] = ops[..] {
            if self.context.is_function(inner, op) {
                if def.flags.involution && self.context.ops(inner).len() == 1 {
                    return self.context.ops(inner)[0];
                }
                if def.flags.idempotent {
                    return inner;
                }
            }
        }
        if def.flags.commutative {
            sort_operands(&self.context, &mut ops);
        }
        build(&mut self.context, op, ops)
    }

    /// Operators whose canonical form is structural rather than defined.
    fn box_structural(&mut self, op: Operator, ops: &[ExprId]) -> Result<Option<ExprId>, EngineError> {
        let result = match op {
            Operator::Hold | Operator::Error => build(&mut self.context, op, ops.to_vec()),
            Operator::Negate => {
                let ops = self.box_operands(ops, HoldPolicy::None)?;
                let ops = self.check_arity(op, Arity::exactly(1), ops)?;
                match ops.as_slice() {
                    [x] => canonical_negate(&mut self.context, *x),
                    _ => self.context.function(op, ops.clone()),
                }
            }
            Operator::Rational => {
                let ops = self.box_operands(ops, HoldPolicy::None)?;
                let ops = self.check_arity(op, Arity::range(1, 2), ops)?;
                match ops.as_slice() {
                    [x] => *x,
                    [n, d] => canonical_divide(&mut self.context, *n, *d),
                    _ => self.context.function(op, ops.clone()),
                }
            }
            Operator::Complex => {
                let ops = self.box_operands(ops, HoldPolicy::None)?;
                let ops = self.check_arity(op, Arity::exactly(2), ops)?;
                match ops.as_slice() {
                    [re, im] => self.complex(*re, *im),
                    _ => self.context.function(op, ops.clone()),
                }
            }
            Operator::String => {
                let ops = self.box_operands(ops, HoldPolicy::None)?;
                let text: String = ops
                    .iter()
                    .map(|&id| match self.context.as_string(id) {
                        Some(s) => s.to_string(),
                        None => self.show(id),
                    })
                    .collect();
                self.context.string(&text)
            }
            Operator::Symbol => match ops {
                [name] => match self.context.as_string(*name).map(str::to_string) {
                    Some(name) => {
                        let raw = self.context.var(&name);
                        self.try_canonical(raw)?
                    }
                    None => self.context.error("expected-string", Some(*name)),
                },
                _ => self.context.error("expected-string", None),
            },
            Operator::Number => match ops {
                [arg] => self.number_literal(*arg),
                _ => self.context.error("expected-number", None),
            },
            _ => return Ok(None),
        };
        Ok(Some(result))
    }

    fn complex(&mut self, re: ExprId, im: ExprId) -> ExprId {
        let parts = (
            self.context.as_number(re).filter(|n| n.is_real()),
            self.context.as_number(im).filter(|n| n.is_real()),
        );
        if let (Some(a), Some(b)) = parts {
            if b.is_zero() {
                return re;
            }
            let value = match (a.as_exact(), b.as_exact()) {
                (Some(x), Some(y)) => NumericValue::exact_complex(x.clone(), y.clone()),
                _ => NumericValue::complex(a.re(), b.re()),
            };
            return self.context.num(value);
        }
        let i = self.context.imaginary_unit();
        let imaginary = canonical_multiply(&mut self.context, &[im, i]);
        canonical_add(&mut self.context, &[re, imaginary])
    }

    fn number_literal(&mut self, arg: ExprId) -> ExprId {
        if self.context.is_number(arg) {
            return arg;
        }
        let parsed = self
            .context
            .as_string(arg)
            .map(|text| NumericValue::parse(text, self.options.precision));
        match parsed {
            Some(Ok(value)) => self.context.num(value),
            _ => self.context.error("expected-number", Some(arg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::definitions::{Arity, OperatorDefinition};
    use crate::engine::Engine;
    use crate::error::EngineError;
    use crate::options::EngineOptions;
    use canon_ast::Operator;
    use canon_numeric::NumericValue;

    #[test]
    fn unknown_operators_stay_uninterpreted() {
        let mut engine = Engine::new();
        let x = engine.context.var("x");
        let one = engine.context.one();
        let raw = engine.context.call("f", vec![one, x]);
        let boxed = engine.canonical(raw);
        assert_eq!(engine.show(boxed), "f(1, x)");
        assert!(engine.context.is_canonical(boxed));
    }

    #[test]
    fn strict_mode_rejects_unknown_operators() {
        let mut engine = Engine::with_options(EngineOptions {
            strict: true,
            ..EngineOptions::default()
        });
        let x = engine.context.var("x");
        let raw = engine.context.call("f", vec![x]);
        assert!(matches!(
            engine.try_canonical(raw),
            Err(EngineError::UnknownOperator(name)) if name == "f"
        ));
    }

    #[test]
    fn arity_errors_degrade_to_error_nodes() {
        let mut engine = Engine::new();
        let x = engine.context.var("x");
        let y = engine.context.var("y");
        let boxed = engine.function(Operator::Sin, vec![x, y]);
        assert!(!engine.context.is_valid(boxed));
        assert_eq!(engine.show(boxed), r#"Sin(x, Error("unexpected-argument", y))"#);

        let boxed = engine.function(Operator::Power, vec![x]);
        assert!(!engine.context.is_valid(boxed));
    }

    #[test]
    fn strict_arity_is_an_error() {
        let mut engine = Engine::with_options(EngineOptions {
            strict: true,
            ..EngineOptions::default()
        });
        let err = engine.try_function(Operator::Sin, vec![]).unwrap_err();
        assert!(matches!(err, EngineError::Arity { got: 0, .. }));
    }

    #[test]
    fn generic_flags() {
        let mut engine = Engine::new();
        engine.define_operator(
            OperatorDefinition::new("g")
                .associative()
                .commutative()
                .with_arity(Arity::at_least(1)),
        );
        engine.define_operator(OperatorDefinition::new("inv").involution().with_arity(Arity::exactly(1)));
        engine.define_operator(OperatorDefinition::new("floorish").idempotent());
        let x = engine.context.var("x");
        let y = engine.context.var("y");
        let z = engine.context.var("z");

        let inner = engine.context.call("g", vec![z, y]);
        let outer = engine.context.call("g", vec![inner, x]);
        let boxed = engine.canonical(outer);
        assert_eq!(engine.show(boxed), "g(x, y, z)");

        let once = engine.context.call("inv", vec![x]);
        let twice = engine.context.call("inv", vec![once]);
        assert_eq!(engine.canonical(twice), engine.canonical(x));

        let once = engine.context.call("floorish", vec![x]);
        let twice = engine.context.call("floorish", vec![once]);
        let boxed_once = engine.canonical(once);
        assert_eq!(engine.canonical(twice), boxed_once);
    }

    #[test]
    fn failing_hook_keeps_the_call_as_written() {
        let mut engine = Engine::new();
        engine.define_operator(OperatorDefinition::new("broken").with_canonical(|_, _| {
            Err(EngineError::Hook {
                operator: "broken".to_string(),
                message: "refused".to_string(),
            })
        }));
        let x = engine.context.var("x");
        let one = engine.context.one();
        let sum = engine.context.function(Operator::Add, vec![one, x]);
        let raw = engine.context.call("broken", vec![sum]);

        let boxed = engine.try_canonical(raw).unwrap();
        assert!(!engine.context.is_canonical(boxed));
        assert!(engine.context.is_valid(boxed));
        assert_eq!(engine.show(boxed), "broken(x + 1)");
        let boxed_sum = engine.canonical(sum);
        assert_eq!(engine.context.ops(boxed), &[boxed_sum]);
    }

    #[test]
    fn sequences_are_spliced() {
        let mut engine = Engine::new();
        let x = engine.context.var("x");
        let y = engine.context.var("y");
        let seq = engine.context.function(Operator::Sequence, vec![x, y]);
        let call = engine.context.call("f", vec![seq]);
        let boxed = engine.canonical(call);
        assert_eq!(engine.show(boxed), "f(x, y)");
    }

    #[test]
    fn hold_is_not_boxed() {
        let mut engine = Engine::new();
        let one = engine.context.one();
        let two = engine.context.two();
        let sum = engine.context.function(Operator::Add, vec![one, two]);
        let held = engine.context.function(Operator::Hold, vec![sum]);
        let boxed = engine.canonical(held);
        assert_eq!(engine.show(boxed), "Hold(1 + 2)");
    }

    #[test]
    fn structural_constructors() {
        let mut engine = Engine::new();
        let three = engine.context.integer(3);
        let four = engine.context.integer(4);
        let c = engine.function(Operator::Complex, vec![three, four]);
        assert!(engine.context.as_number(c).map_or(false, |n| n.is_complex()));

        let tenth = engine.context.rational(1, 10);
        let one = engine.context.one();
        let z = engine.function(Operator::Complex, vec![tenth, one]);
        let z_value = engine.context.as_number(z).cloned().expect("complex number");
        assert!(z_value.is_exact());
        let tripled = engine.function(Operator::Multiply, vec![z, three]);
        assert_eq!(engine.show(tripled), "3/10+3i");
        assert!(engine.context.as_number(tripled).map_or(false, NumericValue::is_exact));

        let text = engine.context.string("1.5");
        let n = engine.function(Operator::Number, vec![text]);
        assert!(engine.context.is_number(n));

        let name = engine.context.string("alpha");
        let s = engine.function(Operator::Symbol, vec![name]);
        assert_eq!(engine.show(s), "alpha");

        let r = engine.function(Operator::Rational, vec![three, four]);
        assert_eq!(engine.show(r), "3/4");
    }
}
