//! Sign of an expression, when it can be decided without evaluation.

use crate::engine::Engine;
use canon_ast::{Expr, ExprId, Operator};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sign {
    Negative,
    Zero,
    Positive,
}

impl Sign {
    pub fn from_i32(s: i32) -> Sign {
        match s {
            s if s < 0 => Sign::Negative,
            0 => Sign::Zero,
            _ => Sign::Positive,
        }
    }

    pub fn flip(self) -> Sign {
        match self {
            Sign::Negative => Sign::Positive,
            Sign::Zero => Sign::Zero,
            Sign::Positive => Sign::Negative,
        }
    }

    pub fn times(self, other: Sign) -> Sign {
        match (self, other) {
            (Sign::Zero, _) | (_, Sign::Zero) => Sign::Zero,
            (a, b) if a == b => Sign::Positive,
            _ => Sign::Negative,
        }
    }
}

impl Engine {
    /// Sign of a real expression, or `None` when unknown or not real.
    pub fn sgn(&mut self, id: ExprId) -> Option<Sign> {
        match self.context.get(id).clone() {
            Expr::Number(n) => n.sign().map(Sign::from_i32),
            Expr::Symbol(s) => {
                let def = self.symbol_definition(s)?;
                if let Some(value) = def.value {
                    return self.sgn(value);
                }
                def.numeric_value.as_ref()?.sign().map(Sign::from_i32)
            }
            Expr::Function(op, ops) => {
                if let Some(hook) = self.operator_definition(op).and_then(|d| d.sgn.clone()) {
                    return hook(self, &ops);
                }
                self.structural_sign(op, &ops)
            }
            _ => None,
        }
    }

    fn structural_sign(&mut self, op: Operator, ops: &[ExprId]) -> Option<Sign> {
        match (op, ops) {
            (Operator::Negate, [x]) => self.sgn(*x).map(Sign::flip),
            (Operator::Multiply, _) => {
                let mut sign = Sign::Positive;
                for &factor in ops {
                    sign = sign.times(self.sgn(factor)?);
                }
                Some(sign)
            }
            (Operator::Divide, [a, b]) => {
                let denominator = self.sgn(*b)?;
                if denominator == Sign::Zero {
                    return None;
                }
                Some(self.sgn(*a)?.times(denominator))
            }
            (Operator::Add, _) => {
                let mut seen = (false, false);
                for &term in ops {
                    match self.sgn(term)? {
                        Sign::Positive => seen.0 = true,
                        Sign::Negative => seen.1 = true,
                        Sign::Zero => {}
                    }
                }
                match seen {
                    (false, false) => Some(Sign::Zero),
                    (true, false) => Some(Sign::Positive),
                    (false, true) => Some(Sign::Negative),
                    (true, true) => None,
                }
            }
            (Operator::Power, [base, exp]) => {
                let base_sign = self.sgn(*base)?;
                match base_sign {
                    Sign::Positive => Some(Sign::Positive),
                    Sign::Zero => match self.sgn(*exp)? {
                        Sign::Positive => Some(Sign::Zero),
                        _ => None,
                    },
                    Sign::Negative => {
                        let n = self.context.as_number(*exp)?.as_integer()?;
                        Some(if n.bit(0) { Sign::Negative } else { Sign::Positive })
                    }
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_of_structures() {
        let mut engine = Engine::new();
        let e = engine.parse("2*Pi").unwrap();
        assert_eq!(engine.sgn(e), Some(Sign::Positive));
        let e = engine.parse("-Pi/3").unwrap();
        assert_eq!(engine.sgn(e), Some(Sign::Negative));
        let e = engine.parse("Pi + 1").unwrap();
        assert_eq!(engine.sgn(e), Some(Sign::Positive));
        let e = engine.parse("Pi - 4").unwrap();
        assert_eq!(engine.sgn(e), None);
        let e = engine.parse("(-2)^x").unwrap();
        assert_eq!(engine.sgn(e), None);
        let e = engine.parse("exp(x)").unwrap();
        assert_eq!(engine.sgn(e), Some(Sign::Positive));
        let e = engine.parse("x").unwrap();
        assert_eq!(engine.sgn(e), None);
    }
}
