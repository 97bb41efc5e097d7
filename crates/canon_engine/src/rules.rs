//! The standard simplification rule set.

use crate::engine::Engine;
use crate::rule::Rule;
use tracing::warn;

/// Rule families, by name. A family's name is what the cost exemptions in
/// [`crate::SimplifyOptions`] refer to.
const STANDARD_RULES: &[(&str, &[&str])] = &[
    (
        "power-combination",
        &[
            "x^n * x^m -> x^(n + m)",
            "x * x^n -> x^(n + 1)",
            "x^n * x^m * ___r -> x^(n + m) * ___r",
            "x * x^n * ___r -> x^(n + 1) * ___r",
        ],
    ),
    (
        "log-rule",
        &[
            "ln(e^x) -> x",
            "e^(ln(x)) -> x",
            "ln(x^n) -> n*ln(x); x > 0",
        ],
    ),
    ("root-sign", &["sqrt(x^2) -> |x|"]),
    (
        "abs-identity",
        &[
            "|-x| -> |x|",
            "|x|^2 -> x^2",
            "|x| -> x; x >= 0",
            "|x| -> -x; x < 0",
        ],
    ),
    (
        "trig-pythagorean",
        &[
            "sin(x)^2 + cos(x)^2 -> 1",
            "sin(x)^2 + cos(x)^2 + ___r -> 1 + ___r",
        ],
    ),
    (
        "trig-parity",
        &[
            "sin(-x) -> -sin(x)",
            "cos(-x) -> cos(x)",
            "tan(-x) -> -tan(x)",
        ],
    ),
    ("trig-quotient", &["sin(x)/cos(x) -> tan(x)"]),
];

pub(crate) fn standard_rules(engine: &mut Engine) -> Vec<Rule> {
    let mut rules = Vec::new();
    for (name, texts) in STANDARD_RULES {
        for text in *texts {
            match engine.rule(name, text) {
                Ok(rule) => rules.push(rule),
                Err(e) => warn!(rule = %name, text = %text, error = %e, "rule_compile_failed"),
            }
        }
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simplify(engine: &mut Engine, text: &str) -> String {
        let e = engine.parse(text).unwrap();
        let s = engine.simplify(e);
        engine.show(s)
    }

    #[test]
    fn every_standard_rule_compiles() {
        let mut engine = Engine::new();
        let expected: usize = STANDARD_RULES.iter().map(|(_, t)| t.len()).sum();
        assert_eq!(standard_rules(&mut engine).len(), expected);
    }

    #[test]
    fn combines_powers() {
        let mut engine = Engine::new();
        assert_eq!(simplify(&mut engine, "2*2^x"), "2^(x + 1)");
        assert_eq!(simplify(&mut engine, "y^a * y^b"), "y^(a + b)");
    }

    #[test]
    fn logarithms() {
        let mut engine = Engine::new();
        assert_eq!(simplify(&mut engine, "ln(exp(t))"), "t");
        assert_eq!(simplify(&mut engine, "exp(ln(t))"), "t");
        assert_eq!(simplify(&mut engine, "ln(Pi^3)"), "3*Ln(Pi)");
        assert_eq!(simplify(&mut engine, "ln(t^3)"), "Ln(t^3)");
    }

    #[test]
    fn absolute_values() {
        let mut engine = Engine::new();
        assert_eq!(simplify(&mut engine, "sqrt(t^2)"), "|t|");
        assert_eq!(simplify(&mut engine, "|-t|"), "|t|");
        let flipped = engine.parse("4 - Pi").unwrap();
        assert_eq!(simplify(&mut engine, "|Pi - 4|"), engine.show(flipped));
        assert_eq!(simplify(&mut engine, "|Pi + 1|"), "Pi + 1");
    }

    #[test]
    fn trigonometry() {
        let mut engine = Engine::new();
        assert_eq!(simplify(&mut engine, "cos(-t)"), "Cos(t)");
        assert_eq!(simplify(&mut engine, "sin(-t)"), "-Sin(t)");
        assert_eq!(simplify(&mut engine, "sin(t)/cos(t)"), "Tan(t)");
    }
}
