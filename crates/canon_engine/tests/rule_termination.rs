//! Rewriting must terminate, whether the rules converge, cycle, or grow.

use canon_engine::{Engine, ReplaceOptions, SimplifyOptions};

/// Run with `RUST_LOG=simplify=debug` to watch the passes.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn standard_rules_terminate_on_assorted_inputs() {
    let inputs = [
        "sin(x)^2 + cos(x)^2",
        "sin(-x)^2 + cos(-x)^2 + 2*2^x",
        "ln(e^(x^2)) + e^(ln(y))",
        "|(-t)|^2 + sqrt(t^2)",
        "x^a * x^b * x^c * y",
        "sin(x)/cos(x) + tan(-x)",
        "(1 + x)^2 + (1 - x)^2",
        "|Pi - 4| + |x - 1| * ln(Pi^3)",
    ];
    let mut engine = Engine::new();
    for text in inputs {
        let e = engine.parse(text).expect("input parses");
        let once = engine.simplify(e);
        let twice = engine.simplify(once);
        assert_eq!(
            engine.show(once),
            engine.show(twice),
            "simplification of {} is not a fixed point",
            text
        );
    }
}

#[test]
fn inverse_rule_pair_stops_on_first_repeat() {
    init_tracing();
    let mut engine = Engine::new();
    let rules = vec![
        engine.rule("split", "x^2 -> x*x").unwrap(),
        engine.rule("fold", "f(x) -> g(x)").unwrap(),
        engine.rule("unfold", "g(x) -> f(x)").unwrap(),
    ];
    let e = engine.parse("f(t) + f(s)").unwrap();
    let options = SimplifyOptions {
        cost_exempt_rules: vec!["fold".to_string(), "unfold".to_string()],
        ..SimplifyOptions::default()
    };
    let out = engine.simplify_with(e, &rules, &options);
    let shown = engine.show(out);
    assert!(shown.contains('t') && shown.contains('s'), "{}", shown);
}

#[test]
fn growing_rule_hits_iteration_ceiling() {
    init_tracing();
    let mut engine = Engine::new();
    let rules = vec![engine.rule("nest", "f(x) -> f(f(x))").unwrap()];
    let e = engine.parse("f(t)").unwrap();
    let options = SimplifyOptions {
        max_iterations: 5,
        cost_exempt_rules: vec!["nest".to_string()],
        ..SimplifyOptions::default()
    };
    let out = engine.simplify_with(e, &rules, &options);
    assert_ne!(out, e);

    let replace = ReplaceOptions {
        iteration_limit: 5,
        ..ReplaceOptions::default()
    };
    let out = engine.replace(e, &rules, &replace);
    assert!(engine.show(out).starts_with("f(f("));
}
