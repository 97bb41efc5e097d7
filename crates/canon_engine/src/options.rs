//! Engine, matching, replacement and simplification options.
//!
//! Every option struct has a `Default` and round-trips through serde, so a
//! host can keep its configuration as JSON.

use canon_numeric::DEFAULT_PRECISION;
use serde::{Deserialize, Serialize};

/// Construction-wide settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Malformed construction (invalid identifier, unknown operator, wrong
    /// argument count) returns `Err` instead of an `Error(...)` node.
    pub strict: bool,
    /// Significant decimal digits kept for long decimal literals.
    pub precision: u32,
    /// Default tolerance when matching inexact number literals.
    pub tolerance: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strict: false,
            precision: DEFAULT_PRECISION,
            tolerance: 1e-10,
        }
    }
}

/// Pattern matching settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Also try algebraic variants of the subject (`a - b` as `a + (-b)`,
    /// `x` as `1*x`, ...) when heads differ.
    pub use_variations: bool,
    /// Tolerance for inexact number literals; `None` uses the engine's.
    pub numeric_tolerance: Option<f64>,
    /// Matching gives up (no match) after this many steps.
    pub max_steps: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            use_variations: false,
            numeric_tolerance: None,
            max_steps: 10_000,
        }
    }
}

/// Settings for [`crate::Engine::replace`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaceOptions {
    /// Apply rules to sub-expressions too, not only to the root.
    pub recursive: bool,
    /// Stop after the first successful pass.
    pub once: bool,
    /// Passes before giving up on reaching a fixed point.
    pub iteration_limit: usize,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            once: false,
            iteration_limit: 100,
        }
    }
}

/// Rules whose rewrites are accepted regardless of cost.
pub const DEFAULT_COST_EXEMPT_RULES: &[&str] =
    &["power-combination", "log-rule", "root-sign", "abs-identity"];

/// Settings for [`crate::Engine::simplify_with`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyOptions {
    /// Hard ceiling on rewrite passes.
    pub max_iterations: usize,
    /// A rewrite is accepted when `cost(after) <= cost(before) * cost_tolerance`.
    pub cost_tolerance: f64,
    /// Rule names exempt from the cost check.
    pub cost_exempt_rules: Vec<String>,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            cost_tolerance: 1.3,
            cost_exempt_rules: DEFAULT_COST_EXEMPT_RULES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SimplifyOptions {
    pub fn is_cost_exempt(&self, rule: &str) -> bool {
        self.cost_exempt_rules.iter().any(|r| r == rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = SimplifyOptions::default();
        assert_eq!(s.max_iterations, 1000);
        assert_eq!(s.cost_tolerance, 1.3);
        assert!(s.is_cost_exempt("log-rule"));
        assert!(!s.is_cost_exempt("trig-quotient"));
        assert!(!EngineOptions::default().strict);
    }

    #[test]
    fn json_round_trip() {
        let options = SimplifyOptions {
            max_iterations: 10,
            ..SimplifyOptions::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        let back: SimplifyOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);

        // Missing fields take their defaults.
        let partial: MatchOptions = serde_json::from_str(r#"{"use_variations": true}"#).unwrap();
        assert!(partial.use_variations);
        assert_eq!(partial.max_steps, 10_000);
    }
}
