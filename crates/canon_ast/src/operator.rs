//! Operator heads.
//!
//! Built-in operators form a closed enum; user-defined operators are
//! `Named(SymbolId)` and resolve their behavior through the definition
//! registry of the engine.

use crate::symbol::{SymbolId, SymbolTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    // Arithmetic
    Add,
    Subtract,
    Negate,
    Multiply,
    Divide,
    Power,
    Sqrt,
    Root,
    Exp,
    Ln,
    Log,
    Abs,
    Conjugate,
    // Trigonometric / hyperbolic
    Sin,
    Cos,
    Tan,
    Sinh,
    Cosh,
    Tanh,
    Arcsin,
    Arccos,
    Arctan,
    // Relational
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    // Logic
    And,
    Or,
    Not,
    // Predicates
    IsInteger,
    IsRational,
    IsNumber,
    IsPositive,
    IsNegative,
    // Structural
    Sequence,
    List,
    Hold,
    Error,
    Rational,
    Complex,
    String,
    Symbol,
    Number,
    /// User-defined operator
    Named(SymbolId),
}

/// Coarse grouping used by the canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperatorClass {
    Product,
    Sum,
    Transcendental,
    Power,
    Other,
}

const BUILTINS: &[(&str, Operator)] = &[
    ("Add", Operator::Add),
    ("Subtract", Operator::Subtract),
    ("Negate", Operator::Negate),
    ("Multiply", Operator::Multiply),
    ("Divide", Operator::Divide),
    ("Power", Operator::Power),
    ("Sqrt", Operator::Sqrt),
    ("Root", Operator::Root),
    ("Exp", Operator::Exp),
    ("Ln", Operator::Ln),
    ("Log", Operator::Log),
    ("Abs", Operator::Abs),
    ("Conjugate", Operator::Conjugate),
    ("Sin", Operator::Sin),
    ("Cos", Operator::Cos),
    ("Tan", Operator::Tan),
    ("Sinh", Operator::Sinh),
    ("Cosh", Operator::Cosh),
    ("Tanh", Operator::Tanh),
    ("Arcsin", Operator::Arcsin),
    ("Arccos", Operator::Arccos),
    ("Arctan", Operator::Arctan),
    ("Equal", Operator::Equal),
    ("NotEqual", Operator::NotEqual),
    ("Less", Operator::Less),
    ("LessEqual", Operator::LessEqual),
    ("Greater", Operator::Greater),
    ("GreaterEqual", Operator::GreaterEqual),
    ("And", Operator::And),
    ("Or", Operator::Or),
    ("Not", Operator::Not),
    ("IsInteger", Operator::IsInteger),
    ("IsRational", Operator::IsRational),
    ("IsNumber", Operator::IsNumber),
    ("IsPositive", Operator::IsPositive),
    ("IsNegative", Operator::IsNegative),
    ("Sequence", Operator::Sequence),
    ("List", Operator::List),
    ("Hold", Operator::Hold),
    ("Error", Operator::Error),
    ("Rational", Operator::Rational),
    ("Complex", Operator::Complex),
    ("String", Operator::String),
    ("Symbol", Operator::Symbol),
    ("Number", Operator::Number),
];

impl Operator {
    /// Built-in operator with this name, if any.
    pub fn builtin(name: &str) -> Option<Operator> {
        BUILTINS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, op)| *op)
    }

    /// Built-in operator or a `Named` head interned in `symbols`.
    pub fn from_name(name: &str, symbols: &mut SymbolTable) -> Operator {
        Self::builtin(name).unwrap_or_else(|| Operator::Named(symbols.intern(name)))
    }

    pub fn name<'a>(&self, symbols: &'a SymbolTable) -> &'a str {
        match self {
            Operator::Named(id) => symbols.resolve(*id),
            op => BUILTINS
                .iter()
                .find(|(_, b)| b == op)
                .map(|(n, _)| *n)
                .unwrap_or("?"),
        }
    }

    /// Every built-in operator, in declaration order.
    pub fn builtins() -> impl Iterator<Item = Operator> {
        BUILTINS.iter().map(|(_, op)| *op)
    }

    pub fn class(&self) -> OperatorClass {
        use Operator::*;
        match self {
            Multiply | Negate | Divide => OperatorClass::Product,
            Add | Subtract => OperatorClass::Sum,
            Exp | Ln | Log | Sin | Cos | Tan | Sinh | Cosh | Tanh | Arcsin | Arccos | Arctan => {
                OperatorClass::Transcendental
            }
            Power | Sqrt | Root => OperatorClass::Power,
            _ => OperatorClass::Other,
        }
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            Operator::Equal
                | Operator::NotEqual
                | Operator::Less
                | Operator::LessEqual
                | Operator::Greater
                | Operator::GreaterEqual
        )
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Operator::Named(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        let mut symbols = SymbolTable::new();
        for op in Operator::builtins() {
            let name = op.name(&symbols).to_string();
            assert_eq!(Operator::from_name(&name, &mut symbols), op);
        }
        let f = Operator::from_name("f", &mut symbols);
        assert!(f.is_named());
        assert_eq!(f.name(&symbols), "f");
    }

    #[test]
    fn classes() {
        assert_eq!(Operator::Negate.class(), OperatorClass::Product);
        assert_eq!(Operator::Sqrt.class(), OperatorClass::Power);
        assert_eq!(Operator::Sin.class(), OperatorClass::Transcendental);
        assert!(Operator::LessEqual.is_relational());
    }
}
