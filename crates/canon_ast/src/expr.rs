use crate::operator::Operator;
use crate::symbol::SymbolId;
use canon_numeric::NumericValue;

/// Handle to a node in a [`crate::Context`].
///
/// Nodes are hash-consed, so two ids are equal exactly when the trees they
/// denote are structurally identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        ExprId(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Number(NumericValue),
    Symbol(SymbolId),
    String(String),
    Function(Operator, Vec<ExprId>),
    /// Entries sorted by key
    Dictionary(Vec<(String, ExprId)>),
}

impl Expr {
    pub fn is_number(&self) -> bool {
        matches!(self, Expr::Number(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Expr::Symbol(_))
    }

    pub fn operator(&self) -> Option<Operator> {
        match self {
            Expr::Function(op, _) => Some(*op),
            _ => None,
        }
    }

    /// Operands of a function node; empty for leaves.
    pub fn operands(&self) -> &[ExprId] {
        match self {
            Expr::Function(_, ops) => ops,
            _ => &[],
        }
    }

    /// Child ids in left-to-right order (operands or dictionary values).
    pub fn children(&self) -> Vec<ExprId> {
        match self {
            Expr::Function(_, ops) => ops.clone(),
            Expr::Dictionary(entries) => entries.iter().map(|(_, v)| *v).collect(),
            _ => Vec::new(),
        }
    }
}
