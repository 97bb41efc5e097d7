use canon_ast::{ExprId, Operator};
use canon_engine::Engine;
use proptest::prelude::*;

/// Engine-independent expression tree, lowered into a context on demand.
#[derive(Clone, Debug)]
pub enum Tree {
    Int(i64),
    Ratio(i64, i64),
    Var(&'static str),
    Pi,
    Node(Operator, Vec<Tree>),
}

const NAMES: [&str; 4] = ["x", "y", "z", "w"];

pub fn arb_leaf() -> impl Strategy<Value = Tree> {
    prop_oneof![
        (-12i64..12).prop_map(Tree::Int),
        (-9i64..9, 1i64..7).prop_map(|(n, d)| Tree::Ratio(n, d)),
        (0usize..NAMES.len()).prop_map(|i| Tree::Var(NAMES[i])),
        Just(Tree::Pi),
    ]
}

pub fn arb_tree() -> impl Strategy<Value = Tree> {
    arb_leaf().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4)
                .prop_map(|ops| Tree::Node(Operator::Add, ops)),
            prop::collection::vec(inner.clone(), 2..4)
                .prop_map(|ops| Tree::Node(Operator::Multiply, ops)),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Tree::Node(Operator::Subtract, vec![a, b])),
            inner
                .clone()
                .prop_map(|a| Tree::Node(Operator::Negate, vec![a])),
            (inner.clone(), 0i64..4)
                .prop_map(|(a, n)| Tree::Node(Operator::Power, vec![a, Tree::Int(n)])),
            inner.prop_map(|a| Tree::Node(Operator::Sin, vec![a])),
        ]
    })
}

/// Build the tree as raw, non-canonical nodes.
pub fn lower(engine: &mut Engine, tree: &Tree) -> ExprId {
    match tree {
        Tree::Int(n) => engine.integer(*n),
        Tree::Ratio(n, d) => engine.context.rational(*n, *d),
        Tree::Var(name) => engine.context.var(name),
        Tree::Pi => engine.context.pi(),
        Tree::Node(op, ops) => {
            let ops = ops.iter().map(|t| lower(engine, t)).collect();
            engine.context.function(*op, ops)
        }
    }
}
