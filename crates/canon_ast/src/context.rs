//! Expression arena.
//!
//! Every node lives in a `Context` and is referenced by an [`ExprId`]. The
//! arena hash-conses nodes: adding a node equal to an existing one returns the
//! existing id. Per node it caches a structural hash, whether the node is
//! known to be canonical, and whether it is valid (contains no `Error` node).
//! Canonical marks belong to a generation; [`Context::invalidate_canonical`]
//! starts a new one when the definitions canonical forms depend on change.
//!
//! The context also owns the symbol table, the set of constant symbols and the
//! shared singleton literals (`0`, `1`, `NaN`, `Pi`, ...).

use crate::error::AstError;
use crate::expr::{Expr, ExprId};
use crate::operator::Operator;
use crate::symbol::{is_valid_identifier, SymbolId, SymbolTable};
use canon_numeric::NumericValue;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
struct Node {
    expr: Expr,
    hash: u64,
    /// Generation the node was last marked canonical in.
    canonical_at: u64,
    valid: bool,
}

/// Never marked canonical.
const NOT_CANONICAL: u64 = 0;
/// Canonical in every generation: literals and `Error` nodes.
const ALWAYS_CANONICAL: u64 = u64::MAX;

/// Ids of the literals and symbols allocated with every context.
#[derive(Debug, Clone, Copy)]
pub struct WellKnown {
    pub zero: ExprId,
    pub one: ExprId,
    pub negative_one: ExprId,
    pub two: ExprId,
    pub half: ExprId,
    pub nan: ExprId,
    pub positive_infinity: ExprId,
    pub negative_infinity: ExprId,
    pub complex_infinity: ExprId,
    pub pi: ExprId,
    pub e: ExprId,
    pub imaginary_unit: ExprId,
    pub true_: ExprId,
    pub false_: ExprId,
    pub nothing: ExprId,
}

/// Arena statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStats {
    pub nodes: usize,
    pub canonical: usize,
    pub invalid: usize,
    pub symbols: usize,
}

/// Names of the constant symbols every context knows about.
pub const CONSTANT_SYMBOLS: &[&str] = &[
    "Pi",
    "ExponentialE",
    "ImaginaryUnit",
    "True",
    "False",
    "Nothing",
];

#[derive(Debug, Clone)]
pub struct Context {
    nodes: Vec<Node>,
    interned: FxHashMap<Expr, ExprId>,
    symbols: SymbolTable,
    constants: FxHashSet<SymbolId>,
    well_known: WellKnown,
    generation: u64,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        // Placeholder ids are overwritten below once the nodes exist.
        let placeholder = ExprId::from_index(0);
        let mut ctx = Context {
            nodes: Vec::new(),
            interned: FxHashMap::default(),
            symbols: SymbolTable::new(),
            constants: FxHashSet::default(),
            generation: 1,
            well_known: WellKnown {
                zero: placeholder,
                one: placeholder,
                negative_one: placeholder,
                two: placeholder,
                half: placeholder,
                nan: placeholder,
                positive_infinity: placeholder,
                negative_infinity: placeholder,
                complex_infinity: placeholder,
                pi: placeholder,
                e: placeholder,
                imaginary_unit: placeholder,
                true_: placeholder,
                false_: placeholder,
                nothing: placeholder,
            },
        };
        for name in CONSTANT_SYMBOLS {
            let id = ctx.symbols.intern(name);
            ctx.constants.insert(id);
        }
        ctx.well_known = WellKnown {
            zero: ctx.num(NumericValue::zero()),
            one: ctx.num(NumericValue::one()),
            negative_one: ctx.num(NumericValue::negative_one()),
            two: ctx.num(NumericValue::two()),
            half: ctx.num(NumericValue::half()),
            nan: ctx.num(NumericValue::nan()),
            positive_infinity: ctx.num(NumericValue::positive_infinity()),
            negative_infinity: ctx.num(NumericValue::negative_infinity()),
            complex_infinity: ctx.num(NumericValue::complex_infinity()),
            pi: ctx.var("Pi"),
            e: ctx.var("ExponentialE"),
            imaginary_unit: ctx.var("ImaginaryUnit"),
            true_: ctx.var("True"),
            false_: ctx.var("False"),
            nothing: ctx.var("Nothing"),
        };
        ctx
    }

    /// Add (or find) a node. New nodes start non-canonical, except number
    /// and string literals which have a single representation.
    pub fn add(&mut self, expr: Expr) -> ExprId {
        if let Some(&id) = self.interned.get(&expr) {
            return id;
        }
        let valid = match &expr {
            Expr::Function(Operator::Error, _) => false,
            Expr::Function(_, ops) => ops.iter().all(|&op| self.nodes[op.index()].valid),
            Expr::Dictionary(entries) => entries.iter().all(|(_, v)| self.nodes[v.index()].valid),
            _ => true,
        };
        let canonical_at = if matches!(expr, Expr::Number(_) | Expr::String(_)) {
            ALWAYS_CANONICAL
        } else {
            NOT_CANONICAL
        };
        let mut hasher = FxHasher::default();
        expr.hash(&mut hasher);
        let hash = hasher.finish();

        let id = ExprId::from_index(self.nodes.len());
        self.nodes.push(Node {
            expr: expr.clone(),
            hash,
            canonical_at,
            valid,
        });
        self.interned.insert(expr, id);
        id
    }

    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()].expr
    }

    // ---- construction helpers -------------------------------------------

    pub fn num(&mut self, value: NumericValue) -> ExprId {
        self.add(Expr::Number(value))
    }

    pub fn integer(&mut self, n: i64) -> ExprId {
        self.num(NumericValue::from_integer(n))
    }

    pub fn rational(&mut self, n: i64, d: i64) -> ExprId {
        self.num(NumericValue::rational(n, d))
    }

    /// Symbol node without identifier validation.
    pub fn var(&mut self, name: &str) -> ExprId {
        let id = self.symbols.intern(name);
        self.add(Expr::Symbol(id))
    }

    /// Symbol node for a validated identifier.
    pub fn try_symbol(&mut self, name: &str) -> Result<ExprId, AstError> {
        if !is_valid_identifier(name) {
            return Err(AstError::InvalidIdentifier(name.to_string()));
        }
        Ok(self.var(name))
    }

    pub fn string(&mut self, s: &str) -> ExprId {
        self.add(Expr::String(s.to_string()))
    }

    /// Function node built as given: no flattening, sorting or folding.
    pub fn function(&mut self, op: Operator, ops: Vec<ExprId>) -> ExprId {
        self.add(Expr::Function(op, ops))
    }

    /// Function node with a head looked up by name.
    pub fn call(&mut self, name: &str, ops: Vec<ExprId>) -> ExprId {
        let op = Operator::from_name(name, &mut self.symbols);
        self.function(op, ops)
    }

    /// Dictionary node; keys are sorted and must be unique.
    pub fn dictionary(&mut self, mut entries: Vec<(String, ExprId)>) -> Result<ExprId, AstError> {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(AstError::DuplicateKey(pair[0].0.clone()));
        }
        Ok(self.add(Expr::Dictionary(entries)))
    }

    /// `Error(code)` or `Error(code, at)`; always invalid.
    pub fn error(&mut self, code: &str, at: Option<ExprId>) -> ExprId {
        let code = self.string(code);
        let mut ops = vec![code];
        ops.extend(at);
        let id = self.function(Operator::Error, ops);
        self.nodes[id.index()].canonical_at = ALWAYS_CANONICAL;
        id
    }

    // ---- node flags -----------------------------------------------------

    #[inline]
    pub fn is_canonical(&self, id: ExprId) -> bool {
        let at = self.nodes[id.index()].canonical_at;
        at == ALWAYS_CANONICAL || at == self.generation
    }

    /// Record that `id` is in canonical form for the current generation.
    #[inline]
    pub fn mark_canonical(&mut self, id: ExprId) {
        let node = &mut self.nodes[id.index()];
        if node.canonical_at != ALWAYS_CANONICAL {
            node.canonical_at = self.generation;
        }
    }

    /// Drop every canonical mark except those of literals and `Error` nodes.
    pub fn invalidate_canonical(&mut self) {
        self.generation += 1;
    }

    #[inline]
    pub fn is_valid(&self, id: ExprId) -> bool {
        self.nodes[id.index()].valid
    }

    /// Structural hash of the node.
    #[inline]
    pub fn hash_of(&self, id: ExprId) -> u64 {
        self.nodes[id.index()].hash
    }

    // ---- accessors ------------------------------------------------------

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn symbol_name(&self, id: SymbolId) -> &str {
        self.symbols.resolve(id)
    }

    pub fn operator_name(&self, op: Operator) -> &str {
        op.name(&self.symbols)
    }

    pub fn operator_of(&mut self, name: &str) -> Operator {
        Operator::from_name(name, &mut self.symbols)
    }

    pub fn is_constant_symbol(&self, id: SymbolId) -> bool {
        self.constants.contains(&id)
    }

    /// Register a symbol as a constant for ordering purposes.
    pub fn add_constant(&mut self, name: &str) -> SymbolId {
        let id = self.symbols.intern(name);
        self.constants.insert(id);
        id
    }

    pub fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    pub fn op(&self, id: ExprId) -> Option<Operator> {
        self.get(id).operator()
    }

    pub fn ops(&self, id: ExprId) -> &[ExprId] {
        self.get(id).operands()
    }

    pub fn as_number(&self, id: ExprId) -> Option<&NumericValue> {
        match self.get(id) {
            Expr::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_symbol(&self, id: ExprId) -> Option<SymbolId> {
        match self.get(id) {
            Expr::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_string(&self, id: ExprId) -> Option<&str> {
        match self.get(id) {
            Expr::String(s) => Some(s),
            _ => None,
        }
    }

    /// Name of a symbol node.
    pub fn symbol_str(&self, id: ExprId) -> Option<&str> {
        self.as_symbol(id).map(|s| self.symbols.resolve(s))
    }

    pub fn is_number(&self, id: ExprId) -> bool {
        self.get(id).is_number()
    }

    pub fn is_function(&self, id: ExprId, op: Operator) -> bool {
        self.op(id) == Some(op)
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stats(&self) -> ContextStats {
        ContextStats {
            nodes: self.nodes.len(),
            canonical: self
                .nodes
                .iter()
                .filter(|n| n.canonical_at == ALWAYS_CANONICAL || n.canonical_at == self.generation)
                .count(),
            invalid: self.nodes.iter().filter(|n| !n.valid).count(),
            symbols: self.symbols.len(),
        }
    }

    // ---- singletons -----------------------------------------------------

    pub fn zero(&self) -> ExprId {
        self.well_known.zero
    }

    pub fn one(&self) -> ExprId {
        self.well_known.one
    }

    pub fn negative_one(&self) -> ExprId {
        self.well_known.negative_one
    }

    pub fn two(&self) -> ExprId {
        self.well_known.two
    }

    pub fn half(&self) -> ExprId {
        self.well_known.half
    }

    pub fn nan(&self) -> ExprId {
        self.well_known.nan
    }

    pub fn positive_infinity(&self) -> ExprId {
        self.well_known.positive_infinity
    }

    pub fn negative_infinity(&self) -> ExprId {
        self.well_known.negative_infinity
    }

    pub fn complex_infinity(&self) -> ExprId {
        self.well_known.complex_infinity
    }

    pub fn pi(&self) -> ExprId {
        self.well_known.pi
    }

    pub fn e(&self) -> ExprId {
        self.well_known.e
    }

    pub fn imaginary_unit(&self) -> ExprId {
        self.well_known.imaginary_unit
    }

    pub fn true_(&self) -> ExprId {
        self.well_known.true_
    }

    pub fn false_(&self) -> ExprId {
        self.well_known.false_
    }

    pub fn boolean(&self, value: bool) -> ExprId {
        if value {
            self.well_known.true_
        } else {
            self.well_known.false_
        }
    }

    pub fn nothing(&self) -> ExprId {
        self.well_known.nothing
    }
}
