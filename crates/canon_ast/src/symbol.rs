//! Symbol interning and wildcard naming.
//!
//! All symbol and operator names are stored once and referenced by SymbolId.

use rustc_hash::FxHashMap;

/// Unique identifier for an interned symbol name.
///
/// Using usize for direct Vec indexing without casts.
pub type SymbolId = usize;

/// Symbol table for interning names.
///
/// Not thread-safe. Owned by a single `Context`.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    /// Canonical string storage (SymbolId = index)
    strings: Vec<String>,
    /// Reverse lookup: string → SymbolId
    lookup: FxHashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its SymbolId.
    pub fn intern(&mut self, s: &str) -> SymbolId {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }
        let id = self.strings.len();
        let owned = s.to_string();
        self.strings.push(owned.clone());
        self.lookup.insert(owned, id);
        id
    }

    /// Resolve a SymbolId back to its string.
    ///
    /// # Panics
    /// Panics if id was not produced by this table.
    #[inline]
    pub fn resolve(&self, id: SymbolId) -> &str {
        &self.strings[id]
    }

    /// Get id for a string if it exists, without interning.
    #[inline]
    pub fn get_id(&self, s: &str) -> Option<SymbolId> {
        self.lookup.get(s).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// How many operands a wildcard captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    /// `_x`: exactly one
    Single,
    /// `__x`: one or more
    Sequence,
    /// `___x`: zero or more
    OptionalSequence,
}

/// Classify a symbol name as a wildcard.
pub fn wildcard_kind(name: &str) -> Option<WildcardKind> {
    if name.starts_with("___") {
        Some(WildcardKind::OptionalSequence)
    } else if name.starts_with("__") {
        Some(WildcardKind::Sequence)
    } else if name.starts_with('_') {
        Some(WildcardKind::Single)
    } else {
        None
    }
}

/// Capture name of a wildcard without its underscores (`"__x"` → `"x"`).
///
/// The anonymous wildcard `_` yields an empty name and binds nothing.
pub fn wildcard_name(name: &str) -> Option<&str> {
    wildcard_kind(name).map(|_| name.trim_start_matches('_'))
}

/// Identifiers start with a letter or `_` and continue with letters, digits or `_`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut table = SymbolTable::new();
        let x = table.intern("x");
        let y = table.intern("y");
        assert_ne!(x, y);
        assert_eq!(table.intern("x"), x);
        assert_eq!(table.resolve(y), "y");
        assert_eq!(table.get_id("z"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn wildcard_classification() {
        assert_eq!(wildcard_kind("_x"), Some(WildcardKind::Single));
        assert_eq!(wildcard_kind("__rest"), Some(WildcardKind::Sequence));
        assert_eq!(wildcard_kind("___opt"), Some(WildcardKind::OptionalSequence));
        assert_eq!(wildcard_kind("x"), None);
        assert_eq!(wildcard_name("__rest"), Some("rest"));
        assert_eq!(wildcard_name("_"), Some(""));
    }

    #[test]
    fn identifiers() {
        assert!(is_valid_identifier("x"));
        assert!(is_valid_identifier("_a1"));
        assert!(is_valid_identifier("θ"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1x"));
        assert!(!is_valid_identifier("a-b"));
    }
}
