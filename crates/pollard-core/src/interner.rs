//! Name interning for tags and variables.
//!
//! Every element tag and variable name a query run touches is interned once
//! into a `NameTable`, yielding a cheap `Name` handle. Automaton transition
//! tables and buffer nodes store handles, so tag comparison during event
//! processing is O(1) integer comparison.
//!
//! The table is an explicit per-run value, not a global registry: it is built
//! during query analysis and passed by reference wherever names are resolved.

use indexmap::IndexSet;

/// A lightweight handle to an interned name.
///
/// Comparing two names is O(1). Names are ordered by insertion order, not
/// lexicographically; use `NameTable::resolve` if you need string ordering.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Name(u32);

impl Name {
    /// Raw index for transition-table keys and debugging.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Create a Name from a raw index. Use only for indices obtained from
    /// `as_u32` on the same table.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

/// Name interner. A handle is the string's position in the insertion-ordered
/// set, so deduplication, storage, and handle assignment are one structure.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: IndexSet<String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its `Name`. Interning a string the table
    /// already holds returns the existing handle.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(i) = self.names.get_index_of(s) {
            return Name(i as u32);
        }
        let (i, _) = self.names.insert_full(s.to_owned());
        Name(i as u32)
    }

    /// Look up a string without interning it. A probe for callers that only
    /// care about names the table already holds; unknown strings leave the
    /// table untouched.
    #[inline]
    pub fn lookup(&self, s: &str) -> Option<Name> {
        self.names.get_index_of(s).map(|i| Name(i as u32))
    }

    /// Resolve a Name back to its string.
    ///
    /// # Panics
    /// Panics if the name was not created by this table.
    #[inline]
    pub fn resolve(&self, name: Name) -> &str {
        self.names
            .get_index(name.0 as usize)
            .map(String::as_str)
            .expect("name resolved against a foreign table")
    }

    /// Try to resolve a Name, returning None if invalid.
    #[inline]
    pub fn try_resolve(&self, name: Name) -> Option<&str> {
        self.names.get_index(name.0 as usize).map(String::as_str)
    }

    /// Number of interned names.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over all interned strings with their names.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Name, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, s)| (Name(i as u32), s.as_str()))
    }
}
