//! Symbols and the per-session symbol allocator

use ahash::AHashMap;
use std::fmt;
use std::sync::Arc;

/// A named free variable in a symbolic expression
///
/// Symbols compare by name, so two symbols built from the same string are
/// interchangeable.
///
/// # Example
/// ```
/// use bloqcount_core::Symbol;
///
/// let n = Symbol::new("n");
/// assert_eq!(n.name(), "n");
/// assert_eq!(n, Symbol::new("n"));
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Create a symbol with the given name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Get the symbol name
    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Allocates fresh symbols for integrating out bloq attributes
///
/// When counting, bloqs that differ only in attributes that do not affect
/// resource costs are grouped by replacing those attributes with a symbol.
/// Every symbol handed out by one allocator is distinct; the name is
/// `_{prefix}{index}` where the index counts up per prefix, so a given call
/// sequence always produces the same names.
///
/// Allocators are not shared: create one per independent counting run.
///
/// # Example
/// ```
/// use bloqcount_core::SymbolAllocator;
///
/// let mut ssa = SymbolAllocator::new();
/// let k0 = ssa.new_symbol("k");
/// let k1 = ssa.new_symbol("k");
/// let n0 = ssa.new_symbol("n");
/// assert_eq!(k0.name(), "_k0");
/// assert_eq!(k1.name(), "_k1");
/// assert_eq!(n0.name(), "_n0");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SymbolAllocator {
    idxs: AHashMap<String, usize>,
}

impl SymbolAllocator {
    /// Create an allocator with no symbols issued
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a symbol distinct from every symbol this allocator issued before
    pub fn new_symbol(&mut self, prefix: &str) -> Symbol {
        let idx = self.idxs.entry(prefix.to_string()).or_insert(0);
        let symbol = Symbol::new(format!("_{}{}", prefix, idx));
        *idx += 1;
        symbol
    }

    /// Number of symbols issued for `prefix` so far
    pub fn issued(&self, prefix: &str) -> usize {
        self.idxs.get(prefix).copied().unwrap_or(0)
    }
}
