//! The bloq abstraction and its shared, structurally compared handle

use crate::composite::CompositeBloq;
use crate::cost::{CostKey, CostValue};
use crate::wrappers::{Adjoint, Controlled};
use crate::{Angle, BloqError, Expr, Result, Signature, SymbolAllocator};
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Coarse classification of a bloq used by generalizers, keep policies and
/// gate tallies
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GateFamily {
    /// T or T-dagger
    T,
    /// Doubly controlled NOT
    Toffoli,
    /// Two-bit controlled swap (Fredkin)
    CSwap,
    /// Logical AND into a fresh target, or its measurement-based uncomputation
    And { uncompute: bool },
    /// Any Clifford operation
    Clifford,
    /// Single-qubit rotation by a continuous angle
    Rotation,
    /// Pure rewiring of qubits into or out of a register
    SplitJoin,
    /// Allocation or deallocation of qubits
    AllocFree,
    /// Everything else
    Other,
}

impl GateFamily {
    /// Whether bloqs of this family cost nothing beyond bookkeeping
    pub fn is_bookkeeping(self) -> bool {
        matches!(self, GateFamily::SplitJoin | GateFamily::AllocFree)
    }
}

/// The value of a generalizable bloq attribute
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Bool(bool),
    Expr(Expr),
    Angle(Angle),
}

impl FieldValue {
    /// Name of the value kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Expr(_) => "expression",
            FieldValue::Angle(_) => "angle",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            FieldValue::Expr(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_angle(&self) -> Option<&Angle> {
        match self {
            FieldValue::Angle(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Expr(e) => write!(f, "{}", e),
            FieldValue::Angle(a) => write!(f, "{}", a),
        }
    }
}

/// The type-level identity of a bloq
///
/// Two bloqs of the same Rust type have the same kind regardless of their
/// parameters. Interop wrappers may report a kind that is not a Rust type.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BloqKind(Arc<str>);

impl BloqKind {
    /// The kind of the Rust type `T`
    pub fn of<T: ?Sized>() -> Self {
        Self(Arc::from(std::any::type_name::<T>()))
    }

    /// A kind with an explicit, fully qualified name
    pub fn named(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Fully qualified name
    #[inline]
    pub fn full_name(&self) -> &str {
        &self.0
    }

    /// Last path segment of the name
    pub fn short_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }
}

impl fmt::Debug for BloqKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BloqKind({})", self.0)
    }
}

impl fmt::Display for BloqKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Object-safe equality and hashing for bloq trait objects
///
/// Implemented automatically for every [`Bloq`] that is `Eq + Hash`; bloq
/// authors never implement it by hand.
pub trait DynBloq: Any {
    fn as_any(&self) -> &dyn Any;

    /// Structural equality against another bloq of any type
    fn dyn_eq(&self, other: &dyn Any) -> bool;

    fn dyn_hash(&self, state: &mut dyn Hasher);

    /// Rust type name of the concrete bloq
    fn type_name(&self) -> &'static str;

    fn kind(&self) -> BloqKind;
}

impl<T: Bloq + Eq + Hash + 'static> DynBloq for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().map_or(false, |other| self == other)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn kind(&self) -> BloqKind {
        BloqKind::of::<T>()
    }
}

/// An immutable description of one quantum operation
///
/// A bloq exposes a [`Signature`] and may describe its cost through a call
/// graph: a list of callee bloqs and how many times each is invoked. Bloqs
/// are compared by value, so two separately constructed bloqs with equal
/// parameters are the same graph vertex.
///
/// # Example
/// ```
/// use bloqcount_core::{Bloq, BloqRef, Expr, Result, Signature, SymbolAllocator};
///
/// #[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// struct Atom;
///
/// impl Bloq for Atom {
///     fn signature(&self) -> Signature {
///         Signature::build([("q", 1)])
///     }
/// }
///
/// #[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// struct Pair;
///
/// impl Bloq for Pair {
///     fn signature(&self) -> Signature {
///         Signature::build([("q", 2)])
///     }
///
///     fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
///         Ok(vec![(BloqRef::new(Atom), Expr::from(2))])
///     }
/// }
///
/// let pair = BloqRef::new(Pair);
/// let callees = pair.build_call_graph(&mut SymbolAllocator::new()).unwrap();
/// assert_eq!(callees[0].0, BloqRef::new(Atom));
/// assert!(BloqRef::new(Atom).build_call_graph(&mut SymbolAllocator::new()).is_err());
/// ```
pub trait Bloq: DynBloq + fmt::Debug + Send + Sync {
    /// Short human-readable name of the bloq type
    fn pretty_name(&self) -> String {
        self.kind().short_name().to_string()
    }

    /// Name including the parameters that distinguish instances
    fn label(&self) -> String {
        self.pretty_name()
    }

    /// The ordered ports of the bloq
    fn signature(&self) -> Signature;

    /// Expand this bloq into a composite of sub-bloq instances
    ///
    /// # Errors
    /// [`BloqError::DecomposeNotImplemented`] by default, or
    /// [`BloqError::DecomposeTypeError`] when no decomposition can exist.
    fn decompose_bloq(&self) -> Result<CompositeBloq> {
        Err(BloqError::not_implemented(self.pretty_name()))
    }

    /// Callees of this bloq with the number of times each is called
    ///
    /// The default counts the instances of [`Bloq::decompose_bloq`].
    /// Implementations may introduce fresh symbols through `ssa`.
    fn build_call_graph(&self, ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        let _ = ssa;
        Ok(self.decompose_bloq()?.callee_counts())
    }

    /// Costs this bloq contributes on top of whatever its callees add up to
    fn my_static_costs(&self) -> Vec<(CostKey, CostValue)> {
        Vec::new()
    }

    /// Costs to use when counting stops at this bloq
    ///
    /// `None` selects the engine default: one call of the bloq itself and
    /// its signature width as max qubits.
    fn my_leaf_costs(&self) -> Option<Vec<(CostKey, CostValue)>> {
        None
    }

    /// Look up a single static cost
    fn static_cost(&self, key: &CostKey) -> Option<CostValue> {
        self.my_static_costs()
            .into_iter()
            .find_map(|(k, v)| (&k == key).then_some(v))
    }

    fn family(&self) -> GateFamily {
        GateFamily::Other
    }

    /// Attributes a generalizer may rewrite
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        Vec::new()
    }

    /// A copy of this bloq with one attribute replaced
    ///
    /// # Errors
    /// [`BloqError::UnknownField`] if the bloq has no such attribute, or
    /// [`BloqError::FieldType`] if the value has the wrong kind.
    fn with_field(&self, name: &str, value: FieldValue) -> Result<BloqRef> {
        let _ = value;
        Err(BloqError::unknown_field(self.pretty_name(), name))
    }

    /// The bloq this one wraps, for adjoint and controlled wrappers
    fn wrapped(&self) -> Option<&BloqRef> {
        None
    }

    /// Kind used for the class graph, looking through wrappers
    fn class_kind(&self) -> BloqKind {
        match self.wrapped() {
            Some(inner) => inner.class_kind(),
            None => self.kind(),
        }
    }

    /// A dedicated adjoint, if this bloq has one
    fn specialized_adjoint(&self) -> Option<BloqRef> {
        None
    }

    /// A dedicated controlled version, if this bloq has one
    fn specialized_controlled(&self, cv: bool) -> Option<BloqRef> {
        let _ = cv;
        None
    }
}

/// A shared handle to any bloq
///
/// Equality and hashing are structural across concrete bloq types, which
/// makes `BloqRef` suitable as a graph key.
#[derive(Clone)]
pub struct BloqRef(Arc<dyn Bloq>);

impl BloqRef {
    pub fn new<B: Bloq + 'static>(bloq: B) -> Self {
        Self(Arc::new(bloq))
    }

    pub fn from_arc(bloq: Arc<dyn Bloq>) -> Self {
        Self(bloq)
    }

    /// The concrete bloq, if it has type `B`
    pub fn downcast_ref<B: Bloq + 'static>(&self) -> Option<&B> {
        self.0.as_any().downcast_ref::<B>()
    }

    pub fn is<B: Bloq + 'static>(&self) -> bool {
        self.downcast_ref::<B>().is_some()
    }

    /// The adjoint of this bloq
    ///
    /// Uses the bloq's own adjoint when it has one and wraps it otherwise.
    pub fn adjoint(&self) -> BloqRef {
        self.0
            .specialized_adjoint()
            .unwrap_or_else(|| BloqRef::new(Adjoint::new(self.clone())))
    }

    /// This bloq controlled on one qubit being `cv`
    pub fn controlled(&self, cv: bool) -> BloqRef {
        self.0
            .specialized_controlled(cv)
            .unwrap_or_else(|| BloqRef::new(Controlled::new(self.clone(), cv)))
    }
}

impl Deref for BloqRef {
    type Target = dyn Bloq;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for BloqRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.dyn_eq(other.0.as_any())
    }
}

impl Eq for BloqRef {}

impl Hash for BloqRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.type_name().hash(state);
        self.0.dyn_hash(state);
    }
}

impl fmt::Debug for BloqRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for BloqRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Tagged(u32);

    impl Bloq for Tagged {
        fn signature(&self) -> Signature {
            Signature::build([("q", 1)])
        }

        fn label(&self) -> String {
            format!("Tagged({})", self.0)
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Other(u32);

    impl Bloq for Other {
        fn signature(&self) -> Signature {
            Signature::empty()
        }
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(BloqRef::new(Tagged(1)), BloqRef::new(Tagged(1)));
        assert_ne!(BloqRef::new(Tagged(1)), BloqRef::new(Tagged(2)));
        assert_ne!(BloqRef::new(Tagged(1)), BloqRef::new(Other(1)));
    }

    #[test]
    fn test_hash_set_dedup() {
        let mut set = AHashSet::new();
        set.insert(BloqRef::new(Tagged(1)));
        set.insert(BloqRef::new(Tagged(1)));
        set.insert(BloqRef::new(Other(1)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_downcast() {
        let b = BloqRef::new(Tagged(7));
        assert_eq!(b.downcast_ref::<Tagged>(), Some(&Tagged(7)));
        assert!(!b.is::<Other>());
    }

    #[test]
    fn test_kind_names() {
        let b = BloqRef::new(Tagged(0));
        assert_eq!(b.kind().short_name(), "Tagged");
        assert_eq!(b.pretty_name(), "Tagged");
        assert_eq!(b.to_string(), "Tagged(0)");
        assert_eq!(b.kind(), BloqRef::new(Tagged(3)).kind());
    }

    #[test]
    fn test_default_decomposition_not_implemented() {
        let b = BloqRef::new(Other(0));
        let err = b.build_call_graph(&mut SymbolAllocator::new()).unwrap_err();
        assert!(matches!(err, BloqError::DecomposeNotImplemented { .. }));
    }

    #[test]
    fn test_default_with_field_is_unknown() {
        let b = BloqRef::new(Other(0));
        let err = b.with_field("angle", FieldValue::Bool(true)).unwrap_err();
        assert_eq!(err, BloqError::unknown_field("Other", "angle"));
    }

    #[test]
    fn test_adjoint_wraps_and_unwraps() {
        let b = BloqRef::new(Tagged(1));
        let adj = b.adjoint();
        assert_ne!(adj, b);
        assert_eq!(adj.class_kind(), b.kind());
        assert_eq!(adj.adjoint(), b);
    }

    #[test]
    fn test_controlled_class_kind() {
        let b = BloqRef::new(Tagged(1));
        let ctrl = b.controlled(true);
        assert_eq!(ctrl.wrapped(), Some(&b));
        assert_eq!(ctrl.class_kind(), b.kind());
        assert_ne!(ctrl, b.controlled(false));
    }
}
