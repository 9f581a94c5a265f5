//! Declared rules for bloqs that are always counted as leaves

use ahash::AHashSet;
use bloqcount_core::{BloqKind, BloqRef, GateFamily};
use std::fmt;
use std::sync::Arc;

type KeepFn = dyn Fn(&BloqRef) -> bool + Send + Sync;

/// Which bloqs the call-graph builder must not expand
///
/// A bloq is kept (made a leaf even if it has a decomposition) when it
/// matches any of:
/// - an exact bloq in the declared set
/// - a declared [`BloqKind`]
/// - a declared [`GateFamily`]
/// - the optional custom predicate
///
/// # Example
/// ```
/// use bloqcount_core::{BloqRef, GateFamily};
/// use bloqcount_counting::KeepPolicy;
/// use bloqcount_gates::{CSwap, Rz, Toffoli};
///
/// let keep = KeepPolicy::new()
///     .keep_bloq(BloqRef::new(Toffoli))
///     .keep_family(GateFamily::Rotation);
/// assert!(keep.should_keep(&BloqRef::new(Toffoli)));
/// assert!(keep.should_keep(&BloqRef::new(Rz::new(0.5))));
/// assert!(!keep.should_keep(&BloqRef::new(CSwap)));
/// ```
#[derive(Clone, Default)]
pub struct KeepPolicy {
    bloqs: AHashSet<BloqRef>,
    kinds: AHashSet<BloqKind>,
    families: Vec<GateFamily>,
    predicate: Option<Arc<KeepFn>>,
}

impl KeepPolicy {
    /// A policy that keeps nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep exactly this bloq
    pub fn keep_bloq(mut self, bloq: BloqRef) -> Self {
        self.bloqs.insert(bloq);
        self
    }

    /// Keep every bloq of type `B`
    pub fn keep_kind<B: 'static>(self) -> Self {
        self.keep_kind_named(BloqKind::of::<B>())
    }

    pub fn keep_kind_named(mut self, kind: BloqKind) -> Self {
        self.kinds.insert(kind);
        self
    }

    /// Keep every bloq reporting `family`
    pub fn keep_family(mut self, family: GateFamily) -> Self {
        if !self.families.contains(&family) {
            self.families.push(family);
        }
        self
    }

    /// Keep every bloq the predicate accepts, in addition to the declared sets
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&BloqRef) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn should_keep(&self, bloq: &BloqRef) -> bool {
        self.bloqs.contains(bloq)
            || self.kinds.contains(&bloq.kind())
            || self.families.contains(&bloq.family())
            || self.predicate.as_ref().map_or(false, |p| p(bloq))
    }

    /// Whether the policy can keep anything at all
    pub fn is_empty(&self) -> bool {
        self.bloqs.is_empty()
            && self.kinds.is_empty()
            && self.families.is_empty()
            && self.predicate.is_none()
    }
}

impl fmt::Debug for KeepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeepPolicy")
            .field("bloqs", &self.bloqs.len())
            .field("kinds", &self.kinds)
            .field("families", &self.families)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}
