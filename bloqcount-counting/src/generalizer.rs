//! Generalizer trait and the ordered pipeline that composes generalizers

use bloqcount_core::{BloqRef, Result};
use std::fmt;
use std::sync::Arc;

/// Trait for rules that merge equivalent bloqs before they become graph keys
///
/// A generalizer maps a bloq to a (usually less specific) replacement, or to
/// `None` to drop it from counting entirely.
///
/// # Example
/// ```
/// use bloqcount_core::{BloqRef, GateFamily, Result};
/// use bloqcount_counting::Generalizer;
///
/// struct DropRotations;
///
/// impl Generalizer for DropRotations {
///     fn name(&self) -> &str {
///         "drop-rotations"
///     }
///
///     fn generalize(&self, bloq: &BloqRef) -> Result<Option<BloqRef>> {
///         if bloq.family() == GateFamily::Rotation {
///             return Ok(None);
///         }
///         Ok(Some(bloq.clone()))
///     }
/// }
/// ```
pub trait Generalizer: Send + Sync {
    /// The name of this generalizer
    fn name(&self) -> &str;

    /// Rewrite `bloq`
    ///
    /// # Returns
    /// * `Ok(Some(b))` to use `b` in place of the input
    /// * `Ok(None)` to drop the input from the call graph
    ///
    /// # Errors
    /// Returns an error if the rule does not fit the bloq it was handed, for
    /// example a field rewrite naming a field the bloq lacks. Such errors
    /// abort counting.
    fn generalize(&self, bloq: &BloqRef) -> Result<Option<BloqRef>>;

    /// Optional description of what this generalizer does
    fn description(&self) -> Option<&str> {
        None
    }
}

/// An ordered chain of generalizers applied as one
///
/// Each rule sees the output of the previous one. The first rule that drops
/// a bloq ends the chain.
#[derive(Clone, Default)]
pub struct GeneralizerPipeline {
    rules: Vec<Arc<dyn Generalizer>>,
}

impl GeneralizerPipeline {
    /// The pipeline that returns every bloq unchanged
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn new(rules: Vec<Arc<dyn Generalizer>>) -> Self {
        Self { rules }
    }

    /// Append a rule to the end of the chain
    pub fn push(&mut self, rule: Arc<dyn Generalizer>) {
        self.rules.push(rule);
    }

    /// Builder-style [`push`](Self::push)
    pub fn then(mut self, rule: impl Generalizer + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names of the rules in application order
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

impl Generalizer for GeneralizerPipeline {
    fn name(&self) -> &str {
        "pipeline"
    }

    fn generalize(&self, bloq: &BloqRef) -> Result<Option<BloqRef>> {
        let mut current = bloq.clone();
        for rule in &self.rules {
            match rule.generalize(&current)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

impl fmt::Debug for GeneralizerPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

type GeneralizeFn = dyn Fn(&BloqRef) -> Result<Option<BloqRef>> + Send + Sync;

/// A generalizer backed by a closure
///
/// # Example
/// ```
/// use bloqcount_core::BloqRef;
/// use bloqcount_counting::{FnGeneralizer, Generalizer};
/// use bloqcount_gates::{TGate, Toffoli};
///
/// let drop_t = FnGeneralizer::new("drop-t", |b: &BloqRef| {
///     if b.is::<TGate>() { None } else { Some(b.clone()) }
/// });
/// assert_eq!(drop_t.generalize(&BloqRef::new(TGate::new())).unwrap(), None);
/// assert!(drop_t.generalize(&BloqRef::new(Toffoli)).unwrap().is_some());
/// ```
pub struct FnGeneralizer {
    name: String,
    func: Box<GeneralizeFn>,
}

impl FnGeneralizer {
    /// Wrap an infallible rewrite
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&BloqRef) -> Option<BloqRef> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(move |b| Ok(func(b))),
        }
    }

    /// Wrap a rewrite that may reject the bloqs it is handed
    pub fn fallible<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&BloqRef) -> Result<Option<BloqRef>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl Generalizer for FnGeneralizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn generalize(&self, bloq: &BloqRef) -> Result<Option<BloqRef>> {
        (self.func)(bloq)
    }
}

impl fmt::Debug for FnGeneralizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnGeneralizer").field("name", &self.name).finish()
    }
}
