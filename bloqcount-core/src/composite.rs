//! Decompositions expressed as an ordered list of sub-bloq instances

use crate::{BloqRef, Expr, Signature};
use ahash::AHashMap;

/// The decomposition of a bloq into sub-bloq instances
///
/// Only the instances matter for counting; wiring between them is not
/// tracked.
///
/// # Example
/// ```
/// use bloqcount_core::{CompositeBloq, Signature};
///
/// let cbloq = CompositeBloq::new(Signature::build([("x", 4)]));
/// assert!(cbloq.is_empty());
/// assert!(cbloq.callee_counts().is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct CompositeBloq {
    signature: Signature,
    instances: Vec<BloqRef>,
}

impl CompositeBloq {
    /// Create an empty composite with the given external signature
    pub fn new(signature: Signature) -> Self {
        Self {
            signature,
            instances: Vec::new(),
        }
    }

    /// Create a composite from a sequence of instances
    pub fn from_instances(signature: Signature, instances: impl IntoIterator<Item = BloqRef>) -> Self {
        Self {
            signature,
            instances: instances.into_iter().collect(),
        }
    }

    /// Append one instance of `bloq`
    pub fn add(&mut self, bloq: BloqRef) -> &mut Self {
        self.instances.push(bloq);
        self
    }

    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Get an iterator over the instances in order
    pub fn instances(&self) -> impl Iterator<Item = &BloqRef> {
        self.instances.iter()
    }

    /// Number of instances of each distinct bloq, in first-occurrence order
    pub fn callee_counts(&self) -> Vec<(BloqRef, Expr)> {
        let mut index: AHashMap<&BloqRef, usize> = AHashMap::new();
        let mut counts: Vec<(BloqRef, u64)> = Vec::new();
        for bloq in &self.instances {
            match index.get(bloq) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(bloq, counts.len());
                    counts.push((bloq.clone(), 1));
                }
            }
        }
        counts
            .into_iter()
            .map(|(bloq, n)| (bloq, Expr::from(n)))
            .collect()
    }
}
