//! Call-graph construction
//!
//! The builder expands root bloqs depth-first. Every callee is generalized
//! before it becomes a graph key, so equal generalized bloqs share one vertex
//! and are expanded once. Expansion stops at bloqs the keep policy declares
//! terminal, at the depth bound, and at bloqs without a decomposition.

use crate::generalizer::{Generalizer, GeneralizerPipeline};
use crate::generalizers::{
    ForeignToNative, GeneralizeControlValues, GeneralizeRotationAngle, IgnoreAllocFree,
    IgnoreCliffords, IgnoreSplitJoin,
};
use crate::graph::{CallGraph, LeafReason, VertexKind};
use crate::keep::KeepPolicy;
use crate::warning::CountingWarning;
use ahash::AHashSet;
use bloqcount_core::{
    BloqError, BloqRef, CostKey, CostValue, Expr, GateFamily, Result, SymbolAllocator,
};
use bloqcount_gates::{ForeignGate, TGate, Toffoli};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Call-graph construction settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallGraphConfig {
    /// Depth at which vertices become leaves; `None` is unbounded
    pub max_depth: Option<usize>,
    /// Record a warning for each bloq whose decomposition is not implemented
    pub warn_on_unimplemented: bool,
    /// Record each vertex's static costs
    pub record_static_costs: bool,
}

impl Default for CallGraphConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            warn_on_unimplemented: true,
            record_static_costs: true,
        }
    }
}

/// Costs of counting `bloq` as a leaf
///
/// Bloqs may override these. The default is one call of the bloq itself,
/// plus the signature width as max qubits unless the bloq declares its own.
pub fn leaf_costs_of(bloq: &BloqRef) -> Vec<(CostKey, CostValue)> {
    if let Some(costs) = bloq.my_leaf_costs() {
        return costs;
    }
    let mut costs = vec![(
        CostKey::bloq_count(bloq.clone()),
        CostValue::Add(Expr::one()),
    )];
    if bloq.static_cost(&CostKey::MaxQubits).is_none() {
        costs.push((
            CostKey::MaxQubits,
            CostValue::Max(Some(bloq.signature().n_qubits())),
        ));
    }
    costs
}

/// Depth-first expansion over borrowed session state
struct Expander<'a> {
    generalizer: &'a dyn Generalizer,
    keep: &'a KeepPolicy,
    config: &'a CallGraphConfig,
    ssa: &'a mut SymbolAllocator,
    graph: &'a mut CallGraph,
    in_progress: AHashSet<usize>,
}

impl<'a> Expander<'a> {
    fn expand_root(&mut self, bloq: &BloqRef) -> Result<BloqRef> {
        let root = self
            .generalizer
            .generalize(bloq)?
            .ok_or_else(|| BloqError::RootGeneralizedAway { bloq: bloq.label() })?;
        let idx = self.visit(root.clone(), 0)?;
        self.graph.add_root(idx);
        Ok(root)
    }

    fn visit(&mut self, bloq: BloqRef, depth: usize) -> Result<usize> {
        let (idx, created) = self.graph.add_vertex(bloq, depth);
        if created {
            if self.config.record_static_costs {
                let vertex = self.graph.vertex_mut(idx);
                vertex.static_costs = vertex.bloq.my_static_costs();
            }
            self.expand(idx, depth)?;
        } else {
            self.revisit(idx, depth)?;
        }
        Ok(idx)
    }

    fn expand(&mut self, idx: usize, depth: usize) -> Result<()> {
        let bloq = self.graph.vertex_mut(idx).bloq.clone();

        if self.keep.should_keep(&bloq) {
            self.make_leaf(idx, LeafReason::Keep);
            return Ok(());
        }
        if self.config.max_depth.map_or(false, |d| depth >= d) {
            self.make_leaf(idx, LeafReason::MaxDepth);
            return Ok(());
        }

        debug!(bloq = %bloq, depth, "Expanding bloq");
        let callees = match bloq.build_call_graph(&mut *self.ssa) {
            Ok(callees) => callees,
            Err(BloqError::DecomposeTypeError { reason, .. }) => {
                debug!(bloq = %bloq, reason = %reason, "No decomposition");
                self.make_leaf(idx, LeafReason::NoDecomposition);
                return Ok(());
            }
            Err(BloqError::DecomposeNotImplemented { .. }) => {
                if self.config.warn_on_unimplemented {
                    warn!(bloq = %bloq, "Decomposition not implemented, counting as a leaf");
                    self.graph
                        .push_warning(CountingWarning::DecomposeNotImplemented {
                            bloq: bloq.label(),
                        });
                }
                self.make_leaf(idx, LeafReason::NotImplemented);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if callees.is_empty() {
            self.make_leaf(idx, LeafReason::NoCallees);
            return Ok(());
        }

        let mut generalized = Vec::with_capacity(callees.len());
        for (callee, n) in callees {
            if let Some(callee) = self.generalizer.generalize(&callee)? {
                generalized.push((callee, n));
            }
        }
        if generalized.is_empty() {
            debug!(bloq = %bloq, "All callees generalized away");
            self.graph.vertex_mut(idx).kind =
                VertexKind::Leaf(LeafReason::EmptyAfterGeneralization);
            return Ok(());
        }

        self.graph.vertex_mut(idx).kind = VertexKind::Internal;
        self.in_progress.insert(idx);
        for (callee, n) in generalized {
            let recursive = self
                .graph
                .vertex_index(&callee)
                .map_or(false, |c| self.in_progress.contains(&c));
            if !recursive {
                let callee_idx = self.visit(callee.clone(), depth + 1)?;
                if !self.closes_cycle(idx, callee_idx) {
                    self.graph.add_edge(idx, callee_idx, n);
                    continue;
                }
            }
            warn!(caller = %bloq, callee = %callee, "Recursive call counted as a leaf");
            self.graph.push_warning(CountingWarning::RecursionCut {
                caller: bloq.label(),
                callee: callee.label(),
            });
            self.graph.vertex_mut(idx).cut_calls.push((callee, n));
        }
        self.in_progress.remove(&idx);
        Ok(())
    }

    /// Whether an edge `caller -> callee` would close a cycle
    ///
    /// Without a depth bound every finished vertex is fully expanded, so the
    /// in-progress stack already catches recursion. Re-expanding a vertex cut
    /// off by the bound can reach finished vertices that call back into it.
    fn closes_cycle(&self, caller: usize, callee: usize) -> bool {
        self.config.max_depth.is_some() && self.graph.reaches(callee, caller)
    }

    /// Reach an existing vertex again, possibly at a shallower depth
    ///
    /// With a depth bound, a vertex first cut off by the bound is expanded
    /// once it is reached closer to a root.
    fn revisit(&mut self, idx: usize, depth: usize) -> Result<()> {
        if self.config.max_depth.is_none() || self.in_progress.contains(&idx) {
            return Ok(());
        }
        let vertex = self.graph.vertex_mut(idx);
        if depth >= vertex.depth {
            return Ok(());
        }
        vertex.depth = depth;
        let kind = vertex.kind;
        match kind {
            VertexKind::Leaf(LeafReason::MaxDepth) => {
                vertex.kind = VertexKind::Internal;
                vertex.leaf_costs.clear();
                self.expand(idx, depth)
            }
            VertexKind::Internal => {
                let callees: Vec<usize> = self.graph.successors(idx).map(|(c, _)| c).collect();
                for callee in callees {
                    self.revisit(callee, depth + 1)?;
                }
                Ok(())
            }
            VertexKind::Leaf(_) => Ok(()),
        }
    }

    fn make_leaf(&mut self, idx: usize, reason: LeafReason) {
        let vertex = self.graph.vertex_mut(idx);
        debug!(bloq = %vertex.bloq, reason = reason.as_str(), "Leaf");
        vertex.kind = VertexKind::Leaf(reason);
        vertex.leaf_costs = leaf_costs_of(&vertex.bloq);
    }
}

/// Build the call graph of `roots`
///
/// Each root is generalized first; dropping a root is an error. Symbols
/// introduced by decompositions come from `ssa`.
///
/// # Errors
/// Returns [`BloqError::RootGeneralizedAway`] if the generalizer drops a
/// root, and propagates any error other than a decomposition failure raised
/// by a bloq or a generalizer.
///
/// # Example
/// ```
/// use bloqcount_core::{BloqRef, Expr, SymbolAllocator};
/// use bloqcount_counting::{build_call_graph, GeneralizerPipeline, KeepPolicy};
/// use bloqcount_gates::{CSwap, TGate, Toffoli};
///
/// let graph = build_call_graph(
///     &[BloqRef::new(CSwap)],
///     &GeneralizerPipeline::identity(),
///     &mut SymbolAllocator::new(),
///     &KeepPolicy::new(),
///     None,
/// )
/// .unwrap();
/// let t = BloqRef::new(TGate::new());
/// assert_eq!(graph.edge(&BloqRef::new(Toffoli), &t), Some(&Expr::from(4)));
/// ```
pub fn build_call_graph(
    roots: &[BloqRef],
    generalizer: &dyn Generalizer,
    ssa: &mut SymbolAllocator,
    keep: &KeepPolicy,
    max_depth: Option<usize>,
) -> Result<CallGraph> {
    let config = CallGraphConfig {
        max_depth,
        ..CallGraphConfig::default()
    };
    let mut graph = CallGraph::empty();
    let mut expander = Expander {
        generalizer,
        keep,
        config: &config,
        ssa,
        graph: &mut graph,
        in_progress: AHashSet::new(),
    };
    for root in roots {
        expander.expand_root(root)?;
    }
    info!(
        vertices = graph.num_vertices(),
        edges = graph.num_edges(),
        warnings = graph.warnings().len(),
        "Call graph built"
    );
    Ok(graph)
}

/// One counting run: settings, a symbol allocator and the graph so far
///
/// Roots added to the same session share vertices. Sessions are independent
/// of each other; use one per worker when counting in parallel.
#[derive(Debug)]
pub struct CountingSession {
    config: CallGraphConfig,
    generalizer: GeneralizerPipeline,
    keep: KeepPolicy,
    ssa: SymbolAllocator,
    graph: CallGraph,
}

impl CountingSession {
    pub fn new(config: CallGraphConfig, generalizer: GeneralizerPipeline, keep: KeepPolicy) -> Self {
        Self {
            config,
            generalizer,
            keep,
            ssa: SymbolAllocator::new(),
            graph: CallGraph::empty(),
        }
    }

    /// Continue from an allocator that already issued symbols
    pub fn with_allocator(mut self, ssa: SymbolAllocator) -> Self {
        self.ssa = ssa;
        self
    }

    /// Expand `bloq` into the session's graph
    ///
    /// Returns the generalized root, which is the key of the root vertex.
    ///
    /// # Errors
    /// See [`build_call_graph`].
    pub fn add_root(&mut self, bloq: &BloqRef) -> Result<BloqRef> {
        let mut expander = Expander {
            generalizer: &self.generalizer,
            keep: &self.keep,
            config: &self.config,
            ssa: &mut self.ssa,
            graph: &mut self.graph,
            in_progress: AHashSet::new(),
        };
        expander.expand_root(bloq)
    }

    pub fn config(&self) -> &CallGraphConfig {
        &self.config
    }

    pub fn graph(&self) -> &CallGraph {
        &self.graph
    }

    pub fn allocator(&mut self) -> &mut SymbolAllocator {
        &mut self.ssa
    }

    /// Finish the session and return its graph
    pub fn finish(self) -> CallGraph {
        info!(
            vertices = self.graph.num_vertices(),
            edges = self.graph.num_edges(),
            warnings = self.graph.warnings().len(),
            "Call graph built"
        );
        self.graph
    }
}

/// Builder for counting sessions
///
/// # Example
/// ```
/// use bloqcount_core::BloqRef;
/// use bloqcount_counting::{CallGraphBuilder, IgnoreCliffords};
/// use bloqcount_gates::Toffoli;
///
/// let mut session = CallGraphBuilder::new()
///     .generalizer(IgnoreCliffords)
///     .max_depth(3)
///     .build();
/// session.add_root(&BloqRef::new(Toffoli)).unwrap();
/// let graph = session.finish();
/// assert_eq!(graph.num_vertices(), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallGraphBuilder {
    config: CallGraphConfig,
    generalizer: GeneralizerPipeline,
    keep: KeepPolicy,
    ssa: SymbolAllocator,
}

impl CallGraphBuilder {
    /// Create a builder with no generalizers and an empty keep policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for a library-wide class graph
    ///
    /// Foreign gates are translated, bookkeeping and Cliffords are ignored,
    /// control values and rotation angles are merged, and counting stops at
    /// T, Toffoli, rotations and untranslated foreign gates.
    pub fn library_wide() -> Self {
        let mut ssa = SymbolAllocator::new();
        let rotations = GeneralizeRotationAngle::from_allocator(&mut ssa);
        let keep = KeepPolicy::new()
            .keep_bloq(BloqRef::new(TGate::new()))
            .keep_bloq(BloqRef::new(Toffoli))
            .keep_family(GateFamily::Rotation)
            .keep_kind::<ForeignGate>();
        Self::new()
            .generalizer(ForeignToNative)
            .generalizer(IgnoreSplitJoin)
            .generalizer(GeneralizeControlValues::default())
            .generalizer(rotations)
            .generalizer(IgnoreAllocFree)
            .generalizer(IgnoreCliffords)
            .keep(keep)
            .symbol_allocator(ssa)
    }

    /// Set the configuration
    pub fn config(mut self, config: CallGraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the depth bound
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = Some(max_depth);
        self
    }

    /// Enable or disable warnings for unimplemented decompositions
    pub fn warn_on_unimplemented(mut self, enable: bool) -> Self {
        self.config.warn_on_unimplemented = enable;
        self
    }

    /// Enable or disable recording of static costs
    pub fn record_static_costs(mut self, enable: bool) -> Self {
        self.config.record_static_costs = enable;
        self
    }

    /// Append a generalizer to the pipeline
    pub fn generalizer(mut self, rule: impl Generalizer + 'static) -> Self {
        self.generalizer.push(Arc::new(rule));
        self
    }

    /// Append several generalizers to the pipeline, in order
    pub fn generalizers(mut self, rules: Vec<Arc<dyn Generalizer>>) -> Self {
        for rule in rules {
            self.generalizer.push(rule);
        }
        self
    }

    /// Set the keep policy
    pub fn keep(mut self, keep: KeepPolicy) -> Self {
        self.keep = keep;
        self
    }

    /// Start sessions from this allocator instead of a fresh one
    pub fn symbol_allocator(mut self, ssa: SymbolAllocator) -> Self {
        self.ssa = ssa;
        self
    }

    pub fn pipeline(&self) -> &GeneralizerPipeline {
        &self.generalizer
    }

    /// A new session with this builder's settings
    pub fn session(&self) -> CountingSession {
        CountingSession::new(
            self.config.clone(),
            self.generalizer.clone(),
            self.keep.clone(),
        )
        .with_allocator(self.ssa.clone())
    }

    /// Build the session
    pub fn build(self) -> CountingSession {
        CountingSession::new(self.config, self.generalizer, self.keep).with_allocator(self.ssa)
    }

    /// Count `roots` in a fresh session
    ///
    /// # Errors
    /// See [`build_call_graph`].
    pub fn count(&self, roots: &[BloqRef]) -> Result<CallGraph> {
        let mut session = self.session();
        for root in roots {
            session.add_root(root)?;
        }
        Ok(session.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generalizer::FnGeneralizer;
    use bloqcount_gates::for_testing::{CostingBloq, Recursive};
    use bloqcount_gates::{CNot, CSwap, Hadamard, Split};

    fn leaf_reason(graph: &CallGraph, bloq: &BloqRef) -> Option<VertexKind> {
        graph
            .vertex_index(bloq)
            .and_then(|i| graph.vertex(i))
            .map(|v| v.kind)
    }

    #[test]
    fn test_toffoli_expansion() {
        let graph = CallGraphBuilder::new()
            .count(&[BloqRef::new(Toffoli)])
            .unwrap();
        assert_eq!(graph.num_vertices(), 5);
        assert_eq!(graph.num_edges(), 4);
        assert_eq!(
            graph.edge(&BloqRef::new(Toffoli), &BloqRef::new(TGate::dagger())),
            Some(&Expr::from(3))
        );
        assert_eq!(
            leaf_reason(&graph, &BloqRef::new(Hadamard)),
            Some(VertexKind::Leaf(LeafReason::NoDecomposition))
        );
        assert!(graph.warnings().is_empty());
    }

    #[test]
    fn test_keep_stops_expansion() {
        let graph = CallGraphBuilder::new()
            .keep(KeepPolicy::new().keep_bloq(BloqRef::new(Toffoli)))
            .count(&[BloqRef::new(CSwap)])
            .unwrap();
        assert_eq!(graph.num_vertices(), 3);
        assert_eq!(
            leaf_reason(&graph, &BloqRef::new(Toffoli)),
            Some(VertexKind::Leaf(LeafReason::Keep))
        );
    }

    #[test]
    fn test_depth_bound() {
        let graph = CallGraphBuilder::new()
            .max_depth(1)
            .count(&[BloqRef::new(CSwap)])
            .unwrap();
        assert_eq!(
            leaf_reason(&graph, &BloqRef::new(Toffoli)),
            Some(VertexKind::Leaf(LeafReason::MaxDepth))
        );
        assert!(!graph.contains(&BloqRef::new(TGate::new())));
    }

    #[test]
    fn test_shallower_visit_reexpands() {
        // a -> b -> tof, and a -> tof directly; b is expanded first
        let tof = BloqRef::new(Toffoli);
        let b = CostingBloq::new("b", 3).calls(tof.clone(), 1).into_ref();
        let a = CostingBloq::new("a", 3)
            .calls(b, 1)
            .calls(tof.clone(), 1)
            .into_ref();
        let graph = CallGraphBuilder::new().max_depth(2).count(&[a]).unwrap();
        let tof_vertex = graph.vertex(graph.vertex_index(&tof).unwrap()).unwrap();
        assert_eq!(tof_vertex.kind, VertexKind::Internal);
        assert_eq!(tof_vertex.depth, 1);
        assert!(tof_vertex.leaf_costs.is_empty());
        assert!(graph.contains(&BloqRef::new(TGate::new())));
    }

    #[test]
    fn test_empty_after_generalization() {
        let drop_all = FnGeneralizer::new("drop-cliffords", |b: &BloqRef| {
            if b.is::<CNot>() {
                None
            } else {
                Some(b.clone())
            }
        });
        let root = CostingBloq::new("wires", 2)
            .calls(BloqRef::new(CNot), 3)
            .into_ref();
        let graph = CallGraphBuilder::new()
            .generalizer(drop_all)
            .count(&[root.clone()])
            .unwrap();
        let vertex = graph.vertex(0).unwrap();
        assert_eq!(
            vertex.kind,
            VertexKind::Leaf(LeafReason::EmptyAfterGeneralization)
        );
        assert!(vertex.leaf_costs.is_empty());
        assert_eq!(graph.num_vertices(), 1);
    }

    #[test]
    fn test_root_generalized_away() {
        let err = CallGraphBuilder::new()
            .generalizer(IgnoreSplitJoin)
            .count(&[BloqRef::new(Split::new(4))])
            .unwrap_err();
        assert!(matches!(err, BloqError::RootGeneralizedAway { .. }));
    }

    #[test]
    fn test_recursion_is_cut() {
        let erase_n = FnGeneralizer::fallible("erase-n", |b: &BloqRef| {
            if b.is::<Recursive>() {
                let n = Expr::symbol(bloqcount_core::Symbol::new("n"));
                return b.with_field("n", bloqcount_core::FieldValue::Expr(n)).map(Some);
            }
            Ok(Some(b.clone()))
        });
        let graph = CallGraphBuilder::new()
            .generalizer(erase_n)
            .count(&[BloqRef::new(Recursive::new(10))])
            .unwrap();
        assert!(graph.is_acyclic());
        assert_eq!(graph.num_vertices(), 2);
        let root = graph.vertex(0).unwrap();
        assert_eq!(root.cut_calls.len(), 1);
        assert_eq!(root.cut_calls[0].1, Expr::from(2));
        assert!(matches!(
            graph.warnings(),
            [CountingWarning::RecursionCut { .. }]
        ));
    }

    #[test]
    fn test_static_costs_recorded() {
        let root = CostingBloq::new("root", 5)
            .with_static_cost(CostKey::clifford(), CostValue::Add(Expr::from(7)))
            .into_ref();
        let graph = CallGraphBuilder::new().count(&[root.clone()]).unwrap();
        let vertex = graph.vertex(0).unwrap();
        assert!(vertex
            .static_costs
            .contains(&(CostKey::clifford(), CostValue::Add(Expr::from(7)))));

        let bare = CallGraphBuilder::new()
            .record_static_costs(false)
            .count(&[root])
            .unwrap();
        assert!(bare.vertex(0).unwrap().static_costs.is_empty());
    }

    #[test]
    fn test_default_leaf_costs() {
        let costs = leaf_costs_of(&BloqRef::new(Toffoli));
        assert_eq!(
            costs,
            vec![
                (
                    CostKey::bloq_count(BloqRef::new(Toffoli)),
                    CostValue::Add(Expr::one())
                ),
                (CostKey::MaxQubits, CostValue::Max(Some(Expr::from(3)))),
            ]
        );
    }
}
