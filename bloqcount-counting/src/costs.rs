//! Cost aggregation over a call graph
//!
//! Costs flow from leaves to roots in reverse topological order. At each
//! vertex every cost key computes `total += callee_total * n` over the
//! outgoing edges under its own combination rule, then adds the costs
//! recorded on the vertex itself.

use crate::builder::{leaf_costs_of, CallGraphBuilder};
use crate::graph::CallGraph;
use ahash::AHashMap;
use bloqcount_core::{BloqRef, CombineRule, CostKey, CostValue, Expr, Result};

/// Totals for every cost key of one vertex, in first-seen order
#[derive(Clone, Debug, Default)]
pub struct CostTable {
    entries: Vec<(CostKey, CostValue)>,
    index: AHashMap<CostKey, usize>,
}

impl CostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `self[key] += value * n`, starting from the key's identity
    ///
    /// # Errors
    /// Returns [`BloqError::CostKindMismatch`](bloqcount_core::BloqError::CostKindMismatch)
    /// if `value` does not follow the key's combination rule.
    pub fn accumulate(&mut self, key: &CostKey, value: &CostValue, n: &Expr) -> Result<()> {
        match self.index.get(key) {
            Some(&i) => {
                let total = key.accumulate(&self.entries[i].1, value, n)?;
                self.entries[i].1 = total;
            }
            None => {
                let total = key.accumulate(&key.identity_val(), value, n)?;
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key.clone(), total));
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &CostKey) -> Option<&CostValue> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// The total for `key`, or the key's identity if nothing contributed
    pub fn value(&self, key: &CostKey) -> CostValue {
        self.get(key).cloned().unwrap_or_else(|| key.identity_val())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CostKey, &CostValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Call totals of leaf bloqs, taken from the [`CostKey::BloqCount`] entries
    pub fn bloq_counts(&self) -> Vec<(BloqRef, Expr)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| match (k, v) {
                (CostKey::BloqCount(bloq), CostValue::Add(n)) => Some((bloq.clone(), n.clone())),
                _ => None,
            })
            .collect()
    }
}

/// Total costs of every vertex, indexed like [`CallGraph::vertices`]
///
/// # Errors
/// Returns [`BloqError::CycleDetected`](bloqcount_core::BloqError::CycleDetected)
/// if the graph has a cycle, and
/// [`BloqError::CostKindMismatch`](bloqcount_core::BloqError::CostKindMismatch)
/// if a recorded value does not follow its key's rule.
pub fn sum_up_costs(graph: &CallGraph) -> Result<Vec<CostTable>> {
    let order = graph.topological_sort()?;
    let one = Expr::one();
    let mut tables = vec![CostTable::new(); graph.num_vertices()];

    for &idx in order.iter().rev() {
        let mut table = CostTable::new();

        for (callee, n) in graph.successors(idx) {
            for (k, v) in tables[callee].iter() {
                table.accumulate(k, v, n)?;
            }
        }

        let vertex = &graph.vertices()[idx];
        for (k, v) in vertex.static_costs.iter().chain(&vertex.leaf_costs) {
            table.accumulate(k, v, &one)?;
        }

        // A cut recursive call costs what the callee would cost as a leaf
        for (callee, n) in &vertex.cut_calls {
            let statics = graph
                .vertex_index(callee)
                .and_then(|i| graph.vertex(i))
                .map(|v| v.static_costs.clone())
                .unwrap_or_default();
            for (k, v) in statics.iter().chain(&leaf_costs_of(callee)) {
                table.accumulate(k, v, n)?;
            }
        }

        tables[idx] = table;
    }

    Ok(tables)
}

/// Total costs of one bloq in the graph
///
/// # Errors
/// Returns [`BloqError::UnknownVertex`](bloqcount_core::BloqError::UnknownVertex)
/// if `bloq` is not a vertex, and otherwise as [`sum_up_costs`].
pub fn costs_of(graph: &CallGraph, bloq: &BloqRef) -> Result<CostTable> {
    let idx = graph.require(bloq)?;
    let mut tables = sum_up_costs(graph)?;
    Ok(tables.swap_remove(idx))
}

/// Total of a single cost key for `bloq`
///
/// # Errors
/// As [`costs_of`].
pub fn query_cost(graph: &CallGraph, bloq: &BloqRef, key: &CostKey) -> Result<CostValue> {
    Ok(costs_of(graph, bloq)?.value(key))
}

/// Call totals of the leaf bloqs reached from `root`
///
/// # Errors
/// As [`costs_of`].
pub fn sigma(graph: &CallGraph, root: &BloqRef) -> Result<Vec<(BloqRef, Expr)>> {
    Ok(costs_of(graph, root)?.bloq_counts())
}

/// Build the call graph of `root` and its leaf call totals in one step
///
/// # Errors
/// As [`CallGraphBuilder::count`] and [`sigma`].
///
/// # Example
/// ```
/// use bloqcount_core::{BloqRef, Expr};
/// use bloqcount_counting::{call_graph_and_sigma, CallGraphBuilder, KeepPolicy};
/// use bloqcount_gates::{CSwap, Toffoli};
///
/// let builder = CallGraphBuilder::new().keep(KeepPolicy::new().keep_bloq(BloqRef::new(Toffoli)));
/// let (_, sigma) = call_graph_and_sigma(&builder, &BloqRef::new(CSwap)).unwrap();
/// assert!(sigma.contains(&(BloqRef::new(Toffoli), Expr::from(1))));
/// ```
pub fn call_graph_and_sigma(
    builder: &CallGraphBuilder,
    root: &BloqRef,
) -> Result<(CallGraph, Vec<(BloqRef, Expr)>)> {
    let mut session = builder.session();
    let root = session.add_root(root)?;
    let graph = session.finish();
    let sigma = sigma(&graph, &root)?;
    Ok((graph, sigma))
}

/// Combine one externally supplied cost through the graph
///
/// Each vertex's total is its own entry in `costs` (if any) combined with
/// `n` times each callee's total under `rule`. Returns the total of every
/// root.
///
/// # Errors
/// Returns [`BloqError::CycleDetected`](bloqcount_core::BloqError::CycleDetected)
/// if the graph has a cycle and
/// [`BloqError::CostKindMismatch`](bloqcount_core::BloqError::CostKindMismatch)
/// if a supplied value does not follow `rule`.
pub fn aggregate(
    graph: &CallGraph,
    costs: &AHashMap<BloqRef, CostValue>,
    rule: CombineRule,
) -> Result<Vec<(BloqRef, CostValue)>> {
    let key = CostKey::named("aggregate", rule);
    let one = Expr::one();
    let order = graph.topological_sort()?;
    let mut totals = vec![rule.identity(); graph.num_vertices()];

    for &idx in order.iter().rev() {
        let mut total = rule.identity();
        for (callee, n) in graph.successors(idx) {
            total = key.accumulate(&total, &totals[callee], n)?;
        }
        let vertex = &graph.vertices()[idx];
        if let Some(own) = costs.get(&vertex.bloq) {
            total = key.accumulate(&total, own, &one)?;
        }
        for (callee, n) in &vertex.cut_calls {
            if let Some(callee_cost) = costs.get(callee) {
                total = key.accumulate(&total, callee_cost, n)?;
            }
        }
        totals[idx] = total;
    }

    Ok(graph
        .roots()
        .iter()
        .map(|&r| (graph.vertices()[r].bloq.clone(), totals[r].clone()))
        .collect())
}
