//! Tallies of expensive gates for error-corrected cost models

use crate::costs::CostTable;
use crate::graph::CallGraph;
use bloqcount_core::{BloqRef, CostKey, CostValue, Expr, GateFamily, Result};
use bloqcount_gates::{CSwap, TGate, Toffoli};
use std::fmt;
use std::ops::{Add, AddAssign};
use tracing::debug;

/// Counts of the gates that dominate surface-code costs
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GateCounts {
    pub t: Expr,
    pub toffoli: Expr,
    pub cswap: Expr,
    pub and_bloq: Expr,
    pub clifford: Expr,
    pub rotation: Expr,
}

impl GateCounts {
    pub fn zero() -> Self {
        Self {
            t: Expr::zero(),
            toffoli: Expr::zero(),
            cswap: Expr::zero(),
            and_bloq: Expr::zero(),
            clifford: Expr::zero(),
            rotation: Expr::zero(),
        }
    }

    pub fn t(n: impl Into<Expr>) -> Self {
        Self {
            t: n.into(),
            ..Self::zero()
        }
    }

    pub fn toffoli(n: impl Into<Expr>) -> Self {
        Self {
            toffoli: n.into(),
            ..Self::zero()
        }
    }

    /// The counts of `n` sequential repetitions
    pub fn scaled(&self, n: &Expr) -> Self {
        Self {
            t: &self.t * n,
            toffoli: &self.toffoli * n,
            cswap: &self.cswap * n,
            and_bloq: &self.and_bloq * n,
            clifford: &self.clifford * n,
            rotation: &self.rotation * n,
        }
    }

    /// Number of magic states: everything except Cliffords and rotations
    pub fn total_n_magic(&self) -> Expr {
        &(&(&self.t + &self.toffoli) + &self.cswap) + &self.and_bloq
    }

    fn fields(&self) -> [(&'static str, &Expr); 6] {
        [
            ("t", &self.t),
            ("toffoli", &self.toffoli),
            ("cswap", &self.cswap),
            ("and_bloq", &self.and_bloq),
            ("clifford", &self.clifford),
            ("rotation", &self.rotation),
        ]
    }
}

impl Default for GateCounts {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for GateCounts {
    type Output = GateCounts;

    fn add(mut self, other: GateCounts) -> GateCounts {
        self += other;
        self
    }
}

impl AddAssign for GateCounts {
    fn add_assign(&mut self, other: GateCounts) {
        self.t = &self.t + &other.t;
        self.toffoli = &self.toffoli + &other.toffoli;
        self.cswap = &self.cswap + &other.cswap;
        self.and_bloq = &self.and_bloq + &other.and_bloq;
        self.clifford = &self.clifford + &other.clifford;
        self.rotation = &self.rotation + &other.rotation;
    }
}

impl fmt::Display for GateCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields()
            .iter()
            .filter(|(_, v)| !v.is_zero())
            .map(|(name, v)| format!("{}: {}", name, v))
            .collect();
        if parts.is_empty() {
            return write!(f, "-");
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Gate counts under optional conversion ratios
///
/// Without ratios each gate family is tallied as itself. A ratio rewrites
/// one family into T gates or Toffolis; Toffolis produced by a conversion
/// are themselves converted when `ts_per_toffoli` is set.
///
/// # Example
/// ```
/// use bloqcount_core::{BloqRef, Expr};
/// use bloqcount_counting::{CallGraphBuilder, QecGatesCost};
/// use bloqcount_gates::CSwap;
///
/// let cswap = BloqRef::new(CSwap);
/// let graph = CallGraphBuilder::new().count(&[cswap.clone()]).unwrap();
/// let counts = QecGatesCost::default().compute(&graph, &cswap).unwrap();
/// assert_eq!(counts.cswap, Expr::from(1));
///
/// let as_t = QecGatesCost { ts_per_cswap: Some(7), ..Default::default() };
/// assert_eq!(as_t.compute(&graph, &cswap).unwrap().t, Expr::from(7));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct QecGatesCost {
    pub ts_per_toffoli: Option<u32>,
    pub toffolis_per_and: Option<u32>,
    pub ts_per_and: Option<u32>,
    pub toffolis_per_cswap: Option<u32>,
    pub ts_per_cswap: Option<u32>,
}

impl QecGatesCost {
    fn toffolis(&self, n: u32) -> GateCounts {
        match self.ts_per_toffoli {
            Some(ts) => GateCounts::t(Expr::from(n) * Expr::from(ts)),
            None => GateCounts::toffoli(n),
        }
    }

    /// Counts for a bloq that is tallied without looking at its callees
    pub fn leaf_counts(&self, bloq: &BloqRef) -> Option<GateCounts> {
        let counts = match bloq.family() {
            GateFamily::T => GateCounts::t(1),
            GateFamily::Toffoli => self.toffolis(1),
            GateFamily::And { uncompute: false } => {
                match (self.toffolis_per_and, self.ts_per_and) {
                    (Some(tofs), _) => self.toffolis(tofs),
                    (None, Some(ts)) => GateCounts::t(ts),
                    (None, None) => GateCounts {
                        and_bloq: Expr::one(),
                        ..GateCounts::zero()
                    },
                }
            }
            GateFamily::CSwap => match (self.toffolis_per_cswap, self.ts_per_cswap) {
                (Some(tofs), _) => self.toffolis(tofs),
                (None, Some(ts)) => GateCounts::t(ts),
                (None, None) => GateCounts {
                    cswap: Expr::one(),
                    ..GateCounts::zero()
                },
            },
            GateFamily::Clifford => GateCounts {
                clifford: Expr::one(),
                ..GateCounts::zero()
            },
            GateFamily::Rotation => GateCounts {
                rotation: Expr::one(),
                ..GateCounts::zero()
            },
            _ => return None,
        };
        Some(counts)
    }

    /// Counts of every vertex, indexed like [`CallGraph::vertices`]
    ///
    /// Vertices of a tallied family count as themselves; every other vertex
    /// sums its callees. Leaves of other families count nothing.
    ///
    /// # Errors
    /// Returns [`BloqError::CycleDetected`](bloqcount_core::BloqError::CycleDetected)
    /// if the graph has a cycle.
    pub fn compute_all(&self, graph: &CallGraph) -> Result<Vec<GateCounts>> {
        let order = graph.topological_sort()?;
        let mut counts = vec![GateCounts::zero(); graph.num_vertices()];

        for &idx in order.iter().rev() {
            let vertex = &graph.vertices()[idx];
            if let Some(own) = self.leaf_counts(&vertex.bloq) {
                counts[idx] = own;
                continue;
            }
            let mut total = GateCounts::zero();
            for (callee, n) in graph.successors(idx) {
                total += counts[callee].scaled(n);
            }
            for (callee, n) in &vertex.cut_calls {
                if let Some(own) = self.leaf_counts(callee) {
                    total += own.scaled(n);
                }
            }
            debug!(bloq = %vertex.bloq, counts = %total, "Gate counts");
            counts[idx] = total;
        }

        Ok(counts)
    }

    /// Counts of one bloq in the graph
    ///
    /// # Errors
    /// Returns [`BloqError::UnknownVertex`](bloqcount_core::BloqError::UnknownVertex)
    /// if `bloq` is not a vertex, and otherwise as [`compute_all`](Self::compute_all).
    pub fn compute(&self, graph: &CallGraph, bloq: &BloqRef) -> Result<GateCounts> {
        let idx = graph.require(bloq)?;
        let mut counts = self.compute_all(graph)?;
        Ok(counts.swap_remove(idx))
    }
}

impl fmt::Display for QecGatesCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut gates = vec!["t"];
        if self.ts_per_toffoli.is_none() {
            gates.push("tof");
        }
        if self.toffolis_per_and.is_none() && self.ts_per_and.is_none() {
            gates.push("and");
        }
        if self.toffolis_per_cswap.is_none() && self.ts_per_cswap.is_none() {
            gates.push("cswap");
        }
        write!(f, "{} counts", gates.join(","))
    }
}

/// A target gateset whose members are counted individually
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Gateset {
    /// T and T-dagger
    T,
    /// T, T-dagger and Toffoli
    TTof,
    /// T, T-dagger, Toffoli and CSwap
    TTofCSwap,
    /// Whatever the call graph's leaves are
    Leaf,
}

impl Gateset {
    /// Look up a gateset by name: `t`, `t+tof`, `t+tof+cswap` or `leaf`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "t" => Some(Gateset::T),
            "t+tof" => Some(Gateset::TTof),
            "t+tof+cswap" => Some(Gateset::TTofCSwap),
            "leaf" => Some(Gateset::Leaf),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Gateset::T => "t",
            Gateset::TTof => "t+tof",
            Gateset::TTofCSwap => "t+tof+cswap",
            Gateset::Leaf => "leaf",
        }
    }

    /// The fixed members of the gateset; empty for [`Gateset::Leaf`]
    pub fn bloqs(self) -> Vec<BloqRef> {
        let mut bloqs = Vec::new();
        if self == Gateset::Leaf {
            return bloqs;
        }
        bloqs.push(BloqRef::new(TGate::new()));
        bloqs.push(BloqRef::new(TGate::dagger()));
        if matches!(self, Gateset::TTof | Gateset::TTofCSwap) {
            bloqs.push(BloqRef::new(Toffoli));
        }
        if self == Gateset::TTofCSwap {
            bloqs.push(BloqRef::new(CSwap));
        }
        bloqs
    }
}

/// Number of calls of each gateset member made by `root`
///
/// # Errors
/// Returns [`BloqError::UnknownVertex`](bloqcount_core::BloqError::UnknownVertex)
/// if `root` is not a vertex and
/// [`BloqError::CycleDetected`](bloqcount_core::BloqError::CycleDetected)
/// if the graph has a cycle.
pub fn gateset_counts(
    graph: &CallGraph,
    root: &BloqRef,
    gateset: Gateset,
) -> Result<Vec<(BloqRef, Expr)>> {
    let root_idx = graph.require(root)?;
    let members = gateset.bloqs();
    let in_gateset = |idx: usize, bloq: &BloqRef| match gateset {
        Gateset::Leaf => graph.outgoing_edges(idx).is_empty(),
        _ => members.contains(bloq),
    };

    let order = graph.topological_sort()?;
    let mut tables = vec![CostTable::new(); graph.num_vertices()];
    let one = Expr::one();

    for &idx in order.iter().rev() {
        let vertex = &graph.vertices()[idx];
        let mut table = CostTable::new();
        if in_gateset(idx, &vertex.bloq) {
            table.accumulate(
                &CostKey::bloq_count(vertex.bloq.clone()),
                &CostValue::Add(Expr::one()),
                &one,
            )?;
        } else {
            for (callee, n) in graph.successors(idx) {
                for (k, v) in tables[callee].iter() {
                    table.accumulate(k, v, n)?;
                }
            }
            for (callee, n) in &vertex.cut_calls {
                if members.contains(callee) {
                    table.accumulate(
                        &CostKey::bloq_count(callee.clone()),
                        &CostValue::Add(Expr::one()),
                        n,
                    )?;
                }
            }
        }
        tables[idx] = table;
    }

    Ok(tables[root_idx].bloq_counts())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CallGraphBuilder;
    use bloqcount_gates::{And, CNot, Hadamard};

    fn graph_of(bloq: &BloqRef) -> CallGraph {
        CallGraphBuilder::new().count(&[bloq.clone()]).unwrap()
    }

    #[test]
    fn test_toffoli_is_counted_as_itself() {
        let tof = BloqRef::new(Toffoli);
        let graph = graph_of(&tof);
        let counts = QecGatesCost::default().compute(&graph, &tof).unwrap();
        assert_eq!(counts, GateCounts::toffoli(1));
        assert_eq!(counts.to_string(), "toffoli: 1");

        let as_t = QecGatesCost {
            ts_per_toffoli: Some(4),
            ..Default::default()
        };
        assert_eq!(as_t.compute(&graph, &tof).unwrap(), GateCounts::t(4));
    }

    #[test]
    fn test_large_conversion_ratios_do_not_overflow() {
        let cswap = BloqRef::new(CSwap);
        let graph = graph_of(&cswap);
        let costs = QecGatesCost {
            ts_per_toffoli: Some(u32::MAX),
            toffolis_per_cswap: Some(u32::MAX),
            ..Default::default()
        };
        let expected = Expr::from(u64::from(u32::MAX)) * Expr::from(u64::from(u32::MAX));
        assert_eq!(costs.compute(&graph, &cswap).unwrap(), GateCounts::t(expected));
    }

    #[test]
    fn test_and_uncompute_recurses() {
        let and = BloqRef::new(And::default());
        let and_dag = and.adjoint();
        let graph = CallGraphBuilder::new()
            .count(&[and.clone(), and_dag.clone()])
            .unwrap();
        let cost = QecGatesCost::default();
        assert_eq!(cost.compute(&graph, &and).unwrap().and_bloq, Expr::from(1));
        let uncompute = cost.compute(&graph, &and_dag).unwrap();
        assert_eq!(uncompute.clifford, Expr::from(4));
        assert_eq!(uncompute.total_n_magic(), Expr::zero());

        let and_as_tof = QecGatesCost {
            toffolis_per_and: Some(1),
            ts_per_toffoli: Some(4),
            ..Default::default()
        };
        assert_eq!(and_as_tof.compute(&graph, &and).unwrap(), GateCounts::t(4));
    }

    #[test]
    fn test_sum_and_display() {
        let a = GateCounts::t(3) + GateCounts::toffoli(2);
        assert_eq!(a.total_n_magic(), Expr::from(5));
        assert_eq!(a.to_string(), "t: 3, toffoli: 2");
        assert_eq!(GateCounts::zero().to_string(), "-");
        assert_eq!(a.scaled(&Expr::from(2)).t, Expr::from(6));
        assert_eq!(QecGatesCost::default().to_string(), "t,tof,and,cswap counts");
    }

    #[test]
    fn test_cliffords_tallied() {
        let cost = QecGatesCost::default();
        assert_eq!(
            cost.leaf_counts(&BloqRef::new(Hadamard)).map(|c| c.clifford),
            Some(Expr::from(1))
        );
        assert_eq!(
            cost.leaf_counts(&BloqRef::new(CNot)).map(|c| c.clifford),
            Some(Expr::from(1))
        );
    }

    #[test]
    fn test_gateset_names() {
        assert_eq!(Gateset::from_name("t+tof"), Some(Gateset::TTof));
        assert_eq!(Gateset::from_name("clifford"), None);
        assert_eq!(Gateset::TTofCSwap.bloqs().len(), 4);
        assert_eq!(Gateset::from_name("leaf").map(Gateset::name), Some("leaf"));
    }

    #[test]
    fn test_gateset_counts_stop_at_members() {
        let cswap = BloqRef::new(CSwap);
        let graph = graph_of(&cswap);

        let tof_level = gateset_counts(&graph, &cswap, Gateset::TTof).unwrap();
        assert_eq!(tof_level, vec![(BloqRef::new(Toffoli), Expr::from(1))]);

        let t_level = gateset_counts(&graph, &cswap, Gateset::T).unwrap();
        assert!(t_level.contains(&(BloqRef::new(TGate::new()), Expr::from(4))));
        assert!(t_level.contains(&(BloqRef::new(TGate::dagger()), Expr::from(3))));
        assert_eq!(t_level.len(), 2);

        let whole = gateset_counts(&graph, &cswap, Gateset::TTofCSwap).unwrap();
        assert_eq!(whole, vec![(cswap, Expr::from(1))]);
    }
}
