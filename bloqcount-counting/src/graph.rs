//! Call graph storage and traversal

use crate::warning::CountingWarning;
use ahash::AHashMap;
use bloqcount_core::{BloqError, BloqRef, CostKey, CostValue, Expr, Result};
use std::fmt::Write;

/// Why expansion stopped at a vertex
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LeafReason {
    /// The keep policy declared the bloq terminal
    Keep,
    /// The vertex sits at the depth bound
    MaxDepth,
    /// The bloq has no decomposition by construction
    NoDecomposition,
    /// The bloq's decomposition was never written
    NotImplemented,
    /// The bloq declares an empty call graph
    NoCallees,
    /// Every callee was dropped by the generalizer; such a vertex costs
    /// nothing
    EmptyAfterGeneralization,
}

impl LeafReason {
    pub fn as_str(self) -> &'static str {
        match self {
            LeafReason::Keep => "keep",
            LeafReason::MaxDepth => "max_depth",
            LeafReason::NoDecomposition => "no_decomposition",
            LeafReason::NotImplemented => "not_implemented",
            LeafReason::NoCallees => "no_callees",
            LeafReason::EmptyAfterGeneralization => "empty_after_generalization",
        }
    }
}

/// Whether a vertex was expanded
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VertexKind {
    Internal,
    Leaf(LeafReason),
}

impl VertexKind {
    pub fn is_leaf(self) -> bool {
        matches!(self, VertexKind::Leaf(_))
    }
}

/// One generalized bloq in a call graph
#[derive(Clone, Debug)]
pub struct Vertex {
    pub bloq: BloqRef,
    pub kind: VertexKind,
    /// Shallowest depth at which the bloq was reached
    pub depth: usize,
    /// Costs the bloq declares on top of its callees
    pub static_costs: Vec<(CostKey, CostValue)>,
    /// Costs of counting the bloq as a leaf; empty for internal vertices
    pub leaf_costs: Vec<(CostKey, CostValue)>,
    /// Recursive calls that were counted as leaf calls instead of edges
    pub cut_calls: Vec<(BloqRef, Expr)>,
}

impl Vertex {
    fn new(bloq: BloqRef, depth: usize) -> Self {
        Self {
            bloq,
            kind: VertexKind::Internal,
            depth,
            static_costs: Vec::new(),
            leaf_costs: Vec::new(),
            cut_calls: Vec::new(),
        }
    }
}

/// Caller-to-callee edge with a summed multiplicity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallEdge {
    pub from: usize,
    pub to: usize,
    pub n: Expr,
}

/// Directed graph of bloqs and how many times each calls the next
///
/// Vertices are unique up to structural equality of their bloqs. Calls
/// between the same pair accumulate into one edge.
#[derive(Clone, Debug, Default)]
pub struct CallGraph {
    vertices: Vec<Vertex>,
    index: AHashMap<BloqRef, usize>,
    edges: Vec<CallEdge>,
    edge_index: AHashMap<(usize, usize), usize>,
    // Adjacency lists for efficient traversal
    outgoing_edges: Vec<Vec<usize>>, // vertex index -> edge indices
    incoming_edges: Vec<Vec<usize>>, // vertex index -> edge indices
    roots: Vec<usize>,
    warnings: Vec<CountingWarning>,
}

impl CallGraph {
    /// Create an empty call graph
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a vertex, or find the existing one for an equal bloq
    ///
    /// Returns the vertex index and whether it was newly created.
    pub fn add_vertex(&mut self, bloq: BloqRef, depth: usize) -> (usize, bool) {
        if let Some(&idx) = self.index.get(&bloq) {
            return (idx, false);
        }
        let idx = self.vertices.len();
        self.index.insert(bloq.clone(), idx);
        self.vertices.push(Vertex::new(bloq, depth));
        self.outgoing_edges.push(Vec::new());
        self.incoming_edges.push(Vec::new());
        (idx, true)
    }

    /// Add `n` calls from `from` to `to`, summing into an existing edge
    pub fn add_edge(&mut self, from: usize, to: usize, n: Expr) {
        if let Some(&edge_idx) = self.edge_index.get(&(from, to)) {
            let edge = &mut self.edges[edge_idx];
            edge.n = &edge.n + &n;
            return;
        }
        let edge_idx = self.edges.len();
        self.edges.push(CallEdge { from, to, n });
        self.edge_index.insert((from, to), edge_idx);
        self.outgoing_edges[from].push(edge_idx);
        self.incoming_edges[to].push(edge_idx);
    }

    /// Mark a vertex as a root
    pub fn add_root(&mut self, idx: usize) {
        if !self.roots.contains(&idx) {
            self.roots.push(idx);
        }
    }

    pub(crate) fn push_warning(&mut self, warning: CountingWarning) {
        self.warnings.push(warning);
    }

    /// Get number of vertices
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get number of edges
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex(&self, idx: usize) -> Option<&Vertex> {
        self.vertices.get(idx)
    }

    pub(crate) fn vertex_mut(&mut self, idx: usize) -> &mut Vertex {
        &mut self.vertices[idx]
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_index(&self, bloq: &BloqRef) -> Option<usize> {
        self.index.get(bloq).copied()
    }

    pub fn contains(&self, bloq: &BloqRef) -> bool {
        self.index.contains_key(bloq)
    }

    /// The vertex for `bloq`
    ///
    /// # Errors
    /// Returns [`BloqError::UnknownVertex`] if `bloq` is not in the graph.
    pub fn require(&self, bloq: &BloqRef) -> Result<usize> {
        self.vertex_index(bloq).ok_or_else(|| BloqError::UnknownVertex {
            bloq: bloq.label(),
        })
    }

    /// All bloqs in insertion order
    pub fn bloqs(&self) -> impl Iterator<Item = &BloqRef> {
        self.vertices.iter().map(|v| &v.bloq)
    }

    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    /// All edges as `(caller, callee, n)`
    pub fn edge_triples(&self) -> impl Iterator<Item = (&BloqRef, &BloqRef, &Expr)> {
        self.edges.iter().map(move |e| {
            (
                &self.vertices[e.from].bloq,
                &self.vertices[e.to].bloq,
                &e.n,
            )
        })
    }

    /// Multiplicity of the edge `caller -> callee`, if present
    pub fn edge(&self, caller: &BloqRef, callee: &BloqRef) -> Option<&Expr> {
        let from = self.vertex_index(caller)?;
        let to = self.vertex_index(callee)?;
        self.edge_index.get(&(from, to)).map(|&e| &self.edges[e].n)
    }

    /// Get outgoing edges for a vertex
    pub fn outgoing_edges(&self, idx: usize) -> &[usize] {
        self.outgoing_edges
            .get(idx)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get incoming edges for a vertex
    pub fn incoming_edges(&self, idx: usize) -> &[usize] {
        self.incoming_edges
            .get(idx)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Callees of a vertex with their multiplicities
    pub fn successors(&self, idx: usize) -> impl Iterator<Item = (usize, &Expr)> {
        self.outgoing_edges(idx).iter().map(move |&e| {
            let edge = &self.edges[e];
            (edge.to, &edge.n)
        })
    }

    /// Callers of a vertex with their multiplicities
    pub fn predecessors(&self, idx: usize) -> impl Iterator<Item = (usize, &Expr)> {
        self.incoming_edges(idx).iter().map(move |&e| {
            let edge = &self.edges[e];
            (edge.from, &edge.n)
        })
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn root_bloqs(&self) -> impl Iterator<Item = &BloqRef> {
        self.roots.iter().map(move |&r| &self.vertices[r].bloq)
    }

    /// Vertices without outgoing edges
    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_vertices()).filter(move |&i| self.outgoing_edges(i).is_empty())
    }

    pub fn warnings(&self) -> &[CountingWarning] {
        &self.warnings
    }

    /// Whether `to` can be reached from `from` along call edges
    pub fn reaches(&self, from: usize, to: usize) -> bool {
        let mut visited = vec![false; self.num_vertices()];
        let mut stack = vec![from];
        while let Some(idx) = stack.pop() {
            if idx == to {
                return true;
            }
            if std::mem::replace(&mut visited[idx], true) {
                continue;
            }
            stack.extend(self.successors(idx).map(|(c, _)| c));
        }
        false
    }

    /// Check if graph is acyclic (no cycles)
    pub fn is_acyclic(&self) -> bool {
        self.find_cycles().is_empty()
    }

    /// Find cycles in the graph
    ///
    /// Stops at the first cycle found.
    pub fn find_cycles(&self) -> Vec<Vec<usize>> {
        let mut cycles = Vec::new();
        let mut visited = vec![false; self.num_vertices()];
        let mut recursion_stack = vec![false; self.num_vertices()];
        let mut path = Vec::with_capacity(self.num_vertices());

        for i in 0..self.num_vertices() {
            if !visited[i] {
                self.dfs_cycle_detection(
                    i,
                    &mut visited,
                    &mut recursion_stack,
                    &mut path,
                    &mut cycles,
                );
                if !cycles.is_empty() {
                    break;
                }
            }
        }

        cycles
    }

    fn dfs_cycle_detection(
        &self,
        node: usize,
        visited: &mut [bool],
        recursion_stack: &mut [bool],
        path: &mut Vec<usize>,
        cycles: &mut Vec<Vec<usize>>,
    ) {
        visited[node] = true;
        recursion_stack[node] = true;
        path.push(node);

        for (target, _) in self.successors(node) {
            if !visited[target] {
                self.dfs_cycle_detection(target, visited, recursion_stack, path, cycles);
            } else if recursion_stack[target] {
                if let Some(cycle_start) = path.iter().position(|&x| x == target) {
                    let mut cycle = path[cycle_start..].to_vec();
                    cycle.push(target);
                    cycles.push(cycle);
                }
            }
        }

        recursion_stack[node] = false;
        path.pop();
    }

    /// Callers before callees (Kahn's algorithm)
    ///
    /// # Errors
    /// Returns [`BloqError::CycleDetected`] if the graph has a cycle.
    pub fn topological_sort(&self) -> Result<Vec<usize>> {
        let mut in_degree: Vec<usize> = (0..self.num_vertices())
            .map(|i| self.incoming_edges(i).len())
            .collect();

        // Reversed so that pops visit vertices in insertion order
        let mut queue: Vec<usize> = (0..self.num_vertices())
            .rev()
            .filter(|&i| in_degree[i] == 0)
            .collect();

        let mut result = Vec::with_capacity(self.num_vertices());

        while let Some(node) = queue.pop() {
            result.push(node);
            for &edge_idx in self.outgoing_edges(node).iter().rev() {
                let to = self.edges[edge_idx].to;
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    queue.push(to);
                }
            }
        }

        if result.len() != self.num_vertices() {
            let path = self
                .find_cycles()
                .into_iter()
                .next()
                .unwrap_or_default()
                .into_iter()
                .map(|i| self.vertices[i].bloq.label())
                .collect();
            return Err(BloqError::CycleDetected { path });
        }

        Ok(result)
    }

    /// Merge another graph into this one
    ///
    /// Vertices are matched by structural equality. Where both graphs
    /// expanded a vertex the existing edges are kept; an expanded vertex
    /// replaces a leaf.
    pub fn merge(&mut self, other: CallGraph) {
        let mut mapping = Vec::with_capacity(other.num_vertices());
        let mut adopted = vec![false; other.num_vertices()];

        for (i, vertex) in other.vertices.iter().enumerate() {
            let (idx, created) = self.add_vertex(vertex.bloq.clone(), vertex.depth);
            let existing = &mut self.vertices[idx];
            if created || (existing.kind.is_leaf() && !vertex.kind.is_leaf()) {
                *existing = vertex.clone();
                adopted[i] = true;
            } else {
                existing.depth = existing.depth.min(vertex.depth);
            }
            mapping.push(idx);
        }

        for edge in other.edges {
            let (from, to) = (mapping[edge.from], mapping[edge.to]);
            if adopted[edge.from] && !self.edge_index.contains_key(&(from, to)) {
                self.add_edge(from, to, edge.n);
            }
        }

        for root in other.roots {
            self.add_root(mapping[root]);
        }
        self.warnings.extend(other.warnings);
    }

    /// Lines of `caller -- n -> callee`, callers in topological order
    ///
    /// # Errors
    /// Returns [`BloqError::CycleDetected`] if the graph has a cycle.
    pub fn format_counts(&self) -> Result<String> {
        let mut out = String::new();
        for idx in self.topological_sort()? {
            for (to, n) in self.successors(idx) {
                let _ = writeln!(
                    out,
                    "{} -- {} -> {}",
                    self.vertices[idx].bloq, n, self.vertices[to].bloq
                );
            }
        }
        Ok(out)
    }

    /// Graphviz DOT source for the graph
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph CallGraph {\n");
        for (i, vertex) in self.vertices.iter().enumerate() {
            let shape = if vertex.kind.is_leaf() { "box" } else { "ellipse" };
            let _ = writeln!(
                out,
                "  b{} [label=\"{}\", shape={}];",
                i,
                escape(&vertex.bloq.label()),
                shape
            );
        }
        for edge in &self.edges {
            let _ = writeln!(
                out,
                "  b{} -> b{} [label=\"{}\"];",
                edge.from,
                edge.to,
                escape(&edge.n.to_string())
            );
        }
        out.push_str("}\n");
        out
    }
}

pub(crate) fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
