//! Collapse of a call graph into a graph over bloq kinds

use crate::graph::{escape, CallGraph};
use ahash::{AHashMap, AHashSet};
use bloqcount_core::{BloqKind, BloqRef};
use bloqcount_gates::ForeignGate;
use std::fmt::Write;

/// Kind of a bloq for the class graph
///
/// Adjoint and controlled wrappers collapse onto the bloq they wrap, and a
/// foreign gate with a native equivalent collapses onto that equivalent.
pub fn default_classifier(bloq: &BloqRef) -> BloqKind {
    if let Some(native) = bloq.downcast_ref::<ForeignGate>().and_then(ForeignGate::to_native) {
        return native.class_kind();
    }
    bloq.class_kind()
}

/// A directed graph over bloq kinds
///
/// Edge `a -> b` exists when any bloq of kind `a` calls any bloq of kind
/// `b`. Multiplicities are dropped. Self-loops are kept, so a recursive
/// family shows up as a cycle here even though its call graph is acyclic.
#[derive(Clone, Debug, Default)]
pub struct ClassGraph {
    nodes: Vec<BloqKind>,
    index: AHashMap<BloqKind, usize>,
    edges: Vec<(usize, usize)>,
    edge_set: AHashSet<(usize, usize)>,
}

impl ClassGraph {
    /// Collapse `graph` under `classifier`
    ///
    /// # Example
    /// ```
    /// use bloqcount_core::BloqRef;
    /// use bloqcount_counting::{CallGraphBuilder, ClassGraph};
    /// use bloqcount_gates::Toffoli;
    ///
    /// let graph = CallGraphBuilder::new().count(&[BloqRef::new(Toffoli)]).unwrap();
    /// let classes = ClassGraph::from_call_graph(&graph);
    /// // T and T-dagger are one class
    /// assert_eq!(classes.num_nodes(), 4);
    /// ```
    pub fn collapse<F>(graph: &CallGraph, classifier: F) -> Self
    where
        F: Fn(&BloqRef) -> BloqKind,
    {
        let mut classes = ClassGraph::default();
        let node_of: Vec<usize> = graph
            .vertices()
            .iter()
            .map(|v| classes.add_node(classifier(&v.bloq)))
            .collect();
        for edge in graph.edges() {
            classes.add_edge(node_of[edge.from], node_of[edge.to]);
        }
        for (idx, vertex) in graph.vertices().iter().enumerate() {
            for (callee, _) in &vertex.cut_calls {
                let to = classes.add_node(classifier(callee));
                classes.add_edge(node_of[idx], to);
            }
        }
        classes
    }

    /// Collapse with [`default_classifier`]
    pub fn from_call_graph(graph: &CallGraph) -> Self {
        Self::collapse(graph, default_classifier)
    }

    fn add_node(&mut self, kind: BloqKind) -> usize {
        if let Some(&idx) = self.index.get(&kind) {
            return idx;
        }
        let idx = self.nodes.len();
        self.index.insert(kind.clone(), idx);
        self.nodes.push(kind);
        idx
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        if self.edge_set.insert((from, to)) {
            self.edges.push((from, to));
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[BloqKind] {
        &self.nodes
    }

    pub fn contains(&self, kind: &BloqKind) -> bool {
        self.index.contains_key(kind)
    }

    pub fn has_edge(&self, from: &BloqKind, to: &BloqKind) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&f), Some(&t)) => self.edge_set.contains(&(f, t)),
            _ => false,
        }
    }

    /// Kinds called by `kind`, in first-seen order
    pub fn successors(&self, kind: &BloqKind) -> Vec<&BloqKind> {
        let Some(&from) = self.index.get(kind) else {
            return Vec::new();
        };
        self.edges
            .iter()
            .filter(|(f, _)| *f == from)
            .map(|&(_, t)| &self.nodes[t])
            .collect()
    }

    /// Edges as `(caller kind, callee kind)` pairs
    pub fn edges(&self) -> impl Iterator<Item = (&BloqKind, &BloqKind)> {
        self.edges
            .iter()
            .map(move |&(f, t)| (&self.nodes[f], &self.nodes[t]))
    }

    /// Graphviz text of the class graph
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph ClassGraph {\n");
        for (i, kind) in self.nodes.iter().enumerate() {
            let _ = writeln!(out, "  k{} [label=\"{}\"];", i, escape(kind.short_name()));
        }
        for &(f, t) in &self.edges {
            let _ = writeln!(out, "  k{} -> k{};", f, t);
        }
        out.push_str("}\n");
        out
    }
}
