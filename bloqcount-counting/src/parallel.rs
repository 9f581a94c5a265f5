//! Counting independent roots on worker threads

use crate::builder::CallGraphBuilder;
use crate::graph::CallGraph;
use bloqcount_core::{BloqRef, Result};
use rayon::prelude::*;
use tracing::info;

/// Build one call graph per root in parallel and merge them
///
/// Every worker runs a private session with its own copy of the builder's
/// symbol allocator. Graphs are merged in the order of `roots`, so the
/// result does not depend on scheduling. Fresh symbols from different
/// workers may share names.
///
/// # Errors
/// The first error of any root, in root order.
pub fn count_parallel(builder: &CallGraphBuilder, roots: &[BloqRef]) -> Result<CallGraph> {
    let graphs = roots
        .par_iter()
        .map(|root| builder.count(std::slice::from_ref(root)))
        .collect::<Result<Vec<CallGraph>>>()?;

    let mut merged = CallGraph::empty();
    for graph in graphs {
        merged.merge(graph);
    }
    info!(
        roots = roots.len(),
        vertices = merged.num_vertices(),
        edges = merged.num_edges(),
        "Merged parallel call graphs"
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::sigma;
    use bloqcount_core::Expr;
    use bloqcount_gates::{CSwap, TGate, Toffoli};

    #[test]
    fn test_parallel_matches_sequential() {
        let roots = vec![BloqRef::new(CSwap), BloqRef::new(Toffoli)];
        let builder = CallGraphBuilder::new();
        let parallel = count_parallel(&builder, &roots).unwrap();
        let sequential = builder.count(&roots).unwrap();

        assert_eq!(parallel.num_vertices(), sequential.num_vertices());
        assert_eq!(parallel.num_edges(), sequential.num_edges());
        assert_eq!(parallel.roots().len(), 2);
        for root in &roots {
            assert_eq!(
                sigma(&parallel, root).unwrap(),
                sigma(&sequential, root).unwrap()
            );
        }
        assert_eq!(
            parallel.edge(&BloqRef::new(Toffoli), &BloqRef::new(TGate::new())),
            Some(&Expr::from(4))
        );
    }

    #[test]
    fn test_empty_roots() {
        let graph = count_parallel(&CallGraphBuilder::new(), &[]).unwrap();
        assert_eq!(graph.num_vertices(), 0);
    }
}
