//! Integration tests for call-graph construction

use bloqcount_core::{BloqError, BloqRef, Expr, FieldValue, Symbol};
use bloqcount_counting::{
    sigma, sum_up_costs, CallGraphBuilder, CountingWarning, FnGeneralizer, Generalizer, IgnoreSplitJoin,
    LeafReason, VertexKind,
};
use bloqcount_gates::for_testing::{
    make_diamond_graph, make_example_1, make_funnel_graph, CostingBloq, Recursive,
};
use bloqcount_gates::{And, CSwap, ForeignGate, ModExp, Rz, Split, TGate, Toffoli};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn test_depth_bound_makes_frontier_leaves() {
    let root = make_example_1();
    let graph = CallGraphBuilder::new()
        .max_depth(1)
        .count(&[root.clone()])
        .unwrap();
    assert_eq!(graph.num_vertices(), 3);

    let leaves = sigma(&graph, &root).unwrap();
    let counts: Vec<(String, Expr)> = leaves
        .into_iter()
        .map(|(b, n)| (b.label(), n))
        .collect();
    assert!(counts.contains(&("Add".to_string(), Expr::from(1))));
    assert!(counts.contains(&("Compare".to_string(), Expr::from(2))));
    for idx in graph.leaves() {
        assert_eq!(
            graph.vertex(idx).unwrap().kind,
            VertexKind::Leaf(LeafReason::MaxDepth)
        );
    }

    let root_only = CallGraphBuilder::new().max_depth(0).count(&[root.clone()]).unwrap();
    assert_eq!(root_only.num_vertices(), 1);
    assert_eq!(sigma(&root_only, &root).unwrap(), vec![(root, Expr::from(1))]);
}

#[test]
fn test_symbolic_recursion_terminates_under_depth_bound() {
    init_tracing();
    let n = Expr::symbol(Symbol::new("n"));
    let root = BloqRef::new(Recursive::new(n));
    let graph = CallGraphBuilder::new().max_depth(5).count(&[root]).unwrap();
    // n, n - 1, ..., n - 5 and the T gate
    assert_eq!(graph.num_vertices(), 7);
    assert!(graph.is_acyclic());
}

#[test]
fn test_concrete_recursion_bottoms_out() {
    let root = BloqRef::new(Recursive::new(10));
    let graph = CallGraphBuilder::new().count(&[root.clone()]).unwrap();
    assert_eq!(graph.num_vertices(), 12);

    let leaves = sigma(&graph, &root).unwrap();
    assert!(leaves.contains(&(BloqRef::new(TGate::new()), Expr::from(1023))));
    assert!(leaves.contains(&(BloqRef::new(Recursive::new(0)), Expr::from(1024))));
}

#[test]
fn test_self_call_after_generalization_is_cut() {
    let erase_n = FnGeneralizer::fallible("erase-n", |b: &BloqRef| {
        if b.is::<Recursive>() {
            let n = Expr::symbol(Symbol::new("n"));
            return b.with_field("n", FieldValue::Expr(n)).map(Some);
        }
        Ok(Some(b.clone()))
    });
    let graph = CallGraphBuilder::new()
        .generalizer(erase_n)
        .count(&[BloqRef::new(Recursive::new(3))])
        .unwrap();
    assert!(graph.is_acyclic());
    assert_eq!(graph.num_edges(), 1);
    assert_eq!(graph.warnings().len(), 1);
    assert!(graph.format_counts().is_ok());
}

#[test]
fn test_reexpanded_vertex_does_not_close_a_cycle() {
    init_tracing();
    // r -> {a, x}, a -> y -> x, and x calls a bloq that generalizes to y.
    // x is first cut off by the depth bound under y, then re-expanded from r.
    let y_alias = CostingBloq::new("y'", 1).into_ref();
    let x = CostingBloq::new("x", 1).calls(y_alias.clone(), 1).into_ref();
    let y = CostingBloq::new("y", 1).calls(x.clone(), 1).into_ref();
    let a = CostingBloq::new("a", 1).calls(y.clone(), 1).into_ref();
    let r = CostingBloq::new("r", 1)
        .calls(a, 1)
        .calls(x.clone(), 1)
        .into_ref();

    let target = y.clone();
    let alias = FnGeneralizer::new("alias-y", move |b: &BloqRef| {
        if *b == y_alias {
            Some(target.clone())
        } else {
            Some(b.clone())
        }
    });
    let graph = CallGraphBuilder::new()
        .generalizer(alias)
        .max_depth(3)
        .count(&[r])
        .unwrap();

    assert!(graph.is_acyclic());
    assert!(graph.format_counts().is_ok());
    assert!(sum_up_costs(&graph).is_ok());
    assert_eq!(
        graph.warnings(),
        &[CountingWarning::RecursionCut {
            caller: "x".to_string(),
            callee: "y".to_string(),
        }]
    );
    let x_vertex = graph.vertex(graph.vertex_index(&x).unwrap()).unwrap();
    assert_eq!(x_vertex.kind, VertexKind::Internal);
    assert_eq!(x_vertex.depth, 1);
    assert_eq!(x_vertex.cut_calls, vec![(y.clone(), Expr::from(1))]);
    assert_eq!(graph.edge(&y, &x), Some(&Expr::from(1)));
}

#[test]
fn test_shallower_path_propagates_depth() {
    // r -> a -> m -> c -> d, and r -> m directly
    let d = CostingBloq::new("d", 1).into_ref();
    let c = CostingBloq::new("c", 1).calls(d.clone(), 1).into_ref();
    let m = CostingBloq::new("m", 1).calls(c.clone(), 1).into_ref();
    let a = CostingBloq::new("a", 1).calls(m.clone(), 1).into_ref();
    let r = CostingBloq::new("r", 1)
        .calls(a, 1)
        .calls(m.clone(), 1)
        .into_ref();

    let graph = CallGraphBuilder::new().max_depth(3).count(&[r.clone()]).unwrap();
    let vertex = |b: &BloqRef| graph.vertex(graph.vertex_index(b).unwrap()).unwrap();

    assert_eq!(vertex(&m).kind, VertexKind::Internal);
    assert_eq!(vertex(&m).depth, 1);
    // c sat at the bound under m; m's shorter path brings it back in range
    assert_eq!(vertex(&c).kind, VertexKind::Internal);
    assert_eq!(vertex(&c).depth, 2);
    assert_eq!(vertex(&d).depth, 3);
    assert_eq!(vertex(&d).kind, VertexKind::Leaf(LeafReason::MaxDepth));
    assert!(graph.warnings().is_empty());
    assert_eq!(sigma(&graph, &r).unwrap(), vec![(d, Expr::from(2))]);
}

#[test]
fn test_library_wide_pipeline_is_idempotent() {
    let root = CostingBloq::new("root", 4)
        .calls(BloqRef::new(Rz::new(0.25)), 2)
        .calls(BloqRef::new(Rz::new(0.5)), 1)
        .calls(BloqRef::new(ForeignGate::new("cirq", "CNOT", 2)), 3)
        .calls(BloqRef::new(Split::new(4)), 1)
        .calls(BloqRef::new(And::new(false, true)), 2)
        .into_ref();
    let builder = CallGraphBuilder::library_wide();
    let graph = builder.count(&[root]).unwrap();

    // root, the generalized rotation, And and its T gates
    assert_eq!(graph.num_vertices(), 4);
    for bloq in graph.bloqs() {
        let again = builder.pipeline().generalize(bloq).unwrap();
        assert_eq!(again.as_ref(), Some(bloq));
    }
    let rz_edges: Vec<_> = graph
        .edge_triples()
        .filter(|(_, to, _)| to.is::<Rz>())
        .collect();
    assert_eq!(rz_edges.len(), 1);
    assert_eq!(rz_edges[0].2, &Expr::from(3));
}

#[test]
fn test_fresh_allocators_give_identical_graphs() {
    let root = BloqRef::new(ModExp::new(4, 15, 3, 4));
    let first = CallGraphBuilder::new().count(&[root.clone()]).unwrap();
    let second = CallGraphBuilder::new().count(&[root]).unwrap();
    assert_eq!(first.format_counts().unwrap(), second.format_counts().unwrap());
    assert_eq!(first.to_dot(), second.to_dot());
}

#[test]
fn test_multiplicities_are_conserved() {
    let leaf = CostingBloq::new("leaf", 1).into_ref();

    let twice = CostingBloq::new("twice", 1)
        .calls(leaf.clone(), 3)
        .calls(leaf.clone(), 4)
        .into_ref();
    let graph = CallGraphBuilder::new().count(&[twice.clone()]).unwrap();
    assert_eq!(graph.edge(&twice, &leaf), Some(&Expr::from(7)));

    let mid = CostingBloq::new("mid", 1).calls(leaf.clone(), 5).into_ref();
    let outer = CostingBloq::new("outer", 1).calls(mid, 2).into_ref();
    let graph = CallGraphBuilder::new().count(&[outer.clone()]).unwrap();
    assert_eq!(sigma(&graph, &outer).unwrap(), vec![(leaf, Expr::from(10))]);
}

#[test]
fn test_diamond_with_and_without_merging() {
    let (a, combine_bs) = make_diamond_graph();
    let c = bloqcount_gates::for_testing::CallGraphShim::new("c").into_ref();

    let plain = CallGraphBuilder::new().count(&[a.clone()]).unwrap();
    assert_eq!(plain.num_vertices(), 4);
    assert_eq!(sigma(&plain, &a).unwrap(), vec![(c.clone(), Expr::from(2))]);

    let merged = CallGraphBuilder::new()
        .generalizer(FnGeneralizer::new("combine-bs", combine_bs))
        .count(&[a.clone()])
        .unwrap();
    assert_eq!(merged.num_vertices(), 3);
    assert_eq!(merged.num_edges(), 2);
    let b = merged.vertex(1).unwrap().bloq.clone();
    assert_eq!(b.label(), "b");
    assert_eq!(merged.edge(&a, &b), Some(&Expr::from(2)));
    assert_eq!(sigma(&merged, &a).unwrap(), vec![(c, Expr::from(2))]);
}

#[test]
fn test_funnel_with_and_without_merging() {
    let (x, combine_as) = make_funnel_graph();
    let c = bloqcount_gates::for_testing::CallGraphShim::new("c").into_ref();

    let plain = CallGraphBuilder::new().count(&[x.clone()]).unwrap();
    assert_eq!(plain.num_vertices(), 5);
    assert_eq!(sigma(&plain, &x).unwrap(), vec![(c.clone(), Expr::from(2))]);

    let merged = CallGraphBuilder::new()
        .generalizer(FnGeneralizer::new("combine-as", combine_as))
        .count(&[x.clone()])
        .unwrap();
    assert_eq!(merged.num_vertices(), 4);
    assert_eq!(sigma(&merged, &x).unwrap(), vec![(c, Expr::from(2))]);
}

#[test]
fn test_unimplemented_decomposition_warns() {
    init_tracing();
    let iswap = BloqRef::new(ForeignGate::new("cirq", "ISWAP", 2));
    let root = CostingBloq::new("root", 2).calls(iswap.clone(), 1).into_ref();

    let graph = CallGraphBuilder::new().count(&[root.clone()]).unwrap();
    assert_eq!(
        graph.warnings(),
        &[CountingWarning::DecomposeNotImplemented {
            bloq: "cirq.ISWAP".to_string()
        }]
    );
    let idx = graph.vertex_index(&iswap).unwrap();
    assert_eq!(
        graph.vertex(idx).unwrap().kind,
        VertexKind::Leaf(LeafReason::NotImplemented)
    );

    let quiet = CallGraphBuilder::new()
        .warn_on_unimplemented(false)
        .count(&[root])
        .unwrap();
    assert!(quiet.warnings().is_empty());
}

#[test]
fn test_unknown_field_propagates() {
    let broken = FnGeneralizer::fallible("broken", |b: &BloqRef| {
        if b.is::<Toffoli>() {
            return b.with_field("bogus", FieldValue::Bool(true)).map(Some);
        }
        Ok(Some(b.clone()))
    });
    let err = CallGraphBuilder::new()
        .generalizer(broken)
        .count(&[BloqRef::new(CSwap)])
        .unwrap_err();
    assert!(matches!(err, BloqError::UnknownField { .. }));
}

#[test]
fn test_split_join_removed_from_decomposition() {
    use bloqcount_gates::for_testing::DecompBloq;

    let root = BloqRef::new(DecompBloq::new(10));
    let plain = CallGraphBuilder::new().count(&[root.clone()]).unwrap();
    assert_eq!(sigma(&plain, &root).unwrap().len(), 3);

    let ignored = CallGraphBuilder::new()
        .generalizer(IgnoreSplitJoin)
        .count(&[root.clone()])
        .unwrap();
    assert_eq!(
        sigma(&ignored, &root).unwrap(),
        vec![(BloqRef::new(TGate::new()), Expr::from(30))]
    );
}
