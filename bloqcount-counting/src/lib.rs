//! Call-graph construction and resource counting for bloqs
//!
//! This crate turns a root bloq into a call graph and adds up what it costs:
//! - [`CallGraphBuilder`]: Expands bloqs through their declared callees,
//!   rewriting each one with a [`GeneralizerPipeline`] first
//! - [`KeepPolicy`]: Bloqs that are always counted as leaves
//! - [`CallGraph`]: Deduplicated vertices with summed call multiplicities
//! - [`sum_up_costs`] / [`sigma`] / [`aggregate`]: Cost totals per vertex
//! - [`QecGatesCost`]: T, Toffoli, CSwap and And tallies
//! - [`ClassGraph`]: The call graph collapsed onto bloq kinds
//!
//! # Example
//!
//! ```
//! use bloqcount_core::{BloqRef, CostKey, CostValue, Expr};
//! use bloqcount_counting::{query_cost, sigma, CallGraphBuilder};
//! use bloqcount_gates::for_testing::make_example_1;
//!
//! let root = make_example_1();
//! let graph = CallGraphBuilder::new().count(&[root.clone()]).unwrap();
//! let leaves = sigma(&graph, &root).unwrap();
//! assert_eq!(leaves.len(), 1);
//! assert_eq!(leaves[0].1, Expr::from(96));
//! assert_eq!(
//!     query_cost(&graph, &root, &CostKey::clifford()).unwrap(),
//!     CostValue::Add(Expr::from(168))
//! );
//! ```

pub mod builder;
pub mod class_graph;
pub mod costs;
pub mod gate_counts;
pub mod generalizer;
pub mod generalizers;
pub mod graph;
pub mod keep;
pub mod parallel;
pub mod serialization;
pub mod warning;

pub use builder::{build_call_graph, leaf_costs_of, CallGraphBuilder, CallGraphConfig, CountingSession};
pub use class_graph::{default_classifier, ClassGraph};
pub use costs::{aggregate, call_graph_and_sigma, costs_of, query_cost, sigma, sum_up_costs, CostTable};
pub use gate_counts::{gateset_counts, GateCounts, Gateset, QecGatesCost};
pub use generalizer::{FnGeneralizer, Generalizer, GeneralizerPipeline};
pub use generalizers::{
    ForeignToNative, GeneralizeControlValues, GeneralizeRotationAngle, IgnoreAllocFree,
    IgnoreCliffords, IgnoreSplitJoin,
};
pub use graph::{CallEdge, CallGraph, LeafReason, Vertex, VertexKind};
pub use keep::KeepPolicy;
pub use parallel::count_parallel;
pub use serialization::{
    SerializedCallGraph, SerializedEdge, SerializedVertex, CALL_GRAPH_FORMAT_VERSION,
};
pub use warning::CountingWarning;

pub use bloqcount_core::{BloqError, Result};
