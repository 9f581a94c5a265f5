//! JSON export of call graphs for reports and caching
//!
//! Bloqs themselves are not serializable; the exported form keeps their
//! labels, leaf reasons and the call structure by vertex index.

use crate::graph::{CallGraph, VertexKind};
use bloqcount_core::{BloqError, Result};
use serde::{Deserialize, Serialize};

/// Serialization format version
pub const CALL_GRAPH_FORMAT_VERSION: u32 = 1;

/// Serialized call graph representation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerializedCallGraph {
    /// Format version for compatibility checking
    pub version: u32,
    pub nodes: Vec<SerializedVertex>,
    /// Indices into `nodes`
    pub roots: Vec<usize>,
    pub edges: Vec<SerializedEdge>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerializedVertex {
    pub label: String,
    /// Short name of the bloq type
    pub kind: String,
    /// Why the vertex is a leaf; absent for internal vertices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerializedEdge {
    pub from: usize,
    pub to: usize,
    /// Multiplicity as printed expression text
    pub n: String,
    /// Set for recursive calls that were counted as leaf calls
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cut: bool,
}

impl SerializedCallGraph {
    /// Check version compatibility
    pub fn check_version(&self) -> Result<()> {
        if self.version > CALL_GRAPH_FORMAT_VERSION {
            return Err(BloqError::Serialization(format!(
                "unsupported call graph format version {} (expected at most {})",
                self.version, CALL_GRAPH_FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Parse and version-check a graph produced by [`CallGraph::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        let graph: SerializedCallGraph =
            serde_json::from_str(json).map_err(|e| BloqError::Serialization(e.to_string()))?;
        graph.check_version()?;
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| BloqError::Serialization(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| BloqError::Serialization(e.to_string()))
    }
}

impl CallGraph {
    /// Flatten the graph into its serializable form
    pub fn to_serializable(&self) -> SerializedCallGraph {
        let nodes = self
            .vertices()
            .iter()
            .map(|v| SerializedVertex {
                label: v.bloq.label(),
                kind: v.bloq.kind().short_name().to_string(),
                leaf: match v.kind {
                    VertexKind::Leaf(reason) => Some(reason.as_str().to_string()),
                    VertexKind::Internal => None,
                },
            })
            .collect();

        let mut edges: Vec<SerializedEdge> = self
            .edges()
            .iter()
            .map(|e| SerializedEdge {
                from: e.from,
                to: e.to,
                n: e.n.to_string(),
                cut: false,
            })
            .collect();
        for (from, vertex) in self.vertices().iter().enumerate() {
            for (callee, n) in &vertex.cut_calls {
                if let Some(to) = self.vertex_index(callee) {
                    edges.push(SerializedEdge {
                        from,
                        to,
                        n: n.to_string(),
                        cut: true,
                    });
                }
            }
        }

        SerializedCallGraph {
            version: CALL_GRAPH_FORMAT_VERSION,
            nodes,
            roots: self.roots().to_vec(),
            edges,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        self.to_serializable().to_json()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        self.to_serializable().to_json_pretty()
    }
}
