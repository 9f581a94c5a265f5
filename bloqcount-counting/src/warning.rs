//! Non-fatal diagnostics collected while building a call graph

use std::fmt;

/// Something the builder approximated instead of aborting on
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CountingWarning {
    /// A bloq without a written decomposition was counted as a leaf
    DecomposeNotImplemented { bloq: String },
    /// A recursive call back into a bloq still being expanded was counted
    /// as a leaf call instead of an edge
    RecursionCut { caller: String, callee: String },
}

impl CountingWarning {
    /// Label of the bloq that was approximated
    pub fn bloq(&self) -> &str {
        match self {
            CountingWarning::DecomposeNotImplemented { bloq } => bloq,
            CountingWarning::RecursionCut { callee, .. } => callee,
        }
    }

    /// Format warning for display
    pub fn format(&self) -> String {
        format!("Warning: {}", self)
    }
}

impl fmt::Display for CountingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountingWarning::DecomposeNotImplemented { bloq } => {
                write!(f, "decomposition of '{}' is not implemented; counted as a leaf", bloq)
            }
            CountingWarning::RecursionCut { caller, callee } => {
                write!(
                    f,
                    "'{}' calls '{}' recursively; the inner call is counted as a leaf",
                    caller, callee
                )
            }
        }
    }
}
