//! Error types for bloqcount

use thiserror::Error;

/// Errors that can occur while describing, decomposing or costing bloqs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BloqError {
    /// The bloq's cost cannot be expressed as a decomposition
    ///
    /// This is expected and common: atomic gates and bloqs whose parameters are
    /// irreducibly symbolic raise it. Counting treats the bloq as a leaf.
    #[error("Bloq '{bloq}' has no decomposition: {reason}")]
    DecomposeTypeError { bloq: String, reason: String },

    /// The bloq's author never wrote a decomposition
    #[error("Decomposition of bloq '{bloq}' is not implemented")]
    DecomposeNotImplemented { bloq: String },

    /// A generalizer or classifier referred to a field the bloq does not have
    #[error("Bloq '{bloq}' has no field named '{field}'")]
    UnknownField { bloq: String, field: String },

    /// A field exists but was given a value of the wrong kind
    #[error("Field '{field}' of bloq '{bloq}' expects a {expected} value")]
    FieldType {
        bloq: String,
        field: String,
        expected: &'static str,
    },

    /// A register name was not found in a signature
    #[error("Signature has no register named '{0}'")]
    UnknownRegister(String),

    /// Aggregation found a cycle that the call-graph builder should have broken
    #[error("Call graph contains a cycle: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    /// A generalizer returned "drop" for a root bloq
    #[error("The root bloq '{bloq}' cannot be generalized away")]
    RootGeneralizedAway { bloq: String },

    /// Two cost values with different combination rules were combined
    #[error("Cannot combine a {actual} cost into a {expected} cost for '{key}'")]
    CostKindMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A cost query named a bloq that is not a vertex of the call graph
    #[error("Bloq '{bloq}' is not a vertex of the call graph")]
    UnknownVertex { bloq: String },

    /// Export to an external format failed
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl BloqError {
    /// Create a structural "no decomposition" error
    pub fn decompose_type(bloq: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DecomposeTypeError {
            bloq: bloq.into(),
            reason: reason.into(),
        }
    }

    /// Create a "decomposition not implemented" error
    pub fn not_implemented(bloq: impl Into<String>) -> Self {
        Self::DecomposeNotImplemented { bloq: bloq.into() }
    }

    /// Create an unknown field error
    pub fn unknown_field(bloq: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            bloq: bloq.into(),
            field: field.into(),
        }
    }

    /// Create a field type error
    pub fn field_type(
        bloq: impl Into<String>,
        field: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::FieldType {
            bloq: bloq.into(),
            field: field.into(),
            expected,
        }
    }

    /// Whether this error means "stop here and treat the bloq as a leaf"
    ///
    /// Both decomposition failures are recoverable; everything else indicates
    /// a contract violation and must be propagated.
    pub fn is_decomposition_failure(&self) -> bool {
        matches!(
            self,
            Self::DecomposeTypeError { .. } | Self::DecomposeNotImplemented { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_type_error() {
        let err = BloqError::decompose_type("Rz", "rotation synthesis");
        let msg = format!("{}", err);
        assert!(msg.contains("Rz"));
        assert!(msg.contains("rotation synthesis"));
        assert!(err.is_decomposition_failure());
    }

    #[test]
    fn test_not_implemented_error() {
        let err = BloqError::not_implemented("ModExp");
        assert!(format!("{}", err).contains("ModExp"));
        assert!(err.is_decomposition_failure());
    }

    #[test]
    fn test_unknown_field_is_fatal() {
        let err = BloqError::unknown_field("TGate", "angle");
        let msg = format!("{}", err);
        assert!(msg.contains("TGate"));
        assert!(msg.contains("angle"));
        assert!(!err.is_decomposition_failure());
    }

    #[test]
    fn test_cycle_message() {
        let err = BloqError::CycleDetected {
            path: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        };
        assert_eq!(format!("{}", err), "Call graph contains a cycle: A -> B -> A");
    }
}
