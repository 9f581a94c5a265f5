//! Gates imported from another circuit framework

use crate::standard::{CNot, CSwap, Hadamard, Rx, Ry, Rz, SGate, TGate, Toffoli};
use bloqcount_core::{Angle, Bloq, BloqKind, BloqRef, Expr, QDType, Register, Signature};
use smallvec::SmallVec;
use std::sync::Arc;

/// An opaque gate from a foreign circuit framework
///
/// Foreign gates carry only a name, a width and their parameters. They have
/// no decomposition; [`ForeignGate::to_native`] maps well-known names onto
/// the native gates of this crate so a generalizer can replace them.
///
/// # Example
/// ```
/// use bloqcount_core::BloqRef;
/// use bloqcount_gates::{ForeignGate, TGate};
///
/// let t = ForeignGate::new("cirq", "T", 1);
/// assert_eq!(t.to_native(), Some(BloqRef::new(TGate::new())));
/// assert_eq!(ForeignGate::new("cirq", "ISWAP", 2).to_native(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignGate {
    framework: Arc<str>,
    name: Arc<str>,
    num_qubits: u32,
    params: SmallVec<[Angle; 1]>,
}

impl ForeignGate {
    pub fn new(framework: &str, name: &str, num_qubits: u32) -> Self {
        Self {
            framework: Arc::from(framework),
            name: Arc::from(name),
            num_qubits,
            params: SmallVec::new(),
        }
    }

    /// Add a parameter to the gate
    pub fn with_param(mut self, param: impl Into<Angle>) -> Self {
        self.params.push(param.into());
        self
    }

    #[inline]
    pub fn framework(&self) -> &str {
        &self.framework
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn params(&self) -> &[Angle] {
        &self.params
    }

    /// The equivalent native bloq, if the gate name is recognized
    pub fn to_native(&self) -> Option<BloqRef> {
        let one_param = || match self.params.as_slice() {
            [angle] => Some(angle.clone()),
            _ => None,
        };
        let native = match (self.name.to_ascii_uppercase().as_str(), self.num_qubits) {
            ("T", 1) => BloqRef::new(TGate::new()),
            ("T**-1" | "TDG", 1) => BloqRef::new(TGate::dagger()),
            ("S", 1) => BloqRef::new(SGate::new()),
            ("S**-1" | "SDG", 1) => BloqRef::new(SGate::dagger()),
            ("H", 1) => BloqRef::new(Hadamard),
            ("CNOT" | "CX", 2) => BloqRef::new(CNot),
            ("TOFFOLI" | "CCX" | "CCNOT", 3) => BloqRef::new(Toffoli),
            ("CSWAP" | "FREDKIN", 3) => BloqRef::new(CSwap),
            ("RZ", 1) => BloqRef::new(Rz::new(one_param()?)),
            ("RX", 1) => BloqRef::new(Rx::new(one_param()?)),
            ("RY", 1) => BloqRef::new(Ry::new(one_param()?)),
            _ => return None,
        };
        Some(native)
    }
}

impl Bloq for ForeignGate {
    fn pretty_name(&self) -> String {
        self.name.to_string()
    }

    fn label(&self) -> String {
        if self.params.is_empty() {
            return format!("{}.{}", self.framework, self.name);
        }
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        format!("{}.{}({})", self.framework, self.name, params.join(", "))
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![Register::new("qubits", QDType::QBit)
            .with_shape([Expr::from(self.num_qubits)])])
    }

    // Foreign gates are grouped by their foreign name, not by this wrapper
    fn class_kind(&self) -> BloqKind {
        BloqKind::named(format!("{}::{}", self.framework, self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloqcount_core::{BloqError, SymbolAllocator};

    #[test]
    fn test_rotation_needs_parameter() {
        let bare = ForeignGate::new("cirq", "Rz", 1);
        assert_eq!(bare.to_native(), None);
        let rz = bare.with_param(0.125);
        assert_eq!(rz.to_native(), Some(BloqRef::new(Rz::new(0.125))));
        assert_eq!(rz.label(), "cirq.Rz(0.125)");
    }

    #[test]
    fn test_width_must_match() {
        assert_eq!(ForeignGate::new("cirq", "CNOT", 3).to_native(), None);
        assert_eq!(
            ForeignGate::new("qiskit", "cx", 2).to_native(),
            Some(BloqRef::new(CNot))
        );
    }

    #[test]
    fn test_no_decomposition_is_not_implemented() {
        let gate = BloqRef::new(ForeignGate::new("cirq", "ISWAP", 2));
        let err = gate.build_call_graph(&mut SymbolAllocator::new()).unwrap_err();
        assert!(matches!(err, BloqError::DecomposeNotImplemented { .. }));
        assert_eq!(gate.signature().n_qubits(), Expr::from(2));
    }

    #[test]
    fn test_class_kind_uses_foreign_name() {
        let a = BloqRef::new(ForeignGate::new("cirq", "ISWAP", 2));
        let b = BloqRef::new(ForeignGate::new("cirq", "ISWAP", 2).with_param(0.5));
        assert_eq!(a.class_kind(), b.class_kind());
        assert_eq!(a.class_kind().to_string(), "ISWAP");
        assert_ne!(a.class_kind(), BloqRef::new(ForeignGate::new("cirq", "FSIM", 2)).class_kind());
    }
}
