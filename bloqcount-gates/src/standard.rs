//! Standard leaf gates
//!
//! These are the bloqs that call graphs usually bottom out in. Most are
//! atomic: asking for their callees raises a structural decomposition error
//! so counting treats them as leaves.

use bloqcount_core::{
    Angle, Bloq, BloqError, BloqRef, Expr, FieldValue, GateFamily, QDType, Register, Result, Side,
    Signature, SymbolAllocator,
};

/// The error atomic gates raise when asked for their callees
pub fn atomic<B: Bloq>(bloq: &B) -> BloqError {
    BloqError::decompose_type(bloq.label(), "atomic gate")
}

fn control_pair() -> Register {
    Register::new("ctrl", QDType::QBit).with_shape([Expr::from(2)])
}

// ============================================================================
// Clifford + T
// ============================================================================

/// The T gate, or its adjoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TGate {
    is_adjoint: bool,
}

impl TGate {
    pub const fn new() -> Self {
        Self { is_adjoint: false }
    }

    /// T-dagger
    pub const fn dagger() -> Self {
        Self { is_adjoint: true }
    }

    #[inline]
    pub const fn is_adjoint(&self) -> bool {
        self.is_adjoint
    }
}

impl Bloq for TGate {
    fn pretty_name(&self) -> String {
        "T".to_string()
    }

    fn label(&self) -> String {
        if self.is_adjoint {
            "T†".to_string()
        } else {
            "T".to_string()
        }
    }

    fn signature(&self) -> Signature {
        Signature::build([("q", 1)])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Err(atomic(self))
    }

    fn family(&self) -> GateFamily {
        GateFamily::T
    }

    fn specialized_adjoint(&self) -> Option<BloqRef> {
        Some(BloqRef::new(Self {
            is_adjoint: !self.is_adjoint,
        }))
    }
}

/// The S gate, or its adjoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SGate {
    is_adjoint: bool,
}

impl SGate {
    pub const fn new() -> Self {
        Self { is_adjoint: false }
    }

    pub const fn dagger() -> Self {
        Self { is_adjoint: true }
    }
}

impl Bloq for SGate {
    fn pretty_name(&self) -> String {
        "S".to_string()
    }

    fn label(&self) -> String {
        if self.is_adjoint {
            "S†".to_string()
        } else {
            "S".to_string()
        }
    }

    fn signature(&self) -> Signature {
        Signature::build([("q", 1)])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Err(atomic(self))
    }

    fn family(&self) -> GateFamily {
        GateFamily::Clifford
    }

    fn specialized_adjoint(&self) -> Option<BloqRef> {
        Some(BloqRef::new(Self {
            is_adjoint: !self.is_adjoint,
        }))
    }
}

/// Hadamard gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Hadamard;

impl Bloq for Hadamard {
    fn pretty_name(&self) -> String {
        "H".to_string()
    }

    fn signature(&self) -> Signature {
        Signature::build([("q", 1)])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Err(atomic(self))
    }

    fn family(&self) -> GateFamily {
        GateFamily::Clifford
    }

    fn specialized_adjoint(&self) -> Option<BloqRef> {
        Some(BloqRef::new(*self))
    }
}

/// Controlled-NOT gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CNot;

impl Bloq for CNot {
    fn pretty_name(&self) -> String {
        "CNOT".to_string()
    }

    fn signature(&self) -> Signature {
        Signature::build([("ctrl", 1), ("target", 1)])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Err(atomic(self))
    }

    fn family(&self) -> GateFamily {
        GateFamily::Clifford
    }

    fn specialized_adjoint(&self) -> Option<BloqRef> {
        Some(BloqRef::new(*self))
    }

    // A controlled CNOT is a Toffoli
    fn specialized_controlled(&self, cv: bool) -> Option<BloqRef> {
        cv.then(|| BloqRef::new(Toffoli))
    }
}

/// A Clifford operation on `n` qubits whose exact identity does not matter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArbitraryClifford {
    n: Expr,
}

impl ArbitraryClifford {
    pub fn new(n: impl Into<Expr>) -> Self {
        Self { n: n.into() }
    }

    #[inline]
    pub fn n(&self) -> &Expr {
        &self.n
    }
}

impl Bloq for ArbitraryClifford {
    fn label(&self) -> String {
        format!("ArbitraryClifford(n={})", self.n)
    }

    fn signature(&self) -> Signature {
        Signature::build([("x", self.n.clone())])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Err(atomic(self))
    }

    fn family(&self) -> GateFamily {
        GateFamily::Clifford
    }

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![("n", FieldValue::Expr(self.n.clone()))]
    }

    fn with_field(&self, name: &str, value: FieldValue) -> Result<BloqRef> {
        match (name, value) {
            ("n", FieldValue::Expr(n)) => Ok(BloqRef::new(Self { n })),
            ("n", _) => Err(BloqError::field_type(self.pretty_name(), name, "expression")),
            _ => Err(BloqError::unknown_field(self.pretty_name(), name)),
        }
    }

    fn specialized_adjoint(&self) -> Option<BloqRef> {
        Some(BloqRef::new(self.clone()))
    }
}

// ============================================================================
// Multi-qubit non-Clifford gates
// ============================================================================

/// Doubly controlled NOT
///
/// Calls the textbook seven-T circuit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Toffoli;

impl Bloq for Toffoli {
    fn signature(&self) -> Signature {
        Signature::new(vec![
            control_pair(),
            Register::new("target", QDType::QBit),
        ])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Ok(vec![
            (BloqRef::new(TGate::new()), Expr::from(4)),
            (BloqRef::new(TGate::dagger()), Expr::from(3)),
            (BloqRef::new(CNot), Expr::from(6)),
            (BloqRef::new(Hadamard), Expr::from(2)),
        ])
    }

    fn family(&self) -> GateFamily {
        GateFamily::Toffoli
    }

    fn specialized_adjoint(&self) -> Option<BloqRef> {
        Some(BloqRef::new(*self))
    }
}

/// Controlled swap of two single qubits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CSwap;

impl Bloq for CSwap {
    fn signature(&self) -> Signature {
        Signature::build([("ctrl", 1), ("x", 1), ("y", 1)])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Ok(vec![
            (BloqRef::new(CNot), Expr::from(2)),
            (BloqRef::new(Toffoli), Expr::from(1)),
        ])
    }

    fn family(&self) -> GateFamily {
        GateFamily::CSwap
    }

    fn specialized_adjoint(&self) -> Option<BloqRef> {
        Some(BloqRef::new(*self))
    }
}

/// Logical AND of two control qubits into a fresh target
///
/// The uncomputing variant consumes the target by measurement and needs no
/// T gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct And {
    cv1: bool,
    cv2: bool,
    uncompute: bool,
}

impl And {
    pub const fn new(cv1: bool, cv2: bool) -> Self {
        Self {
            cv1,
            cv2,
            uncompute: false,
        }
    }

    #[inline]
    pub const fn is_uncompute(&self) -> bool {
        self.uncompute
    }
}

impl Default for And {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl Bloq for And {
    fn label(&self) -> String {
        let dag = if self.uncompute { "†" } else { "" };
        if self.cv1 && self.cv2 {
            format!("And{}", dag)
        } else {
            format!("And{}({}, {})", dag, u8::from(self.cv1), u8::from(self.cv2))
        }
    }

    fn signature(&self) -> Signature {
        let side = if self.uncompute { Side::Left } else { Side::Right };
        Signature::new(vec![
            control_pair(),
            Register::new("target", QDType::QBit).with_side(side),
        ])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        if self.uncompute {
            return Ok(vec![(BloqRef::new(ArbitraryClifford::new(2)), Expr::from(4))]);
        }
        Ok(vec![
            (BloqRef::new(ArbitraryClifford::new(2)), Expr::from(9)),
            (BloqRef::new(TGate::new()), Expr::from(4)),
        ])
    }

    fn family(&self) -> GateFamily {
        GateFamily::And {
            uncompute: self.uncompute,
        }
    }

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("cv1", FieldValue::Bool(self.cv1)),
            ("cv2", FieldValue::Bool(self.cv2)),
        ]
    }

    fn with_field(&self, name: &str, value: FieldValue) -> Result<BloqRef> {
        let mut next = *self;
        let slot = match name {
            "cv1" => &mut next.cv1,
            "cv2" => &mut next.cv2,
            _ => return Err(BloqError::unknown_field(self.pretty_name(), name)),
        };
        *slot = value
            .as_bool()
            .ok_or_else(|| BloqError::field_type(self.pretty_name(), name, "bool"))?;
        Ok(BloqRef::new(next))
    }

    fn specialized_adjoint(&self) -> Option<BloqRef> {
        Some(BloqRef::new(Self {
            uncompute: !self.uncompute,
            ..*self
        }))
    }
}

// ============================================================================
// Rotations
// ============================================================================

macro_rules! rotation_gate {
    ($(#[$doc:meta])* $name:ident, $short:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            angle: Angle,
        }

        impl $name {
            pub fn new(angle: impl Into<Angle>) -> Self {
                Self {
                    angle: angle.into(),
                }
            }

            /// Returns the rotation angle
            #[inline]
            pub fn angle(&self) -> &Angle {
                &self.angle
            }
        }

        impl Bloq for $name {
            fn pretty_name(&self) -> String {
                $short.to_string()
            }

            fn label(&self) -> String {
                format!("{}({})", $short, self.angle)
            }

            fn signature(&self) -> Signature {
                Signature::build([("q", 1)])
            }

            fn build_call_graph(
                &self,
                _ssa: &mut SymbolAllocator,
            ) -> Result<Vec<(BloqRef, Expr)>> {
                Err(BloqError::decompose_type(
                    self.label(),
                    "rotation synthesis is not expressed as a call graph",
                ))
            }

            fn family(&self) -> GateFamily {
                GateFamily::Rotation
            }

            fn fields(&self) -> Vec<(&'static str, FieldValue)> {
                vec![("angle", FieldValue::Angle(self.angle.clone()))]
            }

            fn with_field(&self, name: &str, value: FieldValue) -> Result<BloqRef> {
                match (name, value) {
                    ("angle", FieldValue::Angle(angle)) => Ok(BloqRef::new(Self { angle })),
                    ("angle", FieldValue::Expr(e)) => Ok(BloqRef::new(Self {
                        angle: Angle::Symbolic(e),
                    })),
                    ("angle", _) => Err(BloqError::field_type(self.pretty_name(), name, "angle")),
                    _ => Err(BloqError::unknown_field(self.pretty_name(), name)),
                }
            }

            fn specialized_adjoint(&self) -> Option<BloqRef> {
                Some(BloqRef::new(Self {
                    angle: -&self.angle,
                }))
            }
        }
    };
}

rotation_gate!(
    /// Rotation about the Z axis
    Rz,
    "Rz"
);
rotation_gate!(
    /// Rotation about the X axis
    Rx,
    "Rx"
);
rotation_gate!(
    /// Rotation about the Y axis
    Ry,
    "Ry"
);

#[cfg(test)]
mod tests {
    use super::*;
    use bloqcount_core::Symbol;

    fn callees(bloq: BloqRef) -> Vec<(BloqRef, Expr)> {
        bloq.build_call_graph(&mut SymbolAllocator::new()).unwrap()
    }

    #[test]
    fn test_t_gate_is_atomic() {
        let err = BloqRef::new(TGate::new())
            .build_call_graph(&mut SymbolAllocator::new())
            .unwrap_err();
        assert!(matches!(err, BloqError::DecomposeTypeError { .. }));
    }

    #[test]
    fn test_t_adjoint_is_specialized() {
        let t = BloqRef::new(TGate::new());
        assert_eq!(t.adjoint(), BloqRef::new(TGate::dagger()));
        assert_eq!(t.adjoint().to_string(), "T†");
        assert_eq!(t.adjoint().family(), GateFamily::T);
    }

    #[test]
    fn test_toffoli_uses_seven_t() {
        let t_total: i64 = callees(BloqRef::new(Toffoli))
            .iter()
            .filter(|(b, _)| b.family() == GateFamily::T)
            .filter_map(|(_, n)| n.to_i64())
            .sum();
        assert_eq!(t_total, 7);
    }

    #[test]
    fn test_controlled_cnot_is_toffoli() {
        assert_eq!(BloqRef::new(CNot).controlled(true), BloqRef::new(Toffoli));
        assert_ne!(BloqRef::new(CNot).controlled(false), BloqRef::new(Toffoli));
    }

    #[test]
    fn test_and_compute_and_uncompute() {
        let and = BloqRef::new(And::default());
        assert_eq!(callees(and.clone()).len(), 2);
        let undo = and.adjoint();
        assert_eq!(undo.family(), GateFamily::And { uncompute: true });
        assert_eq!(
            callees(undo.clone()),
            vec![(BloqRef::new(ArbitraryClifford::new(2)), Expr::from(4))]
        );
        assert_eq!(undo.signature().rights().count(), 1);
    }

    #[test]
    fn test_and_control_fields() {
        let and = BloqRef::new(And::new(false, true));
        assert_eq!(and.to_string(), "And(0, 1)");
        let general = and.with_field("cv1", FieldValue::Bool(true)).unwrap();
        assert_eq!(general, BloqRef::new(And::default()));
        assert!(and.with_field("cv3", FieldValue::Bool(true)).is_err());
    }

    #[test]
    fn test_rotation_fields() {
        let rz = BloqRef::new(Rz::new(0.25));
        assert_eq!(rz.to_string(), "Rz(0.25)");
        let phi = Angle::symbolic(Symbol::new("phi"));
        let general = rz.with_field("angle", FieldValue::Angle(phi.clone())).unwrap();
        assert_eq!(general, BloqRef::new(Rz::new(phi)));
        assert_ne!(general, BloqRef::new(Rx::new(Angle::symbolic(Symbol::new("phi")))));
        assert!(matches!(
            rz.with_field("angle", FieldValue::Bool(false)),
            Err(BloqError::FieldType { .. })
        ));
    }

    #[test]
    fn test_rotation_adjoint_negates() {
        let ry = BloqRef::new(Ry::new(0.5));
        assert_eq!(ry.adjoint(), BloqRef::new(Ry::new(-0.5)));
    }

    #[test]
    fn test_cswap_callees() {
        assert_eq!(
            callees(BloqRef::new(CSwap)),
            vec![
                (BloqRef::new(CNot), Expr::from(2)),
                (BloqRef::new(Toffoli), Expr::from(1)),
            ]
        );
    }
}
