//! Stock generalizers
//!
//! Each rule is independent and idempotent; combine them with a
//! [`GeneralizerPipeline`](crate::GeneralizerPipeline).

use crate::generalizer::Generalizer;
use bloqcount_core::{Angle, BloqRef, FieldValue, GateFamily, Result, Symbol, SymbolAllocator};
use bloqcount_gates::ForeignGate;

/// Drop `Split` and `Join` bloqs
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreSplitJoin;

impl Generalizer for IgnoreSplitJoin {
    fn name(&self) -> &str {
        "ignore-split-join"
    }

    fn generalize(&self, bloq: &BloqRef) -> Result<Option<BloqRef>> {
        if bloq.family() == GateFamily::SplitJoin {
            return Ok(None);
        }
        Ok(Some(bloq.clone()))
    }

    fn description(&self) -> Option<&str> {
        Some("Removes register split and join bookkeeping")
    }
}

/// Drop qubit allocation and deallocation
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreAllocFree;

impl Generalizer for IgnoreAllocFree {
    fn name(&self) -> &str {
        "ignore-alloc-free"
    }

    fn generalize(&self, bloq: &BloqRef) -> Result<Option<BloqRef>> {
        if bloq.family() == GateFamily::AllocFree {
            return Ok(None);
        }
        Ok(Some(bloq.clone()))
    }

    fn description(&self) -> Option<&str> {
        Some("Removes qubit allocation and deallocation")
    }
}

/// Drop Clifford gates
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreCliffords;

impl Generalizer for IgnoreCliffords {
    fn name(&self) -> &str {
        "ignore-cliffords"
    }

    fn generalize(&self, bloq: &BloqRef) -> Result<Option<BloqRef>> {
        if bloq.family() == GateFamily::Clifford {
            return Ok(None);
        }
        Ok(Some(bloq.clone()))
    }
}

/// Replace every rotation angle with one shared symbol
///
/// Rotations differing only in their angle then share a vertex, and their
/// multiplicities sum.
///
/// # Example
/// ```
/// use bloqcount_core::{BloqRef, Symbol};
/// use bloqcount_counting::{GeneralizeRotationAngle, Generalizer};
/// use bloqcount_gates::Rz;
///
/// let rule = GeneralizeRotationAngle::new(Symbol::new("phi"));
/// let a = rule.generalize(&BloqRef::new(Rz::new(0.1))).unwrap();
/// let b = rule.generalize(&BloqRef::new(Rz::new(0.2))).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.unwrap().to_string(), "Rz(phi)");
/// ```
#[derive(Debug, Clone)]
pub struct GeneralizeRotationAngle {
    symbol: Symbol,
}

impl GeneralizeRotationAngle {
    pub fn new(symbol: Symbol) -> Self {
        Self { symbol }
    }

    /// Use a fresh `phi` symbol from the session's allocator
    pub fn from_allocator(ssa: &mut SymbolAllocator) -> Self {
        Self::new(ssa.new_symbol("phi"))
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

impl Generalizer for GeneralizeRotationAngle {
    fn name(&self) -> &str {
        "generalize-rotation-angle"
    }

    fn generalize(&self, bloq: &BloqRef) -> Result<Option<BloqRef>> {
        if bloq.family() != GateFamily::Rotation {
            return Ok(Some(bloq.clone()));
        }
        let angle = FieldValue::Angle(Angle::symbolic(self.symbol.clone()));
        bloq.with_field("angle", angle).map(Some)
    }

    fn description(&self) -> Option<&str> {
        Some("Merges rotations that differ only in their angle")
    }
}

/// Set boolean control-value fields to `true`
///
/// Merges variants of a bloq that differ only in which control values they
/// respond to. Only the listed field names are touched, and only when the
/// bloq reports them as booleans.
#[derive(Debug, Clone)]
pub struct GeneralizeControlValues {
    fields: Vec<&'static str>,
}

impl GeneralizeControlValues {
    /// Rewrite the given fields
    pub fn new(fields: Vec<&'static str>) -> Self {
        Self { fields }
    }
}

impl Default for GeneralizeControlValues {
    fn default() -> Self {
        Self::new(vec!["cv", "cv1", "cv2"])
    }
}

impl Generalizer for GeneralizeControlValues {
    fn name(&self) -> &str {
        "generalize-control-values"
    }

    fn generalize(&self, bloq: &BloqRef) -> Result<Option<BloqRef>> {
        let mut current = bloq.clone();
        for (name, value) in bloq.fields() {
            if !self.fields.contains(&name) {
                continue;
            }
            if value.as_bool() == Some(false) {
                current = current.with_field(name, FieldValue::Bool(true))?;
            }
        }
        Ok(Some(current))
    }
}

/// Replace recognized foreign gates with their native equivalents
#[derive(Debug, Clone, Copy, Default)]
pub struct ForeignToNative;

impl Generalizer for ForeignToNative {
    fn name(&self) -> &str {
        "foreign-to-native"
    }

    fn generalize(&self, bloq: &BloqRef) -> Result<Option<BloqRef>> {
        let native = bloq
            .downcast_ref::<ForeignGate>()
            .and_then(ForeignGate::to_native);
        Ok(Some(native.unwrap_or_else(|| bloq.clone())))
    }

    fn description(&self) -> Option<&str> {
        Some("Translates recognized foreign gates into native bloqs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generalizer::GeneralizerPipeline;
    use bloqcount_core::BloqError;
    use bloqcount_gates::{And, CNot, Hadamard, Join, Rx, Split, TGate, Toffoli};

    #[test]
    fn test_bookkeeping_is_dropped() {
        let split = BloqRef::new(Split::new(4));
        let join = BloqRef::new(Join::new(4));
        assert_eq!(IgnoreSplitJoin.generalize(&split).unwrap(), None);
        assert_eq!(IgnoreSplitJoin.generalize(&join).unwrap(), None);
        let tof = BloqRef::new(Toffoli);
        assert_eq!(IgnoreSplitJoin.generalize(&tof).unwrap(), Some(tof.clone()));
        assert_eq!(IgnoreAllocFree.generalize(&split).unwrap(), Some(split));
    }

    #[test]
    fn test_cliffords_are_dropped() {
        assert_eq!(IgnoreCliffords.generalize(&BloqRef::new(Hadamard)).unwrap(), None);
        assert_eq!(IgnoreCliffords.generalize(&BloqRef::new(CNot)).unwrap(), None);
        assert!(IgnoreCliffords
            .generalize(&BloqRef::new(TGate::new()))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_rotation_angles_merge() {
        let rule = GeneralizeRotationAngle::from_allocator(&mut SymbolAllocator::new());
        assert_eq!(rule.symbol().name(), "_phi0");
        let a = rule.generalize(&BloqRef::new(Rx::new(0.3))).unwrap().unwrap();
        let b = rule.generalize(&BloqRef::new(Rx::new(1.7))).unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(rule.generalize(&a).unwrap(), Some(a.clone()));
    }

    #[test]
    fn test_control_values_merge() {
        let rule = GeneralizeControlValues::default();
        let and01 = BloqRef::new(And::new(false, true));
        let and11 = BloqRef::new(And::default());
        assert_eq!(rule.generalize(&and01).unwrap(), Some(and11.clone()));
        assert_eq!(rule.generalize(&and11).unwrap(), Some(and11));

        let c0 = BloqRef::new(TGate::new()).controlled(false);
        let c1 = BloqRef::new(TGate::new()).controlled(true);
        assert_eq!(rule.generalize(&c0).unwrap(), Some(c1));
    }

    #[test]
    fn test_foreign_translation() {
        let t = BloqRef::new(ForeignGate::new("cirq", "T", 1));
        assert_eq!(
            ForeignToNative.generalize(&t).unwrap(),
            Some(BloqRef::new(TGate::new()))
        );
        let iswap = BloqRef::new(ForeignGate::new("cirq", "ISWAP", 2));
        assert_eq!(ForeignToNative.generalize(&iswap).unwrap(), Some(iswap));
    }

    #[test]
    fn test_pipeline_idempotence() {
        let pipeline = GeneralizerPipeline::identity()
            .then(ForeignToNative)
            .then(IgnoreSplitJoin)
            .then(GeneralizeControlValues::default())
            .then(GeneralizeRotationAngle::new(Symbol::new("phi")))
            .then(IgnoreAllocFree)
            .then(IgnoreCliffords);
        let inputs = vec![
            BloqRef::new(ForeignGate::new("cirq", "Rz", 1).with_param(0.5)),
            BloqRef::new(And::new(false, false)),
            BloqRef::new(Rx::new(0.1)).adjoint(),
            BloqRef::new(Toffoli).controlled(false),
            BloqRef::new(Split::new(3)),
        ];
        for bloq in inputs {
            let once = pipeline.generalize(&bloq).unwrap();
            let twice = match &once {
                Some(b) => pipeline.generalize(b).unwrap(),
                None => None,
            };
            assert_eq!(once, twice, "not idempotent on {}", bloq);
        }
    }

    #[test]
    fn test_rotation_rule_propagates_field_errors() {
        #[derive(Debug, PartialEq, Eq, Hash)]
        struct Unnamed;
        impl bloqcount_core::Bloq for Unnamed {
            fn signature(&self) -> bloqcount_core::Signature {
                bloqcount_core::Signature::build([("q", 1)])
            }
            fn family(&self) -> GateFamily {
                GateFamily::Rotation
            }
        }
        let rule = GeneralizeRotationAngle::new(Symbol::new("phi"));
        let err = rule.generalize(&BloqRef::new(Unnamed)).unwrap_err();
        assert!(matches!(err, BloqError::UnknownField { .. }));
    }
}
