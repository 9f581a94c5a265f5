//! Adjoint and controlled wrappers around arbitrary bloqs

use crate::bloq::{Bloq, BloqRef, FieldValue, GateFamily};
use crate::cost::{CostKey, CostValue};
use crate::registers::{QDType, Register};
use crate::{BloqError, Expr, Result, Signature, SymbolAllocator};

/// The adjoint of a bloq that has no dedicated adjoint of its own
///
/// Costs are those of the wrapped bloq; callees are the adjoints of the
/// wrapped bloq's callees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Adjoint {
    subbloq: BloqRef,
}

impl Adjoint {
    pub fn new(subbloq: BloqRef) -> Self {
        Self { subbloq }
    }

    #[inline]
    pub fn subbloq(&self) -> &BloqRef {
        &self.subbloq
    }
}

impl Bloq for Adjoint {
    fn pretty_name(&self) -> String {
        format!("{}†", self.subbloq.pretty_name())
    }

    fn label(&self) -> String {
        format!("{}†", self.subbloq.label())
    }

    fn signature(&self) -> Signature {
        self.subbloq.signature().adjoint()
    }

    fn build_call_graph(&self, ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Ok(self
            .subbloq
            .build_call_graph(ssa)?
            .into_iter()
            .map(|(callee, n)| (callee.adjoint(), n))
            .collect())
    }

    fn my_static_costs(&self) -> Vec<(CostKey, CostValue)> {
        self.subbloq.my_static_costs()
    }

    fn family(&self) -> GateFamily {
        self.subbloq.family()
    }

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        self.subbloq.fields()
    }

    fn with_field(&self, name: &str, value: FieldValue) -> Result<BloqRef> {
        Ok(self.subbloq.with_field(name, value)?.adjoint())
    }

    fn wrapped(&self) -> Option<&BloqRef> {
        Some(&self.subbloq)
    }

    fn specialized_adjoint(&self) -> Option<BloqRef> {
        Some(self.subbloq.clone())
    }
}

/// A bloq controlled by one extra qubit
///
/// The wrapped bloq acts only when the control qubit equals `cv`. Callees
/// are the controlled versions of the wrapped bloq's callees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Controlled {
    subbloq: BloqRef,
    cv: bool,
}

impl Controlled {
    pub fn new(subbloq: BloqRef, cv: bool) -> Self {
        Self { subbloq, cv }
    }

    #[inline]
    pub fn subbloq(&self) -> &BloqRef {
        &self.subbloq
    }

    /// The control value
    #[inline]
    pub fn cv(&self) -> bool {
        self.cv
    }
}

impl Bloq for Controlled {
    fn pretty_name(&self) -> String {
        format!("C[{}]", self.subbloq.pretty_name())
    }

    fn label(&self) -> String {
        if self.cv {
            format!("C[{}]", self.subbloq.label())
        } else {
            format!("C0[{}]", self.subbloq.label())
        }
    }

    fn signature(&self) -> Signature {
        self.subbloq
            .signature()
            .with_leading(Register::new("ctrl", QDType::QBit))
    }

    fn build_call_graph(&self, ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Ok(self
            .subbloq
            .build_call_graph(ssa)?
            .into_iter()
            .map(|(callee, n)| (callee.controlled(self.cv), n))
            .collect())
    }

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        let mut fields = vec![("cv", FieldValue::Bool(self.cv))];
        fields.extend(self.subbloq.fields());
        fields
    }

    fn with_field(&self, name: &str, value: FieldValue) -> Result<BloqRef> {
        if name == "cv" {
            let cv = value
                .as_bool()
                .ok_or_else(|| BloqError::field_type(self.pretty_name(), name, "bool"))?;
            return Ok(BloqRef::new(Self::new(self.subbloq.clone(), cv)));
        }
        Ok(self.subbloq.with_field(name, value)?.controlled(self.cv))
    }

    fn wrapped(&self) -> Option<&BloqRef> {
        Some(&self.subbloq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Leaf;

    impl Bloq for Leaf {
        fn signature(&self) -> Signature {
            Signature::build([("q", 1)])
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Parent;

    impl Bloq for Parent {
        fn signature(&self) -> Signature {
            Signature::build([("x", 2)])
        }

        fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
            Ok(vec![(BloqRef::new(Leaf), Expr::from(2))])
        }
    }

    #[test]
    fn test_adjoint_callees_are_adjoints() {
        let adj = BloqRef::new(Parent).adjoint();
        let callees = adj.build_call_graph(&mut SymbolAllocator::new()).unwrap();
        assert_eq!(callees, vec![(BloqRef::new(Leaf).adjoint(), Expr::from(2))]);
        assert_eq!(adj.label(), "Parent†");
    }

    #[test]
    fn test_controlled_signature_and_callees() {
        let ctrl = BloqRef::new(Parent).controlled(true);
        assert_eq!(ctrl.signature().registers()[0].name(), "ctrl");
        assert_eq!(ctrl.signature().n_qubits(), Expr::from(3));
        let callees = ctrl.build_call_graph(&mut SymbolAllocator::new()).unwrap();
        assert_eq!(callees[0].0, BloqRef::new(Leaf).controlled(true));
    }

    #[test]
    fn test_controlled_cv_field() {
        let ctrl = BloqRef::new(Leaf).controlled(false);
        let flipped = ctrl.with_field("cv", FieldValue::Bool(true)).unwrap();
        assert_eq!(flipped, BloqRef::new(Leaf).controlled(true));

        let err = ctrl.with_field("cv", FieldValue::Expr(Expr::one())).unwrap_err();
        assert!(matches!(err, BloqError::FieldType { .. }));
    }

    #[test]
    fn test_wrapper_field_errors_propagate() {
        let adj = BloqRef::new(Leaf).adjoint();
        let err = adj.with_field("angle", FieldValue::Bool(true)).unwrap_err();
        assert!(matches!(err, BloqError::UnknownField { .. }));
    }
}
