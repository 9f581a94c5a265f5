//! Synthetic bloqs for exercising the counting engine
//!
//! These bloqs let tests and benchmarks describe call graphs and costs
//! directly through their attributes.

use crate::bookkeeping::{Join, Split};
use crate::standard::TGate;
use bloqcount_core::{
    Bloq, BloqError, BloqRef, CompositeBloq, CostKey, CostValue, Expr, FieldValue, Result, Signature,
    SymbolAllocator,
};
use std::sync::Arc;

/// A bloq whose callees and costs are set through attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CostingBloq {
    name: Arc<str>,
    num_qubits: u32,
    callees: Vec<(BloqRef, Expr)>,
    static_costs: Vec<(CostKey, CostValue)>,
    leaf_costs: Option<Vec<(CostKey, CostValue)>>,
}

impl CostingBloq {
    pub fn new(name: &str, num_qubits: u32) -> Self {
        Self {
            name: Arc::from(name),
            num_qubits,
            callees: Vec::new(),
            static_costs: Vec::new(),
            leaf_costs: None,
        }
    }

    /// Add a callee invoked `n` times
    pub fn calls(mut self, callee: BloqRef, n: impl Into<Expr>) -> Self {
        self.callees.push((callee, n.into()));
        self
    }

    pub fn with_static_cost(mut self, key: CostKey, value: CostValue) -> Self {
        self.static_costs.push((key, value));
        self
    }

    /// Replace the default leaf costs
    pub fn with_leaf_costs(mut self, costs: Vec<(CostKey, CostValue)>) -> Self {
        self.leaf_costs = Some(costs);
        self
    }

    pub fn into_ref(self) -> BloqRef {
        BloqRef::new(self)
    }
}

impl Bloq for CostingBloq {
    fn pretty_name(&self) -> String {
        self.name.to_string()
    }

    fn signature(&self) -> Signature {
        Signature::build([("register", self.num_qubits)])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Ok(self.callees.clone())
    }

    fn my_static_costs(&self) -> Vec<(CostKey, CostValue)> {
        let mut costs = vec![(
            CostKey::MaxQubits,
            CostValue::Max(Some(Expr::from(self.num_qubits))),
        )];
        costs.extend(self.static_costs.iter().cloned());
        costs
    }

    fn my_leaf_costs(&self) -> Option<Vec<(CostKey, CostValue)>> {
        self.leaf_costs.clone()
    }
}

/// A bloq that only has a call graph
///
/// Its leaf cost is one call of itself and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallGraphShim {
    name: Arc<str>,
    callees: Vec<(BloqRef, Expr)>,
}

impl CallGraphShim {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            callees: Vec::new(),
        }
    }

    pub fn calls(mut self, callee: BloqRef, n: impl Into<Expr>) -> Self {
        self.callees.push((callee, n.into()));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_ref(self) -> BloqRef {
        BloqRef::new(self)
    }
}

impl Bloq for CallGraphShim {
    fn pretty_name(&self) -> String {
        self.name.to_string()
    }

    fn signature(&self) -> Signature {
        Signature::empty()
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Ok(self.callees.clone())
    }

    fn my_leaf_costs(&self) -> Option<Vec<(CostKey, CostValue)>> {
        Some(vec![(
            CostKey::BloqCount(BloqRef::new(self.clone())),
            CostValue::Add(Expr::one()),
        )])
    }
}

/// A bloq that calls `log2(bitsize)` sub-bloqs through its call graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BigBloq {
    bitsize: Expr,
}

impl BigBloq {
    pub fn new(bitsize: impl Into<Expr>) -> Self {
        Self {
            bitsize: bitsize.into(),
        }
    }
}

impl Bloq for BigBloq {
    fn signature(&self) -> Signature {
        Signature::build([("x", self.bitsize.clone())])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Ok(vec![(
            BloqRef::new(SubBloq::new(Expr::rational(1, 2))),
            self.bitsize.log2(),
        )])
    }
}

/// A bloq that decomposes into one sub-bloq per qubit, wrapped in split/join
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecompBloq {
    bitsize: u32,
}

impl DecompBloq {
    pub fn new(bitsize: u32) -> Self {
        Self { bitsize }
    }
}

impl Bloq for DecompBloq {
    fn signature(&self) -> Signature {
        Signature::build([("x", self.bitsize)])
    }

    fn decompose_bloq(&self) -> Result<CompositeBloq> {
        let mut cbloq = CompositeBloq::new(self.signature());
        cbloq.add(BloqRef::new(Split::new(self.bitsize)));
        for i in 0..self.bitsize {
            let param = Expr::rational(i64::from(i), 12);
            cbloq.add(BloqRef::new(SubBloq::new(param)));
        }
        cbloq.add(BloqRef::new(Join::new(self.bitsize)));
        Ok(cbloq)
    }
}

/// A single-qubit bloq with a parameter that does not affect its cost
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubBloq {
    unrelated_param: Expr,
}

impl SubBloq {
    pub fn new(unrelated_param: impl Into<Expr>) -> Self {
        Self {
            unrelated_param: unrelated_param.into(),
        }
    }
}

impl Bloq for SubBloq {
    fn label(&self) -> String {
        format!("SubBloq({})", self.unrelated_param)
    }

    fn signature(&self) -> Signature {
        Signature::build([("q", 1)])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Ok(vec![(BloqRef::new(TGate::new()), Expr::from(3))])
    }
}

/// A bloq that calls a smaller copy of itself until `n` reaches zero
///
/// With a symbolic `n` the callee is `n - 1`, a distinct bloq; a generalizer
/// that erases `n` turns the decomposition into a self-call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Recursive {
    n: Expr,
}

impl Recursive {
    pub fn new(n: impl Into<Expr>) -> Self {
        Self { n: n.into() }
    }

    #[inline]
    pub fn n(&self) -> &Expr {
        &self.n
    }
}

impl Bloq for Recursive {
    fn label(&self) -> String {
        format!("Recursive({})", self.n)
    }

    fn signature(&self) -> Signature {
        Signature::build([("q", 1)])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        if self.n.to_i64().map_or(false, |n| n <= 0) {
            return Err(BloqError::decompose_type(self.label(), "base case"));
        }
        Ok(vec![
            (BloqRef::new(Self::new(&self.n - 1)), Expr::from(2)),
            (BloqRef::new(TGate::new()), Expr::one()),
        ])
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
}

/// The small costing example: a modular adder built from adders and
/// comparators that bottom out in Toffolis and T gates
///
/// ```text
/// ModAdd --1--> Add --8--> Tof --4--> TGate
///        --2--> Compare --8--> Tof
/// ```
pub fn make_example_1() -> BloqRef {
    let tgate = CostingBloq::new("TGate", 1).into_ref();
    let tof = CostingBloq::new("Tof", 3)
        .calls(tgate, 4)
        .with_static_cost(CostKey::clifford(), CostValue::Add(Expr::from(7)))
        .into_ref();
    let add = CostingBloq::new("Add", 8).calls(tof.clone(), 8).into_ref();
    let comp = CostingBloq::new("Compare", 9)
        .calls(tof, 8)
        .with_static_cost(CostKey::SuccessProb, CostValue::Mul(Expr::rational(9, 10)))
        .into_ref();
    CostingBloq::new("ModAdd", 8)
        .calls(add, 1)
        .calls(comp, 2)
        .into_ref()
}

/// `a -> {b1, b2} -> c`, plus a rule merging the `b`s into one bloq `b`
pub fn make_diamond_graph() -> (BloqRef, impl Fn(&BloqRef) -> Option<BloqRef> + Send + Sync) {
    let c = CallGraphShim::new("c").into_ref();
    let b1 = CallGraphShim::new("b1").calls(c.clone(), 1).into_ref();
    let b2 = CallGraphShim::new("b2").calls(c.clone(), 1).into_ref();
    let a = CallGraphShim::new("a").calls(b1, 1).calls(b2, 1).into_ref();

    let combine_bs = move |bloq: &BloqRef| -> Option<BloqRef> {
        match bloq.downcast_ref::<CallGraphShim>() {
            Some(shim) if shim.name().starts_with('b') => {
                Some(CallGraphShim::new("b").calls(c.clone(), 1).into_ref())
            }
            _ => Some(bloq.clone()),
        }
    };
    (a, combine_bs)
}

/// `x -> {a1, a2} -> b -> c`, plus a rule merging the `a`s into one bloq `a`
pub fn make_funnel_graph() -> (BloqRef, impl Fn(&BloqRef) -> Option<BloqRef> + Send + Sync) {
    let c = CallGraphShim::new("c").into_ref();
    let b = CallGraphShim::new("b").calls(c, 1).into_ref();
    let a1 = CallGraphShim::new("a1").calls(b.clone(), 1).into_ref();
    let a2 = CallGraphShim::new("a2").calls(b.clone(), 1).into_ref();
    let x = CallGraphShim::new("x").calls(a1, 1).calls(a2, 1).into_ref();

    let combine_as = move |bloq: &BloqRef| -> Option<BloqRef> {
        match bloq.downcast_ref::<CallGraphShim>() {
            Some(shim) if shim.name().starts_with('a') => {
                Some(CallGraphShim::new("a").calls(b.clone(), 1).into_ref())
            }
            _ => Some(bloq.clone()),
        }
    };
    (x, combine_as)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_costing_bloq_static_costs() {
        let tof = CostingBloq::new("Tof", 3)
            .with_static_cost(CostKey::clifford(), CostValue::Add(Expr::from(7)));
        assert_eq!(
            tof.static_cost(&CostKey::MaxQubits),
            Some(CostValue::Max(Some(Expr::from(3))))
        );
        assert_eq!(
            tof.static_cost(&CostKey::clifford()),
            Some(CostValue::Add(Expr::from(7)))
        );
        assert_eq!(tof.my_leaf_costs(), None);
        assert_eq!(tof.label(), "Tof");
    }

    #[test]
    fn test_decomp_bloq_counts_instances() {
        let callees = DecompBloq::new(3)
            .build_call_graph(&mut SymbolAllocator::new())
            .unwrap();
        assert_eq!(callees.len(), 5);
        assert_eq!(callees[0].0, BloqRef::new(Split::new(3)));
        assert_eq!(callees[2].0.to_string(), "SubBloq(1/12)");
    }

    #[test]
    fn test_recursive_base_case() {
        let mut ssa = SymbolAllocator::new();
        assert!(Recursive::new(0).build_call_graph(&mut ssa).is_err());
        let callees = Recursive::new(2).build_call_graph(&mut ssa).unwrap();
        assert_eq!(callees[0].0, BloqRef::new(Recursive::new(1)));
    }

    #[test]
    fn test_diamond_generalizer_merges_bs() {
        let (a, combine_bs) = make_diamond_graph();
        let callees = a.build_call_graph(&mut SymbolAllocator::new()).unwrap();
        let merged: Vec<_> = callees.iter().filter_map(|(b, _)| combine_bs(b)).collect();
        assert_eq!(merged[0], merged[1]);
        assert_eq!(merged[0].to_string(), "b");
        assert_eq!(combine_bs(&a), Some(a.clone()));
    }
}
