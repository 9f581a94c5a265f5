//! Bookkeeping bloqs that rewire or allocate qubits without doing any work

use crate::standard::atomic;
use bloqcount_core::{
    Bloq, BloqRef, Expr, GateFamily, QDType, Register, Result, Side, Signature, SymbolAllocator,
};

fn whole(n: &Expr, side: Side) -> Register {
    Register::new("reg", QDType::QAny(n.clone())).with_side(side)
}

fn bits(n: &Expr, side: Side) -> Register {
    Register::new("reg", QDType::QBit)
        .with_shape([n.clone()])
        .with_side(side)
}

macro_rules! bookkeeping_bloq {
    (
        $(#[$doc:meta])*
        $name:ident, $family:expr, adjoint = $adjoint:ident,
        signature = |$n:ident| $sig:expr
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            n: Expr,
        }

        impl $name {
            pub fn new(n: impl Into<Expr>) -> Self {
                Self { n: n.into() }
            }

            /// Number of qubits handled
            #[inline]
            pub fn n(&self) -> &Expr {
                &self.n
            }
        }

        impl Bloq for $name {
            fn label(&self) -> String {
                format!("{}({})", stringify!($name), self.n)
            }

            fn signature(&self) -> Signature {
                let $n = &self.n;
                $sig
            }

            fn build_call_graph(
                &self,
                _ssa: &mut SymbolAllocator,
            ) -> Result<Vec<(BloqRef, Expr)>> {
                Err(atomic(self))
            }

            fn family(&self) -> GateFamily {
                $family
            }

            fn specialized_adjoint(&self) -> Option<BloqRef> {
                Some(BloqRef::new($adjoint::new(self.n.clone())))
            }
        }
    };
}

bookkeeping_bloq!(
    /// Split an `n`-qubit register into `n` single qubits
    Split,
    GateFamily::SplitJoin,
    adjoint = Join,
    signature = |n| Signature::new(vec![whole(n, Side::Left), bits(n, Side::Right)])
);

bookkeeping_bloq!(
    /// Join `n` single qubits into one register
    Join,
    GateFamily::SplitJoin,
    adjoint = Split,
    signature = |n| Signature::new(vec![bits(n, Side::Left), whole(n, Side::Right)])
);

bookkeeping_bloq!(
    /// Allocate an `n`-qubit register in the zero state
    Allocate,
    GateFamily::AllocFree,
    adjoint = Free,
    signature = |n| Signature::new(vec![whole(n, Side::Right)])
);

bookkeeping_bloq!(
    /// Free an `n`-qubit register that is known to be in the zero state
    Free,
    GateFamily::AllocFree,
    adjoint = Allocate,
    signature = |n| Signature::new(vec![whole(n, Side::Left)])
);
