//! Modular arithmetic bloqs used by the modular exponentiation example
//!
//! Only the call graphs are modeled. Counts follow the standard
//! controlled-multiplication construction of modular exponentiation.

use crate::standard::{CSwap, Toffoli};
use bloqcount_core::{
    Bloq, BloqRef, Expr, FieldValue, QDType, Register, Result, Signature, SymbolAllocator,
};

/// `x = base^exponent mod modulus` for a quantum exponent
///
/// An `n_exponent`-bit exponent costs `n_exponent` controlled modular
/// multiplications, each by a classical constant that is integrated out as a
/// fresh symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModExp {
    base: Expr,
    modulus: Expr,
    n_exponent: Expr,
    x_bitsize: Expr,
}

impl ModExp {
    pub fn new(
        base: impl Into<Expr>,
        modulus: impl Into<Expr>,
        n_exponent: impl Into<Expr>,
        x_bitsize: impl Into<Expr>,
    ) -> Self {
        Self {
            base: base.into(),
            modulus: modulus.into(),
            n_exponent: n_exponent.into(),
            x_bitsize: x_bitsize.into(),
        }
    }
}

impl Bloq for ModExp {
    fn label(&self) -> String {
        format!("ModExp({}^e mod {})", self.base, self.modulus)
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![
            Register::new("exponent", QDType::QUInt(self.n_exponent.clone())),
            Register::new("x", QDType::QUInt(self.x_bitsize.clone())),
        ])
    }

    fn build_call_graph(&self, ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        let k = Expr::symbol(ssa.new_symbol("k"));
        let mul = CtrlModMul::new(k, self.modulus.clone(), self.x_bitsize.clone());
        Ok(vec![(BloqRef::new(mul), self.n_exponent.clone())])
    }

    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("base", FieldValue::Expr(self.base.clone())),
            ("modulus", FieldValue::Expr(self.modulus.clone())),
            ("n_exponent", FieldValue::Expr(self.n_exponent.clone())),
        ]
    }
}

/// Controlled in-place multiplication by a classical constant `k`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CtrlModMul {
    k: Expr,
    modulus: Expr,
    bitsize: Expr,
}

impl CtrlModMul {
    pub fn new(k: impl Into<Expr>, modulus: impl Into<Expr>, bitsize: impl Into<Expr>) -> Self {
        Self {
            k: k.into(),
            modulus: modulus.into(),
            bitsize: bitsize.into(),
        }
    }
}

impl Bloq for CtrlModMul {
    fn label(&self) -> String {
        format!("CtrlModMul(*{})", self.k)
    }

    fn signature(&self) -> Signature {
        Signature::new(vec![
            Register::new("ctrl", QDType::QBit),
            Register::new("x", QDType::QUInt(self.bitsize.clone())),
        ])
    }

    // Multiply into an ancilla, swap it in, and uncompute with the inverse
    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        let add = CModAdd::new(self.modulus.clone(), self.bitsize.clone());
        Ok(vec![
            (BloqRef::new(add), &self.bitsize * 2),
            (BloqRef::new(CSwap), self.bitsize.clone()),
        ])
    }
}

/// Controlled modular addition of two `bitsize`-bit registers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CModAdd {
    modulus: Expr,
    bitsize: Expr,
}

impl CModAdd {
    pub fn new(modulus: impl Into<Expr>, bitsize: impl Into<Expr>) -> Self {
        Self {
            modulus: modulus.into(),
            bitsize: bitsize.into(),
        }
    }

    /// Toffoli count `ceil(16 n log2(n) - 23.8 n)`
    pub fn toffoli_count(&self) -> Expr {
        let n = &self.bitsize;
        let cost = n * 16 * n.log2() - n * Expr::rational(119, 5);
        cost.ceil()
    }
}

impl Bloq for CModAdd {
    fn signature(&self) -> Signature {
        Signature::new(vec![
            Register::new("ctrl", QDType::QBit),
            Register::new("x", QDType::QUInt(self.bitsize.clone())),
            Register::new("y", QDType::QUInt(self.bitsize.clone())),
        ])
    }

    fn build_call_graph(&self, _ssa: &mut SymbolAllocator) -> Result<Vec<(BloqRef, Expr)>> {
        Ok(vec![(BloqRef::new(Toffoli), self.toffoli_count())])
    }
}
