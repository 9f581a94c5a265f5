//! Named, typed, directional data ports of a bloq

use crate::symbolic::Expr;
use crate::{BloqError, Result};
use smallvec::SmallVec;
use std::fmt;

/// Which side of a bloq a register appears on
///
/// `Thru` registers are both consumed and produced. `Left`-only registers
/// are consumed (e.g. freed) and `Right`-only registers are produced
/// (e.g. allocated).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Thru,
}

impl Side {
    /// The side this register ends up on in the adjoint bloq
    pub fn adjoint(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Thru => Side::Thru,
        }
    }

    /// Whether the register is an input
    #[inline]
    pub fn is_left(self) -> bool {
        matches!(self, Side::Left | Side::Thru)
    }

    /// Whether the register is an output
    #[inline]
    pub fn is_right(self) -> bool {
        matches!(self, Side::Right | Side::Thru)
    }
}

/// Quantum data type carried by a register
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QDType {
    /// A single qubit
    QBit,
    /// An opaque bag of qubits
    QAny(Expr),
    /// An unsigned integer
    QUInt(Expr),
    /// A two's complement signed integer
    QInt(Expr),
}

impl QDType {
    /// Number of qubits in one value of this type
    pub fn bitsize(&self) -> Expr {
        match self {
            QDType::QBit => Expr::one(),
            QDType::QAny(n) | QDType::QUInt(n) | QDType::QInt(n) => n.clone(),
        }
    }
}

impl fmt::Display for QDType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QDType::QBit => write!(f, "QBit()"),
            QDType::QAny(n) => write!(f, "QAny({})", n),
            QDType::QUInt(n) => write!(f, "QUInt({})", n),
            QDType::QInt(n) => write!(f, "QInt({})", n),
        }
    }
}

/// A named port of a bloq
///
/// # Example
/// ```
/// use bloqcount_core::{Expr, QDType, Register, Side};
///
/// let reg = Register::new("x", QDType::QUInt(Expr::from(8)))
///     .with_shape([Expr::from(2)])
///     .with_side(Side::Right);
/// assert_eq!(reg.total_bits(), Expr::from(16));
/// assert!(!reg.side().is_left());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Register {
    name: String,
    dtype: QDType,
    shape: SmallVec<[Expr; 2]>,
    side: Side,
}

impl Register {
    /// Create a scalar `Thru` register
    pub fn new(name: impl Into<String>, dtype: QDType) -> Self {
        Self {
            name: name.into(),
            dtype,
            shape: SmallVec::new(),
            side: Side::Thru,
        }
    }

    /// Set the side of the register
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Make this an array register of the given shape
    pub fn with_shape(mut self, shape: impl IntoIterator<Item = Expr>) -> Self {
        self.shape = shape.into_iter().collect();
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn dtype(&self) -> &QDType {
        &self.dtype
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn shape(&self) -> &[Expr] {
        &self.shape
    }

    /// Qubits per element
    pub fn bitsize(&self) -> Expr {
        self.dtype.bitsize()
    }

    /// Qubits across all elements of the register
    pub fn total_bits(&self) -> Expr {
        self.shape
            .iter()
            .fold(self.bitsize(), |acc, dim| &acc * dim)
    }

    /// The same register with its side flipped
    pub fn adjoint(&self) -> Self {
        Self {
            side: self.side.adjoint(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.dtype)?;
        if !self.shape.is_empty() {
            write!(f, "[")?;
            for (i, dim) in self.shape.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", dim)?;
            }
            write!(f, "]")?;
        }
        match self.side {
            Side::Thru => Ok(()),
            Side::Left => write!(f, " (left)"),
            Side::Right => write!(f, " (right)"),
        }
    }
}

/// Ordered list of the registers a bloq exposes
///
/// # Example
/// ```
/// use bloqcount_core::{Expr, Signature};
///
/// let sig = Signature::build([("ctrl", 1), ("x", 8)]);
/// assert_eq!(sig.len(), 2);
/// assert_eq!(sig.n_qubits(), Expr::from(9));
/// assert!(sig.get("y").is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature(Vec<Register>);

impl Signature {
    /// Create a signature from registers
    pub fn new(registers: Vec<Register>) -> Self {
        Self(registers)
    }

    /// A signature with no registers
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build `Thru` registers from `(name, bitsize)` pairs
    ///
    /// Registers of bitsize one are single qubits.
    pub fn build<S, E>(regs: impl IntoIterator<Item = (S, E)>) -> Self
    where
        S: Into<String>,
        E: Into<Expr>,
    {
        Self(
            regs.into_iter()
                .map(|(name, bitsize)| {
                    let bitsize = bitsize.into();
                    let dtype = if bitsize.is_one() {
                        QDType::QBit
                    } else {
                        QDType::QAny(bitsize)
                    };
                    Register::new(name, dtype)
                })
                .collect(),
        )
    }

    #[inline]
    pub fn registers(&self) -> &[Register] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Registers that are inputs
    pub fn lefts(&self) -> impl Iterator<Item = &Register> {
        self.0.iter().filter(|r| r.side().is_left())
    }

    /// Registers that are outputs
    pub fn rights(&self) -> impl Iterator<Item = &Register> {
        self.0.iter().filter(|r| r.side().is_right())
    }

    /// Look up a register by name
    ///
    /// # Errors
    /// Returns [`BloqError::UnknownRegister`] if no register has that name.
    pub fn get(&self, name: &str) -> Result<&Register> {
        self.0
            .iter()
            .find(|r| r.name() == name)
            .ok_or_else(|| BloqError::UnknownRegister(name.to_string()))
    }

    /// Width of the bloq: the larger of its total input and output bits
    pub fn n_qubits(&self) -> Expr {
        let left: Expr = self.lefts().map(Register::total_bits).sum();
        let right: Expr = self.rights().map(Register::total_bits).sum();
        left.maximum(&right)
    }

    /// The signature of the adjoint bloq
    pub fn adjoint(&self) -> Self {
        Self(self.0.iter().map(Register::adjoint).collect())
    }

    /// This signature with `register` inserted first
    pub fn with_leading(&self, register: Register) -> Self {
        let mut regs = Vec::with_capacity(self.0.len() + 1);
        regs.push(register);
        regs.extend(self.0.iter().cloned());
        Self(regs)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(")?;
        for (i, reg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", reg)?;
        }
        write!(f, ")")
    }
}
