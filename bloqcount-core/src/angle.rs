//! Rotation parameters that may be concrete or symbolic

use crate::symbolic::Expr;
use crate::symbol::Symbol;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Neg;

/// A rotation angle in radians
///
/// Concrete angles compare bit-for-bit so that bloqs carrying them can be
/// used as graph keys; `-0.0` and `0.0` are distinct, as are different NaNs.
/// Generalizers typically replace concrete angles with a shared symbol so
/// rotations differing only in their angle merge.
///
/// # Example
/// ```
/// use bloqcount_core::{Angle, Symbol};
///
/// let theta = Angle::new(0.25);
/// assert_eq!(theta.value(), Some(0.25));
/// assert!(!theta.is_symbolic());
///
/// let phi = Angle::symbolic(Symbol::new("phi"));
/// assert!(phi.is_symbolic());
/// assert_eq!(phi.to_string(), "phi");
/// ```
#[derive(Clone, Debug)]
pub enum Angle {
    /// A concrete value in radians
    Value(f64),
    /// A symbolic value
    Symbolic(Expr),
}

impl Angle {
    /// Create a concrete angle
    pub fn new(value: f64) -> Self {
        Self::Value(value)
    }

    /// Create an angle that is a bare symbol
    pub fn symbolic(symbol: Symbol) -> Self {
        Self::Symbolic(Expr::symbol(symbol))
    }

    /// The concrete value, if any
    #[inline]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Symbolic(e) => e.to_f64(),
        }
    }

    /// Whether the angle depends on free symbols
    pub fn is_symbolic(&self) -> bool {
        match self {
            Self::Value(_) => false,
            Self::Symbolic(e) => !e.is_constant(),
        }
    }
}

impl PartialEq for Angle {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a.to_bits() == b.to_bits(),
            (Self::Symbolic(a), Self::Symbolic(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Angle {}

impl Hash for Angle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Value(v) => {
                0u8.hash(state);
                v.to_bits().hash(state);
            }
            Self::Symbolic(e) => {
                1u8.hash(state);
                e.hash(state);
            }
        }
    }
}

impl From<f64> for Angle {
    fn from(value: f64) -> Self {
        Self::Value(value)
    }
}

impl From<Expr> for Angle {
    fn from(value: Expr) -> Self {
        Self::Symbolic(value)
    }
}

impl Neg for Angle {
    type Output = Angle;

    fn neg(self) -> Angle {
        match self {
            Self::Value(v) => Self::Value(-v),
            Self::Symbolic(e) => Self::Symbolic(-e),
        }
    }
}

impl Neg for &Angle {
    type Output = Angle;

    fn neg(self) -> Angle {
        -self.clone()
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{}", v),
            Self::Symbolic(e) => write!(f, "{}", e),
        }
    }
}
