//! Cost keys and the values they combine

use crate::{BloqError, BloqRef, Expr, Result};
use std::fmt;
use std::sync::Arc;

/// How values of one cost kind compose along call-graph edges
///
/// Every rule defines `acc += callee * n`: for additive costs that is sum
/// and scaling, for maximum costs it is max and identity, and for
/// multiplicative costs it is product and power.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CombineRule {
    Add,
    Max,
    Mul,
}

impl CombineRule {
    pub fn name(self) -> &'static str {
        match self {
            CombineRule::Add => "additive",
            CombineRule::Max => "maximum",
            CombineRule::Mul => "multiplicative",
        }
    }

    /// The value that leaves any other value unchanged when combined
    pub fn identity(self) -> CostValue {
        match self {
            CombineRule::Add => CostValue::Add(Expr::zero()),
            CombineRule::Max => CostValue::Max(None),
            CombineRule::Mul => CostValue::Mul(Expr::one()),
        }
    }
}

/// A quantity that a cost key measures
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CostValue {
    /// Counts and other summed quantities
    Add(Expr),
    /// A maximum; `None` is the empty maximum
    Max(Option<Expr>),
    /// Probabilities and other multiplied quantities
    Mul(Expr),
}

impl CostValue {
    pub fn rule(&self) -> CombineRule {
        match self {
            CostValue::Add(_) => CombineRule::Add,
            CostValue::Max(_) => CombineRule::Max,
            CostValue::Mul(_) => CombineRule::Mul,
        }
    }

    /// The underlying expression; `None` for the empty maximum
    pub fn expr(&self) -> Option<&Expr> {
        match self {
            CostValue::Add(e) | CostValue::Mul(e) => Some(e),
            CostValue::Max(e) => e.as_ref(),
        }
    }

    /// The value of calling the measured thing `n` times in sequence
    pub fn repeat(&self, n: &Expr) -> CostValue {
        match self {
            CostValue::Add(v) => CostValue::Add(v * n),
            CostValue::Max(v) => CostValue::Max(v.clone()),
            CostValue::Mul(v) => CostValue::Mul(v.pow(n)),
        }
    }

    /// Combine two values of the same rule; `None` if the rules differ
    pub fn combine(&self, other: &CostValue) -> Option<CostValue> {
        match (self, other) {
            (CostValue::Add(a), CostValue::Add(b)) => Some(CostValue::Add(a + b)),
            (CostValue::Max(a), CostValue::Max(b)) => Some(CostValue::Max(match (a, b) {
                (Some(a), Some(b)) => Some(a.maximum(b)),
                (Some(v), None) | (None, Some(v)) => Some(v.clone()),
                (None, None) => None,
            })),
            (CostValue::Mul(a), CostValue::Mul(b)) => Some(CostValue::Mul(a * b)),
            _ => None,
        }
    }
}

impl fmt::Display for CostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expr() {
            Some(e) => write!(f, "{}", e),
            None => write!(f, "-inf"),
        }
    }
}

/// Identifies one kind of resource cost
///
/// # Example
/// ```
/// use bloqcount_core::{CostKey, CostValue, Expr};
///
/// let key = CostKey::clifford();
/// let acc = key.identity_val();
/// let total = key.accumulate(&acc, &CostValue::Add(Expr::from(7)), &Expr::from(2)).unwrap();
/// assert_eq!(total, CostValue::Add(Expr::from(14)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CostKey {
    /// Number of calls of one specific bloq
    BloqCount(BloqRef),
    /// A user-named cost with its own combination rule
    Named { name: Arc<str>, rule: CombineRule },
    /// Peak number of qubits in use
    MaxQubits,
    /// Probability that every call succeeds
    SuccessProb,
}

impl CostKey {
    pub fn bloq_count(bloq: BloqRef) -> Self {
        CostKey::BloqCount(bloq)
    }

    /// An additive named count
    pub fn count(name: &str) -> Self {
        CostKey::Named {
            name: Arc::from(name),
            rule: CombineRule::Add,
        }
    }

    pub fn named(name: &str, rule: CombineRule) -> Self {
        CostKey::Named {
            name: Arc::from(name),
            rule,
        }
    }

    /// The number of Clifford operations
    pub fn clifford() -> Self {
        Self::count("clifford")
    }

    pub fn rule(&self) -> CombineRule {
        match self {
            CostKey::BloqCount(_) => CombineRule::Add,
            CostKey::Named { rule, .. } => *rule,
            CostKey::MaxQubits => CombineRule::Max,
            CostKey::SuccessProb => CombineRule::Mul,
        }
    }

    pub fn identity_val(&self) -> CostValue {
        self.rule().identity()
    }

    /// Reject values that do not follow this key's rule
    ///
    /// # Errors
    /// Returns [`BloqError::CostKindMismatch`] if the rules differ.
    pub fn validate(&self, value: &CostValue) -> Result<()> {
        if value.rule() == self.rule() {
            Ok(())
        } else {
            Err(BloqError::CostKindMismatch {
                key: self.to_string(),
                expected: self.rule().name(),
                actual: value.rule().name(),
            })
        }
    }

    /// Compute `acc += value * n` under this key's rule
    ///
    /// # Errors
    /// Returns [`BloqError::CostKindMismatch`] if either value has the
    /// wrong rule.
    pub fn accumulate(&self, acc: &CostValue, value: &CostValue, n: &Expr) -> Result<CostValue> {
        self.validate(acc)?;
        self.validate(value)?;
        acc.combine(&value.repeat(n))
            .ok_or_else(|| BloqError::CostKindMismatch {
                key: self.to_string(),
                expected: self.rule().name(),
                actual: value.rule().name(),
            })
    }
}

impl fmt::Display for CostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostKey::BloqCount(bloq) => write!(f, "{} count", bloq),
            CostKey::Named { name, .. } => write!(f, "{} count", name),
            CostKey::MaxQubits => write!(f, "max qubits"),
            CostKey::SuccessProb => write!(f, "success prob"),
        }
    }
}
