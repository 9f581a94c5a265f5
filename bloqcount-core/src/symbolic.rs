//! Exact symbolic arithmetic for resource counts
//!
//! Counts, multiplicities and register sizes can be concrete integers,
//! rationals, or expressions over free [`Symbol`]s. [`Expr`] keeps all of
//! them in one canonical form so the counting engine can be written once:
//!
//! - a sum of monomials with arbitrary-precision rational coefficients
//! - each monomial a product of atoms raised to positive integer powers
//! - atoms are symbols or opaque functions (`log2`, `ceil`, `max`, symbolic powers)
//!
//! Integer counts never pass through floating point, so `3 * 10**40` stays exact.
//!
//! # Example
//! ```
//! use bloqcount_core::{Expr, Symbol};
//!
//! let n = Expr::symbol(Symbol::new("n"));
//! let cost = &n * Expr::from(4) + Expr::from(2) * &n + Expr::from(1);
//! assert_eq!(cost.to_string(), "6*n + 1");
//! assert_eq!(cost.subs(&Symbol::new("n"), &Expr::from(10)).to_i64(), Some(61));
//! ```

use crate::symbol::Symbol;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub};

/// Largest integer exponent expanded by repeated multiplication of a
/// non-constant base. Larger exponents stay as a symbolic power.
const MAX_EXPANDED_POWER: u64 = 64;

/// An irreducible factor of a monomial
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Atom {
    /// A free variable
    Symbol(Symbol),
    /// Base-2 logarithm of a non-constant (or non power-of-two) argument
    Log2(Box<Expr>),
    /// Ceiling of a non-constant argument
    Ceil(Box<Expr>),
    /// Maximum of two or more arguments that could not be ordered
    Max(Vec<Expr>),
    /// `base ^ exponent` where the exponent is not a small integer constant
    Pow(Box<Expr>, Box<Expr>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Monomial(BTreeMap<Atom, u32>);

impl Monomial {
    fn single(atom: Atom) -> Self {
        let mut factors = BTreeMap::new();
        factors.insert(atom, 1);
        Self(factors)
    }

    fn is_constant(&self) -> bool {
        self.0.is_empty()
    }

    fn mul(&self, other: &Monomial) -> Monomial {
        let mut factors = self.0.clone();
        for (atom, power) in &other.0 {
            *factors.entry(atom.clone()).or_insert(0) += power;
        }
        Monomial(factors)
    }
}

/// Exact symbolic value: a rational number or an expression over symbols
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Expr {
    terms: BTreeMap<Monomial, BigRational>,
}

fn add_term(terms: &mut BTreeMap<Monomial, BigRational>, mono: Monomial, coeff: BigRational) {
    if coeff.is_zero() {
        return;
    }
    match terms.entry(mono) {
        Entry::Vacant(e) => {
            e.insert(coeff);
        }
        Entry::Occupied(mut e) => {
            *e.get_mut() += coeff;
            if e.get().is_zero() {
                e.remove();
            }
        }
    }
}

fn rational_pow(base: &BigRational, mut exp: u64) -> BigRational {
    let mut result = BigRational::one();
    let mut square = base.clone();
    while exp > 0 {
        if exp & 1 == 1 {
            result *= square.clone();
        }
        exp >>= 1;
        if exp > 0 {
            square = &square * &square;
        }
    }
    result
}

fn big_to_f64(value: &BigRational) -> Option<f64> {
    Some(value.numer().to_f64()? / value.denom().to_f64()?)
}

/// Exponent `k` such that `value == 2^k`, if any
fn exact_log2(value: &BigRational) -> Option<i64> {
    if !value.is_positive() {
        return None;
    }
    let power_of_two = |n: &BigInt| -> Option<i64> {
        let magnitude = n.magnitude();
        let bits = magnitude.bits();
        match magnitude.trailing_zeros() {
            Some(tz) if tz + 1 == bits => i64::try_from(tz).ok(),
            _ => None,
        }
    };
    if value.is_integer() {
        power_of_two(value.numer())
    } else if value.numer().is_one() {
        power_of_two(value.denom()).map(|k| -k)
    } else {
        None
    }
}

impl Expr {
    /// The additive identity
    pub fn zero() -> Self {
        Self {
            terms: BTreeMap::new(),
        }
    }

    /// The multiplicative identity
    pub fn one() -> Self {
        Self::constant(BigRational::one())
    }

    /// A rational constant
    pub fn constant(value: BigRational) -> Self {
        let mut terms = BTreeMap::new();
        add_term(&mut terms, Monomial::default(), value);
        Self { terms }
    }

    /// An integer constant
    pub fn int(value: i64) -> Self {
        Self::constant(BigRational::from_integer(BigInt::from(value)))
    }

    /// The rational constant `numer / denom`
    ///
    /// # Panics
    /// Panics if `denom` is zero.
    pub fn rational(numer: i64, denom: i64) -> Self {
        Self::constant(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    /// A free variable
    pub fn symbol(symbol: Symbol) -> Self {
        Self::atom(Atom::Symbol(symbol))
    }

    fn atom(atom: Atom) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(Monomial::single(atom), BigRational::one());
        Self { terms }
    }

    /// Whether this is exactly zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether this is exactly one
    pub fn is_one(&self) -> bool {
        self.as_rational().map_or(false, |r| r.is_one())
    }

    /// Whether the expression contains no free symbols or opaque functions
    pub fn is_constant(&self) -> bool {
        self.terms.keys().all(Monomial::is_constant)
    }

    /// The exact value, if the expression is constant
    pub fn as_rational(&self) -> Option<BigRational> {
        if !self.is_constant() {
            return None;
        }
        Some(
            self.terms
                .get(&Monomial::default())
                .cloned()
                .unwrap_or_else(BigRational::zero),
        )
    }

    /// The exact value, if the expression is an integer constant
    pub fn as_integer(&self) -> Option<BigInt> {
        self.as_rational()
            .filter(|r| r.is_integer())
            .map(|r| r.to_integer())
    }

    /// The value as an `i64`, if the expression is an integer constant that fits
    pub fn to_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|i| i.to_i64())
    }

    /// The value as an `f64`, if the expression is constant
    pub fn to_f64(&self) -> Option<f64> {
        self.as_rational().as_ref().and_then(big_to_f64)
    }

    /// The single atom this expression consists of, if any
    fn as_atom(&self) -> Option<&Atom> {
        if self.terms.len() != 1 {
            return None;
        }
        let (mono, coeff) = self.terms.iter().next()?;
        if !coeff.is_one() || mono.0.len() != 1 {
            return None;
        }
        let (atom, power) = mono.0.iter().next()?;
        (*power == 1).then_some(atom)
    }

    /// The symbol this expression consists of, if it is a bare symbol
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self.as_atom() {
            Some(Atom::Symbol(s)) => Some(s),
            _ => None,
        }
    }

    /// All free symbols, including those inside opaque functions
    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, out: &mut BTreeSet<Symbol>) {
        for mono in self.terms.keys() {
            for atom in mono.0.keys() {
                match atom {
                    Atom::Symbol(s) => {
                        out.insert(s.clone());
                    }
                    Atom::Log2(e) | Atom::Ceil(e) => e.collect_symbols(out),
                    Atom::Max(args) => args.iter().for_each(|a| a.collect_symbols(out)),
                    Atom::Pow(b, e) => {
                        b.collect_symbols(out);
                        e.collect_symbols(out);
                    }
                }
            }
        }
    }

    /// Raise to a power
    ///
    /// Integer bases with integer exponents are evaluated exactly, as are
    /// fractional bases with small integer exponents. Small non-negative
    /// integer exponents are expanded; anything else stays a symbolic power.
    pub fn pow(&self, exponent: &Expr) -> Expr {
        if exponent.is_zero() || self.is_one() {
            return Expr::one();
        }
        if exponent.is_one() {
            return self.clone();
        }
        if let Some(k) = exponent.as_integer() {
            if let Some(base) = self.as_rational() {
                // Fractional bases grow a digit per step; keep long products symbolic
                let exact = base.is_integer()
                    || k.magnitude().to_u64().map_or(false, |m| m <= MAX_EXPANDED_POWER);
                if let Some(k) = k.to_i64().filter(|_| exact) {
                    if k > 0 {
                        return Expr::constant(rational_pow(&base, k as u64));
                    }
                    if !base.is_zero() {
                        return Expr::constant(rational_pow(&base.recip(), k.unsigned_abs()));
                    }
                }
            } else if let Some(k) = k.to_u64().filter(|k| *k <= MAX_EXPANDED_POWER) {
                let mut result = Expr::one();
                let mut square = self.clone();
                let mut k = k;
                while k > 0 {
                    if k & 1 == 1 {
                        result = &result * &square;
                    }
                    k >>= 1;
                    if k > 0 {
                        square = &square * &square;
                    }
                }
                return result;
            }
        }
        Expr::atom(Atom::Pow(Box::new(self.clone()), Box::new(exponent.clone())))
    }

    /// Compare two expressions numerically, if their difference is constant
    pub fn try_cmp(&self, other: &Expr) -> Option<Ordering> {
        let diff = self - other;
        diff.as_rational().map(|d| d.cmp(&BigRational::zero()))
    }

    /// The larger of two expressions
    ///
    /// When the order cannot be decided the result is an opaque `max`
    /// with flattened, deduplicated arguments.
    pub fn maximum(&self, other: &Expr) -> Expr {
        if self == other {
            return self.clone();
        }
        if let Some(ord) = self.try_cmp(other) {
            return if ord == Ordering::Less {
                other.clone()
            } else {
                self.clone()
            };
        }

        let mut args = Vec::new();
        for e in [self, other] {
            match e.as_atom() {
                Some(Atom::Max(inner)) => args.extend(inner.iter().cloned()),
                _ => args.push(e.clone()),
            }
        }

        let mut best: Option<BigRational> = None;
        let mut rest = BTreeSet::new();
        for arg in args {
            match arg.as_rational() {
                Some(r) => {
                    best = Some(match best {
                        Some(b) if b >= r => b,
                        _ => r,
                    })
                }
                None => {
                    rest.insert(arg);
                }
            }
        }
        if let Some(c) = best {
            rest.insert(Expr::constant(c));
        }
        if rest.len() == 1 {
            return rest.into_iter().next().unwrap_or_else(Expr::zero);
        }
        Expr::atom(Atom::Max(rest.into_iter().collect()))
    }

    /// Base-2 logarithm; exact for powers of two
    pub fn log2(&self) -> Expr {
        if let Some(k) = self.as_rational().as_ref().and_then(exact_log2) {
            return Expr::int(k);
        }
        Expr::atom(Atom::Log2(Box::new(self.clone())))
    }

    /// Ceiling; exact for constants
    pub fn ceil(&self) -> Expr {
        match self.as_rational() {
            Some(r) => Expr::constant(r.ceil()),
            None => Expr::atom(Atom::Ceil(Box::new(self.clone()))),
        }
    }

    /// Replace every occurrence of `symbol` with `value`
    pub fn subs(&self, symbol: &Symbol, value: &Expr) -> Expr {
        let mut out = Expr::zero();
        for (mono, coeff) in &self.terms {
            let mut term = Expr::constant(coeff.clone());
            for (atom, power) in &mono.0 {
                let factor = atom.subs(symbol, value);
                term = &term * &factor.pow(&Expr::from(*power));
            }
            out += term;
        }
        out
    }

    /// Replace several symbols at once, in order
    pub fn subs_all<'a>(&self, bindings: impl IntoIterator<Item = (&'a Symbol, &'a Expr)>) -> Expr {
        bindings
            .into_iter()
            .fold(self.clone(), |acc, (s, v)| acc.subs(s, v))
    }

    /// Numerically evaluate with the given symbol values
    ///
    /// Returns `None` if any symbol is unbound.
    pub fn evaluate(&self, lookup: &dyn Fn(&Symbol) -> Option<f64>) -> Option<f64> {
        let mut total = 0.0;
        for (mono, coeff) in &self.terms {
            let mut term = big_to_f64(coeff)?;
            for (atom, power) in &mono.0 {
                term *= atom.evaluate(lookup)?.powi(i32::try_from(*power).ok()?);
            }
            total += term;
        }
        Some(total)
    }
}

impl Atom {
    fn subs(&self, symbol: &Symbol, value: &Expr) -> Expr {
        match self {
            Atom::Symbol(s) if s == symbol => value.clone(),
            Atom::Symbol(s) => Expr::symbol(s.clone()),
            Atom::Log2(e) => e.subs(symbol, value).log2(),
            Atom::Ceil(e) => e.subs(symbol, value).ceil(),
            Atom::Max(args) => args
                .iter()
                .map(|a| a.subs(symbol, value))
                .reduce(|a, b| a.maximum(&b))
                .unwrap_or_else(Expr::zero),
            Atom::Pow(b, e) => b.subs(symbol, value).pow(&e.subs(symbol, value)),
        }
    }

    fn evaluate(&self, lookup: &dyn Fn(&Symbol) -> Option<f64>) -> Option<f64> {
        match self {
            Atom::Symbol(s) => lookup(s),
            Atom::Log2(e) => Some(e.evaluate(lookup)?.log2()),
            Atom::Ceil(e) => Some(e.evaluate(lookup)?.ceil()),
            Atom::Max(args) => args
                .iter()
                .map(|a| a.evaluate(lookup))
                .try_fold(f64::NEG_INFINITY, |acc, v| Some(acc.max(v?))),
            Atom::Pow(b, e) => Some(b.evaluate(lookup)?.powf(e.evaluate(lookup)?)),
        }
    }
}

fn add_exprs(a: &Expr, b: &Expr) -> Expr {
    let mut terms = a.terms.clone();
    for (mono, coeff) in &b.terms {
        add_term(&mut terms, mono.clone(), coeff.clone());
    }
    Expr { terms }
}

fn sub_exprs(a: &Expr, b: &Expr) -> Expr {
    let mut terms = a.terms.clone();
    for (mono, coeff) in &b.terms {
        add_term(&mut terms, mono.clone(), -coeff.clone());
    }
    Expr { terms }
}

fn mul_exprs(a: &Expr, b: &Expr) -> Expr {
    let mut terms = BTreeMap::new();
    for (ma, ca) in &a.terms {
        for (mb, cb) in &b.terms {
            add_term(&mut terms, ma.mul(mb), ca * cb);
        }
    }
    Expr { terms }
}

macro_rules! impl_expr_binop {
    ($Trait:ident, $method:ident, $func:ident) => {
        impl $Trait<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $func(self, rhs)
            }
        }

        impl $Trait<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $func(&self, &rhs)
            }
        }

        impl $Trait<&Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $func(&self, rhs)
            }
        }

        impl $Trait<Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $func(self, &rhs)
            }
        }

        impl $Trait<i64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: i64) -> Expr {
                $func(&self, &Expr::int(rhs))
            }
        }

        impl $Trait<i64> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: i64) -> Expr {
                $func(self, &Expr::int(rhs))
            }
        }
    };
}

impl_expr_binop!(Add, add, add_exprs);
impl_expr_binop!(Sub, sub, sub_exprs);
impl_expr_binop!(Mul, mul, mul_exprs);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        sub_exprs(&Expr::zero(), &self)
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        sub_exprs(&Expr::zero(), self)
    }
}

impl AddAssign<Expr> for Expr {
    fn add_assign(&mut self, rhs: Expr) {
        for (mono, coeff) in rhs.terms {
            add_term(&mut self.terms, mono, coeff);
        }
    }
}

impl AddAssign<&Expr> for Expr {
    fn add_assign(&mut self, rhs: &Expr) {
        for (mono, coeff) in &rhs.terms {
            add_term(&mut self.terms, mono.clone(), coeff.clone());
        }
    }
}

impl MulAssign<&Expr> for Expr {
    fn mul_assign(&mut self, rhs: &Expr) {
        *self = mul_exprs(self, rhs);
    }
}

impl MulAssign<Expr> for Expr {
    fn mul_assign(&mut self, rhs: Expr) {
        *self = mul_exprs(self, &rhs);
    }
}

impl Sum for Expr {
    fn sum<I: Iterator<Item = Expr>>(iter: I) -> Expr {
        iter.fold(Expr::zero(), |mut acc, e| {
            acc += e;
            acc
        })
    }
}

impl<'a> Sum<&'a Expr> for Expr {
    fn sum<I: Iterator<Item = &'a Expr>>(iter: I) -> Expr {
        iter.fold(Expr::zero(), |mut acc, e| {
            acc += e;
            acc
        })
    }
}

impl Product for Expr {
    fn product<I: Iterator<Item = Expr>>(iter: I) -> Expr {
        iter.fold(Expr::one(), |acc, e| &acc * &e)
    }
}

impl Default for Expr {
    fn default() -> Self {
        Self::zero()
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Expr {
                fn from(value: $t) -> Self {
                    Expr::constant(BigRational::from_integer(BigInt::from(value)))
                }
            }
        )*
    };
}

impl_from_int!(i32, i64, u32, u64, usize);

impl From<BigInt> for Expr {
    fn from(value: BigInt) -> Self {
        Expr::constant(BigRational::from_integer(value))
    }
}

impl From<BigRational> for Expr {
    fn from(value: BigRational) -> Self {
        Expr::constant(value)
    }
}

impl From<Symbol> for Expr {
    fn from(symbol: Symbol) -> Self {
        Expr::symbol(symbol)
    }
}

impl From<&Symbol> for Expr {
    fn from(symbol: &Symbol) -> Self {
        Expr::symbol(symbol.clone())
    }
}

/// Write `e` so it can be used as a factor of a product or power
fn fmt_factor(e: &Expr, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let simple = e.as_atom().map_or(false, |a| !matches!(a, Atom::Pow(..)))
        || e.as_rational()
            .map_or(false, |r| r.is_integer() && !r.is_negative());
    if simple {
        write!(f, "{}", e)
    } else {
        write!(f, "({})", e)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Symbol(s) => write!(f, "{}", s),
            Atom::Log2(e) => write!(f, "log2({})", e),
            Atom::Ceil(e) => write!(f, "ceil({})", e),
            Atom::Max(args) => {
                write!(f, "max(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            Atom::Pow(b, e) => {
                fmt_factor(b, f)?;
                write!(f, "^")?;
                fmt_factor(e, f)
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }

        // Symbolic terms first, the constant term last
        let ordered = self
            .terms
            .iter()
            .filter(|(m, _)| !m.is_constant())
            .chain(self.terms.iter().filter(|(m, _)| m.is_constant()));

        for (i, (mono, coeff)) in ordered.enumerate() {
            let negative = coeff.is_negative();
            let magnitude = coeff.abs();
            match (i, negative) {
                (0, true) => write!(f, "-")?,
                (0, false) => {}
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }

            if mono.is_constant() {
                write!(f, "{}", magnitude)?;
                continue;
            }

            if !magnitude.is_one() {
                if magnitude.is_integer() {
                    write!(f, "{}*", magnitude)?;
                } else {
                    write!(f, "({})*", magnitude)?;
                }
            }
            for (j, (atom, power)) in mono.0.iter().enumerate() {
                if j > 0 {
                    write!(f, "*")?;
                }
                if *power == 1 {
                    write!(f, "{}", atom)?;
                } else if matches!(atom, Atom::Pow(..)) {
                    write!(f, "({})^{}", atom, power)?;
                } else {
                    write!(f, "{}^{}", atom, power)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({})", self)
    }
}
