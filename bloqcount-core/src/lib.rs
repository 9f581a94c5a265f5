//! Core types and traits for bloqcount
//!
//! This crate provides the abstractions that resource counting is built on:
//! - [`Bloq`]: Trait for a quantum operation that may describe its callees
//! - [`BloqRef`]: Shared handle comparing bloqs by value
//! - [`Signature`]: The named, typed, directional ports of a bloq
//! - [`Expr`]: Exact symbolic arithmetic for counts and sizes
//! - [`SymbolAllocator`]: Fresh symbols for one counting run
//! - [`CostKey`] / [`CostValue`]: What is counted and how it combines
//!
//! # Example
//! ```
//! use bloqcount_core::{Bloq, BloqRef, Expr, Result, Signature, SymbolAllocator};
//!
//! #[derive(Debug, Clone, PartialEq, Eq, Hash)]
//! struct Rotations {
//!     n: Expr,
//! }
//!
//! impl Bloq for Rotations {
//!     fn signature(&self) -> Signature {
//!         Signature::build([("x", self.n.clone())])
//!     }
//! }
//!
//! let mut ssa = SymbolAllocator::new();
//! let n = Expr::symbol(ssa.new_symbol("n"));
//! let bloq = BloqRef::new(Rotations { n: n.clone() });
//! assert_eq!(bloq.signature().n_qubits(), n);
//! ```

pub mod angle;
pub mod bloq;
pub mod composite;
pub mod cost;
pub mod error;
pub mod registers;
pub mod symbol;
pub mod symbolic;
pub mod wrappers;

// Re-exports for convenience
pub use angle::Angle;
pub use bloq::{Bloq, BloqKind, BloqRef, DynBloq, FieldValue, GateFamily};
pub use composite::CompositeBloq;
pub use cost::{CombineRule, CostKey, CostValue};
pub use error::BloqError;
pub use registers::{QDType, Register, Side, Signature};
pub use symbol::{Symbol, SymbolAllocator};
pub use symbolic::{Atom, Expr};
pub use wrappers::{Adjoint, Controlled};

/// Type alias for results in bloqcount
pub type Result<T> = std::result::Result<T, BloqError>;
