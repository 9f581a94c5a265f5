//! Gate and bloq library for bloqcount
//!
//! This crate provides the leaf vocabulary that call graphs bottom out in,
//! along with a few composite bloqs to count:
//!
//! - **Clifford + T gates**: [`TGate`], [`SGate`], [`Hadamard`], [`CNot`],
//!   [`ArbitraryClifford`]
//! - **Non-Clifford multi-qubit gates**: [`Toffoli`], [`CSwap`], [`And`]
//! - **Rotations**: [`Rz`], [`Rx`], [`Ry`] with concrete or symbolic angles
//! - **Bookkeeping**: [`Split`], [`Join`], [`Allocate`], [`Free`]
//! - **Interop**: [`ForeignGate`] for gates imported from other frameworks
//! - **Modular arithmetic**: [`ModExp`] and its callees
//!
//! # Example
//!
//! ```
//! use bloqcount_core::{BloqRef, Expr, SymbolAllocator};
//! use bloqcount_gates::{TGate, Toffoli};
//!
//! let tof = BloqRef::new(Toffoli);
//! let callees = tof.build_call_graph(&mut SymbolAllocator::new()).unwrap();
//! assert!(callees.contains(&(BloqRef::new(TGate::new()), Expr::from(4))));
//! ```
//!
//! The [`for_testing`] module holds synthetic bloqs whose call graphs and
//! costs are set through attributes.

pub mod bookkeeping;
pub mod for_testing;
pub mod foreign;
pub mod mod_arith;
pub mod standard;

// Re-export commonly used items
pub use bookkeeping::{Allocate, Free, Join, Split};
pub use foreign::ForeignGate;
pub use mod_arith::{CModAdd, CtrlModMul, ModExp};
pub use standard::*;
