//! Logic locking for combinational netlists
//!
//! Logic locking hides the function of a netlist behind fresh key inputs:
//! only the correct key value reproduces the original behavior. This crate
//! analyzes a gate-level design with a bit-parallel AIG simulator, scores
//! internal signals by pairwise security and output corruption, selects a
//! bounded set of them and rewrites the netlist with XOR/XNOR or MUX key
//! gates.

#![warn(missing_docs)]

pub mod aig;
pub mod analysis;
pub mod errors;
pub mod io;
pub mod key;
pub mod lock;
pub mod network;
pub mod optim;
pub mod sim;

pub use errors::{LockError, Result};
pub use key::Key;
pub use network::{Cell, CellKind, Netlist, Wire};
