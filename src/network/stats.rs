//! Compute cell statistics
//!
//! ```
//! use gatelock::network::stats::stats;
//! # let netlist = gatelock::Netlist::new();
//! let stats = stats(&netlist);
//!
//! // Check that there is no Xor cell
//! assert_eq!(stats.nb_xor, 0);
//!
//! // Show the statistics
//! println!("{}", stats);
//! ```

use std::fmt;

use crate::network::{CellKind, Netlist};

/// Number of inputs, outputs and cells of each kind in a netlist
#[derive(Clone, Debug, Default)]
pub struct NetlistStats {
    /// Number of module inputs
    pub nb_inputs: usize,
    /// Number of module outputs
    pub nb_outputs: usize,
    /// Number of And/Nand cells
    pub nb_and: usize,
    /// Number of Or/Nor cells
    pub nb_or: usize,
    /// Number of Xor/Xnor cells
    pub nb_xor: usize,
    /// Number of Mux cells
    pub nb_mux: usize,
    /// Number of Buf cells
    pub nb_buf: usize,
    /// Number of Not cells
    pub nb_not: usize,
    /// Number of Dff cells
    pub nb_dff: usize,
}

impl NetlistStats {
    /// Total number of cells, including Dff
    pub fn nb_cells(&self) -> usize {
        self.nb_and + self.nb_or + self.nb_xor + self.nb_mux + self.nb_buf + self.nb_not + self.nb_dff
    }

    /// Number of combinational cells, the base of the key-percent budget
    pub fn nb_comb_cells(&self) -> usize {
        self.nb_cells() - self.nb_dff
    }
}

impl fmt::Display for NetlistStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Inputs: {}", self.nb_inputs)?;
        writeln!(f, "  Outputs: {}", self.nb_outputs)?;
        writeln!(f, "  Cells: {}", self.nb_cells())?;
        if self.nb_dff != 0 {
            writeln!(f, "  Dff: {}", self.nb_dff)?;
        }
        if self.nb_and != 0 {
            writeln!(f, "  And: {}", self.nb_and)?;
        }
        if self.nb_or != 0 {
            writeln!(f, "  Or: {}", self.nb_or)?;
        }
        if self.nb_xor != 0 {
            writeln!(f, "  Xor: {}", self.nb_xor)?;
        }
        if self.nb_mux != 0 {
            writeln!(f, "  Mux: {}", self.nb_mux)?;
        }
        if self.nb_not != 0 {
            writeln!(f, "  Not: {}", self.nb_not)?;
        }
        if self.nb_buf != 0 {
            writeln!(f, "  Buf: {}", self.nb_buf)?;
        }
        fmt::Result::Ok(())
    }
}

/// Compute the statistics of a netlist
pub fn stats(n: &Netlist) -> NetlistStats {
    use CellKind::*;
    let mut ret = NetlistStats {
        nb_inputs: n.nb_inputs(),
        nb_outputs: n.nb_outputs(),
        ..NetlistStats::default()
    };
    for i in 0..n.nb_cells() {
        match n.cell(i).kind {
            And | Nand => ret.nb_and += 1,
            Or | Nor => ret.nb_or += 1,
            Xor | Xnor => ret.nb_xor += 1,
            Mux => ret.nb_mux += 1,
            Buf => ret.nb_buf += 1,
            Not => ret.nb_not += 1,
            Dff => ret.nb_dff += 1,
        }
    }
    ret
}
