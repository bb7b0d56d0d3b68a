//! Read and write netlists to files

mod bench;

use std::fs::File;
use std::path::Path;

pub use bench::read_bench;
pub use bench::write_bench;

use crate::errors::{LockError, Result};
use crate::network::Netlist;

/// Read a netlist from a file
///
/// Following extensions are supported: .bench
pub fn read_netlist_file(path: &Path) -> Result<Netlist> {
    match path.extension() {
        Some(s) if s == "bench" => read_bench(File::open(path)?),
        _ => Err(LockError::InvalidConfiguration(format!(
            "unknown netlist format for {}",
            path.display()
        ))),
    }
}

/// Write a netlist to a file
///
/// Following extensions are supported: .bench
pub fn write_netlist_file(path: &Path, netlist: &Netlist) -> Result<()> {
    match path.extension() {
        Some(s) if s == "bench" => {
            let mut f = File::create(path)?;
            write_bench(&mut f, netlist)
        }
        _ => Err(LockError::InvalidConfiguration(format!(
            "unknown netlist format for {}",
            path.display()
        ))),
    }
}
