//! Error reporting for the locking engine
//!
//! All errors are fatal: the engine either runs to completion or surfaces
//! one of these to the caller, which prints it and exits non-zero.

use thiserror::Error;

/// Errors surfaced by netlist handling, analysis and locking
#[derive(Debug, Error)]
pub enum LockError {
    /// A cell type the simulator cannot evaluate
    #[error("unsupported cell type {kind} driving signal {signal}")]
    UnsupportedCell {
        /// Cell type as written in the netlist
        kind: String,
        /// Name of the signal driven by the cell
        signal: String,
    },

    /// A structurally broken netlist (loop, missing driver, bad arity, ...)
    #[error("malformed netlist: {0}")]
    MalformedNetlist(String),

    /// A rejected combination of options
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A key string that does not describe the requested bit vector
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// An explicitly requested gate that cannot be locked
    #[error("cannot lock {0}: no combinational gate with this output in the module")]
    SelectionImpossible(String),

    /// File access failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, LockError>;
