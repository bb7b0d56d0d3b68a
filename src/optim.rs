//! Selection of the signals to lock

mod clique;
mod coverage;

pub use clique::{partition_cliques, partition_value};
pub use coverage::{corruption_cover, corruption_rate, select_max_coverage};
