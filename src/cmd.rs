//! Command line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use gatelock::io::{read_netlist_file, write_netlist_file};
use gatelock::lock::{self, LockOptions, Target};
use gatelock::network::stats::stats;
use gatelock::{Key, LockError, Result, Wire};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Lock a netlist with key gates
    ///
    /// Selects internal signals with the requested optimization target,
    /// inserts one key gate per selected signal and writes the locked
    /// netlist. The key is printed on success; without it the locked
    /// design computes a corrupted function.
    #[clap()]
    Lock(LockArgs),

    /// Show statistics about a netlist
    ///
    /// Will print statistics on the number of inputs, outputs and cells.
    #[clap()]
    Show(ShowArgs),
}

/// Command arguments for locking
#[derive(Args)]
pub struct LockArgs {
    /// Netlist to lock
    file: PathBuf,

    /// Output file for the locked netlist
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Optimization target
    #[arg(long, value_enum, default_value_t = Target::Pairwise)]
    target: Target,

    /// Key size as a percentage of the combinational cells
    #[arg(long, default_value_t = 5.0)]
    key_percent: f64,

    /// Key size in bits; overrides the percentage
    #[arg(long)]
    key_bits: Option<usize>,

    /// Number of test vectors for the analysis (at least 4)
    #[arg(long, default_value_t = 64)]
    nb_test_vectors: usize,

    /// Explicit key as little-endian hex; drawn from OS entropy if absent
    #[arg(long)]
    key: Option<String>,

    /// Analyze only: print a coverage-vs-locked-cells table, do not rewrite
    #[arg(long)]
    report: bool,

    /// Lock an explicitly named gate with an XOR key gate, skipping the
    /// optimizer; may be repeated
    #[arg(long)]
    lock_gate: Vec<String>,

    /// Mix two explicitly named gates with a MUX key gate, skipping the
    /// optimizer; may be repeated
    #[arg(long, num_args = 2, value_names = ["GATE1", "GATE2"], action = clap::ArgAction::Append)]
    mix_gate: Vec<String>,

    /// Seed for test-vector generation
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl LockArgs {
    pub fn run(&self) -> Result<()> {
        let opts = LockOptions {
            target: self.target,
            key_bits: self.key_bits,
            key_percent: self.key_percent,
            nb_test_vectors: self.nb_test_vectors,
            seed: self.seed,
        };
        opts.validate()?;
        let mut netlist = read_netlist_file(&self.file)?;

        let explicit = !self.lock_gate.is_empty() || !self.mix_gate.is_empty();
        if self.report {
            if explicit || self.key.is_some() {
                return Err(LockError::InvalidConfiguration(
                    "--report cannot be combined with --key, --lock-gate or --mix-gate".to_string(),
                ));
            }
            return lock::coverage_report(&netlist, &opts);
        }
        let output = self.output.as_ref().ok_or_else(|| {
            LockError::InvalidConfiguration(
                "an output file is required unless --report is set".to_string(),
            )
        })?;

        let (locked, pairs) = if explicit {
            let locked = lock::resolve_gates(&netlist, &self.lock_gate)?;
            let mixed = lock::resolve_gates(&netlist, &self.mix_gate)?;
            let pairs = mixed.chunks(2).map(|c| (c[0], c[1])).collect::<Vec<_>>();
            (locked, pairs)
        } else {
            (lock::select_locking_signals(&netlist, &opts)?, Vec::new())
        };

        let nb_bits = locked.len() + pairs.len();
        let key = match &self.key {
            Some(s) => Key::from_hex(s, nb_bits)?,
            None => Key::random(nb_bits),
        };
        let bits: Vec<bool> = key.bits().collect();
        let mut key_inputs: Vec<Wire> =
            lock::insert_key_gates(&mut netlist, &locked, &bits[..locked.len()], 0)?;
        key_inputs.extend(lock::insert_mix_gates(
            &mut netlist,
            &pairs,
            &bits[locked.len()..],
            locked.len(),
        )?);
        write_netlist_file(output, &netlist)?;
        println!("Locked {} signals with key {}", key_inputs.len(), key);
        Ok(())
    }
}

/// Command arguments for netlist informations
#[derive(Args)]
pub struct ShowArgs {
    /// Netlist to show
    file: PathBuf,
}

impl ShowArgs {
    pub fn run(&self) -> Result<()> {
        let netlist = read_netlist_file(&self.file)?;
        println!("Netlist stats:\n{}", stats(&netlist));
        Ok(())
    }
}
