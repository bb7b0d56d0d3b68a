//! Locking engine: candidate selection, analysis dispatch and key gate insertion

use clap::ValueEnum;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::aig::Aig;
use crate::analysis::Analyzer;
use crate::errors::{LockError, Result};
use crate::network::{CellKind, Netlist, Wire};
use crate::optim::{corruption_cover, partition_cliques, partition_value, select_max_coverage};
use crate::sim::TestBatch;

/// Graphs up to this size get the exhaustive clique search
const EXACT_CLIQUE_LIMIT: usize = 20;

/// Objective driving the signal selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// Maximize satisfied pairwise-security constraints
    Pairwise,
    /// Maximize output corruption coverage
    Corruption,
    /// Lock the best pairwise clique, then fill up on corruption
    Hybrid,
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct LockOptions {
    /// Optimization target
    pub target: Target,
    /// Budget in key bits; overrides the percentage when set
    pub key_bits: Option<usize>,
    /// Budget as a percentage of the combinational cells
    pub key_percent: f64,
    /// Number of test vectors, rounded up to whole 64-vector batches
    pub nb_test_vectors: usize,
    /// Seed of the test-vector generator
    pub seed: u64,
}

impl Default for LockOptions {
    fn default() -> Self {
        LockOptions {
            target: Target::Pairwise,
            key_bits: None,
            key_percent: 5.0,
            nb_test_vectors: 64,
            seed: 1,
        }
    }
}

impl LockOptions {
    /// Check the option ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.key_percent) {
            return Err(LockError::InvalidConfiguration(format!(
                "key percentage {} outside [0, 100]",
                self.key_percent
            )));
        }
        if self.nb_test_vectors < 4 {
            return Err(LockError::InvalidConfiguration(format!(
                "{} test vectors requested, at least 4 needed",
                self.nb_test_vectors
            )));
        }
        Ok(())
    }

    /// Key-bit budget for a module with the given number of combinational cells
    pub fn budget(&self, nb_comb_cells: usize) -> usize {
        match self.key_bits {
            Some(k) => k,
            None => (self.key_percent / 100.0 * nb_comb_cells as f64).round() as usize,
        }
    }
}

/// Locking candidates: outputs of combinational cells, in cell order
pub fn candidate_wires(netlist: &Netlist) -> Vec<Wire> {
    (0..netlist.nb_cells())
        .filter(|i| netlist.cell(*i).is_comb())
        .map(|i| netlist.cell(i).output)
        .collect()
}

/// Generate packed random test batches, one Bernoulli(1/2) bit per input
///
/// The generator is seeded so that two runs on the same module analyze the
/// same vectors; the key itself never comes from this generator.
pub fn generate_batches(nb_inputs: usize, nb_vectors: usize, seed: u64) -> Vec<TestBatch> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..nb_vectors.div_ceil(64))
        .map(|_| TestBatch::from_words((0..nb_inputs).map(|_| rng.gen()).collect()))
        .collect()
}

/// Run the analysis pipeline and return the wires to lock
pub fn select_locking_signals(netlist: &Netlist, opts: &LockOptions) -> Result<Vec<Wire>> {
    opts.validate()?;
    let candidates = candidate_wires(netlist);
    let budget = opts.budget(netlist.nb_comb_cells()).min(candidates.len());
    if budget == 0 {
        return Ok(Vec::new());
    }

    let aig = Aig::from_netlist(netlist)?;
    let batches = generate_batches(aig.nb_inputs(), opts.nb_test_vectors, opts.seed);
    let nodes = candidates
        .iter()
        .map(|w| aig.node_of(*w).unwrap())
        .collect();
    let mut analyzer = Analyzer::new(&aig, &batches, nodes);
    println!(
        "Analyzing {} candidates over {} test vectors",
        candidates.len(),
        batches.len() * 64
    );

    let selection = match opts.target {
        Target::Pairwise => {
            let graph = analyzer.pairwise_graph();
            let cliques = partition_cliques(&graph, budget, graph.nb_vertices() <= EXACT_CLIQUE_LIMIT);
            println!(
                "Selected {} cliques satisfying {} pairwise-security constraints",
                cliques.len(),
                partition_value(&cliques)
            );
            cliques.into_iter().flatten().collect()
        }
        Target::Corruption => {
            let matrix = analyzer.corruption_matrix();
            let selection = select_max_coverage(&matrix, budget, &[]);
            println!(
                "Corruption cover {:.2}% with {} locked signals",
                100.0 * corruption_cover(&matrix, &selection),
                selection.len()
            );
            selection
        }
        Target::Hybrid => {
            let graph = analyzer.pairwise_graph();
            let cliques = partition_cliques(&graph, budget, graph.nb_vertices() <= EXACT_CLIQUE_LIMIT);
            let prefix = match cliques.first() {
                Some(c) if c.len() >= 2 => c.clone(),
                _ => Vec::new(),
            };
            let matrix = analyzer.corruption_matrix();
            let selection = select_max_coverage(&matrix, budget, &prefix);
            println!(
                "Locked a {}-clique, corruption cover {:.2}% with {} locked signals",
                prefix.len(),
                100.0 * corruption_cover(&matrix, &selection),
                selection.len()
            );
            selection
        }
    };
    Ok(selection.into_iter().map(|i| candidates[i]).collect())
}

/// Analyze only: print the coverage achieved by each locked-cell count
pub fn coverage_report(netlist: &Netlist, opts: &LockOptions) -> Result<()> {
    opts.validate()?;
    let candidates = candidate_wires(netlist);
    let budget = opts.budget(netlist.nb_comb_cells()).min(candidates.len());
    let aig = Aig::from_netlist(netlist)?;
    let batches = generate_batches(aig.nb_inputs(), opts.nb_test_vectors, opts.seed);
    let nodes = candidates
        .iter()
        .map(|w| aig.node_of(*w).unwrap())
        .collect();
    let analyzer = Analyzer::new(&aig, &batches, nodes);
    let matrix = analyzer.corruption_matrix();
    let selection = select_max_coverage(&matrix, budget, &[]);

    println!("Locked cells  Corruption cover  Signal");
    for k in 1..=selection.len() {
        println!(
            "{:>12}  {:>15.2}%  {}",
            k,
            100.0 * corruption_cover(&matrix, &selection[..k]),
            netlist.wire_name(candidates[selection[k - 1]])
        );
    }
    Ok(())
}

/// Resolve explicitly requested gate names to lockable wires
pub fn resolve_gates(netlist: &Netlist, names: &[String]) -> Result<Vec<Wire>> {
    names
        .iter()
        .map(|name| {
            let w = netlist
                .find_wire(name)
                .ok_or_else(|| LockError::SelectionImpossible(name.clone()))?;
            match netlist.driver(w) {
                Some(c) if netlist.cell(c).is_comb() => Ok(w),
                _ => Err(LockError::SelectionImpossible(name.clone())),
            }
        })
        .collect()
}

/// Insert one XOR or XNOR key gate per selected wire
///
/// The key gate sits between the original driver and all its loads, with
/// an XOR for a zero key bit and an XNOR for a one, so the correct key is
/// the only one reproducing the original function. Key ports are named
/// `keyinput<i>` starting at `first_index`. Returns the key input wires.
pub fn insert_key_gates(
    netlist: &mut Netlist,
    wires: &[Wire],
    key_bits: &[bool],
    first_index: usize,
) -> Result<Vec<Wire>> {
    assert_eq!(wires.len(), key_bits.len());
    let mut key_inputs = Vec::new();
    for (i, w) in wires.iter().enumerate() {
        let key_name = netlist.unique_name(&format!("keyinput{}", first_index + i));
        let k = netlist.add_input(&key_name)?;
        let enc_name = netlist.unique_name(&format!("{}_enc", netlist.wire_name(*w)));
        let enc = netlist.wire(&enc_name);
        netlist.rewire_loads(*w, enc);
        let kind = if key_bits[i] {
            CellKind::Xnor
        } else {
            CellKind::Xor
        };
        netlist.add_cell(kind, vec![*w, k], enc)?;
        key_inputs.push(k);
    }
    Ok(key_inputs)
}

/// Insert one MUX key gate per selected wire pair
///
/// The loads of the first wire are fed from a MUX choosing between the
/// pair; the key bit value selecting the true driver is the key. Returns
/// the key input wires.
pub fn insert_mix_gates(
    netlist: &mut Netlist,
    pairs: &[(Wire, Wire)],
    key_bits: &[bool],
    first_index: usize,
) -> Result<Vec<Wire>> {
    assert_eq!(pairs.len(), key_bits.len());
    let mut key_inputs = Vec::new();
    for (i, (a, b)) in pairs.iter().enumerate() {
        let key_name = netlist.unique_name(&format!("keyinput{}", first_index + i));
        let k = netlist.add_input(&key_name)?;
        let mix_name = netlist.unique_name(&format!("{}_mix", netlist.wire_name(*a)));
        let mix = netlist.wire(&mix_name);
        netlist.rewire_loads(*a, mix);
        let (d0, d1) = if key_bits[i] { (*b, *a) } else { (*a, *b) };
        netlist.add_cell(CellKind::Mux, vec![k, d0, d1], mix)?;
        key_inputs.push(k);
    }
    Ok(key_inputs)
}
