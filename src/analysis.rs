//! Security analysis of locking candidates
//!
//! Both analyses drive the bit-parallel simulator over the same test
//! batches. The no-toggle pass and the single-toggle passes are computed
//! once up front: the singles are reused for every pair (only the
//! double-toggle pass is per-pair) and double as the corruption rows.

use itertools::Itertools;
use kdam::tqdm;

use crate::aig::{Aig, AigNode};
use crate::sim::{Simulator, TestBatch};

/// Undirected graph of pairwise-secure candidate pairs
///
/// Simple by construction: no self-loops, no multi-edges.
#[derive(Debug, Clone)]
pub struct PairwiseGraph {
    nb_vertices: usize,
    adj: Vec<bool>,
}

impl PairwiseGraph {
    /// Create an edgeless graph with the given number of vertices
    pub fn new(nb_vertices: usize) -> PairwiseGraph {
        PairwiseGraph {
            nb_vertices,
            adj: vec![false; nb_vertices * nb_vertices],
        }
    }

    /// Return the number of vertices
    pub fn nb_vertices(&self) -> usize {
        self.nb_vertices
    }

    /// Return the number of edges
    pub fn nb_edges(&self) -> usize {
        self.adj.iter().filter(|b| **b).count() / 2
    }

    /// Add an edge between two distinct vertices
    pub fn add_edge(&mut self, a: usize, b: usize) {
        assert_ne!(a, b);
        self.adj[a * self.nb_vertices + b] = true;
        self.adj[b * self.nb_vertices + a] = true;
    }

    /// Returns whether two vertices are connected
    pub fn connected(&self, a: usize, b: usize) -> bool {
        self.adj[a * self.nb_vertices + b]
    }
}

/// Per-candidate corruption bitmaps: one word per (output, batch)
#[derive(Debug, Clone)]
pub struct CorruptionMatrix {
    nb_outputs: usize,
    nb_batches: usize,
    rows: Vec<Vec<u64>>,
}

impl CorruptionMatrix {
    /// Return the number of candidates
    pub fn nb_candidates(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of words in one row
    pub fn nb_words(&self) -> usize {
        self.nb_outputs * self.nb_batches
    }

    /// Return the number of (output, vector) bits in one row
    pub fn nb_bits(&self) -> usize {
        self.nb_words() * 64
    }

    /// Get the bitmap row of a candidate, output-major
    pub fn row(&self, c: usize) -> &[u64] {
        &self.rows[c]
    }

    /// Number of (output, vector) pairs corrupted by a candidate
    pub fn count(&self, c: usize) -> usize {
        self.rows[c].iter().map(|w| w.count_ones() as usize).sum()
    }
}

/// Analysis engine bound to one AIG, one candidate list and one vector set
pub struct Analyzer<'a> {
    aig: &'a Aig,
    batches: &'a [TestBatch],
    nodes: Vec<u32>,
    sim: Simulator<'a>,
    base: Vec<Vec<u64>>,
    single: Vec<Vec<Vec<u64>>>,
}

impl<'a> Analyzer<'a> {
    /// Prepare the analyzer: runs the shared no-toggle and single-toggle passes
    ///
    /// `nodes` holds the dedicated AIG node of each candidate, in candidate
    /// order.
    pub fn new(aig: &'a Aig, batches: &'a [TestBatch], nodes: Vec<u32>) -> Analyzer<'a> {
        let mut sim = Simulator::from_aig(aig);
        let mut base = Vec::with_capacity(batches.len());
        for b in batches {
            base.push(sim.run(b, &[]));
        }
        let mut single = Vec::with_capacity(nodes.len());
        for n in &nodes {
            let mut per_batch = Vec::with_capacity(batches.len());
            for b in batches {
                per_batch.push(sim.run(b, &[*n]));
            }
            single.push(per_batch);
        }
        Analyzer {
            aig,
            batches,
            nodes,
            sim,
            base,
            single,
        }
    }

    /// Return the number of candidates
    pub fn nb_candidates(&self) -> usize {
        self.nodes.len()
    }

    /// Build the pairwise-security graph over all candidate pairs
    ///
    /// Pairs where one candidate lies in the other's fan-in cone are
    /// pruned without simulation: a wire and its own (possibly buffered)
    /// fanout toggle with the same downstream impact, so keying both adds
    /// nothing. This also makes the predicate irreflexive.
    pub fn pairwise_graph(&mut self) -> PairwiseGraph {
        let nb = self.nodes.len();
        let cones = self.candidate_cones();
        let mut g = PairwiseGraph::new(nb);
        let mut nb_pruned = 0usize;
        let total = nb * nb.saturating_sub(1) / 2;
        for (i, j) in tqdm!(
            (0..nb).tuple_combinations::<(_, _)>(),
            desc = "pairwise security",
            total = total
        ) {
            if cones[i][j] || cones[j][i] {
                nb_pruned += 1;
                continue;
            }
            if self.is_pairwise_secure(i, j) {
                g.add_edge(i, j);
            }
        }
        if nb_pruned != 0 {
            println!("Warning: pruned {} dependent candidate pairs", nb_pruned);
        }
        g
    }

    /// Pairwise-security predicate for one candidate pair
    ///
    /// Runs the remaining double-toggle pass and compares, per batch, the
    /// output-aggregated sensitivity words of the two candidates. A vector
    /// where one candidate disturbs some output while the other disturbs
    /// none (in either toggle context) lets an attacker resolve one key
    /// bit alone, so the pair is not secure.
    fn is_pairwise_secure(&mut self, i: usize, j: usize) -> bool {
        let toggles = [self.nodes[i], self.nodes[j]];
        for (k, batch) in self.batches.iter().enumerate() {
            let fab = self.sim.run(batch, &toggles);
            let mut sens_a = 0u64;
            let mut sens_b = 0u64;
            for o in 0..self.aig.nb_outputs() {
                let f0 = self.base[k][o];
                let fa = self.single[i][k][o];
                let fb = self.single[j][k][o];
                sens_a |= (f0 ^ fa) | (fb ^ fab[o]);
                sens_b |= (f0 ^ fb) | (fa ^ fab[o]);
            }
            if sens_a != sens_b {
                return false;
            }
        }
        true
    }

    /// Corruption bitmaps of every candidate, from the cached passes
    pub fn corruption_matrix(&self) -> CorruptionMatrix {
        let nb_outputs = self.aig.nb_outputs();
        let nb_batches = self.batches.len();
        let rows = (0..self.nodes.len())
            .map(|c| {
                let mut row = Vec::with_capacity(nb_outputs * nb_batches);
                for o in 0..nb_outputs {
                    for k in 0..nb_batches {
                        row.push(self.base[k][o] ^ self.single[c][k][o]);
                    }
                }
                row
            })
            .collect();
        CorruptionMatrix {
            nb_outputs,
            nb_batches,
            rows,
        }
    }

    /// For each candidate, which other candidates sit in its fan-out cone
    fn candidate_cones(&self) -> Vec<Vec<bool>> {
        let nb_nodes = self.aig.nb_nodes();
        let mut dep = vec![false; nb_nodes];
        let mut ret = Vec::with_capacity(self.nodes.len());
        for n in &self.nodes {
            dep.iter_mut().for_each(|d| *d = false);
            dep[*n as usize] = true;
            for i in (*n as usize + 1)..nb_nodes {
                if let AigNode::And(a, b) = self.aig.node(i) {
                    if dep[a.node() as usize] || dep[b.node() as usize] {
                        dep[i] = true;
                    }
                }
            }
            ret.push(self.nodes.iter().map(|m| dep[*m as usize]).collect());
        }
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::CellKind::*;
    use crate::network::{Netlist, Wire};

    fn exhaustive_batch(nb_inputs: usize) -> TestBatch {
        assert!(nb_inputs <= 6);
        let mut words = Vec::new();
        for i in 0..nb_inputs {
            let mut w = 0u64;
            for v in 0..64u64 {
                if (v >> i) & 1 != 0 {
                    w |= 1 << v;
                }
            }
            words.push(w);
        }
        TestBatch::from_words(words)
    }

    fn analyze(n: &Netlist, candidates: &[Wire]) -> (Aig, Vec<TestBatch>, Vec<u32>) {
        let aig = Aig::from_netlist(n).unwrap();
        let nodes = candidates
            .iter()
            .map(|w| aig.node_of(*w).unwrap())
            .collect();
        let batches = vec![exhaustive_batch(n.nb_inputs())];
        (aig, batches, nodes)
    }

    #[test]
    fn test_parallel_inverters_are_secure() {
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let i1 = n.add_input("i1").unwrap();
        let x0 = n.wire("x0");
        let x1 = n.wire("x1");
        n.add_cell(Not, vec![i0], x0).unwrap();
        n.add_cell(Not, vec![i1], x1).unwrap();
        n.add_output(x0);
        n.add_output(x1);

        let (aig, batches, nodes) = analyze(&n, &[x0, x1]);
        let mut an = Analyzer::new(&aig, &batches, nodes);
        let g = an.pairwise_graph();
        assert_eq!(g.nb_edges(), 1);
        assert!(g.connected(0, 1));
        assert!(g.connected(1, 0));
        assert!(!g.connected(0, 0));
    }

    #[test]
    fn test_buffer_chain_is_pruned() {
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let b1 = n.wire("b1");
        let b2 = n.wire("b2");
        let b3 = n.wire("b3");
        n.add_cell(Buf, vec![i0], b1).unwrap();
        n.add_cell(Buf, vec![b1], b2).unwrap();
        n.add_cell(Buf, vec![b2], b3).unwrap();
        n.add_output(b3);

        let (aig, batches, nodes) = analyze(&n, &[b1, b2, b3]);
        let mut an = Analyzer::new(&aig, &batches, nodes);
        let g = an.pairwise_graph();
        assert_eq!(g.nb_edges(), 0);
    }

    #[test]
    fn test_xor_siblings_single_edge() {
        // Both Xor fan-ins are candidates, and so is the Xor output. The
        // fan-ins form the only edge; the output is in both their cones.
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let i1 = n.add_input("i1").unwrap();
        let a = n.wire("a");
        let b = n.wire("b");
        let x = n.wire("x");
        n.add_cell(Not, vec![i0], a).unwrap();
        n.add_cell(Not, vec![i1], b).unwrap();
        n.add_cell(Xor, vec![a, b], x).unwrap();
        n.add_output(x);

        let (aig, batches, nodes) = analyze(&n, &[a, b, x]);
        let mut an = Analyzer::new(&aig, &batches, nodes);
        let g = an.pairwise_graph();
        assert_eq!(g.nb_edges(), 1);
        assert!(g.connected(0, 1));
        assert!(!g.connected(0, 2));
        assert!(!g.connected(1, 2));
    }

    #[test]
    fn test_mux_data_inputs_distinguishable() {
        // Only one data leg of a mux is observable per vector, so an
        // attacker separates the two data keys by driving the select; the
        // select itself stays entangled with either leg.
        let mut n = Netlist::new();
        let s = n.add_input("s").unwrap();
        let a = n.add_input("a").unwrap();
        let b = n.add_input("b").unwrap();
        let ws = n.wire("ws");
        let w0 = n.wire("w0");
        let w1 = n.wire("w1");
        let y = n.wire("y");
        n.add_cell(Buf, vec![s], ws).unwrap();
        n.add_cell(Buf, vec![a], w0).unwrap();
        n.add_cell(Buf, vec![b], w1).unwrap();
        n.add_cell(Mux, vec![ws, w0, w1], y).unwrap();
        n.add_output(y);

        let (aig, batches, nodes) = analyze(&n, &[ws, w0, w1]);
        let mut an = Analyzer::new(&aig, &batches, nodes);
        let g = an.pairwise_graph();
        assert!(!g.connected(1, 2));
        assert!(g.connected(0, 1));
        assert!(g.connected(0, 2));
    }

    #[test]
    fn test_corruption_counts() {
        // x0 corrupts its output on every vector; x1 = And is observable
        // only when i2 = 1 under the chosen cut.
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let i1 = n.add_input("i1").unwrap();
        let i2 = n.add_input("i2").unwrap();
        let x0 = n.wire("x0");
        let x1 = n.wire("x1");
        let y = n.wire("y");
        n.add_cell(Not, vec![i0], x0).unwrap();
        n.add_cell(And, vec![i1, x0], x1).unwrap();
        n.add_cell(And, vec![x1, i2], y).unwrap();
        n.add_output(x0);
        n.add_output(y);

        let (aig, batches, nodes) = analyze(&n, &[x0, x1]);
        let an = Analyzer::new(&aig, &batches, nodes);
        let m = an.corruption_matrix();
        assert_eq!(m.nb_candidates(), 2);
        assert_eq!(m.nb_words(), 2);
        // Toggling x0 flips output x0 everywhere, and y when i1 & i2
        assert_eq!(m.count(0), 64 + 16);
        // Toggling x1 flips y when i2 = 1
        assert_eq!(m.count(1), 32);
    }
}
