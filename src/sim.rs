//! Bit-parallel simulation of the AIG
//!
//! Values are packed 64 test vectors to the word. The simulator evaluates
//! the node array in one forward pass, which is valid because fan-ins
//! always point to lower indices. A toggle set of node indices can be
//! supplied; the toggle is applied after the node value is computed, which
//! models cutting the wire and feeding the opposite value downstream.

use crate::aig::{Aig, AigNode, Lit};

/// One batch of 64 packed test vectors, one word per combinational input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestBatch {
    words: Vec<u64>,
}

impl TestBatch {
    /// Create an all-zero batch for a given number of inputs
    pub fn new(nb_inputs: usize) -> TestBatch {
        TestBatch {
            words: vec![0; nb_inputs],
        }
    }

    /// Create a batch from one word per input
    pub fn from_words(words: Vec<u64>) -> TestBatch {
        TestBatch { words }
    }

    /// Return the number of inputs covered by the batch
    pub fn nb_inputs(&self) -> usize {
        self.words.len()
    }

    /// Get the packed word of input k
    pub fn word(&self, k: usize) -> u64 {
        self.words[k]
    }

    /// Set the packed word of input k
    pub fn set_word(&mut self, k: usize, w: u64) {
        self.words[k] = w;
    }
}

/// Forward-sweep simulator over a borrowed AIG
pub struct Simulator<'a> {
    aig: &'a Aig,
    values: Vec<u64>,
    toggled: Vec<bool>,
}

impl<'a> Simulator<'a> {
    /// Build a simulator by capturing an AIG
    pub fn from_aig(aig: &'a Aig) -> Simulator<'a> {
        Simulator {
            values: vec![0; aig.nb_nodes()],
            toggled: vec![false; aig.nb_nodes()],
            aig,
        }
    }

    fn fetch(&self, l: Lit) -> u64 {
        self.values[l.node() as usize] ^ l.inv_word()
    }

    /// Run one batch with a set of toggled nodes; one word per output
    ///
    /// Toggle indices must be distinct; toggling the same node twice in one
    /// set would cancel out.
    pub fn run(&mut self, batch: &TestBatch, toggles: &[u32]) -> Vec<u64> {
        assert_eq!(batch.nb_inputs(), self.aig.nb_inputs());
        for t in toggles {
            self.toggled[*t as usize] = true;
        }
        for i in 0..self.aig.nb_nodes() {
            let mut v = match self.aig.node(i) {
                AigNode::Const0 => 0,
                AigNode::Input(k) => batch.word(k as usize),
                AigNode::And(a, b) => self.fetch(a) & self.fetch(b),
            };
            if self.toggled[i] {
                v = !v;
            }
            self.values[i] = v;
        }
        for t in toggles {
            self.toggled[*t as usize] = false;
        }
        (0..self.aig.nb_outputs())
            .map(|o| self.fetch(self.aig.output(o).1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::CellKind::*;
    use crate::network::Netlist;

    fn single_word(bits: &[bool]) -> u64 {
        let mut w = 0u64;
        for (i, b) in bits.iter().enumerate() {
            if *b {
                w |= 1 << i;
            }
        }
        w
    }

    #[test]
    fn test_basic() {
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let i1 = n.add_input("i1").unwrap();
        let i2 = n.add_input("i2").unwrap();
        let x1 = n.wire("x1");
        let x2 = n.wire("x2");
        let x3 = n.wire("x3");
        let ni1 = n.wire("ni1");
        n.add_cell(Xor, vec![i0, i1], x1).unwrap();
        n.add_cell(And, vec![i0, i2], x2).unwrap();
        n.add_cell(Not, vec![i1], ni1).unwrap();
        n.add_cell(And, vec![x2, ni1], x3).unwrap();
        n.add_output(x1);
        n.add_output(x3);

        let aig = Aig::from_netlist(&n).unwrap();
        let mut sim = Simulator::from_aig(&aig);

        // Four vectors packed in the low bits: (i0, i1, i2) in
        // (0,0,0), (1,0,0), (1,0,1), (1,1,1)
        let batch = TestBatch::from_words(vec![
            single_word(&[false, true, true, true]),
            single_word(&[false, false, false, true]),
            single_word(&[false, false, true, true]),
        ]);
        let out = sim.run(&batch, &[]);
        assert_eq!(out[0] & 0xf, single_word(&[false, true, true, false]));
        assert_eq!(out[1] & 0xf, single_word(&[false, false, true, false]));
    }

    #[test]
    fn test_mux_truth_table() {
        let mut n = Netlist::new();
        let s = n.add_input("s").unwrap();
        let d0 = n.add_input("d0").unwrap();
        let d1 = n.add_input("d1").unwrap();
        let y = n.wire("y");
        n.add_cell(Mux, vec![s, d0, d1], y).unwrap();
        n.add_output(y);

        let aig = Aig::from_netlist(&n).unwrap();
        let mut sim = Simulator::from_aig(&aig);
        // All 8 combinations of (s, d0, d1) in the low 8 bits
        let batch = TestBatch::from_words(vec![0b10101010, 0b11001100, 0b11110000]);
        let out = sim.run(&batch, &[]);
        // s ? d1 : d0
        assert_eq!(out[0] & 0xff, 0b11100100);
    }

    #[test]
    fn test_nary_reduction() {
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let i1 = n.add_input("i1").unwrap();
        let i2 = n.add_input("i2").unwrap();
        let a = n.wire("a");
        let o = n.wire("o");
        let x = n.wire("x");
        n.add_cell(Nand, vec![i0, i1, i2], a).unwrap();
        n.add_cell(Nor, vec![i0, i1, i2], o).unwrap();
        n.add_cell(Xnor, vec![i0, i1, i2], x).unwrap();
        n.add_output(a);
        n.add_output(o);
        n.add_output(x);

        let aig = Aig::from_netlist(&n).unwrap();
        let mut sim = Simulator::from_aig(&aig);
        let w0 = 0b10101010u64;
        let w1 = 0b11001100u64;
        let w2 = 0b11110000u64;
        let out = sim.run(&TestBatch::from_words(vec![w0, w1, w2]), &[]);
        assert_eq!(out[0] & 0xff, !(w0 & w1 & w2) & 0xff);
        assert_eq!(out[1] & 0xff, !(w0 | w1 | w2) & 0xff);
        assert_eq!(out[2] & 0xff, !(w0 ^ w1 ^ w2) & 0xff);
    }

    #[test]
    fn test_toggle_cuts_one_wire() {
        // a = And(i0, i1) feeds both a Not and a Buf; toggling the Not
        // output must leave the Buf output alone.
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let i1 = n.add_input("i1").unwrap();
        let a = n.wire("a");
        let x = n.wire("x");
        let y = n.wire("y");
        n.add_cell(And, vec![i0, i1], a).unwrap();
        n.add_cell(Not, vec![a], x).unwrap();
        n.add_cell(Buf, vec![a], y).unwrap();
        n.add_output(x);
        n.add_output(y);

        let aig = Aig::from_netlist(&n).unwrap();
        let mut sim = Simulator::from_aig(&aig);
        let batch = TestBatch::from_words(vec![0b0011, 0b0101]);
        let base = sim.run(&batch, &[]);
        let toggled = sim.run(&batch, &[aig.node_of(x).unwrap()]);
        assert_eq!(toggled[0] & 0xf, !base[0] & 0xf);
        assert_eq!(toggled[1], base[1]);
    }

    #[test]
    fn test_toggle_involution() {
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let i1 = n.add_input("i1").unwrap();
        let a = n.wire("a");
        let b = n.wire("b");
        n.add_cell(Or, vec![i0, i1], a).unwrap();
        n.add_cell(Xor, vec![a, i0], b).unwrap();
        n.add_output(b);

        let aig = Aig::from_netlist(&n).unwrap();
        let mut sim = Simulator::from_aig(&aig);
        let batch = TestBatch::from_words(vec![0xdeadbeef, 0x0ff1ce]);
        let toggles = [aig.node_of(a).unwrap(), aig.node_of(b).unwrap()];
        let first = sim.run(&batch, &toggles);
        let second = sim.run(&batch, &toggles);
        assert_eq!(first, second);
        // And the toggle state does not leak into later clean runs
        let clean = sim.run(&batch, &[]);
        let clean2 = sim.run(&batch, &[]);
        assert_eq!(clean, clean2);
        assert_ne!(clean, first);
    }

    #[test]
    fn test_toggle_downstream_of_constant() {
        // x always evaluates to zero; toggling it feeds one downstream.
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let ni0 = n.wire("ni0");
        let x = n.wire("x");
        let y = n.wire("y");
        n.add_cell(Not, vec![i0], ni0).unwrap();
        n.add_cell(And, vec![i0, ni0], x).unwrap();
        n.add_cell(Buf, vec![x], y).unwrap();
        n.add_output(y);

        let aig = Aig::from_netlist(&n).unwrap();
        let mut sim = Simulator::from_aig(&aig);
        let batch = TestBatch::from_words(vec![0b01]);
        assert_eq!(sim.run(&batch, &[])[0], 0);
        assert_eq!(sim.run(&batch, &[aig.node_of(x).unwrap()])[0], !0u64);
    }
}
