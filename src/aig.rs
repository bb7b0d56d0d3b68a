//! And-Inverter Graph lowered from a netlist
//!
//! All supported combinational cells are expanded to two-input And nodes
//! with implicit inverters on the edges. The flat node array is built in
//! topological order, so a single forward sweep evaluates the whole graph;
//! this is what makes the quadratic pairwise analysis affordable.

use std::fmt;
use std::ops::Not;

use fxhash::FxHashMap;

use crate::errors::{LockError, Result};
use crate::network::{CellKind, Netlist, Wire};

/// An AIG edge: a node index plus an inversion flag in the low bit
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
pub struct Lit {
    a: u32,
}

impl Lit {
    /// Constant zero literal (node 0, uninverted)
    pub fn zero() -> Lit {
        Lit { a: 0 }
    }

    /// Constant one literal (node 0, inverted)
    pub fn one() -> Lit {
        Lit { a: 1 }
    }

    /// Create an uninverted literal from a node index
    pub fn from_node(n: u32) -> Lit {
        Lit { a: n << 1 }
    }

    /// Obtain the node index the literal points to
    pub fn node(&self) -> u32 {
        self.a >> 1
    }

    /// Returns whether the literal is inverted
    pub fn is_inverted(&self) -> bool {
        self.a & 1 != 0
    }

    /// Returns whether the literal is one of the two constants
    pub fn is_constant(&self) -> bool {
        self.node() == 0
    }

    /// Inversion flag as a full simulation word, for branch-free xor
    pub(crate) fn inv_word(&self) -> u64 {
        (!((self.a & 1) as u64)).wrapping_add(1)
    }
}

impl Not for Lit {
    type Output = Lit;
    fn not(self) -> Lit {
        Lit { a: self.a ^ 1 }
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constant() {
            write!(f, "{}", self.a & 1)
        } else {
            if self.is_inverted() {
                write!(f, "!")?;
            }
            write!(f, "n{}", self.node())
        }
    }
}

/// A node of the AIG
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AigNode {
    /// The constant-zero sentinel, always at index 0
    Const0,
    /// The k-th combinational input
    Input(u32),
    /// Two-input And; both fan-ins point to strictly lower indices
    And(Lit, Lit),
}

/// And-Inverter Graph for one module, with its wire mappings
///
/// Each combinational cell output owns a dedicated node, so that toggling
/// the node models cutting that one wire. When a cell expands to an
/// inverted, constant or shared literal, an `And(lit, 1)` anchor is
/// inserted to give the wire its own node.
#[derive(Debug, Clone)]
pub struct Aig {
    nodes: Vec<AigNode>,
    inputs: Vec<Wire>,
    outputs: Vec<(Wire, Lit)>,
    wire_lit: FxHashMap<Wire, Lit>,
    wire_node: FxHashMap<Wire, u32>,
    claimed: Vec<bool>,
}

impl Aig {
    /// Build the AIG of the combinational logic of a netlist
    pub fn from_netlist(n: &Netlist) -> Result<Aig> {
        let order = n.comb_topo_order()?;
        let mut aig = Aig {
            nodes: vec![AigNode::Const0],
            inputs: Vec::new(),
            outputs: Vec::new(),
            wire_lit: FxHashMap::default(),
            wire_node: FxHashMap::default(),
            claimed: vec![true],
        };

        for w in n.comb_inputs() {
            let k = aig.inputs.len() as u32;
            aig.inputs.push(w);
            let node = aig.push(AigNode::Input(k));
            aig.wire_lit.insert(w, Lit::from_node(node));
        }

        for ci in order {
            let cell = n.cell(ci);
            let mut ins = Vec::with_capacity(cell.inputs.len());
            for w in &cell.inputs {
                match aig.wire_lit.get(w) {
                    Some(l) => ins.push(*l),
                    None => {
                        return Err(LockError::MalformedNetlist(format!(
                            "signal {} has no driver",
                            n.wire_name(*w)
                        )))
                    }
                }
            }
            let lit = aig.expand_cell(cell.kind, &ins, n.wire_name(cell.output))?;
            let node = aig.anchor(lit);
            aig.wire_lit.insert(cell.output, Lit::from_node(node));
            aig.wire_node.insert(cell.output, node);
        }

        for w in n.comb_outputs() {
            match aig.wire_lit.get(&w) {
                Some(l) => aig.outputs.push((w, *l)),
                None => {
                    return Err(LockError::MalformedNetlist(format!(
                        "signal {} has no driver",
                        n.wire_name(w)
                    )))
                }
            }
        }
        Ok(aig)
    }

    /// Return the number of nodes
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of combinational inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of combinational outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Get the node at index i
    pub fn node(&self, i: usize) -> AigNode {
        self.nodes[i]
    }

    /// Get the wire of the combinational input at index i
    pub fn input(&self, i: usize) -> Wire {
        self.inputs[i]
    }

    /// Get the wire and literal of the combinational output at index i
    pub fn output(&self, i: usize) -> (Wire, Lit) {
        self.outputs[i]
    }

    /// Get the literal a wire resolves to, if it is part of the graph
    pub fn lit_of(&self, w: Wire) -> Option<Lit> {
        self.wire_lit.get(&w).copied()
    }

    /// Get the dedicated node of a combinational cell output
    pub fn node_of(&self, w: Wire) -> Option<u32> {
        self.wire_node.get(&w).copied()
    }

    fn push(&mut self, node: AigNode) -> u32 {
        let i = self.nodes.len() as u32;
        self.nodes.push(node);
        self.claimed.push(false);
        i
    }

    /// Create an And node, folding trivial cases
    fn and(&mut self, a: Lit, b: Lit) -> Lit {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        if a == Lit::zero() || a == !b {
            return Lit::zero();
        }
        if a == Lit::one() || a == b {
            return b;
        }
        Lit::from_node(self.push(AigNode::And(a, b)))
    }

    fn or(&mut self, a: Lit, b: Lit) -> Lit {
        !self.and(!a, !b)
    }

    /// a Xor b as (a & !b) | (!a & b), flattened through De Morgan
    fn xor(&mut self, a: Lit, b: Lit) -> Lit {
        let l = self.and(a, !b);
        let r = self.and(!a, b);
        self.or(l, r)
    }

    /// s ? d1 : d0 as (s & d1) | (!s & d0)
    fn mux(&mut self, s: Lit, d0: Lit, d1: Lit) -> Lit {
        let t = self.and(s, d1);
        let e = self.and(!s, d0);
        self.or(t, e)
    }

    /// Expand one cell to And and inversions, reducing n-ary gates left to right
    fn expand_cell(&mut self, kind: CellKind, ins: &[Lit], out_name: &str) -> Result<Lit> {
        use CellKind::*;
        let lit = match kind {
            Buf => ins[0],
            Not => !ins[0],
            And => self.reduce(ins, Self::and),
            Nand => !self.reduce(ins, Self::and),
            Or => self.reduce(ins, Self::or),
            Nor => !self.reduce(ins, Self::or),
            Xor => self.reduce(ins, Self::xor),
            Xnor => !self.reduce(ins, Self::xor),
            Mux => self.mux(ins[0], ins[1], ins[2]),
            Dff => {
                return Err(LockError::UnsupportedCell {
                    kind: kind.to_string(),
                    signal: out_name.to_string(),
                })
            }
        };
        Ok(lit)
    }

    fn reduce(&mut self, ins: &[Lit], f: fn(&mut Self, Lit, Lit) -> Lit) -> Lit {
        let mut acc = ins[0];
        for l in &ins[1..] {
            acc = f(self, acc, *l);
        }
        acc
    }

    /// Give a wire its own node, inserting an identity And if needed
    fn anchor(&mut self, lit: Lit) -> u32 {
        let n = lit.node() as usize;
        if !lit.is_inverted() && !self.claimed[n] && matches!(self.nodes[n], AigNode::And(_, _)) {
            self.claimed[n] = true;
            return lit.node();
        }
        let node = self.push(AigNode::And(lit, Lit::one()));
        self.claimed[node as usize] = true;
        node
    }
}

impl fmt::Display for Aig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Aig with {} inputs, {} outputs, {} nodes:",
            self.nb_inputs(),
            self.nb_outputs(),
            self.nb_nodes()
        )?;
        for (i, n) in self.nodes.iter().enumerate() {
            match n {
                AigNode::Const0 => (),
                AigNode::Input(k) => writeln!(f, "\tn{} = input {}", i, k)?,
                AigNode::And(a, b) => writeln!(f, "\tn{} = {} & {}", i, a, b)?,
            }
        }
        for (i, (_, l)) in self.outputs.iter().enumerate() {
            writeln!(f, "\to{} = {}", i, l)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::CellKind::{And, Buf, Dff, Mux, Nor, Not, Or, Xor};

    #[test]
    fn test_literal() {
        let l0 = Lit::zero();
        let l1 = Lit::one();
        assert_eq!(l0, !l1);
        assert_eq!(l1, !l0);
        assert!(!l0.is_inverted());
        assert!(l1.is_inverted());
        assert!(l0.is_constant() && l1.is_constant());
        assert_eq!(format!("{l0}"), "0");
        assert_eq!(format!("{l1}"), "1");
        for v in 1u32..10u32 {
            let l = Lit::from_node(v);
            assert_eq!(l.node(), v);
            assert_eq!((!l).node(), v);
            assert!(!l.is_inverted());
            assert!((!l).is_inverted());
            assert_eq!(format!("{l}"), format!("n{v}"));
        }
        assert_eq!(Lit::zero().inv_word(), 0);
        assert_eq!(Lit::one().inv_word(), !0u64);
    }

    #[test]
    fn test_build_and() {
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let i1 = n.add_input("i1").unwrap();
        let x = n.wire("x");
        n.add_cell(And, vec![i0, i1], x).unwrap();
        n.add_output(x);

        let aig = Aig::from_netlist(&n).unwrap();
        // Const0, two inputs, one And
        assert_eq!(aig.nb_nodes(), 4);
        assert_eq!(aig.nb_inputs(), 2);
        assert_eq!(aig.nb_outputs(), 1);
        let (w, l) = aig.output(0);
        assert_eq!(w, x);
        assert!(!l.is_inverted());
        assert_eq!(aig.node_of(x), Some(l.node()));
    }

    #[test]
    fn test_shared_fanin_memoized() {
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
        let la = aig.lit_of(a).unwrap();
        // Both readers see the same literal for a
        assert!(!la.is_inverted());
        // Not and Buf get their own anchor nodes, distinct from a's
        let nx = aig.node_of(x).unwrap();
        let ny = aig.node_of(y).unwrap();
        assert_ne!(nx, la.node());
        assert_ne!(ny, la.node());
        assert_ne!(nx, ny);
    }

    #[test]
    fn test_folding() {
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let x = n.wire("x");
        // i0 & i0 folds to i0; the anchor keeps a dedicated node
        n.add_cell(And, vec![i0, i0], x).unwrap();
        n.add_output(x);
        let aig = Aig::from_netlist(&n).unwrap();
        // Const0, input, anchor
        assert_eq!(aig.nb_nodes(), 3);
        match aig.node(aig.node_of(x).unwrap() as usize) {
            AigNode::And(a, b) => {
                assert_eq!(a, aig.lit_of(i0).unwrap());
                assert_eq!(b, Lit::one());
            }
            _ => panic!("anchor expected"),
        }
    }

    #[test]
    fn test_topological_fanins() {
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let i1 = n.add_input("i1").unwrap();
        let i2 = n.add_input("i2").unwrap();
        let x = n.wire("x");
        let y = n.wire("y");
        let z = n.wire("z");
        n.add_cell(Xor, vec![i0, i1], x).unwrap();
        n.add_cell(Mux, vec![i2, x, y], z).unwrap();
        n.add_cell(Nor, vec![i0, i2], y).unwrap();
        n.add_output(z);

        let aig = Aig::from_netlist(&n).unwrap();
        for i in 0..aig.nb_nodes() {
            if let AigNode::And(a, b) = aig.node(i) {
                assert!((a.node() as usize) < i);
                assert!((b.node() as usize) < i);
            }
        }
    }

    #[test]
    fn test_dff_boundary() {
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let q = n.wire("q");
        let d = n.wire("d");
        n.add_cell(Dff, vec![d], q).unwrap();
        n.add_cell(Not, vec![i0], d).unwrap();
        n.add_output(q);

        let aig = Aig::from_netlist(&n).unwrap();
        // q is a combinational input, d a combinational output
        assert_eq!(aig.nb_inputs(), 2);
        assert_eq!(aig.input(1), q);
        assert_eq!(aig.output(0).0, d);
    }

    #[test]
    fn test_cycle_is_fatal() {
        let mut n = Netlist::new();
        let i0 = n.add_input("i0").unwrap();
        let a = n.wire("a");
        let b = n.wire("b");
        n.add_cell(Or, vec![i0, b], a).unwrap();
        n.add_cell(Buf, vec![a], b).unwrap();
        n.add_output(b);
        assert!(Aig::from_netlist(&n).is_err());
    }
}
