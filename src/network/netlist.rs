use std::collections::VecDeque;
use std::fmt;

use fxhash::FxHashMap;

use crate::errors::{LockError, Result};
use crate::network::cells::{Cell, CellKind};

/// Identifier for a named wire in a netlist
///
/// Wires are interned: the same name always resolves to the same `Wire`,
/// so a signal used as fan-in by several cells compares equal everywhere.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Wire(u32);

impl Wire {
    /// Index of the wire in the netlist tables
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A single-module gate-level netlist
///
/// Cells are stored in a flat vector; each wire records the cell driving
/// it. Module inputs and outputs are ordered lists of wires. The structure
/// is the only mutable state of the engine: analysis reads it, and the key
/// gate inserter rewires loads through it.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    names: Vec<String>,
    name_to_wire: FxHashMap<String, Wire>,
    inputs: Vec<Wire>,
    outputs: Vec<Wire>,
    cells: Vec<Cell>,
    driver: Vec<Option<u32>>,
    is_input: Vec<bool>,
}

impl Netlist {
    /// Create an empty netlist
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of wires
    pub fn nb_wires(&self) -> usize {
        self.names.len()
    }

    /// Return the number of module inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of module outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Return the number of cells
    pub fn nb_cells(&self) -> usize {
        self.cells.len()
    }

    /// Return the number of combinational cells
    pub fn nb_comb_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_comb()).count()
    }

    /// Get the module input at index i
    pub fn input(&self, i: usize) -> Wire {
        self.inputs[i]
    }

    /// Get the module output at index i
    pub fn output(&self, i: usize) -> Wire {
        self.outputs[i]
    }

    /// Get the cell at index i
    pub fn cell(&self, i: usize) -> &Cell {
        &self.cells[i]
    }

    /// Get the name of a wire
    pub fn wire_name(&self, w: Wire) -> &str {
        &self.names[w.index()]
    }

    /// Intern a wire by name, creating it if needed
    pub fn wire(&mut self, name: &str) -> Wire {
        if let Some(w) = self.name_to_wire.get(name) {
            return *w;
        }
        let w = Wire(self.names.len() as u32);
        self.names.push(name.to_string());
        self.name_to_wire.insert(name.to_string(), w);
        self.driver.push(None);
        self.is_input.push(false);
        w
    }

    /// Look up a wire by name
    pub fn find_wire(&self, name: &str) -> Option<Wire> {
        self.name_to_wire.get(name).copied()
    }

    /// Derive a wire name that is not taken yet from a base name
    pub fn unique_name(&self, base: &str) -> String {
        if !self.name_to_wire.contains_key(base) {
            return base.to_string();
        }
        let mut i = 0usize;
        loop {
            let name = format!("{}_{}", base, i);
            if !self.name_to_wire.contains_key(&name) {
                return name;
            }
            i += 1;
        }
    }

    /// Declare a wire as a module input
    pub fn add_input(&mut self, name: &str) -> Result<Wire> {
        let w = self.wire(name);
        if self.is_input[w.index()] || self.driver[w.index()].is_some() {
            return Err(LockError::MalformedNetlist(format!(
                "signal {} is defined twice",
                name
            )));
        }
        self.is_input[w.index()] = true;
        self.inputs.push(w);
        Ok(w)
    }

    /// Declare a wire as a module output
    pub fn add_output(&mut self, w: Wire) {
        self.outputs.push(w);
    }

    /// Add a cell; the output wire must not be driven yet
    pub fn add_cell(&mut self, kind: CellKind, inputs: Vec<Wire>, output: Wire) -> Result<usize> {
        match kind.arity() {
            Some(n) if inputs.len() != n => {
                return Err(LockError::MalformedNetlist(format!(
                    "{} cell driving {} takes {} inputs, got {}",
                    kind,
                    self.wire_name(output),
                    n,
                    inputs.len()
                )));
            }
            None if inputs.len() < 2 => {
                return Err(LockError::MalformedNetlist(format!(
                    "{} cell driving {} takes at least 2 inputs, got {}",
                    kind,
                    self.wire_name(output),
                    inputs.len()
                )));
            }
            _ => (),
        }
        if self.is_input[output.index()] || self.driver[output.index()].is_some() {
            return Err(LockError::MalformedNetlist(format!(
                "signal {} is defined twice",
                self.wire_name(output)
            )));
        }
        let i = self.cells.len();
        self.driver[output.index()] = Some(i as u32);
        self.cells.push(Cell {
            kind,
            inputs,
            output,
        });
        Ok(i)
    }

    /// Get the index of the cell driving a wire, if any
    pub fn driver(&self, w: Wire) -> Option<usize> {
        self.driver[w.index()].map(|i| i as usize)
    }

    /// Returns whether a wire is a module input
    pub fn is_module_input(&self, w: Wire) -> bool {
        self.is_input[w.index()]
    }

    /// Returns whether a wire is an input to the combinational logic
    ///
    /// True for module inputs and flip-flop outputs.
    pub fn is_comb_input(&self, w: Wire) -> bool {
        if self.is_input[w.index()] {
            return true;
        }
        match self.driver(w) {
            Some(c) => !self.cells[c].is_comb(),
            None => false,
        }
    }

    /// Inputs of the combinational logic: module inputs, then Dff outputs
    pub fn comb_inputs(&self) -> Vec<Wire> {
        let mut ret = self.inputs.clone();
        for c in &self.cells {
            if !c.is_comb() {
                ret.push(c.output);
            }
        }
        ret
    }

    /// Outputs of the combinational logic: module outputs, then Dff data pins
    pub fn comb_outputs(&self) -> Vec<Wire> {
        let mut ret = Vec::new();
        let mut seen = vec![false; self.nb_wires()];
        for w in &self.outputs {
            if !seen[w.index()] {
                seen[w.index()] = true;
                ret.push(*w);
            }
        }
        for c in &self.cells {
            if !c.is_comb() {
                let d = c.inputs[0];
                if !seen[d.index()] {
                    seen[d.index()] = true;
                    ret.push(d);
                }
            }
        }
        ret
    }

    /// Check that every wire used as a fan-in or output has a driver
    pub fn check(&self) -> Result<()> {
        for c in &self.cells {
            for w in &c.inputs {
                self.check_driven(*w)?;
            }
        }
        for w in &self.outputs {
            self.check_driven(*w)?;
        }
        Ok(())
    }

    fn check_driven(&self, w: Wire) -> Result<()> {
        if self.is_input[w.index()] || self.driver[w.index()].is_some() {
            Ok(())
        } else {
            Err(LockError::MalformedNetlist(format!(
                "signal {} has no driver",
                self.wire_name(w)
            )))
        }
    }

    /// Topological order of the combinational cells
    ///
    /// Cells are ready once all their fan-ins are combinational inputs or
    /// outputs of already-ordered cells. A cell that never becomes ready
    /// sits on a combinational loop, which is fatal.
    pub fn comb_topo_order(&self) -> Result<Vec<usize>> {
        let mut readers: Vec<Vec<u32>> = vec![Vec::new(); self.nb_wires()];
        let mut pending = vec![0u32; self.nb_cells()];
        for (i, c) in self.cells.iter().enumerate() {
            if !c.is_comb() {
                continue;
            }
            for w in &c.inputs {
                if !self.is_comb_input(*w) {
                    readers[w.index()].push(i as u32);
                    pending[i] += 1;
                }
            }
        }

        let mut order = Vec::new();
        let mut queue: VecDeque<u32> = (0..self.nb_cells())
            .filter(|i| self.cells[*i].is_comb() && pending[*i] == 0)
            .map(|i| i as u32)
            .collect();
        let mut visited = vec![false; self.nb_cells()];
        while let Some(i) = queue.pop_front() {
            if visited[i as usize] {
                continue;
            }
            visited[i as usize] = true;
            order.push(i as usize);
            let out = self.cells[i as usize].output;
            for r in &readers[out.index()] {
                pending[*r as usize] -= 1;
                if pending[*r as usize] == 0 {
                    queue.push_back(*r);
                }
            }
        }

        if order.len() != self.nb_comb_cells() {
            let culprit = (0..self.nb_cells())
                .find(|i| self.cells[*i].is_comb() && !visited[*i])
                .unwrap();
            for w in &self.cells[culprit].inputs {
                self.check_driven(*w)?;
            }
            return Err(LockError::MalformedNetlist(format!(
                "combinational loop through signal {}",
                self.wire_name(self.cells[culprit].output)
            )));
        }
        Ok(order)
    }

    /// Redirect every load of a wire to another wire
    ///
    /// Rewrites cell fan-ins and module output ports; the driver of `from`
    /// is left untouched, so a key gate can be threaded in between.
    pub fn rewire_loads(&mut self, from: Wire, to: Wire) {
        for c in &mut self.cells {
            for w in &mut c.inputs {
                if *w == from {
                    *w = to;
                }
            }
        }
        for w in &mut self.outputs {
            if *w == from {
                *w = to;
            }
        }
    }
}

impl fmt::Display for Netlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Netlist with {} inputs, {} outputs:",
            self.nb_inputs(),
            self.nb_outputs()
        )?;
        for c in &self.cells {
            let ins = c
                .inputs
                .iter()
                .map(|w| self.wire_name(*w))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "\t{} = {}({})", self.wire_name(c.output), c.kind, ins)?;
        }
        for (i, w) in self.outputs.iter().enumerate() {
            writeln!(f, "\to{} = {}", i, self.wire_name(*w))?;
        }
        Ok(())
    }
}
