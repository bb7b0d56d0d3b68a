//! IO for .bench (ISCAS) files, the common format of locking benchmarks

use std::io::{BufRead, BufReader, Read, Write};

use crate::errors::{LockError, Result};
use crate::network::{CellKind, Netlist};

fn cell_kind(name: &str) -> Option<CellKind> {
    use CellKind::*;
    match name.to_uppercase().as_str() {
        "BUF" | "BUFF" => Some(Buf),
        "NOT" => Some(Not),
        "AND" => Some(And),
        "NAND" => Some(Nand),
        "OR" => Some(Or),
        "NOR" => Some(Nor),
        "XOR" => Some(Xor),
        "XNOR" => Some(Xnor),
        "MUX" => Some(Mux),
        "DFF" => Some(Dff),
        _ => None,
    }
}

fn netlist_from_statements(
    statements: &[Vec<String>],
    inputs: &[String],
    outputs: &[String],
) -> Result<Netlist> {
    let mut ret = Netlist::new();
    for name in inputs {
        ret.add_input(name)?;
    }
    for s in statements {
        let kind = cell_kind(&s[1]).ok_or_else(|| LockError::UnsupportedCell {
            kind: s[1].clone(),
            signal: s[0].clone(),
        })?;
        let ins = s[2..].iter().map(|n| ret.wire(n)).collect();
        let out = ret.wire(&s[0]);
        ret.add_cell(kind, ins, out)?;
    }
    for name in outputs {
        let w = ret.wire(name);
        ret.add_output(w);
    }
    ret.check()?;
    Ok(ret)
}

/// Read a netlist in .bench format, as used by the ISCAS benchmarks
///
/// These files describe the design with simple statements like:
/// ```text
///     # This is a comment
///     INPUT(i0)
///     INPUT(i1)
///     x0 = AND(i0, i1)
///     x1 = NAND(x0, i1)
///     x2 = NOT(x1)
///     x3 = MUX(x0, x1, x2)
///     OUTPUT(x3)
/// ```
/// `MUX(s, d0, d1)` selects `d1` when `s` is one. Statements may come in
/// any order; cells are topologically sorted during analysis.
pub fn read_bench<R: Read>(r: R) -> Result<Netlist> {
    let mut statements = Vec::new();
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    for l in BufReader::new(r).lines() {
        let t = l?.trim().to_owned();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        if !t.contains('=') {
            let parts: Vec<_> = t
                .split(&['(', ')'])
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            if parts.len() != 2 {
                return Err(LockError::MalformedNetlist(format!(
                    "unparsable statement \"{}\"",
                    t
                )));
            }
            if parts[0] == "INPUT" {
                inputs.push(parts[1].to_string());
            } else if parts[0] == "OUTPUT" {
                outputs.push(parts[1].to_string());
            } else {
                return Err(LockError::MalformedNetlist(format!(
                    "unknown keyword {}",
                    parts[0]
                )));
            }
        } else {
            let parts: Vec<_> = t
                .split(&['=', '(', ',', ')'])
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
            if parts.len() < 3 {
                return Err(LockError::MalformedNetlist(format!(
                    "unparsable statement \"{}\"",
                    t
                )));
            }
            statements.push(parts);
        }
    }
    netlist_from_statements(&statements, &inputs, &outputs)
}

/// Write a netlist in .bench format, as used by the ISCAS benchmarks
pub fn write_bench<W: Write>(w: &mut W, netlist: &Netlist) -> Result<()> {
    writeln!(w, "# .bench (ISCAS) file")?;
    writeln!(w, "# Generated by gatelock")?;
    for i in 0..netlist.nb_inputs() {
        writeln!(w, "INPUT({})", netlist.wire_name(netlist.input(i)))?;
    }
    writeln!(w)?;
    for i in 0..netlist.nb_outputs() {
        writeln!(w, "OUTPUT({})", netlist.wire_name(netlist.output(i)))?;
    }
    writeln!(w)?;
    for i in 0..netlist.nb_cells() {
        let c = netlist.cell(i);
        let ins = c
            .inputs
            .iter()
            .map(|s| netlist.wire_name(*s))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(w, "{} = {}({})", netlist.wire_name(c.output), c.kind, ins)?;
    }
    Ok(())
}
