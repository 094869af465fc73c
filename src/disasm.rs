//! A minimal disassembler: render one instruction as a single
//! human-readable line, advancing past it. Used by `bajo-run --trace` and
//! useful on its own for inspecting a program without running it.
//!
//! This renders *addresses and literal values*, not operand encodings: it
//! reuses [`crate::decode`] to do the actual field decoding, so what you see
//! here is the same value the VM itself would compute for that operand.

use std::fmt;

use crate::decode;
use crate::error::VmError;
use crate::host::Host;
use crate::opcode::{Opcode, OperandSpec};

/// One decoded instruction, as text. [`fmt::Display`] gives the assembly
/// line; `len` records how many bytes it occupied so a caller (or
/// `bajo-run --trace`) can keep walking the stream.
#[derive(Debug)]
pub struct Disassembled {
    pub pc: u32,
    pub opcode: Opcode,
    pub rmw: bool,
    pub targets: Vec<u32>,
    pub sources: Vec<i32>,
}

impl fmt::Display for Disassembled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}: {:?}", self.pc, self.opcode)?;
        if self.rmw {
            write!(f, ".rmw")?;
        }
        for t in &self.targets {
            write!(f, " ->{t:#x}")?;
        }
        for s in &self.sources {
            write!(f, " {s}")?;
        }
        Ok(())
    }
}

/// Decode one instruction at `*addr` for display purposes, advancing `*addr`
/// past it exactly as [`crate::vm::Vm::step`] would.
pub fn disassemble_one<H: Host>(host: &mut H, addr: &mut u32) -> Result<Disassembled, VmError> {
    let pc = *addr;
    let opcode_byte = host.read(*addr, 1)? as u8;
    *addr += 1;

    let rmw = opcode_byte & 0x80 != 0;
    let opcode = Opcode::from_u8(opcode_byte & 0x7F).ok_or(VmError::UnknownOpcode)?;
    let spec = opcode.opspec();

    let n_targets = match spec.targets {
        OperandSpec::None => 0,
        OperandSpec::Fixed(n) => n as usize,
        OperandSpec::Byte | OperandSpec::Half => 1,
        OperandSpec::Var => unreachable!("no opcode has a variadic target list"),
    };
    let mut targets = Vec::with_capacity(n_targets);
    for _ in 0..n_targets {
        targets.push(decode::decode_destination(host, addr)?);
    }

    let (n_sources, ssize) = match spec.sources {
        OperandSpec::None => (0, 4),
        OperandSpec::Fixed(n) => (n as usize, 4),
        OperandSpec::Byte => (1, 1),
        OperandSpec::Half => (1, 2),
        OperandSpec::Var => {
            let count = decode::decode_source(host, addr, 4)?;
            (count.max(0) as usize, 4)
        }
    };
    let mut sources = Vec::with_capacity(n_sources);
    let mut remaining = n_sources;
    if rmw && remaining > 0 {
        // Displaying RMW's implicit source needs the target address, which
        // for display purposes is just the first decoded target.
        if let Some(&t0) = targets.first() {
            sources.push(host.read(t0, ssize)? as i32);
            remaining -= 1;
        }
    }
    for _ in 0..remaining {
        sources.push(decode::decode_source(host, addr, ssize)?);
    }

    Ok(Disassembled {
        pc,
        opcode,
        rmw,
        targets,
        sources,
    })
}
