//! The fetch-decode-dispatch loop.
//!
//! A single `step` advances the program counter by one instruction and
//! returns `Result<(), _>`, with `run` looping `step` until it errors. Here
//! "errors" includes the ordinary end of a program (`EXIT`), not just
//! faults, since there is no other way for a `bajo` program to stop.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::decode;
use crate::dispatch::{self, ExecCtx};
use crate::error::VmError;
use crate::host::Host;
use crate::opcode::{Opcode, OperandSpec};

/// Maximum targets or sources a single instruction may carry. Fixed so the
/// per-step operand buffers live on the stack rather than the heap.
pub const MAX_OPERANDS: usize = 8;

/// Runtime-tunable behavior for faults the embedder may want handled either
/// way. Both default to permissive (no error raised).
///
/// Deserializable so the CLI can load it from a TOML config file in
/// addition to its own flags.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Raise [`VmError::ZeroDivision`] on `DIV`/`DIV_U`/`REM`/`REM_U` by
    /// zero instead of producing an implementation-defined result.
    pub err_on_zero_division: bool,
    /// Raise [`VmError::IntegerOverflow`] on signed `DIV` of
    /// `i32::MIN / -1` instead of wrapping to `i32::MIN`.
    pub err_on_int_overflow: bool,
}

/// One bytecode interpreter instance bound to a [`Host`].
pub struct Vm<H: Host> {
    pc: u32,
    exit_rc: i32,
    err: Option<VmError>,
    config: VmConfig,
    host: H,
}

impl<H: Host> Vm<H> {
    pub fn new(host: H, config: VmConfig) -> Self {
        Self {
            pc: 0,
            exit_rc: 0,
            err: None,
            config,
            host,
        }
    }

    /// Reset execution state and set the entry point.
    pub fn init(&mut self, pc: u32) {
        self.pc = pc;
        self.exit_rc = 0;
        self.err = None;
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn exit_rc(&self) -> i32 {
        self.exit_rc
    }

    /// The error from the most recently completed `step`, if any.
    pub fn last_error(&self) -> Option<VmError> {
        self.err
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Execute one instruction.
    ///
    /// Mirrors the reference control loop precisely: clear any pending
    /// error, fetch the opcode, decode targets then sources (honoring the
    /// RMW bit), dispatch, and commit writes only when dispatch didn't
    /// fault. On any error the instruction's side effects beyond `pc`
    /// mutation by a control-transfer opcode are not committed.
    #[instrument(level = "trace", skip(self), fields(pc = self.pc))]
    pub fn step(&mut self) -> Result<(), VmError> {
        self.err = None;
        let result = self.step_inner();
        if let Err(e) = result {
            self.err = Some(e);
            debug!(error = ?e, "step faulted");
        }
        result
    }

    /// Run until a step returns an error (`EXIT` included) and return it.
    pub fn run(&mut self) -> VmError {
        loop {
            if let Err(e) = self.step() {
                return e;
            }
        }
    }

    fn decode_count(&mut self, spec: OperandSpec) -> Result<(usize, u8), VmError> {
        match spec {
            OperandSpec::None => Ok((0, 4)),
            OperandSpec::Fixed(n) => Ok((n as usize, 4)),
            OperandSpec::Byte => Ok((1, 1)),
            OperandSpec::Half => Ok((1, 2)),
            OperandSpec::Var => {
                let count = decode::decode_source(&mut self.host, &mut self.pc, 4)?;
                if !(0..=MAX_OPERANDS as i32).contains(&count) {
                    return Err(VmError::BadOperand);
                }
                Ok((count as usize, 4))
            }
        }
    }

    fn step_inner(&mut self) -> Result<(), VmError> {
        let opcode_byte = self.host.read(self.pc, 1)? as u8;
        self.pc += 1;

        let rmw = opcode_byte & 0x80 != 0;
        let opcode = Opcode::from_u8(opcode_byte & 0x7F).ok_or(VmError::UnknownOpcode)?;
        let spec = opcode.opspec();

        let (n_targets, tsize) = self.decode_count(spec.targets)?;
        let mut target_addrs = [0u32; MAX_OPERANDS];
        for slot in target_addrs.iter_mut().take(n_targets) {
            *slot = decode::decode_destination(&mut self.host, &mut self.pc)?;
        }

        let (n_sources, ssize) = self.decode_count(spec.sources)?;
        if rmw && (n_sources == 0 || n_targets == 0) {
            return Err(VmError::BadOperand);
        }

        let mut sources = [0i32; MAX_OPERANDS];
        let mut next = 0;
        if rmw {
            sources[0] = self.host.read(target_addrs[0], ssize)? as i32;
            next = 1;
        }
        for slot in sources.iter_mut().take(n_sources).skip(next) {
            *slot = decode::decode_source(&mut self.host, &mut self.pc, ssize)?;
        }

        let mut results = [0i32; MAX_OPERANDS];
        let mut ctx = ExecCtx {
            pc: &mut self.pc,
            exit_rc: &mut self.exit_rc,
            err_on_zero_division: self.config.err_on_zero_division,
            err_on_int_overflow: self.config.err_on_int_overflow,
        };
        dispatch::execute(
            &mut ctx,
            &mut self.host,
            opcode,
            &mut results[..n_targets],
            &sources[..n_sources],
        )?;

        for i in 0..n_targets {
            if let Err(e) = self.host.write(target_addrs[i], results[i] as u32, tsize) {
                warn!(addr = target_addrs[i], "host write failed mid-commit");
                return Err(e.into());
            }
        }

        Ok(())
    }
}
