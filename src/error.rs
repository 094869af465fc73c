//! VM error codes.
//!
//! Every variant here corresponds to one of the numeric, stable error codes
//! a step can fail with. The numeric projection (`From<VmError> for i32`,
//! `TryFrom<i32> for VmError`) exists for embedders that want a plain
//! integer contract; everything inside this crate works with [`VmError`]
//! directly and propagates it with `?`.

use thiserror::Error;

/// A step-local fault. `Ok(())` from [`crate::vm::Vm::step`] corresponds to
/// a successful step, numbered `0` in the integer contract.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    /// The program executed an `EXIT` opcode. `Vm::exit_rc` holds the value.
    #[error("program exited")]
    Exit,
    /// A varint operand's length tag implied more than 6 bytes.
    #[error("malformed varint operand encoding")]
    BadVarint,
    /// The opcode byte (after stripping the RMW bit) has no opspec entry.
    #[error("unknown opcode")]
    UnknownOpcode,
    /// A decoded operand count/shape violates the opcode's contract: more
    /// than 8 targets or sources, a variadic opcode given zero operands, or
    /// the RMW bit set on an opcode with no target or no source.
    #[error("operand count or shape invalid")]
    BadOperand,
    /// An opspec entry has no matching case in the dispatcher. Indicates an
    /// inconsistency between the opspec table and the executor, never a
    /// reachable outcome for a correctly built table.
    #[error("internal dispatcher inconsistency (opspec without executor case)")]
    Bug,
    /// `DIV`/`DIV_U`/`REM`/`REM_U` by zero, with `VmConfig::err_on_zero_division` set.
    #[error("division by zero")]
    ZeroDivision,
    /// Signed `DIV` of `i32::MIN / -1`, with `VmConfig::err_on_int_overflow` set.
    #[error("signed integer overflow in division")]
    IntegerOverflow,
    /// A host callback reported failure. The payload is the host's own
    /// error code, outside the `1..=7` range reserved by this enum.
    #[error("host callback reported error code {0}")]
    Host(i32),
}

impl From<VmError> for i32 {
    fn from(e: VmError) -> i32 {
        match e {
            VmError::Exit => 1,
            VmError::BadVarint => 2,
            VmError::UnknownOpcode => 3,
            VmError::BadOperand => 4,
            VmError::Bug => 5,
            VmError::ZeroDivision => 6,
            VmError::IntegerOverflow => 7,
            VmError::Host(code) => code,
        }
    }
}

/// The numeric code did not name an error (it was `0`, i.e. `BAJO_OK`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotAnError;

impl TryFrom<i32> for VmError {
    type Error = NotAnError;

    fn try_from(code: i32) -> Result<Self, NotAnError> {
        Ok(match code {
            0 => return Err(NotAnError),
            1 => VmError::Exit,
            2 => VmError::BadVarint,
            3 => VmError::UnknownOpcode,
            4 => VmError::BadOperand,
            5 => VmError::Bug,
            6 => VmError::ZeroDivision,
            7 => VmError::IntegerOverflow,
            other => VmError::Host(other),
        })
    }
}

/// Failure reported by a [`crate::host::Host`] callback. Carries the host's
/// own error code, which the VM wraps in [`VmError::Host`] without
/// interpreting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostFault(pub i32);

impl From<HostFault> for VmError {
    fn from(f: HostFault) -> VmError {
        VmError::Host(f.0)
    }
}
