//! The host capability interface.
//!
//! The VM owns no memory of its own; every byte it reads or writes, and
//! every system call it makes, is routed through a [`Host`] implementation
//! supplied by the embedder, as three callbacks (`read`, `write`, `call`).

use crate::error::HostFault;

/// Host-provided memory and function-call services for one [`crate::vm::Vm`].
///
/// A `Host` impl must not re-enter the owning `Vm`'s `step`/`run` from
/// inside any of these methods. There are no suspension points inside a
/// step, and nothing in this crate guards against that reentrancy.
pub trait Host {
    /// Read `len` (1, 2, 3, or 4) little-endian bytes at `addr`, zero-extended
    /// to 32 bits. 3-byte reads are accepted for completeness of the memory
    /// contract even though no opcode ever requests one.
    fn read(&mut self, addr: u32, len: u8) -> Result<u32, HostFault>;

    /// Write the low `len` (1, 2, or 4) bytes of `val`, little-endian, to
    /// `addr`.
    fn write(&mut self, addr: u32, val: u32, len: u8) -> Result<(), HostFault>;

    /// Invoke host function `func`, forwarding `args` and filling as many of
    /// `results` as the function produces (up to `results.len()`, which is
    /// the instruction's target count).
    fn call(&mut self, func: i32, results: &mut [i32], args: &[i32]) -> Result<(), HostFault>;
}
