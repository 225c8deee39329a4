//! Linear-sweep decoder for a small subset of 32-bit x86.
//!
//! Decodes an in-memory byte range in address order, one instruction per
//! step, without following control flow. Only register-direct `ModRM`
//! forms are interpreted; bytes outside the supported opcode set become
//! single-byte `db` pseudo-instructions.

mod decode;
mod disasm;
mod types;

pub use decode::*;
pub use disasm::*;
pub use types::*;

/// Decode `code` as if loaded at `base`.
///
/// This is a convenience wrapper around `LinearSweep::new(code, base).collect()`.
#[must_use]
pub fn disassemble(code: &[u8], base: u32) -> Vec<Instruction> {
    LinearSweep::new(code, base).collect()
}
