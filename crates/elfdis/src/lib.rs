//! elfdis - ELF32 x86 disassembler
//!
//! Reads a 32-bit ELF file, decodes one of its sections with a linear sweep,
//! and marks the instructions at which named symbols start.
//!
//! # Example
//!
//! ```ignore
//! use elfdis::{Disassembly, Elf32File, LookupMode};
//!
//! let file = Elf32File::open("a.out")?;
//! let listing = Disassembly::new(&file, LookupMode::Strict)
//!     .section(".text")
//!     .mark("main")
//!     .run()?;
//! print!("{listing}");
//! ```

// Re-export from sub-crates
pub use elfdis_elf::{
    ByteReader, ByteSource, Elf32File, ElfError, ElfHeader, FileSource, MemorySource,
    SectionHeader, StringTable, Symbol, SymbolEntry, legacy,
};
pub use elfdis_isa::{
    Instruction, LinearSweep, ModRm, OPCODE_TABLE, OpRule, OpcodeEntry, Reg, decode_at,
    disassemble, rule_for,
};

mod correlate;
mod pipeline;

pub use correlate::*;
pub use pipeline::*;

use thiserror::Error;

/// Disassembler errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("ELF error: {0}")]
    Elf(#[from] ElfError),
    #[error("Section not found: {0}")]
    SectionNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
