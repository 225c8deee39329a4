//! ELF32 container reader.
//!
//! Validates the file header, indexes the section table and the section-name
//! string table, and resolves section data, section addresses, and symbol
//! addresses on demand.

mod constants;
mod file;
mod header;
pub mod legacy;
mod reader;
mod source;
mod strtab;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_image;

pub use constants::*;
pub use file::*;
pub use header::*;
pub use reader::ByteReader;
pub use source::*;
pub use strtab::StringTable;

use thiserror::Error;

/// ELF parsing errors.
#[derive(Error, Debug)]
pub enum ElfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid ELF magic number: {found:02x?}")]
    BadMagic { found: [u8; 4] },
    #[error("Section name string table index {index} out of range ({count} sections)")]
    BadStringTableIndex { index: u16, count: usize },
    #[error("Symbol table size {size} is not a multiple of entry size {entry_size}")]
    BadSymbolTable { size: u32, entry_size: u32 },
    #[error("Name offset {offset} outside string table of {table_size} bytes")]
    NameOutOfBounds { offset: u32, table_size: usize },
    #[error("Name at offset {offset} is not NUL-terminated")]
    UnterminatedName { offset: u32 },
    #[error("Read of {needed} bytes at offset {offset} exceeds {available} available bytes")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

impl ElfError {
    /// Whether this error rejects the file's contents (as opposed to failing I/O).
    #[must_use]
    pub const fn is_format_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, ElfError>;
