//! ELF32 header, section header, and symbol records.

use crate::constants::*;
use crate::reader::ByteReader;
use crate::{ElfError, Result};

/// ELF32 file header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElfHeader {
    pub ident: [u8; EI_NIDENT],
    pub e_type: u16,
    pub machine: u16,
    pub version: u32,
    pub entry: u32,
    pub phoff: u32,
    pub shoff: u32,
    pub flags: u32,
    pub ehsize: u16,
    pub phentsize: u16,
    pub phnum: u16,
    pub shentsize: u16,
    pub shnum: u16,
    pub shstrndx: u16,
}

impl ElfHeader {
    /// Parse the 52-byte header.
    ///
    /// The magic is checked before any other field is decoded.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::BadMagic`] if the identification does not start
    /// with `0x7F 'E' 'L' 'F'`, or [`ElfError::Truncated`] if `data` is
    /// shorter than a full header.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);
        let ident: [u8; EI_NIDENT] = r.read_array()?;

        let mut found = [0u8; 4];
        found.copy_from_slice(&ident[..4]);
        if found != ELF_MAGIC {
            return Err(ElfError::BadMagic { found });
        }

        Ok(Self {
            ident,
            e_type: r.read_u16()?,
            machine: r.read_u16()?,
            version: r.read_u32()?,
            entry: r.read_u32()?,
            phoff: r.read_u32()?,
            shoff: r.read_u32()?,
            flags: r.read_u32()?,
            ehsize: r.read_u16()?,
            phentsize: r.read_u16()?,
            phnum: r.read_u16()?,
            shentsize: r.read_u16()?,
            shnum: r.read_u16()?,
            shstrndx: r.read_u16()?,
        })
    }

    /// File class byte (`ELFCLASS32` = 1).
    #[must_use]
    pub const fn class(&self) -> u8 {
        self.ident[EI_CLASS]
    }

    /// Data encoding byte (`ELFDATA2LSB` = 1).
    #[must_use]
    pub const fn data_encoding(&self) -> u8 {
        self.ident[EI_DATA]
    }
}

/// ELF32 section header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionHeader {
    /// Offset of the name in the section-name string table.
    pub name: u32,
    pub sh_type: u32,
    pub flags: u32,
    pub addr: u32,
    pub offset: u32,
    pub size: u32,
    pub link: u32,
    pub info: u32,
    pub addralign: u32,
    pub entsize: u32,
}

impl SectionHeader {
    /// Parse one 40-byte section header record at the reader's position.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Truncated`] if fewer than 40 bytes remain.
    pub fn parse(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            name: r.read_u32()?,
            sh_type: r.read_u32()?,
            flags: r.read_u32()?,
            addr: r.read_u32()?,
            offset: r.read_u32()?,
            size: r.read_u32()?,
            link: r.read_u32()?,
            info: r.read_u32()?,
            addralign: r.read_u32()?,
            entsize: r.read_u32()?,
        })
    }

    #[must_use]
    pub const fn is_executable(&self) -> bool {
        self.flags & SHF_EXECINSTR != 0
    }
}

/// Raw ELF32 symbol table record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Offset of the name in the symbol string table.
    pub name: u32,
    pub value: u32,
    pub size: u32,
    pub info: u8,
    pub other: u8,
    pub shndx: u16,
}

impl SymbolEntry {
    /// Parse one 16-byte symbol record at the reader's position.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Truncated`] if fewer than 16 bytes remain.
    pub fn parse(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            name: r.read_u32()?,
            value: r.read_u32()?,
            size: r.read_u32()?,
            info: r.read_u8()?,
            other: r.read_u8()?,
            shndx: r.read_u16()?,
        })
    }
}

/// Symbol with its name resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// Symbol value (address for functions).
    pub value: u32,
    pub size: u32,
    pub info: u8,
    pub other: u8,
    /// Section index.
    pub shndx: u16,
}

impl Symbol {
    #[must_use]
    pub fn new(name: impl Into<String>, entry: &SymbolEntry) -> Self {
        Self {
            name: name.into(),
            value: entry.value,
            size: entry.size,
            info: entry.info,
            other: entry.other,
            shndx: entry.shndx,
        }
    }

    /// Symbol type (`STT_FUNC`, `STT_OBJECT`, etc.).
    #[must_use]
    pub const fn sym_type(&self) -> u8 {
        self.info & 0xf
    }

    /// Symbol binding (`STB_LOCAL`, `STB_GLOBAL`, etc.).
    #[must_use]
    pub const fn binding(&self) -> u8 {
        self.info >> 4
    }

    #[must_use]
    pub const fn is_function(&self) -> bool {
        self.sym_type() == STT_FUNC
    }
}
