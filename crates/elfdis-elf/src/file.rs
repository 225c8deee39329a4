//! ELF32 container reader.

use std::borrow::Cow;
use std::path::Path;

use tracing::{debug, warn};

use crate::constants::*;
use crate::header::*;
use crate::reader::ByteReader;
use crate::source::{ByteSource, FileSource, MemorySource};
use crate::strtab::StringTable;
use crate::{ElfError, Result};

/// Widen a 32-bit file size or offset to a buffer length.
#[inline]
fn to_len(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Validated ELF32 file.
///
/// Holds the header, the section table, and the section-name string table.
/// Section payloads and the symbol table are read from the source on every
/// query. A value only exists after validation succeeded, and every query
/// takes `&self`, so one instance can be shared across threads when the
/// source is `Sync`.
#[derive(Debug)]
pub struct Elf32File<S: ByteSource = FileSource> {
    source: S,
    header: ElfHeader,
    sections: Vec<SectionHeader>,
    shstrtab: StringTable,
}

impl Elf32File<FileSource> {
    /// Open and validate the ELF file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Io`] if the file cannot be opened or any of the
    /// header, section table, or section-name table cannot be fully read;
    /// [`ElfError::BadMagic`] or [`ElfError::BadStringTableIndex`] if the
    /// file is rejected.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_source(FileSource::new(path.as_ref()))
    }
}

impl Elf32File<MemorySource> {
    /// Validate an in-memory image.
    ///
    /// # Errors
    ///
    /// Same as [`Elf32File::open`].
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_source(MemorySource::new(data))
    }
}

impl<S: ByteSource> Elf32File<S> {
    /// Validate the image behind `source`.
    ///
    /// # Errors
    ///
    /// Same as [`Elf32File::open`].
    pub fn from_source(source: S) -> Result<Self> {
        let raw = source.read_at(0, ELF32_HEADER_SIZE)?;
        let header = ElfHeader::parse(&raw)?;

        if header.class() != ELF_CLASS_32 || header.data_encoding() != ELF_DATA_LSB {
            warn!(
                source = %source.describe(),
                class = header.class(),
                data = header.data_encoding(),
                "not an ELFCLASS32/ELFDATA2LSB file, decoding fields as 32-bit little-endian"
            );
        }
        let count = usize::from(header.shnum);
        if count > 0 && usize::from(header.shentsize) != ELF32_SECTION_HEADER_SIZE {
            warn!(
                shentsize = header.shentsize,
                "unexpected section header entry size, reading 40-byte records"
            );
        }

        let table = source.read_at(
            u64::from(header.shoff),
            count * ELF32_SECTION_HEADER_SIZE,
        )?;
        let mut r = ByteReader::new(&table);
        let sections = (0..count)
            .map(|_| SectionHeader::parse(&mut r))
            .collect::<Result<Vec<_>>>()?;

        let shstr = sections
            .get(usize::from(header.shstrndx))
            .ok_or(ElfError::BadStringTableIndex {
                index: header.shstrndx,
                count,
            })?;
        let shstrtab = StringTable::new(source.read_at(u64::from(shstr.offset), to_len(shstr.size))?);

        debug!(
            source = %source.describe(),
            sections = count,
            shstrndx = header.shstrndx,
            entry = format_args!("{:#x}", header.entry),
            "parsed ELF32 file"
        );

        Ok(Self {
            source,
            header,
            sections,
            shstrtab,
        })
    }

    #[must_use]
    pub const fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// Section table in file order.
    #[must_use]
    pub fn sections(&self) -> &[SectionHeader] {
        &self.sections
    }

    /// Resolve a section's name through the section-name string table.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::NameOutOfBounds`] or [`ElfError::UnterminatedName`]
    /// if the name offset is invalid.
    pub fn section_name(&self, section: &SectionHeader) -> Result<Cow<'_, str>> {
        self.shstrtab.get(section.name)
    }

    /// First section, in file order, whose name is exactly `name`.
    ///
    /// # Errors
    ///
    /// Returns a name error if a section scanned before the match has an
    /// invalid name offset.
    pub fn find_section(&self, name: &str) -> Result<Option<(usize, &SectionHeader)>> {
        for (index, section) in self.sections.iter().enumerate() {
            if self.shstrtab.matches(section.name, name)? {
                return Ok(Some((index, section)));
            }
        }
        Ok(None)
    }

    /// Payload of the named section, freshly read from the source.
    ///
    /// Returns `Ok(None)` if no section has that name. I/O failures are
    /// reported as errors, never folded into absence.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Io`] if the payload cannot be read, or a name error
    /// from the section scan.
    pub fn section_bytes(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let Some((index, section)) = self.find_section(name)? else {
            debug!(section = name, "section not found");
            return Ok(None);
        };
        let data = self
            .source
            .read_at(u64::from(section.offset), to_len(section.size))?;
        debug!(
            section = name,
            index,
            offset = section.offset,
            size = section.size,
            "read section payload"
        );
        Ok(Some(data))
    }

    /// Virtual address of the named section.
    ///
    /// # Errors
    ///
    /// Returns a name error from the section scan.
    pub fn section_address(&self, name: &str) -> Result<Option<u32>> {
        Ok(self.find_section(name)?.map(|(_, section)| section.addr))
    }

    /// Locate `.symtab` and `.strtab` and load the symbol string table.
    ///
    /// Returns `Ok(None)` when either section is missing.
    fn symbol_tables(&self) -> Result<Option<(Vec<SymbolEntry>, StringTable)>> {
        let (Some((_, symtab)), Some((_, strtab))) = (
            self.find_section(SYMTAB_NAME)?,
            self.find_section(STRTAB_NAME)?,
        ) else {
            debug!("no symbol table");
            return Ok(None);
        };

        if symtab.entsize == 0 || symtab.size % symtab.entsize != 0 {
            return Err(ElfError::BadSymbolTable {
                size: symtab.size,
                entry_size: symtab.entsize,
            });
        }
        let count = to_len(symtab.size / symtab.entsize);
        let stride = to_len(symtab.entsize);

        let raw = self
            .source
            .read_at(u64::from(symtab.offset), to_len(symtab.size))?;
        let entries = (0..count)
            .map(|i| SymbolEntry::parse(&mut ByteReader::at(&raw, i * stride)))
            .collect::<Result<Vec<_>>>()?;

        let names = StringTable::new(
            self.source
                .read_at(u64::from(strtab.offset), to_len(strtab.size))?,
        );
        Ok(Some((entries, names)))
    }

    /// All symbols with resolved names, in table order.
    ///
    /// A file without `.symtab`/`.strtab` has no symbols.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::BadSymbolTable`] if the table size is not a
    /// multiple of its entry size, a name error for an invalid name offset,
    /// or [`ElfError::Io`] if the tables cannot be read.
    pub fn symbols(&self) -> Result<Vec<Symbol>> {
        let Some((entries, names)) = self.symbol_tables()? else {
            return Ok(Vec::new());
        };
        entries
            .iter()
            .map(|entry| -> Result<Symbol> { Ok(Symbol::new(names.get(entry.name)?, entry)) })
            .collect()
    }

    /// First symbol, in table order, named exactly `name`.
    ///
    /// # Errors
    ///
    /// Same as [`Elf32File::symbols`].
    pub fn symbol(&self, name: &str) -> Result<Option<Symbol>> {
        let Some((entries, names)) = self.symbol_tables()? else {
            return Ok(None);
        };
        for entry in &entries {
            if names.matches(entry.name, name)? {
                debug!(symbol = name, value = format_args!("{:#x}", entry.value), "resolved symbol");
                return Ok(Some(Symbol::new(name, entry)));
            }
        }
        debug!(symbol = name, "symbol not found");
        Ok(None)
    }

    /// Value of the first symbol named exactly `name`.
    ///
    /// `Some(0)` is a symbol whose value is zero, distinct from `None`.
    ///
    /// # Errors
    ///
    /// Same as [`Elf32File::symbols`].
    pub fn symbol_address(&self, name: &str) -> Result<Option<u32>> {
        Ok(self.symbol(name)?.map(|sym| sym.value))
    }
}
