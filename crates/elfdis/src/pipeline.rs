//! End-to-end disassembly: section lookup, linear sweep, symbol marking.

use std::fmt;

use tracing::info;

use elfdis_elf::{ByteSource, Elf32File, TEXT_NAME, legacy};
use elfdis_isa::{Instruction, disassemble};

use crate::correlate::{EntryMarks, LookupMode, mark_symbols};
use crate::{Error, Result};

/// Disassembly request for one section of a validated file.
pub struct Disassembly<'f, S: ByteSource> {
    file: &'f Elf32File<S>,
    mode: LookupMode,
    section: String,
    symbols: Vec<String>,
}

impl<'f, S: ByteSource> Disassembly<'f, S> {
    /// Request for `.text` with no symbols marked.
    #[must_use]
    pub fn new(file: &'f Elf32File<S>, mode: LookupMode) -> Self {
        Self {
            file,
            mode,
            section: TEXT_NAME.to_string(),
            symbols: Vec::new(),
        }
    }

    /// Section to decode.
    #[must_use]
    pub fn section(mut self, name: &str) -> Self {
        self.section = name.to_string();
        self
    }

    /// Flag the instruction at which `name` starts.
    #[must_use]
    pub fn mark(mut self, name: &str) -> Self {
        self.symbols.push(name.to_string());
        self
    }

    /// Read, decode, and correlate.
    ///
    /// # Errors
    ///
    /// In [`LookupMode::Strict`], returns [`Error::SectionNotFound`] if the
    /// section is absent and propagates ELF errors. In [`LookupMode::Legacy`]
    /// an absent or unreadable section decodes as empty and nothing fails.
    pub fn run(self) -> Result<Listing> {
        let (code, base) = match self.mode {
            LookupMode::Strict => {
                let code = self
                    .file
                    .section_bytes(&self.section)?
                    .ok_or_else(|| Error::SectionNotFound(self.section.clone()))?;
                let base = self.file.section_address(&self.section)?.unwrap_or(0);
                (code, base)
            }
            LookupMode::Legacy => (
                legacy::section_bytes_or_empty(self.file, &self.section),
                legacy::section_address_or_zero(self.file, &self.section),
            ),
        };

        let instructions = disassemble(&code, base);
        let names: Vec<&str> = self.symbols.iter().map(String::as_str).collect();
        let marks = mark_symbols(self.file, &instructions, &names, self.mode)?;

        info!(
            section = %self.section,
            base = format_args!("{base:#x}"),
            bytes = code.len(),
            instructions = instructions.len(),
            marked = marks.len(),
            "disassembled section"
        );

        Ok(Listing {
            section: self.section,
            base,
            instructions,
            marks,
        })
    }
}

/// Decoded section with symbol start marks.
#[derive(Clone, Debug)]
pub struct Listing {
    pub section: String,
    pub base: u32,
    pub instructions: Vec<Instruction>,
    pub marks: EntryMarks,
}

impl Listing {
    /// Index of the instruction at which `name` starts, if it was marked.
    #[must_use]
    pub fn entry_index(&self, name: &str) -> Option<usize> {
        self.marks
            .indices()
            .into_iter()
            .find(|&i| self.marks.names_at(i).iter().any(|n| n == name))
    }

    /// Total bytes covered by the decoded instructions.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.instructions.iter().map(Instruction::len).sum()
    }
}

/// Marker line printed before a flagged instruction.
#[must_use]
pub fn start_marker(name: &str) -> String {
    format!(">>> {} FUNCTION START <<<", name.to_uppercase())
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Disassembly ({} section):", self.section)?;
        for (index, instr) in self.instructions.iter().enumerate() {
            for name in self.marks.names_at(index) {
                writeln!(f, "{}", start_marker(name))?;
            }
            writeln!(f, "{instr}")?;
        }
        Ok(())
    }
}
