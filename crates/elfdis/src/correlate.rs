//! Symbol/instruction correlation.

use rustc_hash::FxHashMap;
use tracing::debug;

use elfdis_elf::{ByteSource, Elf32File, legacy};
use elfdis_isa::Instruction;

use crate::Result;

/// How section and symbol lookups report absence and failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LookupMode {
    /// `Option` results; I/O and format errors propagate.
    #[default]
    Strict,
    /// Sentinel results: a missing or unreadable section is empty and a
    /// missing symbol is address 0. Errors are never reported.
    Legacy,
}

/// Index of the instruction that starts exactly at `address`.
///
/// Address 0 is never matched, in any lookup mode.
#[must_use]
pub fn find_entry(instrs: &[Instruction], address: Option<u32>) -> Option<usize> {
    let address = address.filter(|&a| a != 0)?;
    instrs.iter().position(|i| i.address == address)
}

/// Symbol address under `mode`.
///
/// # Errors
///
/// In [`LookupMode::Strict`], propagates symbol table errors.
pub fn resolve_symbol<S: ByteSource>(
    file: &Elf32File<S>,
    name: &str,
    mode: LookupMode,
) -> Result<Option<u32>> {
    Ok(match mode {
        LookupMode::Strict => file.symbol_address(name)?,
        LookupMode::Legacy => Some(legacy::symbol_address_or_zero(file, name)),
    })
}

/// Resolve `name` and return the index of the instruction at its address.
///
/// # Errors
///
/// In [`LookupMode::Strict`], propagates symbol table errors.
pub fn find_symbol_entry<S: ByteSource>(
    file: &Elf32File<S>,
    instrs: &[Instruction],
    name: &str,
    mode: LookupMode,
) -> Result<Option<usize>> {
    let address = resolve_symbol(file, name, mode)?;
    let index = find_entry(instrs, address);
    debug!(
        symbol = name,
        address = ?address,
        index = ?index,
        "correlated symbol"
    );
    Ok(index)
}

/// Instruction indices flagged as symbol starts, with the names starting there.
#[derive(Clone, Debug, Default)]
pub struct EntryMarks {
    marks: FxHashMap<usize, Vec<String>>,
}

impl EntryMarks {
    /// Names of the symbols that start at instruction `index`.
    #[must_use]
    pub fn names_at(&self, index: usize) -> &[String] {
        self.marks.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn is_marked(&self, index: usize) -> bool {
        self.marks.contains_key(&index)
    }

    /// Number of distinct flagged instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Flagged indices in ascending order.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        let mut indices: Vec<_> = self.marks.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    fn insert(&mut self, index: usize, name: &str) {
        self.marks.entry(index).or_default().push(name.to_string());
    }
}

/// Flag the instructions at which each of `names` starts.
///
/// Names whose symbol is absent, valued 0, or not at an instruction boundary
/// inside the decoded range are skipped.
///
/// # Errors
///
/// In [`LookupMode::Strict`], propagates symbol table errors.
pub fn mark_symbols<S: ByteSource>(
    file: &Elf32File<S>,
    instrs: &[Instruction],
    names: &[&str],
    mode: LookupMode,
) -> Result<EntryMarks> {
    let mut by_address: FxHashMap<u32, usize> = FxHashMap::default();
    for (index, instr) in instrs.iter().enumerate() {
        by_address.entry(instr.address).or_insert(index);
    }

    let mut marks = EntryMarks::default();
    for &name in names {
        let address = resolve_symbol(file, name, mode)?;
        match address.filter(|&a| a != 0).and_then(|a| by_address.get(&a)) {
            Some(&index) => marks.insert(index, name),
            None => debug!(symbol = name, address = ?address, "symbol not at an instruction"),
        }
    }
    Ok(marks)
}
