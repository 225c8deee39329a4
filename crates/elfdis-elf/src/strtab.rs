//! NUL-terminated string tables.

use std::borrow::Cow;

use crate::{ElfError, Result};

/// Contiguous region of NUL-terminated names, addressed by byte offset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringTable {
    data: Vec<u8>,
}

impl StringTable {
    #[must_use]
    pub const fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw bytes of the name starting at `offset`, without the terminator.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::NameOutOfBounds`] if `offset` is at or past the end
    /// of the table, or [`ElfError::UnterminatedName`] if no NUL byte follows
    /// it within the table.
    pub fn get_bytes(&self, offset: u32) -> Result<&[u8]> {
        let tail = usize::try_from(offset)
            .ok()
            .and_then(|start| self.data.get(start..))
            .filter(|tail| !tail.is_empty())
            .ok_or(ElfError::NameOutOfBounds {
                offset,
                table_size: self.data.len(),
            })?;
        let end = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(ElfError::UnterminatedName { offset })?;
        Ok(&tail[..end])
    }

    /// Name at `offset`; invalid UTF-8 is replaced lossily.
    ///
    /// # Errors
    ///
    /// Same as [`StringTable::get_bytes`].
    pub fn get(&self, offset: u32) -> Result<Cow<'_, str>> {
        self.get_bytes(offset).map(String::from_utf8_lossy)
    }

    /// Whether the name at `offset` is exactly `name`.
    ///
    /// # Errors
    ///
    /// Same as [`StringTable::get_bytes`].
    pub fn matches(&self, offset: u32, name: &str) -> Result<bool> {
        self.get_bytes(offset).map(|bytes| bytes == name.as_bytes())
    }
}
