//! Sentinel-valued lookups.
//!
//! These fold absence and failure together the way older section dumpers
//! did: an empty payload or an address of 0. Prefer the `Option`-returning
//! methods on [`Elf32File`] unless byte-for-byte output parity is required.

use tracing::debug;

use crate::{ByteSource, Elf32File};

/// Section payload, or an empty vector if the section is absent or unreadable.
#[must_use]
pub fn section_bytes_or_empty<S: ByteSource>(file: &Elf32File<S>, name: &str) -> Vec<u8> {
    file.section_bytes(name)
        .unwrap_or_else(|e| {
            debug!(section = name, error = %e, "section read failed");
            None
        })
        .unwrap_or_default()
}

/// Section address, or 0 if the section is absent.
#[must_use]
pub fn section_address_or_zero<S: ByteSource>(file: &Elf32File<S>, name: &str) -> u32 {
    file.section_address(name).ok().flatten().unwrap_or(0)
}

/// Symbol value, or 0 if the symbol or symbol table is absent or unreadable.
#[must_use]
pub fn symbol_address_or_zero<S: ByteSource>(file: &Elf32File<S>, name: &str) -> u32 {
    file.symbol_address(name)
        .unwrap_or_else(|e| {
            debug!(symbol = name, error = %e, "symbol lookup failed");
            None
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_image::{ImageBuilder, TestSymbol};

    #[test]
    fn test_sentinels() {
        let file = Elf32File::from_bytes(
            ImageBuilder::new()
                .text(0x1000, &[0x90, 0xC3])
                .symbol(TestSymbol::func("main", 0x0804_8080))
                .symbol(TestSymbol::func("at_zero", 0))
                .build(),
        )
        .unwrap();

        assert_eq!(section_bytes_or_empty(&file, ".text"), vec![0x90, 0xC3]);
        assert!(section_bytes_or_empty(&file, ".bss").is_empty());
        assert_eq!(section_address_or_zero(&file, ".text"), 0x1000);
        assert_eq!(section_address_or_zero(&file, ".bss"), 0);
        assert_eq!(symbol_address_or_zero(&file, "main"), 0x0804_8080);
        assert_eq!(symbol_address_or_zero(&file, "missing"), 0);
        // Indistinguishable from "missing" under sentinel semantics.
        assert_eq!(symbol_address_or_zero(&file, "at_zero"), 0);
    }

    #[test]
    fn test_bad_symbol_table_reads_as_zero() {
        let mut builder = ImageBuilder::new().symbol(TestSymbol::func("main", 0x40));
        builder.symtab_entsize = 0;
        let file = Elf32File::from_bytes(builder.build()).unwrap();
        assert_eq!(symbol_address_or_zero(&file, "main"), 0);
    }
}
