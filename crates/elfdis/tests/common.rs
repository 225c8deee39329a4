//! Shared fixtures: a sample program and temp-file helpers.

use std::io::Write;

use elfdis_elf::test_image::{ImageBuilder, TestSymbol};
use tempfile::NamedTempFile;

/// Load address of the sample program.
pub const TEXT_ADDR: u32 = 0x0804_8080;
/// Address of `main` in the sample program.
pub const MAIN_ADDR: u32 = 0x0804_808c;

/// `_start` calls `main` then exits; `main` returns 0.
pub const SAMPLE_TEXT: &[u8] = &[
    0xE8, 0x07, 0x00, 0x00, 0x00, // call main
    0xB8, 0x01, 0x00, 0x00, 0x00, // mov eax, 0x1
    0xCD, 0x80, // int 0x80
    0x55, // main: push ebp
    0x89, 0xE5, // mov ebp, esp
    0x31, 0xC0, // xor eax, eax
    0x5D, // pop ebp
    0xC3, // ret
];

/// The sample program with `_start` and `main` defined.
pub fn sample() -> ImageBuilder {
    ImageBuilder::new()
        .text(TEXT_ADDR, SAMPLE_TEXT)
        .symbol(TestSymbol::func("_start", TEXT_ADDR))
        .symbol(TestSymbol::func("main", MAIN_ADDR))
}

/// Write `image` to a fresh temporary file.
pub fn write_temp(image: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(image).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}
