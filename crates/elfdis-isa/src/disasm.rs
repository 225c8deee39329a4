//! Text rendering of decoded instructions.

use std::fmt;

use crate::Instruction;

/// Byte columns reserved before the mnemonic (the longest x86 instruction).
pub const BYTE_COLUMNS: usize = 15;

/// Space-separated lowercase hex bytes, each followed by a space.
#[must_use]
pub fn format_bytes(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::new(), |mut out, b| {
        let _ = write!(out, "{b:02x} ");
        out
    })
}

impl Instruction {
    /// Mnemonic followed by operands, e.g. `mov eax, ebx`.
    #[must_use]
    pub fn text(&self) -> String {
        if self.operands.is_empty() {
            self.mnemonic.to_string()
        } else {
            format!("{} {}", self.mnemonic, self.operands)
        }
    }
}

/// `address:  bytes<padding>mnemonic operands`
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pad = BYTE_COLUMNS.saturating_sub(self.bytes.len()) * 3;
        write!(
            f,
            "{:08x}:  {}{:pad$}{}",
            self.address,
            format_bytes(&self.bytes),
            "",
            self.text()
        )
    }
}
