//! Registers and decoded instruction records.

use std::fmt;

/// 32-bit general-purpose register, in x86 encoding order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Reg {
    Eax = 0,
    Ecx = 1,
    Edx = 2,
    Ebx = 3,
    Esp = 4,
    Ebp = 5,
    Esi = 6,
    Edi = 7,
}

/// Register names indexed by encoding.
pub const REG_NAMES: [&str; 8] = ["eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi"];

impl Reg {
    const ALL: [Self; 8] = [
        Self::Eax,
        Self::Ecx,
        Self::Edx,
        Self::Ebx,
        Self::Esp,
        Self::Ebp,
        Self::Esi,
        Self::Edi,
    ];

    /// Register selected by the low three bits of `bits`.
    #[must_use]
    pub const fn from_index(bits: u8) -> Self {
        Self::ALL[(bits & 0x7) as usize]
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        REG_NAMES[self as usize]
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Register operands of a `ModRM` byte, register-direct interpretation only.
///
/// The `mod` bits are ignored, so memory forms decode as register forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModRm {
    pub reg: Reg,
    pub rm: Reg,
}

impl ModRm {
    #[must_use]
    pub const fn decode(byte: u8) -> Self {
        Self {
            reg: Reg::from_index(byte >> 3),
            rm: Reg::from_index(byte),
        }
    }
}

/// One decoded instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Virtual address of the first byte.
    pub address: u32,
    /// Exact bytes consumed (at least one).
    pub bytes: Vec<u8>,
    pub mnemonic: &'static str,
    /// Operand text, empty for operand-less forms.
    pub operands: String,
    /// Resolved destination of a relative call or jump.
    pub target: Option<u32>,
}

impl Instruction {
    #[must_use]
    pub fn new(
        address: u32,
        bytes: &[u8],
        mnemonic: &'static str,
        operands: String,
        target: Option<u32>,
    ) -> Self {
        Self {
            address,
            bytes: bytes.to_vec(),
            mnemonic,
            operands,
            target,
        }
    }

    /// Number of bytes consumed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: every instruction consumes at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Address of the byte after this instruction.
    #[must_use]
    pub fn end_address(&self) -> u32 {
        let len = u32::try_from(self.bytes.len()).unwrap_or(u32::MAX);
        self.address.wrapping_add(len)
    }

    /// Whether this is a `db` pseudo-instruction for an undecoded byte.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.mnemonic == MNEMONIC_DB
    }
}

/// Mnemonic of the single-byte fallback pseudo-instruction.
pub const MNEMONIC_DB: &str = "db";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reg_names() {
        let names: Vec<_> = (0..8).map(|i| Reg::from_index(i).name()).collect();
        assert_eq!(names, REG_NAMES);
        assert_eq!(Reg::from_index(0xF8 | 3), Reg::Ebx);
    }

    #[test]
    fn test_modrm_fields() {
        // 11 000 011 -> reg = eax, rm = ebx
        let m = ModRm::decode(0xC3);
        assert_eq!(m.reg, Reg::Eax);
        assert_eq!(m.rm, Reg::Ebx);
        // 00 101 100: memory form, still read as registers
        let m = ModRm::decode(0x2C);
        assert_eq!(m.reg, Reg::Ebp);
        assert_eq!(m.rm, Reg::Esp);
    }

    #[test]
    fn test_end_address_wraps() {
        let instr = Instruction::new(u32::MAX, &[0x90, 0x90], "nop", String::new(), None);
        assert_eq!(instr.end_address(), 1);
        assert_eq!(instr.len(), 2);
        assert!(!instr.is_fallback());
    }
}
