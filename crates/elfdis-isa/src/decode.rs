//! Opcode table and linear-sweep decoder.

use std::iter::FusedIterator;

use tracing::trace;

use crate::{Instruction, MNEMONIC_DB, ModRm, Reg};

/// How the bytes after an opcode are decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpRule {
    /// No operand bytes.
    NoOperand,
    /// One immediate byte, rendered as hex.
    Imm8,
    /// Signed 8-bit displacement from the next instruction.
    Rel8,
    /// Signed 32-bit displacement from the next instruction.
    Rel32,
    /// `ModRM` byte rendered `rm, reg`.
    RmReg,
    /// `ModRM` byte rendered `reg, rm`.
    RegRm,
    /// Register encoded in the low bits of the opcode, relative to `base`.
    RegInOpcode { base: u8 },
    /// Register in the opcode followed by a 32-bit immediate.
    RegImm32 { base: u8 },
    /// Not in the supported set.
    Unknown,
}

impl OpRule {
    /// Bytes required after the opcode.
    #[must_use]
    pub const fn operand_len(self) -> usize {
        match self {
            Self::NoOperand | Self::RegInOpcode { .. } | Self::Unknown => 0,
            Self::Imm8 | Self::Rel8 | Self::RmReg | Self::RegRm => 1,
            Self::Rel32 | Self::RegImm32 { .. } => 4,
        }
    }
}

/// Decoding rule for one opcode byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpcodeEntry {
    pub mnemonic: &'static str,
    pub rule: OpRule,
}

impl OpcodeEntry {
    const fn new(mnemonic: &'static str, rule: OpRule) -> Self {
        Self { mnemonic, rule }
    }
}

/// Rule for `opcode`.
#[must_use]
pub const fn rule_for(opcode: u8) -> OpcodeEntry {
    use OpRule::{Imm8, NoOperand, RegImm32, RegInOpcode, RegRm, Rel8, Rel32, RmReg, Unknown};

    match opcode {
        0x90 => OpcodeEntry::new("nop", NoOperand),
        0xC3 => OpcodeEntry::new("ret", NoOperand),
        0xCC => OpcodeEntry::new("int3", NoOperand),
        0xCD => OpcodeEntry::new("int", Imm8),
        0xE8 => OpcodeEntry::new("call", Rel32),
        0xE9 => OpcodeEntry::new("jmp", Rel32),
        0xEB => OpcodeEntry::new("jmp", Rel8),
        0x01 => OpcodeEntry::new("add", RmReg),
        0x31 => OpcodeEntry::new("xor", RmReg),
        0x29 => OpcodeEntry::new("sub", RmReg),
        0x89 => OpcodeEntry::new("mov", RmReg),
        0x8B => OpcodeEntry::new("mov", RegRm),
        0x6A => OpcodeEntry::new("push", Imm8),
        0x58..=0x5F => OpcodeEntry::new("pop", RegInOpcode { base: 0x58 }),
        0x40..=0x47 => OpcodeEntry::new("inc", RegInOpcode { base: 0x40 }),
        0x48..=0x4F => OpcodeEntry::new("dec", RegInOpcode { base: 0x48 }),
        0x50..=0x57 => OpcodeEntry::new("push", RegInOpcode { base: 0x50 }),
        0xB8..=0xBF => OpcodeEntry::new("mov", RegImm32 { base: 0xB8 }),
        _ => OpcodeEntry::new(MNEMONIC_DB, Unknown),
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn build_table() -> [OpcodeEntry; 256] {
    let mut table = [OpcodeEntry::new(MNEMONIC_DB, OpRule::Unknown); 256];
    let mut i = 0;
    while i < table.len() {
        table[i] = rule_for(i as u8);
        i += 1;
    }
    table
}

/// Rules for every opcode byte, indexed by opcode.
pub static OPCODE_TABLE: [OpcodeEntry; 256] = build_table();

/// Offset within the decoded range, as a 32-bit address delta.
#[inline]
#[allow(clippy::cast_possible_truncation)]
const fn addr_delta(offset: usize) -> u32 {
    // Addresses live in a 32-bit space and wrap.
    offset as u32
}

fn fallback(code: &[u8], offset: usize, address: u32, opcode: u8) -> Instruction {
    Instruction::new(
        address,
        &code[offset..=offset],
        MNEMONIC_DB,
        format!("{opcode:#x}"),
        None,
    )
}

/// Decode the instruction starting at `code[offset]`, as if `code` were
/// loaded at `base`.
///
/// Returns `None` only when `offset` is past the end of `code`. Forms whose
/// operand bytes would extend past the end decode as a one-byte `db`.
#[must_use]
pub fn decode_at(code: &[u8], offset: usize, base: u32) -> Option<Instruction> {
    let opcode = *code.get(offset)?;
    let address = base.wrapping_add(addr_delta(offset));
    let entry = OPCODE_TABLE[usize::from(opcode)];
    let len = 1 + entry.rule.operand_len();

    let Some(bytes) = offset.checked_add(len).and_then(|end| code.get(offset..end)) else {
        trace!(
            address = format_args!("{address:#x}"),
            opcode = format_args!("{opcode:#04x}"),
            needed = len,
            available = code.len() - offset,
            "truncated instruction, emitting db"
        );
        return Some(fallback(code, offset, address, opcode));
    };
    let ops = &bytes[1..];
    // Operand word of the imm32/rel32 forms, which carry exactly four bytes.
    let word: [u8; 4] = ops.try_into().unwrap_or_default();

    let (operands, target) = match entry.rule {
        OpRule::NoOperand => (String::new(), None),
        OpRule::Imm8 => (format!("{:#x}", ops[0]), None),
        OpRule::Rel8 => {
            let rel = i32::from(i8::from_le_bytes([ops[0]]));
            let target = address.wrapping_add(2).wrapping_add_signed(rel);
            (format!("{target:#x}"), Some(target))
        }
        OpRule::Rel32 => {
            let rel = i32::from_le_bytes(word);
            let target = address.wrapping_add(5).wrapping_add_signed(rel);
            (format!("{target:#x}"), Some(target))
        }
        OpRule::RmReg => {
            let m = ModRm::decode(ops[0]);
            (format!("{}, {}", m.rm, m.reg), None)
        }
        OpRule::RegRm => {
            let m = ModRm::decode(ops[0]);
            (format!("{}, {}", m.reg, m.rm), None)
        }
        OpRule::RegInOpcode { base } => (Reg::from_index(opcode - base).name().to_string(), None),
        OpRule::RegImm32 { base } => {
            let reg = Reg::from_index(opcode - base);
            (format!("{reg}, {:#x}", u32::from_le_bytes(word)), None)
        }
        OpRule::Unknown => (format!("{opcode:#x}"), None),
    };

    Some(Instruction::new(
        address,
        bytes,
        entry.mnemonic,
        operands,
        target,
    ))
}

/// Lazy linear sweep over a byte range.
///
/// Holds only a cursor. A clone continues independently from the same
/// position, and two sweeps over the same input yield identical output.
#[derive(Clone, Debug)]
pub struct LinearSweep<'a> {
    code: &'a [u8],
    base: u32,
    pos: usize,
}

impl<'a> LinearSweep<'a> {
    #[must_use]
    pub const fn new(code: &'a [u8], base: u32) -> Self {
        Self { code, base, pos: 0 }
    }

    /// Offset of the next instruction within the range.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.pos
    }
}

impl Iterator for LinearSweep<'_> {
    type Item = Instruction;

    fn next(&mut self) -> Option<Instruction> {
        let instr = decode_at(self.code, self.pos, self.base)?;
        self.pos += instr.len();
        Some(instr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.code.len().saturating_sub(self.pos);
        (remaining.div_ceil(5), Some(remaining))
    }
}

impl FusedIterator for LinearSweep<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disassemble;

    fn one(code: &[u8], base: u32) -> Instruction {
        let instrs = disassemble(code, base);
        assert_eq!(instrs.len(), 1, "expected one instruction, got {instrs:?}");
        instrs.into_iter().next().unwrap()
    }

    fn text(instr: &Instruction) -> String {
        format!("{} {}", instr.mnemonic, instr.operands)
    }

    #[test]
    fn test_nop_run() {
        let code = [0x90; 16];
        let instrs = disassemble(&code, 0x400);
        assert_eq!(instrs.len(), 16);
        for (i, instr) in instrs.iter().enumerate() {
            assert_eq!(instr.address, 0x400 + u32::try_from(i).unwrap());
            assert_eq!(instr.bytes, [0x90]);
            assert_eq!(instr.mnemonic, "nop");
            assert!(instr.operands.is_empty());
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(disassemble(&[], 0x1000).is_empty());
    }

    #[test]
    fn test_xor_eax_eax() {
        let instr = one(&[0x31, 0xC0], 0x1000);
        assert_eq!(instr.address, 0x1000);
        assert_eq!(instr.mnemonic, "xor");
        assert_eq!(instr.operands, "eax, eax");
        assert_eq!(instr.bytes, [0x31, 0xC0]);
    }

    #[test]
    fn test_modrm_operand_order() {
        // 0xD8 = 11 011 000: reg = ebx, rm = eax
        assert_eq!(text(&one(&[0x01, 0xD8], 0)), "add eax, ebx");
        assert_eq!(text(&one(&[0x29, 0xD8], 0)), "sub eax, ebx");
        assert_eq!(text(&one(&[0x89, 0xD8], 0)), "mov eax, ebx");
        assert_eq!(text(&one(&[0x8B, 0xD8], 0)), "mov ebx, eax");
        // 0xE5 = 11 100 101: mov ebp, esp
        assert_eq!(text(&one(&[0x89, 0xE5], 0)), "mov ebp, esp");
    }

    #[test]
    fn test_memory_modrm_misdecoded_as_register() {
        // mov eax, [ebp+8] is 8B 45 08; only the ModRM byte is consumed.
        let instrs = disassemble(&[0x8B, 0x45, 0x08], 0);
        assert_eq!(instrs.len(), 2);
        assert_eq!(text(&instrs[0]), "mov eax, ebp");
        assert_eq!(instrs[0].len(), 2);
        assert_eq!(text(&instrs[1]), "db 0x8");
    }

    #[test]
    fn test_jmp_rel32_zero() {
        let instr = one(&[0xE9, 0x00, 0x00, 0x00, 0x00], 0x2000);
        assert_eq!(instr.mnemonic, "jmp");
        assert_eq!(instr.operands, "0x2005");
        assert_eq!(instr.target, Some(0x2005));
        assert_eq!(instr.len(), 5);
    }

    #[test]
    fn test_call_rel32_negative() {
        // call -0x10 from 0x1000 -> 0x1000 + 5 - 0x10
        let instr = one(&[0xE8, 0xF0, 0xFF, 0xFF, 0xFF], 0x1000);
        assert_eq!(instr.mnemonic, "call");
        assert_eq!(instr.target, Some(0x0FF5));
        assert_eq!(instr.operands, "0xff5");
    }

    #[test]
    fn test_rel_targets_wrap() {
        let instr = one(&[0xE8, 0x00, 0x00, 0x00, 0x80], 0x10);
        assert_eq!(instr.target, Some(0x10 + 5 + 0x8000_0000));
        let instr = one(&[0xEB, 0x80], 0x10);
        assert_eq!(instr.target, Some(0x12u32.wrapping_sub(0x80)));
    }

    #[test]
    fn test_jmp_rel8() {
        // Infinite loop: jmp to itself.
        let instr = one(&[0xEB, 0xFE], 0x0804_8000);
        assert_eq!(text(&instr), "jmp 0x8048000");
        let instr = one(&[0xEB, 0x05], 0x100);
        assert_eq!(instr.target, Some(0x107));
    }

    #[test]
    fn test_mov_imm32() {
        let instr = one(&[0xB8, 0x05, 0x00, 0x00, 0x00], 0);
        assert_eq!(instr.mnemonic, "mov");
        assert_eq!(instr.operands, "eax, 0x5");
        assert_eq!(instr.len(), 5);

        let instr = one(&[0xBF, 0x78, 0x56, 0x34, 0x12], 0);
        assert_eq!(instr.operands, "edi, 0x12345678");
    }

    #[test]
    fn test_operand_word_byte_order() {
        let instr = one(&[0xB9, 0xFF, 0xFF, 0xFF, 0xFF], 0);
        assert_eq!(instr.operands, "ecx, 0xffffffff");

        // rel32 0x00010203 from 0x2000 -> 0x2005 + 0x10203
        let instr = one(&[0xE9, 0x03, 0x02, 0x01, 0x00], 0x2000);
        assert_eq!(instr.target, Some(0x0001_2208));
        assert_eq!(instr.operands, "0x12208");
    }

    #[test]
    fn test_immediates() {
        assert_eq!(text(&one(&[0xCD, 0x80], 0)), "int 0x80");
        assert_eq!(text(&one(&[0x6A, 0x00], 0)), "push 0x0");
        assert_eq!(text(&one(&[0x6A, 0xFF], 0)), "push 0xff");
    }

    #[test]
    fn test_single_byte_forms() {
        let code = [0xC3, 0xCC, 0x58, 0x5F, 0x40, 0x47, 0x48, 0x4F, 0x50, 0x57];
        let rendered: Vec<_> = disassemble(&code, 0)
            .iter()
            .map(|i| text(i).trim_end().to_string())
            .collect();
        assert_eq!(
            rendered,
            [
                "ret", "int3", "pop eax", "pop edi", "inc eax", "inc edi", "dec eax", "dec edi",
                "push eax", "push edi"
            ]
        );
    }

    #[test]
    fn test_unknown_opcode() {
        let instr = one(&[0x0F], 0);
        assert!(instr.is_fallback());
        assert_eq!(instr.operands, "0xf");
    }

    #[test]
    fn test_exact_fit_decodes() {
        // The operand bytes end exactly at the end of the buffer.
        assert_eq!(one(&[0xE8, 1, 0, 0, 0], 0).mnemonic, "call");
        assert_eq!(one(&[0xB8, 1, 0, 0, 0], 0).mnemonic, "mov");
        assert_eq!(one(&[0xCD, 0x80], 0).mnemonic, "int");
    }

    #[test]
    fn test_truncated_forms_fall_back() {
        // call with only 3 displacement bytes; the rest is swept one by one.
        let instrs = disassemble(&[0xE8, 0x0F, 0x0F, 0x0F], 0x10);
        let rendered: Vec<_> = instrs.iter().map(text).collect();
        assert_eq!(rendered, ["db 0xe8", "db 0xf", "db 0xf", "db 0xf"]);
        assert_eq!(instrs[1].address, 0x11);

        for op in [0xCD, 0xEB, 0x01, 0x31, 0x29, 0x89, 0x8B, 0x6A] {
            let instr = one(&[op], 0);
            assert!(instr.is_fallback(), "{op:#x} should fall back");
            assert_eq!(instr.operands, format!("{op:#x}"));
        }
        // mov r32, imm32 with a short immediate
        let instrs = disassemble(&[0xB9, 0x90, 0x90], 0);
        assert_eq!(instrs[0].operands, "0xb9");
        assert_eq!(instrs.len(), 3);
        assert_eq!(instrs[1].mnemonic, "nop");
    }

    #[test]
    fn test_table_matches_rules() {
        for op in 0..=255u8 {
            assert_eq!(OPCODE_TABLE[usize::from(op)], rule_for(op));
        }
        assert_eq!(rule_for(0x8B).rule, OpRule::RegRm);
        assert_eq!(rule_for(0x0F).rule, OpRule::Unknown);
    }

    #[test]
    fn test_decode_at_past_end() {
        assert!(decode_at(&[0x90], 1, 0).is_none());
        assert!(decode_at(&[0x90], usize::MAX, 0).is_none());
    }

    #[test]
    fn test_sweep_is_restartable() {
        let code = [0x55, 0x89, 0xE5, 0xE8, 0x00, 0x00, 0x00, 0x00, 0x5D, 0xC3, 0xE9];
        let sweep = LinearSweep::new(&code, 0x0804_8000);
        let first: Vec<_> = sweep.clone().collect();
        let second: Vec<_> = sweep.collect();
        assert_eq!(first, second);
        assert_eq!(first, disassemble(&code, 0x0804_8000));
    }

    /// Deterministic xorshift generator for fuzz-style inputs.
    struct XorShift(u64);

    impl XorShift {
        fn next_u64(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }
    }

    fn check_coverage(code: &[u8]) {
        let mut sweep = LinearSweep::new(code, 0xFFFF_FFF0);
        let mut consumed = 0;
        while let Some(instr) = sweep.next() {
            assert!(!instr.is_empty());
            assert!(instr.len() <= 5);
            assert_eq!(instr.address, 0xFFFF_FFF0u32.wrapping_add(addr_delta(consumed)));
            assert_eq!(instr.bytes, code[consumed..consumed + instr.len()]);
            consumed += instr.len();
            assert_eq!(sweep.offset(), consumed);
        }
        assert_eq!(consumed, code.len());
    }

    #[test]
    fn test_coverage_exhaustive_short_inputs() {
        check_coverage(&[]);
        for a in 0..=255u8 {
            check_coverage(&[a]);
            for b in 0..=255u8 {
                check_coverage(&[a, b]);
            }
        }
    }

    #[test]
    fn test_coverage_random_inputs() {
        let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
        for _ in 0..2000 {
            let len = usize::try_from(rng.next_u64() % 64).unwrap();
            let code: Vec<u8> = (0..len).map(|_| rng.next_u64().to_le_bytes()[0]).collect();
            check_coverage(&code);
            assert_eq!(disassemble(&code, 0), disassemble(&code, 0));
        }
    }
}
