//! Synthetic ELF32 images for tests.
//!
//! Layout: header, code section, `.symtab`, `.strtab`, `.shstrtab`, then the
//! section header table.

use crate::constants::*;

/// Symbol record written into `.symtab`.
pub struct TestSymbol {
    pub name: String,
    pub value: u32,
    pub info: u8,
    /// Raw `st_name` to write instead of the interned offset.
    pub name_offset_override: Option<u32>,
}

impl TestSymbol {
    /// Global function symbol.
    #[must_use]
    pub fn func(name: &str, value: u32) -> Self {
        Self {
            name: name.to_string(),
            value,
            info: (STB_GLOBAL << 4) | STT_FUNC,
            name_offset_override: None,
        }
    }
}

/// Builder for a minimal executable image.
pub struct ImageBuilder {
    pub entry: u32,
    pub text_name: String,
    pub text_addr: u32,
    pub text: Vec<u8>,
    pub symbols: Vec<TestSymbol>,
    pub with_symbols: bool,
    pub shstrndx_override: Option<u16>,
    pub symtab_size_adjust: u32,
    pub symtab_entsize: u32,
}

struct Section {
    name: u32,
    sh_type: u32,
    flags: u32,
    addr: u32,
    offset: u32,
    size: u32,
    link: u32,
    entsize: u32,
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn len32(data: &[u8]) -> u32 {
    u32::try_from(data.len()).expect("test image exceeds 4 GiB")
}

/// Append `name` to a string table and return its offset.
fn intern(table: &mut Vec<u8>, name: &str) -> u32 {
    let offset = len32(table);
    table.extend_from_slice(name.as_bytes());
    table.push(0);
    offset
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    /// A `.text` holding a single `ret` at `0x8048080`, no symbols.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entry: 0x0804_8080,
            text_name: TEXT_NAME.to_string(),
            text_addr: 0x0804_8080,
            text: vec![0xC3],
            symbols: Vec::new(),
            with_symbols: true,
            shstrndx_override: None,
            symtab_size_adjust: 0,
            symtab_entsize: 16,
        }
    }

    /// Code section contents and load address; also sets the entry point.
    #[must_use]
    pub fn text(mut self, addr: u32, code: &[u8]) -> Self {
        self.entry = addr;
        self.text_addr = addr;
        self.text = code.to_vec();
        self
    }

    /// Name of the code section.
    #[must_use]
    pub fn text_name(mut self, name: &str) -> Self {
        self.text_name = name.to_string();
        self
    }

    #[must_use]
    pub fn symbol(mut self, symbol: TestSymbol) -> Self {
        self.symbols.push(symbol);
        self
    }

    /// Omit `.symtab` and `.strtab`.
    #[must_use]
    pub const fn without_symbols(mut self) -> Self {
        self.with_symbols = false;
        self
    }

    /// Serialize the image.
    ///
    /// # Panics
    ///
    /// Panics if the image does not fit 32-bit offsets.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut shstrtab = vec![0u8];
        let mut strtab = vec![0u8];
        let mut symtab = vec![0u8; ELF32_SYMBOL_SIZE];
        for sym in &self.symbols {
            let name = sym
                .name_offset_override
                .unwrap_or_else(|| intern(&mut strtab, &sym.name));
            push_u32(&mut symtab, name);
            push_u32(&mut symtab, sym.value);
            push_u32(&mut symtab, 0);
            symtab.push(sym.info);
            symtab.push(0);
            push_u16(&mut symtab, 1);
        }

        let mut body = vec![0u8; ELF32_HEADER_SIZE];
        let mut sections = vec![Section {
            name: 0,
            sh_type: SHT_NULL,
            flags: 0,
            addr: 0,
            offset: 0,
            size: 0,
            link: 0,
            entsize: 0,
        }];

        sections.push(Section {
            name: intern(&mut shstrtab, &self.text_name),
            sh_type: SHT_PROGBITS,
            flags: SHF_ALLOC | SHF_EXECINSTR,
            addr: self.text_addr,
            offset: len32(&body),
            size: len32(&self.text),
            link: 0,
            entsize: 0,
        });
        body.extend_from_slice(&self.text);

        if self.with_symbols {
            let strtab_index =
                u32::try_from(sections.len() + 1).expect("section count fits u32");
            sections.push(Section {
                name: intern(&mut shstrtab, SYMTAB_NAME),
                sh_type: SHT_SYMTAB,
                flags: 0,
                addr: 0,
                offset: len32(&body),
                size: len32(&symtab) + self.symtab_size_adjust,
                link: strtab_index,
                entsize: self.symtab_entsize,
            });
            body.extend_from_slice(&symtab);
            // Backing bytes for an oversized table.
            let padding = usize::try_from(self.symtab_size_adjust).expect("adjust fits usize");
            body.resize(body.len() + padding, 0);

            sections.push(Section {
                name: intern(&mut shstrtab, STRTAB_NAME),
                sh_type: SHT_STRTAB,
                flags: 0,
                addr: 0,
                offset: len32(&body),
                size: len32(&strtab),
                link: 0,
                entsize: 0,
            });
            body.extend_from_slice(&strtab);
        }

        let shstrndx = u16::try_from(sections.len()).expect("section count fits u16");
        let shstr_name = intern(&mut shstrtab, ".shstrtab");
        sections.push(Section {
            name: shstr_name,
            sh_type: SHT_STRTAB,
            flags: 0,
            addr: 0,
            offset: len32(&body),
            size: len32(&shstrtab),
            link: 0,
            entsize: 0,
        });
        body.extend_from_slice(&shstrtab);

        while body.len() % 4 != 0 {
            body.push(0);
        }
        let shoff = len32(&body);
        for s in &sections {
            push_u32(&mut body, s.name);
            push_u32(&mut body, s.sh_type);
            push_u32(&mut body, s.flags);
            push_u32(&mut body, s.addr);
            push_u32(&mut body, s.offset);
            push_u32(&mut body, s.size);
            push_u32(&mut body, s.link);
            push_u32(&mut body, 0);
            push_u32(&mut body, 1);
            push_u32(&mut body, s.entsize);
        }

        let mut header = Vec::with_capacity(ELF32_HEADER_SIZE);
        header.extend_from_slice(&ELF_MAGIC);
        header.extend_from_slice(&[ELF_CLASS_32, ELF_DATA_LSB, 1]);
        header.resize(EI_NIDENT, 0);
        push_u16(&mut header, ET_EXEC);
        push_u16(&mut header, EM_386);
        push_u32(&mut header, 1);
        push_u32(&mut header, self.entry);
        push_u32(&mut header, 0);
        push_u32(&mut header, shoff);
        push_u32(&mut header, 0);
        push_u16(&mut header, 52);
        push_u16(&mut header, 0);
        push_u16(&mut header, 0);
        push_u16(&mut header, 40);
        push_u16(&mut header, u16::try_from(sections.len()).expect("section count fits u16"));
        push_u16(&mut header, self.shstrndx_override.unwrap_or(shstrndx));
        body[..ELF32_HEADER_SIZE].copy_from_slice(&header);
        body
    }
}
