//! Sections command.

use std::path::Path;

use elfdis::{Elf32File, FileSource};
use tracing::error;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `sections` command.
pub fn cmd_sections(input: &Path) -> i32 {
    let file = match Elf32File::open(input) {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, path = %input.display(), "failed to parse ELF file");
            return EXIT_FAILURE;
        }
    };
    match print_sections(&file) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!(error = %e, "failed to resolve section names");
            EXIT_FAILURE
        }
    }
}

fn print_sections(file: &Elf32File<FileSource>) -> elfdis::Result<()> {
    let h = file.header();
    println!("ELF Header:");
    println!("  Type:                              {}", h.e_type);
    println!("  Machine:                           {}", h.machine);
    println!("  Version:                           {}", h.version);
    println!("  Entry point address:               {:#x}", h.entry);
    println!("  Program header offset:             {}", h.phoff);
    println!("  Section header offset:             {}", h.shoff);
    println!("  Flags:                             {:#x}", h.flags);
    println!("  Header size:                       {}", h.ehsize);
    println!("  Program header entry size:         {}", h.phentsize);
    println!("  Program header count:              {}", h.phnum);
    println!("  Section header entry size:         {}", h.shentsize);
    println!("  Section header count:              {}", h.shnum);
    println!("  Section name string table index:   {}", h.shstrndx);

    println!();
    println!(
        "  [Nr] {:<18} {:>8} {:>5} {:>8} {:>8} {:>8} {:>4} {:>4} {:>5} {:>4}",
        "Name", "Type", "Flags", "Addr", "Offset", "Size", "Link", "Info", "Align", "EntSz"
    );
    for (i, sh) in file.sections().iter().enumerate() {
        println!(
            "  [{i:>2}] {:<18} {:>8} {:>5x} {:08x} {:08x} {:08x} {:>4} {:>4} {:>5} {:>4}",
            file.section_name(sh)?,
            sh.sh_type,
            sh.flags,
            sh.addr,
            sh.offset,
            sh.size,
            sh.link,
            sh.info,
            sh.addralign,
            sh.entsize,
        );
    }
    Ok(())
}
