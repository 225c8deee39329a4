//! Disasm command.

use std::path::Path;

use elfdis::{Disassembly, Elf32File, LookupMode};
use tracing::error;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `disasm` command.
pub fn cmd_disasm(input: &Path, section: &str, symbols: &[String], legacy: bool) -> i32 {
    let file = match Elf32File::open(input) {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, path = %input.display(), "failed to parse ELF file");
            return EXIT_FAILURE;
        }
    };

    let mode = if legacy {
        LookupMode::Legacy
    } else {
        LookupMode::Strict
    };
    let request = symbols
        .iter()
        .fold(Disassembly::new(&file, mode).section(section), |req, name| {
            req.mark(name)
        });

    match request.run() {
        Ok(listing) if legacy && listing.instructions.is_empty() => {
            error!(section, "could not find section");
            EXIT_FAILURE
        }
        Ok(listing) => {
            print!("{listing}");
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(error = %e, path = %input.display(), "disassembly failed");
            EXIT_FAILURE
        }
    }
}
