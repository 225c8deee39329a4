//! Symbol command.

use std::path::Path;

use elfdis::Elf32File;
use tracing::{error, warn};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `symbol` command.
pub fn cmd_symbol(input: &Path, name: &str) -> i32 {
    let file = match Elf32File::open(input) {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, path = %input.display(), "failed to parse ELF file");
            return EXIT_FAILURE;
        }
    };
    match file.symbol(name) {
        Ok(Some(sym)) => {
            println!(
                "{}: {:#x} (size {}, type {}, bind {}, section {})",
                sym.name,
                sym.value,
                sym.size,
                sym.sym_type(),
                sym.binding(),
                sym.shndx
            );
            EXIT_SUCCESS
        }
        Ok(None) => {
            warn!(symbol = name, "symbol not found");
            EXIT_FAILURE
        }
        Err(e) => {
            error!(error = %e, "symbol lookup failed");
            EXIT_FAILURE
        }
    }
}
