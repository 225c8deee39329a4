//! Command implementations.

mod disasm;
mod sections;
mod symbol;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Disasm {
            input,
            section,
            symbols,
            legacy,
        } => disasm::cmd_disasm(input, section, symbols, *legacy),
        Commands::Sections { input } => sections::cmd_sections(input),
        Commands::Symbol { input, name } => symbol::cmd_symbol(input, name),
    }
}
