//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "elfdis")]
#[command(about = "ELF32 x86 disassembler - decodes a section and marks symbol entry points")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default `tracing` directive for the verbosity flags.
    #[must_use]
    pub const fn log_directive(&self) -> &'static str {
        if self.verbose {
            "elfdis=debug"
        } else if self.silent {
            "elfdis=error"
        } else {
            "elfdis=info"
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Disassemble a section
    Disasm {
        /// Input ELF file
        #[arg(value_name = "ELF")]
        input: PathBuf,

        /// Section to decode
        #[arg(long, default_value = ".text")]
        section: String,

        /// Symbol whose first instruction is marked (repeatable)
        #[arg(long = "symbol", default_value = "main")]
        symbols: Vec<String>,

        /// Sentinel lookups: missing sections decode as empty, missing symbols as 0
        #[arg(long)]
        legacy: bool,
    },
    /// Print the file header and section table
    Sections {
        /// Input ELF file
        #[arg(value_name = "ELF")]
        input: PathBuf,
    },
    /// Resolve a symbol's address
    Symbol {
        /// Input ELF file
        #[arg(value_name = "ELF")]
        input: PathBuf,

        /// Symbol name
        name: String,
    },
}
