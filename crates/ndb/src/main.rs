//! NDB - Neo Debugger
//!
//! Command-line front end of the NeoVM introspection engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use ndb_common::logging::{self, LogOutput};

mod cmd;
mod interop;

/// Command-line interface for NDB
#[derive(Debug, Parser)]
#[command(name = "ndb")]
#[command(about = "Neo Debugger - Disassembly and source mapping for NeoVM contracts")]
#[command(version)]
pub struct Cli {
    /// Also write debug logs to a rotating file in the temp directory
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Disassemble a compiled script
    Disasm {
        /// Compiled script (.avm)
        script: PathBuf,

        /// Read the script as hex text instead of raw bytes
        #[arg(long)]
        hex: bool,

        /// Configuration file (default: ~/.ndb.toml)
        #[arg(long, env = "NDB_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Show the method and source line active at an address
    Source {
        /// Compiled script (.avm)
        script: PathBuf,

        /// Debug information (.avmdbgnfo JSON)
        debug_info: PathBuf,

        /// Instruction address
        ip: usize,

        /// Read the script as hex text instead of raw bytes
        #[arg(long)]
        hex: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = if cli.log_file { LogOutput::ConsoleAndFile } else { LogOutput::Console };
    logging::init_logging("ndb", output)?;

    match &cli.command {
        Commands::Disasm { script, hex, config } => {
            tracing::debug!(script = %script.display(), "Disassembling");
            cmd::disasm::run(script, *hex, config.as_deref())
        }
        Commands::Source { script, debug_info, ip, hex } => {
            tracing::debug!(script = %script.display(), ip, "Resolving source location");
            cmd::source::run(script, debug_info, *ip, *hex)
        }
    }
}
