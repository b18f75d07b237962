pub mod cli;
pub mod commands;
pub mod easyeda;
pub mod output;

use clap::Parser;
use cli::KicadParts;
use commands::handle_command;
use std::process;

/// Run the kicad-parts CLI application
pub fn run_main() {
    let args = KicadParts::parse();
    if let Err(e) = handle_command(args.command) {
        output::error(e.to_string());
        process::exit(1);
    }
}
