use std::error::Error;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use commands::{export, inspect};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "beamcast", version, about = "Scanned proton plan to simulation source exporter")]
struct Cli {
    /// Increase verbosity (-v for info, -vv for debug).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a plan against a beam model and write per-field simulation
    /// source files.
    Export(export::ExportArgs),
    /// Print an overview of a plan: fields, layers, spot counts, extents.
    Inspect(inspect::InspectArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
    match cli.command {
        Command::Export(args) => export::run(&args),
        Command::Inspect(args) => inspect::run(&args),
    }
}
