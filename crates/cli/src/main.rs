//! gichain CLI entry point.

use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "gichain")]
#[command(about = "Tamper-evident provenance ledger for GI-tagged products", long_about = None)]
struct Cli {
    /// Directory holding the ledger and its config
    #[arg(short, long, global = true, default_value = "./data")]
    data_dir: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<commands::Commands>,
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(cmd) => {
            if let Err(e) = commands::run(cmd, &cli.data_dir) {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("gichain - Tamper-evident provenance ledger for GI-tagged products");
            println!("Run 'gichain --help' for usage information.");
        }
    }
}
