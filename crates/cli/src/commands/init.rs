//! Initialize ledger command.

use crate::config;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use gichain_chain::{LedgerConfig, VerifyMode};
use gichain_core::{Argon2Config, CredentialHasher};
use gichain_storage::BlockStore;
use std::fs;
use std::path::Path;

#[derive(Args)]
pub struct InitArgs {
    /// Argon2 memory cost in KiB for user password hashes
    #[arg(long, default_value_t = Argon2Config::default().memory_kib)]
    memory_kib: u32,

    /// Argon2 iterations
    #[arg(long, default_value_t = Argon2Config::default().iterations)]
    iterations: u32,

    /// Argon2 parallelism
    #[arg(long, default_value_t = Argon2Config::default().parallelism)]
    parallelism: u32,

    /// Collect every violation by default instead of stopping at the first
    #[arg(long)]
    full_scan: bool,

    /// Overwrite an existing config file
    #[arg(long)]
    force: bool,
}

pub fn run(args: InitArgs, data_dir: &Path) -> Result<()> {
    println!("{}", "Initializing gichain...".bold().cyan());
    println!();

    if config::config_path(data_dir).exists() && !args.force {
        bail!(
            "A ledger is already initialized in {} (use --force to rewrite its config)",
            data_dir.display()
        );
    }

    let argon2 = Argon2Config {
        memory_kib: args.memory_kib,
        iterations: args.iterations,
        parallelism: args.parallelism,
    };
    CredentialHasher::new(argon2).context("Invalid Argon2 parameters")?;

    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
    println!("{}  Created data directory", "✓".green().bold());

    let store = BlockStore::open(config::ledger_path(data_dir))
        .with_context(|| "Failed to open storage")?;
    store.flush()?;
    println!(
        "{}  Opened ledger at: {}",
        "✓".green().bold(),
        config::ledger_path(data_dir).display().to_string().bright_black()
    );

    let ledger_config = LedgerConfig {
        argon2,
        verify_mode: if args.full_scan {
            VerifyMode::FullScan
        } else {
            VerifyMode::FailFast
        },
    };
    let config_file = config::save(data_dir, &ledger_config)?;
    println!(
        "{}  Saved config to: {}",
        "✓".green().bold(),
        config_file.display().to_string().bright_black()
    );

    println!();
    println!("{}", "Ledger initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  • Use {} to append a record",
        "gichain submit --file record.json".bright_cyan()
    );
    println!(
        "  • Use {} to check integrity",
        "gichain verify".bright_cyan()
    );

    Ok(())
}
