//! Integrity verification and statistics commands.

use super::open_service;
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use gichain_chain::{VerificationResult, VerifyMode};
use std::path::Path;

#[derive(Args)]
pub struct VerifyArgs {
    /// First sequence index to check
    #[arg(long)]
    from: Option<u64>,

    /// Last sequence index to check (inclusive)
    #[arg(long)]
    to: Option<u64>,

    /// Collect every violation instead of stopping at the first
    #[arg(long, conflicts_with = "fail_fast")]
    full: bool,

    /// Stop at the first violation, overriding the configured mode
    #[arg(long)]
    fail_fast: bool,
}

impl VerifyArgs {
    fn range(&self) -> Option<std::ops::Range<u64>> {
        match (self.from, self.to) {
            (None, None) => None,
            (from, to) => Some(from.unwrap_or(0)..to.map_or(u64::MAX, |t| t.saturating_add(1))),
        }
    }

    fn mode(&self) -> Option<VerifyMode> {
        if self.full {
            Some(VerifyMode::FullScan)
        } else if self.fail_fast {
            Some(VerifyMode::FailFast)
        } else {
            None
        }
    }
}

pub fn run(args: VerifyArgs, data_dir: &Path) -> Result<()> {
    let service = open_service(data_dir)?;
    let range = args.range();
    let result = match args.mode() {
        Some(mode) => service.verify_integrity_with(range, mode)?,
        None => service.verify_integrity(range)?,
    };

    println!();
    match &result {
        VerificationResult::Valid { blocks_checked } => {
            println!(
                "{}  Chain intact ({} records checked)",
                "✓".green().bold(),
                blocks_checked.to_string().bright_cyan()
            );
            println!();
            Ok(())
        }
        VerificationResult::Invalid {
            blocks_checked,
            violations,
        } => {
            println!(
                "{}  Integrity violations found ({} records checked)",
                "✗".red().bold(),
                blocks_checked.to_string().bright_cyan()
            );
            println!();
            for violation in violations {
                println!(
                    "  {} {} {}",
                    format!("#{}", violation.index).bright_black(),
                    violation.kind.name().red(),
                    violation.kind.to_string().bright_black()
                );
            }
            println!();
            bail!("{} integrity violation(s)", violations.len())
        }
    }
}

pub fn stats(data_dir: &Path) -> Result<()> {
    let service = open_service(data_dir)?;
    let stats = service.ledger().stats()?;

    println!();
    println!("{}", "Ledger Statistics:".bold().cyan());
    println!();
    println!(
        "  Records:   {}",
        stats.block_count.to_string().bright_cyan()
    );
    match (stats.tip_index, stats.tip_hash) {
        (Some(index), Some(hash)) => {
            println!("  Tip Index: {}", index.to_string().bright_cyan());
            println!("  Tip Hash:  {}", hash.to_hex().bright_yellow());
        }
        _ => println!("  Tip:       {}", "(empty ledger)".bright_black()),
    }
    println!();
    Ok(())
}
