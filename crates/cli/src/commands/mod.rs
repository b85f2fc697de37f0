//! CLI commands module.

use crate::config;
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use gichain_chain::ProvenanceService;
use gichain_storage::BlockStore;
use std::path::Path;

mod init;
mod record;
mod verify;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new ledger
    Init(init::InitArgs),
    /// Submit a provenance record from a JSON file
    Submit(record::SubmitArgs),
    /// List recent records
    List {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        count: u64,
    },
    /// Show one record in full
    Show {
        /// Sequence index of the record
        index: u64,
    },
    /// List records carrying a GI tag
    Tag {
        /// GI tag id
        tag_id: String,
    },
    /// Look up a product
    Product(record::ProductArgs),
    /// Verify chain integrity
    Verify(verify::VerifyArgs),
    /// Show ledger statistics
    Stats,
}

pub fn run(cmd: Commands, data_dir: &Path) -> Result<()> {
    match cmd {
        Commands::Init(args) => init::run(args, data_dir),
        Commands::Submit(args) => record::submit(args, data_dir),
        Commands::List { count } => record::list(data_dir, count),
        Commands::Show { index } => record::show(data_dir, index),
        Commands::Tag { tag_id } => record::by_tag(data_dir, &tag_id),
        Commands::Product(args) => record::product(args, data_dir),
        Commands::Verify(args) => verify::run(args, data_dir),
        Commands::Stats => verify::stats(data_dir),
    }
}

/// Open the ledger under `data_dir` with its saved config.
fn open_service(data_dir: &Path) -> Result<ProvenanceService<BlockStore>> {
    let ledger_path = config::ledger_path(data_dir);
    if !ledger_path.exists() {
        bail!(
            "No ledger found at {}. Did you run 'gichain init'?",
            ledger_path.display()
        );
    }
    let config = config::load(data_dir)?;
    let store = BlockStore::open(&ledger_path).with_context(|| "Failed to open ledger storage")?;
    ProvenanceService::new(store, &config).context("Invalid ledger configuration")
}
