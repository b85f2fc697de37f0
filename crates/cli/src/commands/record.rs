//! Record submission and lookup commands.

use super::open_service;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use gichain_chain::RecordSubmission;
use gichain_core::Block;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct SubmitArgs {
    /// JSON file with the record fields ("-" reads stdin)
    #[arg(short, long)]
    file: PathBuf,
}

#[derive(Args)]
pub struct ProductArgs {
    /// Product id
    product_id: u64,

    /// Show every record for the product, not just the first
    #[arg(long)]
    history: bool,
}

fn read_submission(file: &Path) -> Result<RecordSubmission> {
    let contents = if file == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?
    };
    serde_json::from_str(&contents).context("Record JSON is missing fields or malformed")
}

pub fn submit(args: SubmitArgs, data_dir: &Path) -> Result<()> {
    let submission = read_submission(&args.file)?;
    let service = open_service(data_dir)?;

    let block = service
        .submit_record(&submission)
        .context("Record rejected")?;
    service.ledger().store().flush()?;

    println!("{}  Record appended", "✓".green().bold());
    println!(
        "    Index:     {}",
        block.sequence_index.to_string().bright_cyan()
    );
    println!("    Hash:      {}", block.hash.to_hex().bright_yellow());
    println!("    Prev Hash: {}", prev_hash_display(&block).bright_black());
    Ok(())
}

pub fn list(data_dir: &Path, count: u64) -> Result<()> {
    let service = open_service(data_dir)?;
    let blocks = service.ledger().recent(count)?;

    println!();
    println!("{}", "Recent Records:".bold().cyan());
    println!();
    print_summaries(&blocks);
    println!();
    Ok(())
}

pub fn show(data_dir: &Path, index: u64) -> Result<()> {
    let service = open_service(data_dir)?;
    let block = service
        .ledger()
        .get_by_sequence_index(index)?
        .with_context(|| format!("Record #{} not found", index))?;
    print_block(&block);
    Ok(())
}

pub fn by_tag(data_dir: &Path, tag_id: &str) -> Result<()> {
    let service = open_service(data_dir)?;
    let blocks = service.get_records_by_tag(tag_id)?;

    println!();
    println!(
        "{} {}",
        "Records for GI tag".bold().cyan(),
        tag_id.bright_yellow()
    );
    println!();
    print_summaries(&blocks);
    println!();
    Ok(())
}

pub fn product(args: ProductArgs, data_dir: &Path) -> Result<()> {
    let service = open_service(data_dir)?;
    if args.history {
        let blocks = service.get_product_history(args.product_id)?;
        println!();
        println!(
            "{} {}",
            "Ownership trail for product".bold().cyan(),
            args.product_id.to_string().bright_yellow()
        );
        println!();
        print_summaries(&blocks);
        println!();
    } else {
        let block = service.get_record_by_product_id(args.product_id)?;
        print_block(&block);
    }
    Ok(())
}

fn prev_hash_display(block: &Block) -> String {
    match block.prev_hash {
        Some(hash) => hash.to_hex(),
        None => "(genesis)".to_string(),
    }
}

fn print_summaries(blocks: &[Block]) {
    if blocks.is_empty() {
        println!("  {}", "(none)".bright_black());
        return;
    }
    for block in blocks {
        let content = &block.content;
        println!(
            "  {} {} {} {}",
            format!("#{}", block.sequence_index).bright_black(),
            block.hash.short().bright_yellow(),
            content.gi_tag.tag_id.bright_cyan(),
            format!(
                "product {} ({}), owner {}",
                content.product.product_id, content.product.name, content.ownership.ownership_id
            )
            .bright_black()
        );
    }
}

fn print_block(block: &Block) {
    let c = &block.content;
    let end_date = c
        .ownership
        .end_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "open".to_string());

    println!();
    println!("{}", "Record Information:".bold().cyan());
    println!();
    println!(
        "  Index:        {}",
        block.sequence_index.to_string().bright_cyan()
    );
    println!("  Hash:         {}", block.hash.to_hex().bright_yellow());
    println!("  Prev Hash:    {}", prev_hash_display(block).bright_black());
    println!();
    println!("{}", "GI Tag:".bold());
    println!("  Tag ID:       {}", c.gi_tag.tag_id);
    println!("  Created:      {}", c.gi_tag.creation_date);
    println!("{}", "Product:".bold());
    println!("  Product ID:   {}", c.product.product_id);
    println!("  Name:         {}", c.product.name);
    println!("  Origin:       {}", c.product.origin_address);
    println!("{}", "Ownership:".bold());
    println!("  Ownership ID: {}", c.ownership.ownership_id);
    println!("  Period:       {} → {}", c.ownership.start_date, end_date);
    println!("{}", "Transaction:".bold());
    println!("  ID:           {}", c.transaction.transaction_id);
    println!("  Date:         {}", c.transaction.date);
    println!("{}", "Submitted By:".bold());
    println!("  User ID:      {}", c.user.user_id);
    println!("  Name:         {}", c.user.name);
    println!("  Email:        {}", c.user.email);
    println!("  Registered:   {}", c.user.registration_date);
    println!();
}
