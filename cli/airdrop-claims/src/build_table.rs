use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use airdrop_claims::distribution::{build_claim_document, read_allocations};
use airdrop_claims::write_file_atomic;

#[derive(Args, Debug)]
pub struct Cli {
    /// Input file with one `address,amount` pair per line
    #[arg(short, long)]
    input: PathBuf,

    /// Output file for the claim table JSON
    #[arg(short, long)]
    output: PathBuf,
}

pub fn run(cli: Cli) -> Result<()> {
    println!("Reading allocations from {:?}...", cli.input);
    let file = File::open(&cli.input).context("Failed to open input file")?;
    let allocations =
        read_allocations(BufReader::new(file)).context("Failed to read allocations")?;
    println!("Total addresses: {}", allocations.len());

    println!("Building Merkle tree...");
    let document = build_claim_document(&allocations)?;
    println!("Merkle root: {}", document.root);
    println!("Total amount: {}", document.total_amount);

    println!("Writing claim table to {:?}...", cli.output);
    let json = serde_json::to_string_pretty(&document).context("Failed to serialize JSON")?;
    write_file_atomic(&cli.output, &json).context("Failed to write claim table")?;

    println!("Done!");
    Ok(())
}
