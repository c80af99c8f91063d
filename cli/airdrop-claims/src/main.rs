#![forbid(unsafe_code)]
#![allow(unreachable_pub)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod build_table;
mod device;
mod lookup;
mod serve;

#[derive(Parser, Debug)]
#[command(name = "airdrop")]
#[command(about = "Airdrop claim tables, claim lookups and device fingerprints", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the claim table from an allocation list
    BuildTable(build_table::Cli),
    /// Look up an address's claim in a claim table
    Lookup(lookup::Cli),
    /// Serve the claim lookup API
    Serve(serve::Cli),
    /// Compute a device fingerprint and manage the claimed marker
    Fingerprint(device::Cli),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::BuildTable(args) => build_table::run(args)?,
        Commands::Lookup(args) => lookup::run(args)?,
        Commands::Serve(args) => serve::run(args).await?,
        Commands::Fingerprint(args) => device::run(args)?,
    }

    Ok(())
}
