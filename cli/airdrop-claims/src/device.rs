use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use airdrop_claims::config::{DEFAULT_MARKER_DIR, MARKER_DIR_ENV};
use airdrop_claims::fingerprint::{
    generate_fingerprint, HostSignals, ReportedSignals, SignalSource,
};
use airdrop_claims::marker::{has_claimed_before, mark_as_claimed, FileMarkerStore};

#[derive(Args, Debug)]
pub struct Cli {
    /// JSON file with signals reported by a browser; host signals are used if omitted
    #[arg(short, long)]
    signals: Option<PathBuf>,

    /// Directory holding the claimed marker
    #[arg(long, env = MARKER_DIR_ENV, default_value = DEFAULT_MARKER_DIR)]
    marker_dir: PathBuf,

    /// Report whether this device already claimed
    #[arg(long)]
    check: bool,

    /// Record that this device has claimed
    #[arg(long)]
    mark: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    let source: Box<dyn SignalSource> = match &cli.signals {
        Some(path) => {
            let contents = fs::read_to_string(path).context("Failed to read signals file")?;
            Box::new(ReportedSignals::from_json(&contents))
        }
        None => Box::new(HostSignals::detect()),
    };

    println!("{}", generate_fingerprint(source.as_ref()));

    let store = FileMarkerStore::in_dir(&cli.marker_dir);
    if cli.check {
        let claimed = has_claimed_before(&store);
        println!("Claimed before: {}", if claimed { "yes" } else { "no" });
    }
    if cli.mark {
        if mark_as_claimed(&store) && has_claimed_before(&store) {
            println!("Marked as claimed in {:?}", store.path());
        } else {
            println!("Could not save the claimed marker to {:?}", store.path());
        }
    }

    Ok(())
}
