use anyhow::Result;
use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;

use airdrop_claims::config::{
    ServerConfig, BIND_ADDR_ENV, CLAIMS_PATH_ENV, DEFAULT_BIND_ADDR, DEFAULT_CLAIMS_PATH,
};

#[derive(Args, Debug)]
pub struct Cli {
    /// Path to the claim table JSON
    #[arg(short = 't', long, env = CLAIMS_PATH_ENV, default_value = DEFAULT_CLAIMS_PATH)]
    table: PathBuf,

    /// Address to listen on
    #[arg(short, long, env = BIND_ADDR_ENV, default_value = DEFAULT_BIND_ADDR)]
    bind: SocketAddr,

    /// Load the claim table at startup rather than on the first request
    #[arg(long)]
    preload: bool,
}

pub async fn run(cli: Cli) -> Result<()> {
    airdrop_claims::server::serve(ServerConfig {
        claims_path: cli.table,
        bind_addr: cli.bind,
        preload: cli.preload,
    })
    .await
}
