use std::net::SocketAddr;
use std::path::PathBuf;

pub const CLAIMS_PATH_ENV: &str = "AIRDROP_CLAIMS_PATH";
pub const DEFAULT_CLAIMS_PATH: &str = "data/claims.json";
pub const BIND_ADDR_ENV: &str = "AIRDROP_BIND_ADDR";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const MARKER_DIR_ENV: &str = "AIRDROP_MARKER_DIR";
pub const DEFAULT_MARKER_DIR: &str = ".airdrop";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub claims_path: PathBuf,
    pub bind_addr: SocketAddr,
    /// Load the table at startup instead of on the first request.
    pub preload: bool,
}
