pub mod cache;
pub mod claims;
pub mod common;
pub mod config;
pub mod distribution;
pub mod error;
pub mod fingerprint;
pub mod marker;
pub mod merkle;
pub mod server;

pub use cache::ClaimCache;
pub use claims::{read_table, verify_claim, ClaimDocument, ClaimRecord, ClaimTable};
pub use common::{hex_encode, parse_address, write_file_atomic, Address};
pub use error::{ClaimError, MarkerError, TableLoadError};
pub use fingerprint::{generate_fingerprint, hash, Fingerprint};
pub use marker::{has_claimed_before, mark_as_claimed};
