use std::path::PathBuf;

use thiserror::Error;

/// Outcome of a failed claim lookup.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// The request carried something that is not a 20-byte hex address.
    #[error("invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },

    /// The table loaded fine but has no entry for the address.
    #[error("no claim found for address {address}")]
    NotFound { address: String },

    /// The claim table could not be read or parsed.
    #[error(transparent)]
    Unavailable(#[from] TableLoadError),
}

impl ClaimError {
    pub(crate) fn invalid_address(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("failed to read claim table {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse claim table {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of the local claimed-marker store. Never surfaced past
/// [`crate::marker`]'s public helpers.
#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("marker store {} is unreadable: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("marker store {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
