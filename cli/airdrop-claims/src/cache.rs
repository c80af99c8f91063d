use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::claims::{ClaimRecord, ClaimTable};
use crate::common::parse_address;
use crate::error::{ClaimError, TableLoadError};

/// Load-once holder for the claim table behind the lookup API.
///
/// The first successful load is kept for the life of the value. A failed load
/// leaves the cache empty, so the next call tries again.
#[derive(Debug)]
pub struct ClaimCache {
    path: PathBuf,
    table: OnceCell<Arc<ClaimTable>>,
}

impl ClaimCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.table.initialized()
    }

    /// Returns the cached table, loading it first if needed. Concurrent first
    /// callers wait on a single load and all observe the same table.
    ///
    /// # Returns
    /// Shared handle to the loaded claim table
    ///
    /// # Errors
    /// The load error if the file cannot be read or parsed. Nothing is cached
    /// in that case.
    pub async fn get_or_load(&self) -> Result<Arc<ClaimTable>, TableLoadError> {
        self.table
            .get_or_try_init(|| load_table(&self.path))
            .await
            .map(Arc::clone)
    }

    /// Resolves the claim for `address`. The address is validated before the
    /// table is touched.
    ///
    /// # Arguments
    /// * `address` - Address as received, with or without `0x`, any case
    ///
    /// # Returns
    /// A copy of the matching claim record
    ///
    /// # Errors
    /// `InvalidAddress` for a malformed address, `Unavailable` if the table
    /// cannot be loaded, `NotFound` if it has no claim for the address
    pub async fn lookup(&self, address: &str) -> Result<ClaimRecord, ClaimError> {
        let parsed = parse_address(address)?;
        let table = self.get_or_load().await?;
        table.lookup(&parsed).cloned().inspect_err(|err| {
            debug!(error = %err, "no claim for address");
        })
    }
}

async fn load_table(path: &Path) -> Result<Arc<ClaimTable>, TableLoadError> {
    let result = match tokio::fs::read(path).await {
        Ok(bytes) => ClaimTable::from_json(&bytes).map_err(|source| TableLoadError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(source) => Err(TableLoadError::Read {
            path: path.to_path_buf(),
            source,
        }),
    };

    match result {
        Ok(table) => {
            info!(
                path = %path.display(),
                claims = table.len(),
                root = %table.root(),
                "loaded claim table"
            );
            Ok(Arc::new(table))
        }
        Err(err) => {
            error!(error = %err, "claim table unavailable");
            Err(err)
        }
    }
}
