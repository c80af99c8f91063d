//! Claim table model: the JSON document produced by `build-table` and the
//! read-only, address-indexed view served by the lookup API.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::common::{hex_encode, parse_address, parse_hash, Address};
use crate::error::{ClaimError, TableLoadError};
use crate::merkle::{claim_leaf, parse_amount, verify_proof};

/// One eligible address's slot in the distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub index: u64,
    /// Decimal token amount, kept as a string to avoid precision loss.
    pub amount: String,
    pub proof: Vec<String>,
}

/// Claim entries in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimEntries(pub Vec<(String, ClaimRecord)>);

impl Serialize for ClaimEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (address, record) in &self.0 {
            map.serialize_entry(address, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ClaimEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = ClaimEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of address to claim")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, ClaimRecord>()? {
                    entries.push(entry);
                }
                Ok(ClaimEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// On-disk claim table document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDocument {
    pub root: String,
    pub total_amount: String,
    pub claims: ClaimEntries,
}

/// Immutable claim table indexed by normalized address.
#[derive(Debug, Clone)]
pub struct ClaimTable {
    root: String,
    total_amount: String,
    records: Vec<ClaimRecord>,
    by_address: HashMap<Address, usize>,
}

impl ClaimTable {
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let document: ClaimDocument = serde_json::from_slice(bytes)?;
        Ok(Self::from_document(document))
    }

    /// Indexes the document's entries. Keys that are not addresses are skipped,
    /// and among keys differing only in case the first in document order wins.
    pub fn from_document(document: ClaimDocument) -> Self {
        let mut records = Vec::with_capacity(document.claims.0.len());
        let mut by_address = HashMap::with_capacity(document.claims.0.len());

        for (key, record) in document.claims.0 {
            let address = match parse_address(&key) {
                Ok(address) => address,
                Err(err) => {
                    warn!(key = %key, error = %err, "skipping claim with malformed address key");
                    continue;
                }
            };
            if by_address.contains_key(&address) {
                warn!(key = %key, "skipping duplicate claim address");
                continue;
            }
            by_address.insert(address, records.len());
            records.push(record);
        }

        Self {
            root: document.root,
            total_amount: document.total_amount,
            records,
            by_address,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn total_amount(&self) -> &str {
        &self.total_amount
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, address: &Address) -> Option<&ClaimRecord> {
        self.by_address.get(address).map(|&i| &self.records[i])
    }

    /// Looks up the claim for a parsed address.
    ///
    /// # Arguments
    /// * `address` - 20-byte address, already validated by `parse_address`
    ///
    /// # Returns
    /// The claim record for `address`
    ///
    /// # Errors
    /// `ClaimError::NotFound` if the table has no claim for `address`
    pub fn lookup(&self, address: &Address) -> Result<&ClaimRecord, ClaimError> {
        self.get(address).ok_or_else(|| ClaimError::NotFound {
            address: hex_encode(address),
        })
    }
}

/// Reads and parses a claim table synchronously.
///
/// # Arguments
/// * `path` - Path to the claim table JSON
///
/// # Returns
/// The indexed claim table
///
/// # Errors
/// `TableLoadError::Read` if the file cannot be read, `TableLoadError::Parse`
/// if it is not a claim table document
pub fn read_table(path: &Path) -> Result<ClaimTable, TableLoadError> {
    let bytes = std::fs::read(path).map_err(|source| TableLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ClaimTable::from_json(&bytes).map_err(|source| TableLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Checks that `record`'s proof hashes its leaf up to `root`.
///
/// # Arguments
/// * `root` - Merkle root as a 32-byte hex string
/// * `address` - Claimer's address
/// * `record` - Claim record holding the index, amount and proof
///
/// # Returns
/// `true` if the proof leads to `root`
///
/// # Errors
/// If the root, amount or a proof node is malformed
pub fn verify_claim(root: &str, address: &Address, record: &ClaimRecord) -> anyhow::Result<bool> {
    let root = parse_hash(root)?;
    let amount = parse_amount(&record.amount)?;
    let proof = record
        .proof
        .iter()
        .map(|node| parse_hash(node))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let leaf = claim_leaf(record.index, address, amount);
    Ok(verify_proof(leaf, &proof, root))
}
