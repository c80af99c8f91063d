use sha3::{Digest, Keccak256};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::ClaimError;

/// A 20-byte Ethereum account address.
pub type Address = [u8; 20];

/// Parses an Ethereum address from a hex string.
///
/// Accepts exactly 40 hex characters in any casing, with an optional
/// lowercase `0x` prefix. Surrounding whitespace is not stripped, so callers
/// reading from files should trim first.
///
/// # Errors
/// Returns [`ClaimError::InvalidAddress`] if the input does not have that shape.
pub fn parse_address(addr_str: &str) -> Result<Address, ClaimError> {
    let cleaned = addr_str.strip_prefix("0x").unwrap_or(addr_str);
    if cleaned.len() != 40 {
        return Err(ClaimError::invalid_address(
            addr_str,
            format!("expected 40 hex chars, got {}", cleaned.len()),
        ));
    }
    let mut address = [0u8; 20];
    hex::decode_to_slice(cleaned, &mut address)
        .map_err(|e| ClaimError::invalid_address(addr_str, format!("invalid hex encoding: {e}")))?;
    Ok(address)
}

/// Parses a 32-byte hash from a hex string, with or without `0x` prefix.
pub fn parse_hash(hash_str: &str) -> anyhow::Result<[u8; 32]> {
    let cleaned = hash_str.strip_prefix("0x").unwrap_or(hash_str);
    if cleaned.len() != 64 {
        anyhow::bail!(
            "Invalid hash length: expected 64 hex chars, got {}",
            cleaned.len()
        );
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(cleaned, &mut hash)
        .map_err(|e| anyhow::anyhow!("Invalid hex encoding: {}", e))?;
    Ok(hash)
}

/// Renders bytes as lowercase hex with a `0x` prefix.
pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Computes a Keccak256 hash of two 32-byte values concatenated.
pub fn keccak256_hash(left: [u8; 32], right: [u8; 32]) -> [u8; 32] {
    let hash = Keccak256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize();
    hash.into()
}

/// Writes `contents` to `path` through a sibling temp file and a rename, so
/// readers never observe a partially written file.
pub fn write_file_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.sync_all()?;
    std::fs::rename(&temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_with_prefix() {
        let addr = "0x1234567890abcdef1234567890abcdef12345678";
        let result = parse_address(addr).unwrap();
        assert_eq!(result[0], 0x12);
        assert_eq!(result[19], 0x78);
    }

    #[test]
    fn test_parse_address_without_prefix() {
        let addr = "1234567890abcdef1234567890abcdef12345678";
        assert!(parse_address(addr).is_ok());
    }

    #[test]
    fn test_parse_address_is_case_insensitive() {
        let lower = parse_address("0xabcdef0000000000000000000000000000abcdef").unwrap();
        let upper = parse_address("0xABCDEF0000000000000000000000000000ABCDEF").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_parse_address_accepts_zero_address() {
        let addr = "0x0000000000000000000000000000000000000000";
        assert_eq!(parse_address(addr).unwrap(), [0u8; 20]);
    }

    #[test]
    fn test_parse_address_invalid_length() {
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("0x1234567890abcdef1234567890abcdef1234567890").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_parse_address_invalid_hex() {
        let addr = "0xghijklmnopqrstuvwxyz1234567890abcdef1234";
        assert!(parse_address(addr).is_err());
    }

    #[test]
    fn test_parse_address_rejects_surrounding_whitespace() {
        assert!(parse_address(" 0x1234567890abcdef1234567890abcdef12345678").is_err());
    }

    #[test]
    fn test_parse_address_rejects_uppercase_prefix() {
        assert!(parse_address("0X1234567890abcdef1234567890abcdef12345678").is_err());
    }

    #[test]
    fn test_parse_hash() {
        let hash = parse_hash(&hex_encode([7u8; 32])).unwrap();
        assert_eq!(hash, [7u8; 32]);
        assert!(parse_hash("0x11").is_err());
    }

    #[test]
    fn test_keccak256_hash_is_order_sensitive() {
        let left: [u8; 32] = [1u8; 32];
        let right: [u8; 32] = [2u8; 32];
        assert_ne!(keccak256_hash(left, right), keccak256_hash(right, left));
    }

    #[test]
    fn test_write_file_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_file_atomic(&path, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        assert!(!path.with_extension("tmp").exists());
    }
}
