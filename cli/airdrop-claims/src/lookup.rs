use anyhow::{Context, Result};
use clap::Args;
use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};
use std::path::PathBuf;
use zeroize::Zeroize;

use airdrop_claims::config::{CLAIMS_PATH_ENV, DEFAULT_CLAIMS_PATH};
use airdrop_claims::{hex_encode, parse_address, read_table, verify_claim, Address};

#[derive(Args, Debug)]
pub struct Cli {
    /// Path to the claim table JSON
    #[arg(short = 't', long, env = CLAIMS_PATH_ENV, default_value = DEFAULT_CLAIMS_PATH)]
    table: PathBuf,

    /// Claimer address (hex, with or without 0x prefix)
    #[arg(short, long, required_unless_present = "private_key", conflicts_with = "private_key")]
    address: Option<String>,

    /// Private key of the claimer (hex, with or without 0x prefix).
    /// Use "-" to read it from stdin instead of the command line
    #[arg(short = 'k', long)]
    private_key: Option<String>,

    /// Also check the proof against the table root
    #[arg(long)]
    verify: bool,
}

fn private_key_to_address(signing_key: &SigningKey) -> Address {
    let public_key = signing_key.verifying_key();
    let encoded = public_key.to_encoded_point(false);
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    address
}

fn address_from_private_key(private_key: &str) -> Result<Address> {
    let mut key_str = if private_key == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read private key from stdin")?;
        let trimmed = buffer.trim().to_string();
        buffer.zeroize();
        trimmed
    } else {
        private_key.to_string()
    };

    let result = (|| -> Result<Address> {
        let hex_key = key_str.strip_prefix("0x").unwrap_or(&key_str);
        if hex_key.is_empty() {
            anyhow::bail!("Private key is empty");
        }
        let mut key_bytes = hex::decode(hex_key).context("Invalid private key format")?;
        if key_bytes.len() != 32 {
            let len = key_bytes.len();
            key_bytes.zeroize();
            anyhow::bail!("Invalid private key length: expected 32 bytes, got {}", len);
        }
        let signing_key = SigningKey::from_slice(&key_bytes);
        key_bytes.zeroize();
        Ok(private_key_to_address(&signing_key.context("Invalid private key")?))
    })();

    key_str.zeroize();
    result
}

pub fn run(cli: Cli) -> Result<()> {
    let address = match (&cli.address, &cli.private_key) {
        (Some(address), _) => parse_address(address.trim()).context("Invalid address")?,
        (None, Some(private_key)) => {
            println!("Deriving address from private key...");
            address_from_private_key(private_key)?
        }
        (None, None) => anyhow::bail!("Either --address or --private-key is required"),
    };

    println!("Loading claim table from {:?}...", cli.table);
    let table = read_table(&cli.table)?;

    println!("Looking up {}...", hex_encode(address));
    let record = table.lookup(&address)?;

    println!(
        "{}",
        serde_json::to_string_pretty(record).context("Failed to serialize JSON")?
    );

    if cli.verify {
        if !verify_claim(table.root(), &address, record).context("Malformed claim record")? {
            anyhow::bail!("Proof does not verify against root {}", table.root());
        }
        println!("Proof verified against root {}", table.root());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_key_to_address() {
        let signing_key = SigningKey::from_slice(&[1u8; 32]).unwrap();
        let address = private_key_to_address(&signing_key);
        assert_ne!(address, [0u8; 20]);
    }

    #[test]
    fn test_private_key_to_address_known_vector() {
        // secp256k1 key 0x...01 controls 0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf
        let mut key = [0u8; 32];
        key[31] = 1;
        let signing_key = SigningKey::from_slice(&key).unwrap();
        assert_eq!(
            hex_encode(private_key_to_address(&signing_key)),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_address_from_private_key_accepts_prefix() {
        let key = format!("0x{}", "00".repeat(31) + "01");
        let address = address_from_private_key(&key).unwrap();
        assert_eq!(
            address,
            parse_address("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap()
        );
    }

    #[test]
    fn test_address_from_private_key_rejects_bad_keys() {
        assert!(address_from_private_key("0x").is_err());
        assert!(address_from_private_key("0x1234").is_err());
        assert!(address_from_private_key(&"zz".repeat(32)).is_err());
        // zero is not a valid scalar
        assert!(address_from_private_key(&"00".repeat(32)).is_err());
    }
}
