//! Offline construction of the claim table from an `address,amount` list.

use std::collections::HashSet;
use std::io::BufRead;

use anyhow::{Context, Result};

use crate::claims::{ClaimDocument, ClaimEntries, ClaimRecord};
use crate::common::{hex_encode, parse_address, Address};
use crate::merkle::{build_merkle_tree, claim_leaf, get_merkle_proof, parse_amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub address: Address,
    pub amount: u128,
}

/// Reads one `address,amount` pair per line. Blank lines and `#` comments
/// are skipped; zero and repeated addresses are rejected.
pub fn read_allocations(reader: impl BufRead) -> Result<Vec<Allocation>> {
    let mut allocations = Vec::new();
    let mut seen = HashSet::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (address, amount) = trimmed.split_once(',').with_context(|| {
            format!(
                "Invalid format at line {}: expected 'address,amount', got '{}'",
                line_num + 1,
                trimmed
            )
        })?;
        let address = parse_address(address.trim())
            .with_context(|| format!("Invalid address at line {}", line_num + 1))?;
        if address == [0u8; 20] {
            anyhow::bail!("Zero address not allowed at line {}", line_num + 1);
        }
        if !seen.insert(address) {
            anyhow::bail!(
                "Duplicate address {} at line {}",
                hex_encode(address),
                line_num + 1
            );
        }
        let amount = parse_amount(amount.trim())
            .with_context(|| format!("Invalid amount at line {}", line_num + 1))?;

        allocations.push(Allocation { address, amount });
    }

    Ok(allocations)
}

/// Builds the claim document: leaf `i` is allocation `i`, and every entry
/// carries its proof against the returned root.
pub fn build_claim_document(allocations: &[Allocation]) -> Result<ClaimDocument> {
    if allocations.is_empty() {
        anyhow::bail!("No allocations to distribute");
    }

    let total = allocations.iter().try_fold(0u128, |total, a| {
        total
            .checked_add(a.amount)
            .context("Total amount overflows 128 bits")
    })?;

    let leaves = allocations
        .iter()
        .enumerate()
        .map(|(index, a)| claim_leaf(index as u64, &a.address, a.amount))
        .collect();
    let (tree, root) = build_merkle_tree(leaves);

    let mut entries = Vec::with_capacity(allocations.len());
    for (index, allocation) in allocations.iter().enumerate() {
        let proof = get_merkle_proof(&tree, index)
            .with_context(|| format!("Failed to generate proof for leaf {}", index))?;
        entries.push((
            hex_encode(allocation.address),
            ClaimRecord {
                index: index as u64,
                amount: allocation.amount.to_string(),
                proof: proof.into_iter().map(hex_encode).collect(),
            },
        ));
    }

    Ok(ClaimDocument {
        root: hex_encode(root),
        total_amount: total.to_string(),
        claims: ClaimEntries(entries),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{verify_claim, ClaimTable};

    const INPUT: &str = "\
# address,amount
0x1111111111111111111111111111111111111111,100

0x2222222222222222222222222222222222222222, 250
3333333333333333333333333333333333333333,1500000000000000000000
0xAbCdEf000000000000000000000000000000AbCd,7
";

    #[test]
    fn test_read_allocations() {
        let allocations = read_allocations(INPUT.as_bytes()).unwrap();
        assert_eq!(allocations.len(), 4);
        assert_eq!(allocations[1].amount, 250);
        assert_eq!(allocations[2].amount, 1_500_000_000_000_000_000_000);
    }

    #[test]
    fn test_read_allocations_rejects_duplicates_in_any_case() {
        let input = "0xabcdef000000000000000000000000000000abcd,1\n0xABCDEF000000000000000000000000000000ABCD,2\n";
        let err = read_allocations(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Duplicate address"));
    }

    #[test]
    fn test_read_allocations_rejects_bad_lines() {
        assert!(read_allocations("0x1111111111111111111111111111111111111111".as_bytes()).is_err());
        assert!(read_allocations("0x1234,5".as_bytes()).is_err());
        assert!(read_allocations(
            "0x0000000000000000000000000000000000000000,5".as_bytes()
        )
        .is_err());
        assert!(read_allocations(
            "0x1111111111111111111111111111111111111111,-5".as_bytes()
        )
        .is_err());
    }

    #[test]
    fn test_built_document_verifies() {
        let allocations = read_allocations(INPUT.as_bytes()).unwrap();
        let document = build_claim_document(&allocations).unwrap();
        assert_eq!(document.total_amount, "1500000000000000000357");

        let json = serde_json::to_vec(&document).unwrap();
        let table = ClaimTable::from_json(&json).unwrap();
        assert_eq!(table.len(), allocations.len());

        for (index, allocation) in allocations.iter().enumerate() {
            let record = table.get(&allocation.address).unwrap();
            assert_eq!(record.index, index as u64);
            assert!(verify_claim(table.root(), &allocation.address, record).unwrap());
        }
    }

    #[test]
    fn test_keys_are_lowercase_hex() {
        let allocations = read_allocations(INPUT.as_bytes()).unwrap();
        let document = build_claim_document(&allocations).unwrap();
        assert_eq!(
            document.claims.0[3].0,
            "0xabcdef000000000000000000000000000000abcd"
        );
    }

    #[test]
    fn test_empty_distribution_is_rejected() {
        assert!(build_claim_document(&[]).is_err());
    }

    #[test]
    fn test_total_overflow_is_rejected() {
        let allocations = [
            Allocation {
                address: [1u8; 20],
                amount: u128::MAX,
            },
            Allocation {
                address: [2u8; 20],
                amount: 1,
            },
        ];
        assert!(build_claim_document(&allocations).is_err());
    }
}
