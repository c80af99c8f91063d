use sha3::{Digest, Keccak256};

use crate::common::{keccak256_hash, Address};

/// Hashes a claim into its Merkle leaf.
///
/// Matches the packed encoding of `(uint256 index, address account, uint256 amount)`
/// used by on-chain distributors.
///
/// # Arguments
/// * `index` - Position of the claim in the distribution
/// * `address` - Claimer's address
/// * `amount` - Token amount in base units
///
/// # Returns
/// The Keccak-256 leaf hash
pub fn claim_leaf(index: u64, address: &Address, amount: u128) -> [u8; 32] {
    let mut index_word = [0u8; 32];
    index_word[24..].copy_from_slice(&index.to_be_bytes());
    let mut amount_word = [0u8; 32];
    amount_word[16..].copy_from_slice(&amount.to_be_bytes());

    let hash = Keccak256::new()
        .chain_update(index_word)
        .chain_update(address)
        .chain_update(amount_word)
        .finalize();
    hash.into()
}

/// Hashes two nodes in ascending byte order, so proofs carry no left/right bits.
///
/// # Arguments
/// * `a` - One child node
/// * `b` - The other child node
///
/// # Returns
/// The parent node, the same for either argument order
pub fn hash_pair(a: [u8; 32], b: [u8; 32]) -> [u8; 32] {
    if a <= b {
        keccak256_hash(a, b)
    } else {
        keccak256_hash(b, a)
    }
}

/// Builds all levels of the tree, leaves first. A trailing odd node is
/// promoted to the next level unchanged.
///
/// # Arguments
/// * `leaves` - Leaf hashes in claim index order
///
/// # Returns
/// Tuple of (all tree levels, root). An empty leaf set has the zero root.
pub fn build_merkle_tree(leaves: Vec<[u8; 32]>) -> (Vec<Vec<[u8; 32]>>, [u8; 32]) {
    let mut tree: Vec<Vec<[u8; 32]>> = vec![leaves];

    while tree.last().map_or(false, |level| level.len() > 1) {
        let level = &tree[tree.len() - 1];
        let next_level: Vec<[u8; 32]> = level
            .chunks(2)
            .map(|chunk| match chunk {
                [left, right] => hash_pair(*left, *right),
                [single] => *single,
                _ => unreachable!("chunks(2) yields one or two nodes"),
            })
            .collect();
        tree.push(next_level);
    }

    let root = tree
        .last()
        .and_then(|level| level.first().copied())
        .unwrap_or([0u8; 32]);

    (tree, root)
}

/// Collects the sibling hashes from the leaf at `leaf_index` up to the root.
///
/// # Arguments
/// * `tree` - Levels as returned by `build_merkle_tree`
/// * `leaf_index` - Index of the leaf to prove
///
/// # Returns
/// Sibling hashes from the leaf level upward
///
/// # Errors
/// If the tree is empty or `leaf_index` is out of bounds
pub fn get_merkle_proof(
    tree: &[Vec<[u8; 32]>],
    leaf_index: usize,
) -> anyhow::Result<Vec<[u8; 32]>> {
    if tree.is_empty() {
        anyhow::bail!("Merkle tree is empty");
    }
    if leaf_index >= tree[0].len() {
        anyhow::bail!(
            "Leaf index {} is out of bounds for tree with {} leaves",
            leaf_index,
            tree[0].len()
        );
    }

    let mut proof = Vec::new();
    let mut current_index = leaf_index;

    for level in &tree[..tree.len() - 1] {
        let sibling_index = current_index ^ 1;
        // a promoted node has no sibling at this level
        if sibling_index < level.len() {
            proof.push(level[sibling_index]);
        }
        current_index /= 2;
    }

    Ok(proof)
}

/// Folds `proof` over `leaf` and compares the result with `root`.
///
/// # Arguments
/// * `leaf` - Leaf hash from `claim_leaf`
/// * `proof` - Sibling hashes from the leaf level upward
/// * `root` - Expected Merkle root
///
/// # Returns
/// `true` if the proof leads to `root`
pub fn verify_proof(leaf: [u8; 32], proof: &[[u8; 32]], root: [u8; 32]) -> bool {
    proof.iter().fold(leaf, |node, sibling| hash_pair(node, *sibling)) == root
}

/// Parses an unsigned decimal token amount.
///
/// # Arguments
/// * `amount` - Decimal digits only, no sign or separators
///
/// # Returns
/// The amount as u128
///
/// # Errors
/// If the string is empty, has a non-digit, or overflows u128
pub fn parse_amount(amount: &str) -> anyhow::Result<u128> {
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        anyhow::bail!("Invalid amount {:?}: expected an unsigned decimal integer", amount);
    }
    amount
        .parse::<u128>()
        .map_err(|e| anyhow::anyhow!("Invalid amount {:?}: {}", amount, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{hex_encode, parse_hash};

    fn leaves(n: u8) -> Vec<[u8; 32]> {
        (1..=n).map(|i| [i; 32]).collect()
    }

    #[test]
    fn test_claim_leaf_depends_on_every_field() {
        let address = [9u8; 20];
        let leaf = claim_leaf(0, &address, 100);
        assert_ne!(leaf, claim_leaf(1, &address, 100));
        assert_ne!(leaf, claim_leaf(0, &[8u8; 20], 100));
        assert_ne!(leaf, claim_leaf(0, &address, 101));
    }

    #[test]
    fn test_hash_pair_is_commutative() {
        assert_eq!(hash_pair([1u8; 32], [2u8; 32]), hash_pair([2u8; 32], [1u8; 32]));
    }

    #[test]
    fn test_single_leaf_is_root() {
        let (tree, root) = build_merkle_tree(vec![[5u8; 32]]);
        assert_eq!(tree.len(), 1);
        assert_eq!(root, [5u8; 32]);
        assert!(get_merkle_proof(&tree, 0).unwrap().is_empty());
    }

    #[test]
    fn test_empty_tree_has_zero_root() {
        let (_, root) = build_merkle_tree(Vec::new());
        assert_eq!(root, [0u8; 32]);
    }

    #[test]
    fn test_get_merkle_proof_four_leaves() {
        let (tree, root) = build_merkle_tree(leaves(4));
        assert_eq!(tree.len(), 3);

        let proof = get_merkle_proof(&tree, 0).unwrap();
        assert_eq!(proof.len(), 2);
        assert_eq!(proof[0], [2u8; 32]);
        assert_eq!(proof[1], hash_pair([3u8; 32], [4u8; 32]));
        assert!(verify_proof([1u8; 32], &proof, root));
    }

    #[test]
    fn test_every_leaf_verifies_with_odd_count() {
        let leaves = leaves(7);
        let (tree, root) = build_merkle_tree(leaves.clone());
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = get_merkle_proof(&tree, i).unwrap();
            assert!(verify_proof(*leaf, &proof, root), "leaf {i} failed");
        }
        // the promoted seventh leaf skips the first level
        assert_eq!(get_merkle_proof(&tree, 0).unwrap().len(), 3);
        assert_eq!(get_merkle_proof(&tree, 6).unwrap().len(), 2);
    }

    #[test]
    fn test_verify_proof_rejects_wrong_leaf() {
        let (tree, root) = build_merkle_tree(leaves(4));
        let proof = get_merkle_proof(&tree, 0).unwrap();
        assert!(!verify_proof([9u8; 32], &proof, root));
    }

    #[test]
    fn test_get_merkle_proof_empty_tree() {
        let tree: Vec<Vec<[u8; 32]>> = vec![];
        assert!(get_merkle_proof(&tree, 0).is_err());
    }

    #[test]
    fn test_get_merkle_proof_out_of_bounds() {
        let (tree, _) = build_merkle_tree(leaves(2));
        assert!(get_merkle_proof(&tree, 5).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1500").unwrap(), 1500);
        assert_eq!(parse_amount("0").unwrap(), 0);
        assert!(parse_amount("").is_err());
        assert!(parse_amount("+5").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("1.5").is_err());
        assert!(parse_amount("340282366920938463463374607431768211456").is_err());
    }

    #[test]
    fn test_parse_hash_roundtrips_root() {
        let (_, root) = build_merkle_tree(leaves(3));
        assert_eq!(parse_hash(&hex_encode(root)).unwrap(), root);
    }
}
