//! Sorted-pair hashing and inclusion-proof verification.

use optiroll_types::{Hash32, Transaction, keccak256};

/// Parent digest of two children, independent of their order.
#[must_use]
pub fn hash_pair(a: &Hash32, b: &Hash32) -> Hash32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo);
    buf[32..].copy_from_slice(hi);
    keccak256(&buf)
}

/// Fold `proof` onto `leaf` and compare the result with `root`.
#[must_use]
pub fn verify_leaf(leaf: &Hash32, proof: &[Hash32], root: &Hash32) -> bool {
    let computed = proof
        .iter()
        .fold(*leaf, |acc, sibling| hash_pair(&acc, sibling));
    computed == *root
}

/// Check that `transaction` is committed by `root` via `proof`.
#[must_use]
pub fn verify_transaction(transaction: &Transaction, proof: &[Hash32], root: &Hash32) -> bool {
    verify_leaf(&transaction.canonical_hash(), proof, root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_pair_is_symmetric() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_eq!(hash_pair(&a, &b), hash_pair(&b, &a));
    }

    #[test]
    fn hash_pair_orders_smaller_first() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&a);
        buf.extend_from_slice(&b);
        assert_eq!(hash_pair(&b, &a), keccak256(&buf));
    }

    #[test]
    fn empty_proof_means_leaf_is_root() {
        let leaf = [9u8; 32];
        assert!(verify_leaf(&leaf, &[], &leaf));
        assert!(!verify_leaf(&leaf, &[], &[8u8; 32]));
    }

    #[test]
    fn single_step_proof() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let root = hash_pair(&a, &b);
        assert!(verify_leaf(&a, &[b], &root));
        assert!(verify_leaf(&b, &[a], &root));
        assert!(!verify_leaf(&a, &[a], &root));
    }
}
