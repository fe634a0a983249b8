//! Property tests for the commitment tree.
//!
//! Transactions are generated with distinct amounts so that no two leaves
//! collide; the properties below then hold for every input size.

use optiroll_commitment::{CommitmentTree, compute_root};
use optiroll_types::{Address, Transaction};
use proptest::prelude::*;
use rand::{SeedableRng, seq::SliceRandom};
use rust_decimal::Decimal;

fn arb_transactions(max: usize) -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec((any::<[u8; 20]>(), any::<[u8; 20]>()), 1..max).prop_map(|pairs| {
        pairs
            .into_iter()
            .enumerate()
            .map(|(i, (s, r))| Transaction {
                sender: Address::from_bytes(s),
                recipient: Address::from_bytes(r),
                amount: Decimal::from(i as u64 + 1),
            })
            .collect()
    })
}

proptest! {
    /// Same sequence, same root.
    #[test]
    fn root_is_deterministic(txs in arb_transactions(40)) {
        let a = CommitmentTree::build(&txs).unwrap();
        let b = CommitmentTree::build(&txs).unwrap();
        prop_assert_eq!(a.root(), b.root());
    }

    /// Every leaf's proof verifies against the root.
    #[test]
    fn every_proof_verifies(txs in arb_transactions(40)) {
        let tree = CommitmentTree::build(&txs).unwrap();
        let root = tree.root();
        for (i, tx) in txs.iter().enumerate() {
            let proof = tree.proof(i).unwrap();
            prop_assert!(CommitmentTree::verify(tx, &proof, &root), "leaf {}", i);
        }
    }

    /// Changing any field of a transaction breaks its original proof.
    #[test]
    fn mutation_breaks_proof(txs in arb_transactions(24), pick in any::<prop::sample::Index>()) {
        let tree = CommitmentTree::build(&txs).unwrap();
        let root = tree.root();
        let i = pick.index(txs.len());
        let proof = tree.proof(i).unwrap();

        let mut amount = txs[i].clone();
        amount.amount += Decimal::new(1, 2);
        prop_assert!(!CommitmentTree::verify(&amount, &proof, &root));

        let mut sender = txs[i].clone();
        let mut bytes = *sender.sender.as_bytes();
        bytes[0] ^= 0x01;
        sender.sender = Address::from_bytes(bytes);
        prop_assert!(!CommitmentTree::verify(&sender, &proof, &root));

        let mut recipient = txs[i].clone();
        let mut bytes = *recipient.recipient.as_bytes();
        bytes[19] ^= 0x80;
        recipient.recipient = Address::from_bytes(bytes);
        prop_assert!(!CommitmentTree::verify(&recipient, &proof, &root));
    }

    /// Rotating by one always re-pairs the first leaves (for n >= 3), so the
    /// root must change.
    #[test]
    fn repairing_changes_root(txs in arb_transactions(40)) {
        prop_assume!(txs.len() >= 3);
        let mut rotated = txs.clone();
        rotated.rotate_left(1);
        prop_assert_ne!(compute_root(&txs).unwrap(), compute_root(&rotated).unwrap());
    }

    /// Out-of-range indices are rejected, never panic.
    #[test]
    fn out_of_range_index_rejected(txs in arb_transactions(20), extra in 0usize..10) {
        let tree = CommitmentTree::build(&txs).unwrap();
        prop_assert!(tree.proof(txs.len() + extra).is_err());
    }
}

#[test]
fn shuffles_that_change_pairing_change_root() {
    let txs: Vec<Transaction> = (1..=8u64)
        .map(|i| Transaction::dummy(Decimal::from(i)))
        .collect();
    let root = compute_root(&txs).unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let mut shuffled = txs.clone();
        shuffled.shuffle(&mut rng);

        // Leaf pairs as unordered sets. A different set of pairs always
        // changes the root; the same pairs in the same order never do. The
        // same pairs in another order depend on the upper layers, so that
        // case is not asserted.
        let pairs = |v: &[Transaction]| -> Vec<[u64; 2]> {
            v.chunks(2)
                .map(|c| {
                    let mut p = [
                        u64::try_from(c[0].amount.mantissa()).unwrap(),
                        u64::try_from(c[1].amount.mantissa()).unwrap(),
                    ];
                    p.sort_unstable();
                    p
                })
                .collect()
        };
        let (original, candidate) = (pairs(&txs), pairs(&shuffled));
        let sorted = |mut p: Vec<[u64; 2]>| {
            p.sort_unstable();
            p
        };
        if candidate == original {
            assert_eq!(root, compute_root(&shuffled).unwrap());
        } else if sorted(candidate) != sorted(original) {
            assert_ne!(root, compute_root(&shuffled).unwrap());
        }
    }
}

#[test]
fn three_leaf_tree_proves_every_leaf() {
    let txs: Vec<Transaction> = (1..=3u64)
        .map(|i| Transaction::dummy(Decimal::from(i)))
        .collect();
    let tree = CommitmentTree::build(&txs).unwrap();
    assert_eq!(tree.leaf_count(), 3);
    for (i, tx) in txs.iter().enumerate() {
        assert!(CommitmentTree::verify(tx, &tree.proof(i).unwrap(), &tree.root()));
    }
}
