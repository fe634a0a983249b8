//! Build-once, read-many commitment tree.
//!
//! Every node that processes the same ordered transaction list produces the
//! exact same root, so the root can be anchored on the primary ledger and
//! later used to check inclusion proofs.

use optiroll_types::{Hash32, Result, RollupError, Transaction};

use crate::proof::{hash_pair, verify_transaction};

/// A binary hash tree over an ordered list of transactions.
///
/// `layers[0]` holds the leaf digests; each following layer holds the
/// parents of the one below; the last layer holds exactly one node, the
/// root. Layers are never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentTree {
    layers: Vec<Vec<Hash32>>,
}

impl CommitmentTree {
    /// Build the tree over `transactions`, in the given order.
    ///
    /// # Errors
    /// Returns [`RollupError::EmptyInput`] if `transactions` is empty.
    pub fn build(transactions: &[Transaction]) -> Result<Self> {
        let leaves = transactions
            .iter()
            .map(Transaction::canonical_hash)
            .collect();
        Self::from_leaves(leaves)
    }

    /// Build the tree over pre-hashed leaves.
    ///
    /// # Errors
    /// Returns [`RollupError::EmptyInput`] if `leaves` is empty.
    pub fn from_leaves(leaves: Vec<Hash32>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(RollupError::EmptyInput);
        }

        let mut layers = vec![leaves];
        while let Some(current) = layers.last().filter(|layer| layer.len() > 1) {
            let next: Vec<Hash32> = current
                .chunks(2)
                .map(|pair| match pair.get(1) {
                    Some(right) => hash_pair(&pair[0], right),
                    // Odd trailing node moves up unchanged.
                    None => pair[0],
                })
                .collect();
            layers.push(next);
        }

        let tree = Self { layers };
        tracing::debug!(
            leaves = tree.leaf_count(),
            depth = tree.depth(),
            root = hex::encode(tree.root()),
            "Commitment tree built"
        );
        Ok(tree)
    }

    /// The topmost digest.
    #[must_use]
    pub fn root(&self) -> Hash32 {
        // `from_leaves` guarantees a final layer with one node.
        self.layers[self.layers.len() - 1][0]
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Number of hashing layers above the leaves.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    #[must_use]
    pub fn leaves(&self) -> &[Hash32] {
        &self.layers[0]
    }

    /// Sibling path for the leaf at `index`, from the leaf upward.
    ///
    /// A layer where the node was promoted (no sibling) contributes nothing,
    /// so proofs in unbalanced trees can be shorter than [`depth`](Self::depth).
    ///
    /// # Errors
    /// Returns [`RollupError::IndexOutOfRange`] if `index >= leaf_count()`.
    pub fn proof(&self, index: usize) -> Result<Vec<Hash32>> {
        if index >= self.leaf_count() {
            return Err(RollupError::IndexOutOfRange {
                index,
                leaf_count: self.leaf_count(),
            });
        }

        let mut proof = Vec::with_capacity(self.depth());
        let mut idx = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
            if let Some(node) = layer.get(sibling) {
                proof.push(*node);
            }
            idx /= 2;
        }
        Ok(proof)
    }

    /// Proof for the first occurrence of `transaction`, if it is a leaf.
    #[must_use]
    pub fn proof_for(&self, transaction: &Transaction) -> Option<Vec<Hash32>> {
        let leaf = transaction.canonical_hash();
        let index = self.layers[0].iter().position(|l| *l == leaf)?;
        self.proof(index).ok()
    }

    /// Check an inclusion proof against `root`. Pure; needs no tree.
    #[must_use]
    pub fn verify(transaction: &Transaction, proof: &[Hash32], root: &Hash32) -> bool {
        verify_transaction(transaction, proof, root)
    }
}

/// Root over `transactions` without keeping the tree around.
pub fn compute_root(transactions: &[Transaction]) -> Result<Hash32> {
    CommitmentTree::build(transactions).map(|tree| tree.root())
}
