//! # optiroll-commitment
//!
//! **Pure commitment layer**: no side effects, no locks, no I/O.
//!
//! Turns an ordered transaction list into a single root digest and
//! per-transaction inclusion proofs, and checks proofs against a root.
//!
//! ## Hashing rules
//!
//! - Leaf: the transaction's canonical keccak-256 hash
//!   ([`Transaction::canonical_hash`](optiroll_types::Transaction::canonical_hash)).
//! - Parent: `keccak256(min(left, right) || max(left, right))`. Children are
//!   ordered by value, not by position, so a proof is just a list of
//!   sibling digests with no left/right flags.
//! - An odd trailing node is promoted to the next layer unchanged.
//!
//! Because pairs are sorted, swapping two siblings leaves the root
//! unchanged; any reordering that changes which nodes are paired changes it.

pub mod proof;
pub mod tree;

pub use proof::{hash_pair, verify_leaf, verify_transaction};
pub use tree::{CommitmentTree, compute_root};
