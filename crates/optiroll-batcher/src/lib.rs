//! # optiroll-batcher
//!
//! Turns client-submitted transactions into immutable, committed batches.
//!
//! ## Flow
//!
//! ```text
//! client tx → PendingPool.push() → PendingPool.seal()
//!     → Batcher.commit_pool() / Batcher.create_batch()
//!     → CommitmentTree root → Batch { status: PENDING } persisted
//! ```
//!
//! Batch creation never checks balances. That happens when the lifecycle
//! engine verifies the batch.

pub mod batcher;
pub mod pending_pool;

pub use batcher::Batcher;
pub use pending_pool::PendingPool;
