//! # optiroll-store
//!
//! The persistence boundary of the engine. The core never holds batches or
//! balances as ambient state; it reads and writes them through an injected
//! [`SettlementStore`].
//!
//! - [`SettlementStore`]: the contract (batches, balances, receipts, and an
//!   atomic batch + balances commit used by ledger settlement)
//! - [`InMemoryStore`]: reference implementation with failure injection
//! - [`TimedStore`]: wraps any store and bounds every call with a timeout,
//!   surfacing expiry as `StoreUnavailable`

pub mod memory;
pub mod store;
pub mod timed;

pub use memory::InMemoryStore;
pub use store::{BalanceMap, SettlementStore};
pub use timed::TimedStore;
