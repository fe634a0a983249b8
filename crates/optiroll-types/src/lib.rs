//! # optiroll-types
//!
//! Shared types, errors, and configuration for the **Optiroll** optimistic
//! batching engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`BatchId`], [`Address`]
//! - **Transaction model**: [`Transaction`], [`Hash32`], [`keccak256`]
//! - **Batch model**: [`Batch`], [`BatchStatus`], [`SettlementAnchor`], [`SettlementEvent`]
//! - **Ledger model**: [`LedgerEntry`]
//! - **Receipt model**: [`Receipt`], [`ReceiptType`]
//! - **Configuration**: [`EngineConfig`]
//! - **Time**: [`Clock`], [`SystemClock`]
//! - **Errors**: [`RollupError`] with `OR_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod batch;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod receipt;
pub mod transaction;

// Re-export all primary types at crate root for ergonomic imports:
//   use optiroll_types::{Batch, BatchStatus, Transaction, ...};

pub use balance::*;
pub use batch::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use receipt::*;
pub use transaction::*;

// Constants are accessed via `optiroll_types::constants::FOO`
// (not re-exported to avoid name collisions).
