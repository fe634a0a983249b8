//! # optiroll-settlement
//!
//! **Settlement plane**: the balance ledger, the batch lifecycle state
//! machine, and fraud challenges.
//!
//! ## Architecture
//!
//! [`BatchLifecycle`] receives batch ids (from the primary settlement layer
//! or an operator) and:
//! 1. Serializes all transitions of one batch ([`BatchLocks`])
//! 2. Applies or reverses ledger effects exactly once ([`Ledger`],
//!    [`SettlementGuard`])
//! 3. Verifies challenge proofs against the committed root and asks the
//!    [`FraudPolicy`] whether the batch is fraudulent
//! 4. Appends a receipt for every transition and refused challenge
//! 5. Checks supply conservation on demand ([`SupplyConservation`])
//!
//! Every store call goes through a `TimedStore`, so a slow or offline
//! backend surfaces as `StoreUnavailable` instead of hanging a transition.

pub mod fraud;
pub mod ledger;
pub mod lifecycle;
pub mod locks;
pub mod settlement_guard;
pub mod supply_conservation;

pub use fraud::{DefaultFraudPolicy, FraudKind, FraudPolicy, FraudVerdict};
pub use ledger::Ledger;
pub use lifecycle::{BatchLifecycle, ChallengeOutcome};
pub use locks::{BatchGuard, BatchLocks};
pub use settlement_guard::SettlementGuard;
pub use supply_conservation::SupplyConservation;
