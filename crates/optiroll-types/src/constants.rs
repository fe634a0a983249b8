//! System-wide constants for the Optiroll batching engine.

/// Maximum fractional digits accepted on a transfer amount (wei-style 18).
pub const AMOUNT_PRECISION: u32 = 18;

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Default challenge period: 7 days, in seconds.
pub const DEFAULT_CHALLENGE_PERIOD_SECS: u64 = 7 * 24 * 60 * 60;

/// Default bound on a single store call, in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Maximum transactions allowed in a single batch (default).
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10_000;

/// Number of applied batch ids remembered by the settlement guard.
pub const DEFAULT_SETTLEMENT_GUARD_CAPACITY: usize = 100_000;

/// Upper bound on inclusion-proof length accepted from external callers.
/// A tree over `2^64` leaves never needs more siblings than this.
pub const MAX_PROOF_DEPTH: usize = 64;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Optiroll";
