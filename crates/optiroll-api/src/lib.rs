//! # optiroll-api
//!
//! Adapter between the outside world and the settlement engine. Parses and
//! validates wire requests, gates privileged operations through an
//! injected [`Authorizer`], and renders read-only views. Transport wiring
//! (HTTP routes, RPC framing) sits on top of [`RollupService`] and is not
//! part of this crate.
//!
//! Also home to process bootstrap helpers: [`telemetry::init_tracing`] and
//! [`load_config`].

pub mod auth;
pub mod config;
pub mod requests;
pub mod service;
pub mod telemetry;
pub mod views;

pub use auth::{Action, AllowAll, Authorizer, Caller, OperatorAllowlist};
pub use config::load_config;
pub use requests::{
    ChallengeRequest, DepositRequest, RejectRequest, SubmitTransactionsRequest,
    TransactionRequest,
};
pub use service::RollupService;
pub use telemetry::{LogFormat, init_tracing};
pub use views::{AnchorView, BalanceView, BatchView, ChallengeResponse, ProofView, ReceiptView};
