//! Authorization capability for privileged operations.
//!
//! The service never decides on its own who may act; it asks the injected
//! [`Authorizer`]. Challenges and queries are open to everyone and are not
//! gated.

use std::collections::HashSet;
use std::fmt;

use optiroll_types::{Result, RollupError};

/// Identity of whoever is calling, as established by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Caller(pub String);

impl Caller {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Privileged actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SubmitTransactions,
    Deposit,
    Finalize,
    Reject,
    /// Relay a verified/finalized signal from the settlement layer.
    SettlementSignal,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubmitTransactions => write!(f, "submit_transactions"),
            Self::Deposit => write!(f, "deposit"),
            Self::Finalize => write!(f, "finalize"),
            Self::Reject => write!(f, "reject"),
            Self::SettlementSignal => write!(f, "settlement_signal"),
        }
    }
}

pub trait Authorizer: Send + Sync {
    /// # Errors
    /// `Unauthorized` if `caller` may not perform `action`.
    fn authorize(&self, caller: &Caller, action: Action) -> Result<()>;
}

/// Permits everything. For single-operator deployments and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _caller: &Caller, _action: Action) -> Result<()> {
        Ok(())
    }
}

/// Permits privileged actions only for listed operators.
#[derive(Debug, Default, Clone)]
pub struct OperatorAllowlist {
    operators: HashSet<String>,
}

impl OperatorAllowlist {
    pub fn new<I, S>(operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operators: operators.into_iter().map(Into::into).collect(),
        }
    }
}

impl Authorizer for OperatorAllowlist {
    fn authorize(&self, caller: &Caller, action: Action) -> Result<()> {
        if self.operators.contains(&caller.0) {
            return Ok(());
        }
        Err(RollupError::Unauthorized {
            reason: format!("{caller} may not {action}"),
        })
    }
}
