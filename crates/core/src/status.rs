//! Withdrawal status state machine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle state of a withdrawal
///
/// ```text
/// pending ──► approved
///    │
///    └──────► failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    /// Recorded, awaiting disbursement
    Pending,
    /// Payout accepted by the gateway
    Approved,
    /// Payout rejected; a new submission is required
    Failed,
}

/// A transition the state machine does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: WithdrawalStatus,
    pub to: WithdrawalStatus,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Failed => "failed",
        }
    }

    /// Approved and failed withdrawals never change again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WithdrawalStatus::Pending)
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: WithdrawalStatus) -> bool {
        matches!(
            (self, next),
            (WithdrawalStatus::Pending, WithdrawalStatus::Approved)
                | (WithdrawalStatus::Pending, WithdrawalStatus::Failed)
        )
    }

    /// Validate a transition, returning the next status
    pub fn transition(self, next: WithdrawalStatus) -> Result<WithdrawalStatus, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition { from: self, to: next })
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = crate::payout::UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WithdrawalStatus::Pending),
            "approved" => Ok(WithdrawalStatus::Approved),
            "failed" => Ok(WithdrawalStatus::Failed),
            other => Err(crate::payout::UnknownVariant::new("status", other)),
        }
    }
}
