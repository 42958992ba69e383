//! Store errors

use cashout_core::{InvalidTransition, WithdrawalStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Withdrawal not found: {0}")]
    NotFound(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    },

    #[error("Corrupt withdrawal row: {0}")]
    Corrupt(String),
}

impl From<InvalidTransition> for StoreError {
    fn from(err: InvalidTransition) -> Self {
        StoreError::InvalidTransition {
            from: err.from,
            to: err.to,
        }
    }
}
