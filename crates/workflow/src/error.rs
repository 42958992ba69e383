//! Workflow errors

use cashout_core::ValidationError;
use cashout_gateway::GatewayError;
use cashout_store::StoreError;
use thiserror::Error;

/// Errors from the withdrawal workflow
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("userId does not match the authenticated user")]
    OwnerMismatch,

    #[error("invalid or already processed withdrawal: {0}")]
    InvalidOrProcessed(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The gateway paid out but the approval could not be recorded
    #[error("Payout for {0} was sent but its approval was not recorded")]
    PayoutNotRecorded(String),
}

impl WorkflowError {
    /// Caller mistakes, as opposed to failures on our side
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WorkflowError::Validation(_)
                | WorkflowError::OwnerMismatch
                | WorkflowError::InvalidOrProcessed(_)
        )
    }
}
