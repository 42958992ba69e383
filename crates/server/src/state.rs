//! Shared application state

use cashout_auth::TokenSigner;
use cashout_workflow::WithdrawalWorkflow;
use std::sync::Arc;

/// Handed to every handler; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<WithdrawalWorkflow>,
    pub signer: Arc<TokenSigner>,
}

impl AppState {
    pub fn new(workflow: WithdrawalWorkflow, signer: TokenSigner) -> Self {
        Self {
            workflow: Arc::new(workflow),
            signer: Arc::new(signer),
        }
    }
}
