//! Withdrawal workflow logic

use cashout_core::{WithdrawalDraft, WithdrawalRequest, WithdrawalStatus};
use cashout_gateway::{GatewayError, PayoutGateway, PayoutReceipt, PayoutRequest};
use cashout_store::WithdrawalStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::config::{FailurePolicy, ListScope, WorkflowConfig};
use crate::error::WorkflowError;

const MIN_RENEW_PERIOD: Duration = Duration::from_millis(10);

/// A withdrawal that has just been paid out
#[derive(Debug, Clone)]
pub struct ProcessedWithdrawal {
    pub withdrawal: WithdrawalRequest,
    pub receipt: PayoutReceipt,
}

/// Submit / process / list over an injected store and gateway
#[derive(Clone)]
pub struct WithdrawalWorkflow {
    store: Arc<dyn WithdrawalStore>,
    gateway: Arc<dyn PayoutGateway>,
    config: WorkflowConfig,
}

impl WithdrawalWorkflow {
    pub fn new(
        store: Arc<dyn WithdrawalStore>,
        gateway: Arc<dyn PayoutGateway>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn WithdrawalStore> {
        &self.store
    }

    /// Validate and persist a new pending withdrawal on behalf of `caller`.
    ///
    /// A draft without `userId` is attributed to the caller; a draft naming
    /// somebody else is refused.
    pub async fn submit(
        &self,
        caller: &str,
        mut draft: WithdrawalDraft,
    ) -> Result<WithdrawalRequest, WorkflowError> {
        match draft.user_id.as_deref().map(str::trim) {
            Some(user) if !user.is_empty() && user != caller => {
                return Err(WorkflowError::OwnerMismatch);
            }
            _ => draft.user_id = Some(caller.to_string()),
        }

        let new = draft.validate()?;
        let withdrawal = self.store.insert(new).await?;

        tracing::info!(
            withdrawal_id = %withdrawal.id,
            user_id = %withdrawal.user_id,
            amount = %withdrawal.amount,
            method = %withdrawal.payout_method,
            "Withdrawal submitted"
        );
        Ok(withdrawal)
    }

    /// Pay out a pending withdrawal and mark it approved.
    ///
    /// Only one caller can hold the processing claim on a withdrawal, so
    /// concurrent calls for the same id produce a single gateway call. The
    /// claim is renewed while the gateway call runs, however long it takes.
    pub async fn process(&self, id: &str) -> Result<ProcessedWithdrawal, WorkflowError> {
        let withdrawal = self
            .store
            .try_claim(id, self.config.claim_lease)
            .await?
            .ok_or_else(|| WorkflowError::InvalidOrProcessed(id.to_string()))?;

        match self.disburse_holding_claim(&withdrawal).await {
            Ok(receipt) => self.record_approval(withdrawal, receipt).await,
            Err(err) => {
                self.record_failure(&withdrawal, &err).await;
                Err(err.into())
            }
        }
    }

    /// List withdrawals visible to `caller` under the configured scope
    pub async fn list(&self, caller: &str) -> Result<Vec<WithdrawalRequest>, WorkflowError> {
        let withdrawals = match self.config.list_scope {
            ListScope::All => self.store.find_all().await?,
            ListScope::Caller => self.store.find_by_owner(caller).await?,
        };
        Ok(withdrawals)
    }

    async fn disburse_holding_claim(
        &self,
        withdrawal: &WithdrawalRequest,
    ) -> Result<PayoutReceipt, GatewayError> {
        let payout = self.disburse(withdrawal);
        tokio::pin!(payout);

        let period = (self.config.claim_lease / 3).max(MIN_RENEW_PERIOD);
        let mut renew = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        renew.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                result = &mut payout => return result,
                _ = renew.tick() => match self.store.renew_claim(&withdrawal.id).await {
                    Ok(true) => {
                        tracing::debug!(withdrawal_id = %withdrawal.id, "Processing claim renewed");
                    }
                    Ok(false) => {
                        tracing::warn!(withdrawal_id = %withdrawal.id, "Processing claim lost mid-payout");
                    }
                    Err(err) => {
                        tracing::warn!(
                            withdrawal_id = %withdrawal.id,
                            error = %err,
                            "Could not renew processing claim"
                        );
                    }
                },
            }
        }
    }

    async fn disburse(&self, withdrawal: &WithdrawalRequest) -> Result<PayoutReceipt, GatewayError> {
        let bank = self
            .config
            .bank_codes
            .code_for(withdrawal.payout_method)
            .ok_or(GatewayError::MissingBankCode(withdrawal.payout_method))?;

        let request = PayoutRequest::for_withdrawal(withdrawal, &self.config.merchant, bank);

        tracing::info!(
            withdrawal_id = %withdrawal.id,
            gateway = self.gateway.name(),
            bank = %bank,
            "Dispatching payout"
        );
        self.gateway.disburse(&request).await
    }

    async fn record_approval(
        &self,
        withdrawal: WithdrawalRequest,
        receipt: PayoutReceipt,
    ) -> Result<ProcessedWithdrawal, WorkflowError> {
        let id = withdrawal.id.clone();

        // The claim stays in place on failure here: money has left, and a
        // released claim would let another processor pay again.
        match self
            .store
            .compare_and_set_status(&id, WithdrawalStatus::Pending, WithdrawalStatus::Approved)
            .await
        {
            Ok(true) => {
                tracing::info!(
                    withdrawal_id = %id,
                    reference = receipt.reference.as_deref().unwrap_or("-"),
                    "Withdrawal approved"
                );
                Ok(ProcessedWithdrawal {
                    withdrawal: WithdrawalRequest {
                        status: WithdrawalStatus::Approved,
                        ..withdrawal
                    },
                    receipt,
                })
            }
            Ok(false) => {
                tracing::error!(
                    withdrawal_id = %id,
                    reference = receipt.reference.as_deref().unwrap_or("-"),
                    "Payout sent but withdrawal was no longer pending"
                );
                Err(WorkflowError::PayoutNotRecorded(id))
            }
            Err(err) => {
                tracing::error!(
                    withdrawal_id = %id,
                    reference = receipt.reference.as_deref().unwrap_or("-"),
                    error = %err,
                    "Payout sent but approval could not be stored"
                );
                Err(err.into())
            }
        }
    }

    async fn record_failure(&self, withdrawal: &WithdrawalRequest, err: &GatewayError) {
        tracing::warn!(withdrawal_id = %withdrawal.id, error = %err, "Payout failed");

        if self.config.failure_policy == FailurePolicy::MarkFailed && err.is_rejection() {
            match self
                .store
                .compare_and_set_status(&withdrawal.id, WithdrawalStatus::Pending, WithdrawalStatus::Failed)
                .await
            {
                Ok(true) => {
                    tracing::info!(withdrawal_id = %withdrawal.id, "Withdrawal marked failed");
                    return;
                }
                Ok(false) => {}
                Err(store_err) => {
                    tracing::error!(
                        withdrawal_id = %withdrawal.id,
                        error = %store_err,
                        "Could not mark withdrawal failed"
                    );
                }
            }
        }

        if let Err(store_err) = self.store.release_claim(&withdrawal.id).await {
            tracing::error!(
                withdrawal_id = %withdrawal.id,
                error = %store_err,
                "Could not release processing claim"
            );
        }
    }
}
