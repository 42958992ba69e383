//! The store contract shared by every backend

use async_trait::async_trait;
use cashout_core::{NewWithdrawal, WithdrawalRequest, WithdrawalStatus};
use std::time::Duration;

use crate::error::StoreError;

/// Persistent collection of withdrawal records
///
/// A successful `insert` is immediately visible to `find_by_id`.
#[async_trait]
pub trait WithdrawalStore: Send + Sync {
    /// Assign an id and creation timestamp, store as pending
    async fn insert(&self, new: NewWithdrawal) -> Result<WithdrawalRequest, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<WithdrawalRequest>, StoreError>;

    /// Every record, oldest first
    async fn find_all(&self) -> Result<Vec<WithdrawalRequest>, StoreError>;

    /// Records created by `user_id`, oldest first
    async fn find_by_owner(&self, user_id: &str) -> Result<Vec<WithdrawalRequest>, StoreError>;

    /// Set `next` only if the record is currently `expected`, in one operation.
    ///
    /// Returns `false` when the record is missing or in another status.
    /// Clears any processing claim on success.
    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: WithdrawalStatus,
        next: WithdrawalStatus,
    ) -> Result<bool, StoreError>;

    /// Mark a pending record as having a payout in flight.
    ///
    /// Succeeds only if the record is pending and unclaimed, or its previous
    /// claim is older than `lease`. Returns the claimed record.
    async fn try_claim(
        &self,
        id: &str,
        lease: Duration,
    ) -> Result<Option<WithdrawalRequest>, StoreError>;

    /// Restart the lease on a live claim.
    ///
    /// Returns `false` when the record is missing, no longer pending or
    /// not claimed.
    async fn renew_claim(&self, id: &str) -> Result<bool, StoreError>;

    /// Drop the processing claim; status is untouched
    async fn release_claim(&self, id: &str) -> Result<(), StoreError>;

    /// Overwrite the status of an existing record.
    ///
    /// Transitions the state machine forbids are rejected.
    async fn update_status(
        &self,
        id: &str,
        status: WithdrawalStatus,
    ) -> Result<WithdrawalRequest, StoreError> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        current.status.transition(status)?;

        if !self.compare_and_set_status(id, current.status, status).await? {
            // Lost a race with another writer; report what it left behind
            let now = self
                .find_by_id(id)
                .await?
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            return Err(StoreError::InvalidTransition {
                from: now.status,
                to: status,
            });
        }

        Ok(WithdrawalRequest { status, ..current })
    }
}

/// Generate a new withdrawal identifier
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
