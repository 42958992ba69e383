//! In-memory withdrawal store

use async_trait::async_trait;
use cashout_core::{NewWithdrawal, WithdrawalRequest, WithdrawalStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::{new_id, WithdrawalStore};

#[derive(Debug, Clone)]
struct Slot {
    seq: u64,
    record: WithdrawalRequest,
    claimed_at: Option<Instant>,
}

/// Process-local store, mainly for tests
#[derive(Clone, Default)]
pub struct InMemoryWithdrawalStore {
    slots: Arc<RwLock<HashMap<String, Slot>>>,
    next_seq: Arc<AtomicU64>,
}

impl InMemoryWithdrawalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    async fn collect<F>(&self, keep: F) -> Vec<WithdrawalRequest>
    where
        F: Fn(&WithdrawalRequest) -> bool,
    {
        let slots = self.slots.read().await;
        let mut matching: Vec<&Slot> = slots.values().filter(|s| keep(&s.record)).collect();
        matching.sort_by_key(|s| s.seq);
        matching.into_iter().map(|s| s.record.clone()).collect()
    }
}

#[async_trait]
impl WithdrawalStore for InMemoryWithdrawalStore {
    async fn insert(&self, new: NewWithdrawal) -> Result<WithdrawalRequest, StoreError> {
        let record = WithdrawalRequest::create(new_id(), new, Utc::now());
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);

        let mut slots = self.slots.write().await;
        slots.insert(
            record.id.clone(),
            Slot {
                seq,
                record: record.clone(),
                claimed_at: None,
            },
        );
        Ok(record)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<WithdrawalRequest>, StoreError> {
        Ok(self.slots.read().await.get(id).map(|s| s.record.clone()))
    }

    async fn find_all(&self) -> Result<Vec<WithdrawalRequest>, StoreError> {
        Ok(self.collect(|_| true).await)
    }

    async fn find_by_owner(&self, user_id: &str) -> Result<Vec<WithdrawalRequest>, StoreError> {
        Ok(self.collect(|r| r.is_owned_by(user_id)).await)
    }

    async fn compare_and_set_status(
        &self,
        id: &str,
        expected: WithdrawalStatus,
        next: WithdrawalStatus,
    ) -> Result<bool, StoreError> {
        expected.transition(next)?;

        let mut slots = self.slots.write().await;
        match slots.get_mut(id) {
            Some(slot) if slot.record.status == expected => {
                slot.record.status = next;
                slot.claimed_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn try_claim(
        &self,
        id: &str,
        lease: Duration,
    ) -> Result<Option<WithdrawalRequest>, StoreError> {
        let mut slots = self.slots.write().await;
        let Some(slot) = slots.get_mut(id) else {
            return Ok(None);
        };

        let free = match slot.claimed_at {
            None => true,
            Some(at) => at.elapsed() > lease,
        };
        if !slot.record.is_pending() || !free {
            return Ok(None);
        }

        slot.claimed_at = Some(Instant::now());
        Ok(Some(slot.record.clone()))
    }

    async fn renew_claim(&self, id: &str) -> Result<bool, StoreError> {
        let mut slots = self.slots.write().await;
        match slots.get_mut(id) {
            Some(slot) if slot.record.is_pending() && slot.claimed_at.is_some() => {
                slot.claimed_at = Some(Instant::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_claim(&self, id: &str) -> Result<(), StoreError> {
        if let Some(slot) = self.slots.write().await.get_mut(id) {
            slot.claimed_at = None;
        }
        Ok(())
    }
}
