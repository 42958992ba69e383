//! Integration tests for the withdrawal stores
//!
//! Every backend must honour the same contract, so each scenario runs
//! against both the SQLite and the in-memory implementation.

use cashout_core::{Amount, DocumentType, NewWithdrawal, PayoutMethod, WithdrawalStatus};
use cashout_store::{InMemoryWithdrawalStore, SqliteWithdrawalStore, StoreError, WithdrawalStore};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn withdrawal(user: &str, amount: i64) -> NewWithdrawal {
    NewWithdrawal {
        user_id: user.to_string(),
        amount: Amount::new(Decimal::new(amount, 0)).unwrap(),
        payout_method: PayoutMethod::Bancolombia,
        account_number: "0012345678".to_string(),
        id_document_type: DocumentType::ForeignId,
        id_document_number: "E-998".to_string(),
    }
}

async fn backends() -> Vec<(&'static str, Arc<dyn WithdrawalStore>)> {
    vec![
        (
            "sqlite",
            Arc::new(SqliteWithdrawalStore::in_memory().await.unwrap()) as Arc<dyn WithdrawalStore>,
        ),
        ("memory", Arc::new(InMemoryWithdrawalStore::new())),
    ]
}

/// Test: insert is visible to find_by_id and starts pending
#[tokio::test]
async fn test_insert_visible_and_pending() {
    for (name, store) in backends().await {
        let stored = store.insert(withdrawal("alice", 250)).await.unwrap();
        let found = store.find_by_id(&stored.id).await.unwrap();

        assert_eq!(found.as_ref(), Some(&stored), "{name}");
        assert_eq!(stored.status, WithdrawalStatus::Pending, "{name}");
        assert_eq!(stored.amount.value(), Decimal::new(250, 0), "{name}");
    }
}

/// Test: find_all returns everything in creation order, find_by_owner filters
#[tokio::test]
async fn test_listing_all_and_by_owner() {
    for (name, store) in backends().await {
        let a1 = store.insert(withdrawal("alice", 10)).await.unwrap();
        let b1 = store.insert(withdrawal("bob", 20)).await.unwrap();
        let a2 = store.insert(withdrawal("alice", 30)).await.unwrap();

        let all: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(all, vec![a1.id.clone(), b1.id.clone(), a2.id.clone()], "{name}");

        let alice = store.find_by_owner("alice").await.unwrap();
        assert_eq!(alice.len(), 2, "{name}");
        assert!(alice.iter().all(|r| r.user_id == "alice"), "{name}");

        assert!(store.find_by_owner("carol").await.unwrap().is_empty(), "{name}");
    }
}

/// Test: update_status follows the state machine
#[tokio::test]
async fn test_update_status_respects_transitions() {
    for (name, store) in backends().await {
        let stored = store.insert(withdrawal("alice", 10)).await.unwrap();

        let updated = store
            .update_status(&stored.id, WithdrawalStatus::Failed)
            .await
            .unwrap();
        assert_eq!(updated.status, WithdrawalStatus::Failed, "{name}");

        let again = store
            .update_status(&stored.id, WithdrawalStatus::Approved)
            .await;
        assert!(
            matches!(again, Err(StoreError::InvalidTransition { .. })),
            "{name}"
        );

        let missing = store.update_status("missing", WithdrawalStatus::Approved).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))), "{name}");
    }
}

/// Test: compare-and-set refuses illegal transitions outright
#[tokio::test]
async fn test_compare_and_set_rejects_reentering_pending() {
    for (name, store) in backends().await {
        let stored = store.insert(withdrawal("alice", 10)).await.unwrap();
        let result = store
            .compare_and_set_status(&stored.id, WithdrawalStatus::Approved, WithdrawalStatus::Pending)
            .await;
        assert!(
            matches!(result, Err(StoreError::InvalidTransition { .. })),
            "{name}"
        );
    }
}

/// Test: only one of many concurrent claimers wins
#[tokio::test]
async fn test_concurrent_claims_single_winner() {
    for (name, store) in backends().await {
        let stored = store.insert(withdrawal("alice", 10)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let id = stored.id.clone();
            handles.push(tokio::spawn(async move {
                store.try_claim(&id, Duration::from_secs(60)).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1, "{name}");
    }
}

/// Test: renewing restarts the lease; only live claims can be renewed
#[tokio::test]
async fn test_renewed_claim_outlives_original_lease() {
    for (name, store) in backends().await {
        let stored = store.insert(withdrawal("alice", 10)).await.unwrap();
        let lease = Duration::from_millis(200);

        assert!(!store.renew_claim(&stored.id).await.unwrap(), "{name}");
        assert!(store.try_claim(&stored.id, lease).await.unwrap().is_some(), "{name}");

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(store.renew_claim(&stored.id).await.unwrap(), "{name}");
        tokio::time::sleep(Duration::from_millis(120)).await;

        // 240ms after the claim, 120ms after the renewal
        assert!(store.try_claim(&stored.id, lease).await.unwrap().is_none(), "{name}");

        store.release_claim(&stored.id).await.unwrap();
        assert!(!store.renew_claim(&stored.id).await.unwrap(), "{name}");
        assert!(!store.renew_claim("missing").await.unwrap(), "{name}");
    }
}

/// Test: terminal records cannot be claimed
#[tokio::test]
async fn test_claim_refuses_terminal_records() {
    for (name, store) in backends().await {
        let stored = store.insert(withdrawal("alice", 10)).await.unwrap();
        store
            .compare_and_set_status(&stored.id, WithdrawalStatus::Pending, WithdrawalStatus::Approved)
            .await
            .unwrap();

        let claim = store
            .try_claim(&stored.id, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(claim.is_none(), "{name}");
        assert!(store
            .try_claim("missing", Duration::from_secs(60))
            .await
            .unwrap()
            .is_none());
    }
}

/// Test: a SQLite file survives reconnecting
#[tokio::test]
async fn test_sqlite_file_persists_across_connections() {
    let temp_dir = TempDir::new().unwrap();
    let url = format!(
        "sqlite:{}?mode=rwc",
        temp_dir.path().join("cashout.db").display()
    );

    let id = {
        let store = SqliteWithdrawalStore::connect(&url).await.unwrap();
        let stored = store.insert(withdrawal("alice", 75)).await.unwrap();
        store.pool().close().await;
        stored.id
    };

    let store = SqliteWithdrawalStore::connect(&url).await.unwrap();
    let found = store.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(found.user_id, "alice");
    assert_eq!(found.payout_method, PayoutMethod::Bancolombia);
    assert_eq!(found.id_document_type, DocumentType::ForeignId);
}

/// Test: an in-memory URL passed to connect behaves as one database
#[tokio::test]
async fn test_sqlite_memory_url_is_one_database() {
    let store = Arc::new(SqliteWithdrawalStore::connect("sqlite::memory:").await.unwrap());

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.insert(withdrawal("alice", 10 + i)).await.unwrap()
        }));
    }
    for handle in handles {
        let stored = handle.await.unwrap();
        assert!(store.find_by_id(&stored.id).await.unwrap().is_some());
    }

    assert_eq!(store.find_all().await.unwrap().len(), 8);
}
