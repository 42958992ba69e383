//! # Cashout Withdrawal Store
//!
//! Persistent keyed collection of withdrawal records.
//!
//! ## Features
//! - `SqliteWithdrawalStore`: single `withdrawals` table through sqlx
//! - `InMemoryWithdrawalStore`: process-local map for tests and demos
//! - Atomic compare-and-set status updates
//! - Processing claims with a lease, so one payout call runs per record

mod error;
mod memory;
mod sqlite;
mod store;

pub use error::StoreError;
pub use memory::InMemoryWithdrawalStore;
pub use sqlite::SqliteWithdrawalStore;
pub use store::WithdrawalStore;
