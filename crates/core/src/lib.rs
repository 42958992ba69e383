//! Cashout Core - Domain types
//!
//! This crate contains the fundamental types shared by every Cashout crate:
//! - `Amount`: decimal wrapper that is always at least one unit
//! - `WithdrawalStatus`: the pending → approved / failed state machine
//! - `PayoutMethod` / `DocumentType`: closed sets accepted from clients
//! - `WithdrawalRequest`: the persisted withdrawal record

pub mod amount;
pub mod payout;
pub mod status;
pub mod withdrawal;

pub use amount::{Amount, AmountError};
pub use payout::{DocumentType, PayoutMethod, UnknownVariant};
pub use status::{InvalidTransition, WithdrawalStatus};
pub use withdrawal::{
    NewWithdrawal, ValidationError, WithdrawalDraft, WithdrawalRequest, SCHEMA_VERSION,
};
