//! # Cashout Workflow
//!
//! Request-level operations over an injected store and payout gateway.
//!
//! ## Operations
//! - `submit`: validate input, persist a pending withdrawal
//! - `process`: claim a pending withdrawal, pay it out, mark it approved
//! - `list`: every withdrawal, or only the caller's
//!
//! ## Guarantees
//! - A withdrawal is paid out at most once, even under concurrent `process` calls
//! - Gateway calls are never retried automatically

mod config;
mod error;
mod workflow;

pub use config::{FailurePolicy, ListScope, ParsePolicyError, WorkflowConfig};
pub use error::WorkflowError;
pub use workflow::{ProcessedWithdrawal, WithdrawalWorkflow};
