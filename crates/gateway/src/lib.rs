//! Cashout Payout Gateway
//!
//! Outbound disbursement of approved withdrawals.
//! `HttpPayoutGateway` talks to an ePayco-style REST API; `MockGateway`
//! stands in for it in tests.

mod bank_codes;
mod error;
mod http;
mod mock;
mod types;

pub use bank_codes::{BankCodeError, BankCodeTable};
pub use error::GatewayError;
pub use http::{HttpGatewayConfig, HttpPayoutGateway};
pub use mock::{MockBehavior, MockGateway};
pub use types::{MerchantProfile, PayoutGateway, PayoutReceipt, PayoutRequest};
