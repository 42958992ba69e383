//! Gateway error types

use cashout_core::PayoutMethod;
use thiserror::Error;

/// Payout gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No bank code configured for the payout method
    #[error("No gateway bank code configured for payout method {0}")]
    MissingBankCode(PayoutMethod),

    /// The gateway refused our credentials
    #[error("Gateway authentication failed: {0}")]
    Authentication(String),

    /// The gateway answered but declined the payout
    #[error("Gateway rejected payout (status {status:?}): {message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    /// No answer within the configured timeout
    #[error("Gateway request timed out")]
    Timeout,

    /// Connection or protocol failure
    #[error("Gateway transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The gateway answered with something we cannot read
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Transport(err)
        }
    }
}

impl GatewayError {
    /// Whether the gateway itself declined (as opposed to an outage or a local problem)
    pub fn is_rejection(&self) -> bool {
        matches!(self, GatewayError::Rejected { .. })
    }
}
