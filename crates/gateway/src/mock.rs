//! Mock gateway for testing
//!
//! Records every payout it receives and answers with a configurable outcome.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::GatewayError;
use crate::types::{PayoutGateway, PayoutReceipt, PayoutRequest};

/// How the mock answers
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Accept with the given response body
    Approve(serde_json::Value),
    /// Decline with the given message
    Reject(String),
    /// Behave as if the request timed out
    Timeout,
}

impl MockBehavior {
    /// An acceptance carrying reference `MOCK-0001`
    pub fn approved() -> Self {
        MockBehavior::Approve(serde_json::json!({
            "success": true,
            "titleResponse": "OK",
            "data": { "ref_payco": "MOCK-0001", "estado": "Aceptada" }
        }))
    }
}

/// Mock payout gateway
pub struct MockGateway {
    behavior: Mutex<MockBehavior>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    requests: Mutex<Vec<PayoutRequest>>,
}

impl MockGateway {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A gateway that approves everything
    pub fn approving() -> Self {
        Self::new(MockBehavior::approved())
    }

    /// A gateway that declines everything
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self::new(MockBehavior::Reject(message.into()))
    }

    /// Hold every call for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().await = behavior;
    }

    /// Number of payout calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Payout requests received, in order
    pub async fn requests(&self) -> Vec<PayoutRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::approving()
    }
}

#[async_trait]
impl PayoutGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn disburse(&self, request: &PayoutRequest) -> Result<PayoutReceipt, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.behavior.lock().await.clone() {
            MockBehavior::Approve(payload) => Ok(PayoutReceipt::from_payload(payload)),
            MockBehavior::Reject(message) => Err(GatewayError::Rejected {
                status: Some(400),
                message,
            }),
            MockBehavior::Timeout => Err(GatewayError::Timeout),
        }
    }
}
