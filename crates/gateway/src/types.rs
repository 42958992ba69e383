//! Core gateway types

use async_trait::async_trait;
use cashout_core::WithdrawalRequest;
use serde::{Deserialize, Serialize};

use crate::GatewayError;

/// Merchant-side metadata attached to every payout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantProfile {
    pub description: String,
    pub currency: String,
    pub country: String,
    pub customer_name: String,
    pub customer_last_name: String,
    pub customer_email: String,
    pub url_response: String,
    pub url_confirmation: String,
    pub test_mode: bool,
}

impl Default for MerchantProfile {
    fn default() -> Self {
        Self {
            description: "Retiro".to_string(),
            currency: "COP".to_string(),
            country: "CO".to_string(),
            customer_name: "Usuario".to_string(),
            customer_last_name: "Cashout".to_string(),
            customer_email: "usuario@example.com".to_string(),
            url_response: "http://localhost:5000/respuesta".to_string(),
            url_confirmation: "http://localhost:5000/confirmacion".to_string(),
            test_mode: false,
        }
    }
}

/// Body of a payout call, in the gateway's wire format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRequest {
    pub bank: String,
    pub invoice: String,
    pub description: String,
    pub value: String,
    pub tax: String,
    pub tax_base: String,
    pub currency: String,
    pub type_person: String,
    pub doc_type: String,
    pub doc_number: String,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub country: String,
    pub cell_phone: String,
    pub url_response: String,
    pub url_confirmation: String,
    pub method_confirmation: String,
    pub test_mode: bool,
}

impl PayoutRequest {
    /// Build the payout for a stored withdrawal; `bank` is the gateway code
    /// selected for its payout method.
    pub fn for_withdrawal(
        withdrawal: &WithdrawalRequest,
        merchant: &MerchantProfile,
        bank: impl Into<String>,
    ) -> Self {
        let value = withdrawal.amount.value().to_string();
        Self {
            bank: bank.into(),
            invoice: withdrawal.id.clone(),
            description: merchant.description.clone(),
            tax_base: value.clone(),
            value,
            tax: "0".to_string(),
            currency: merchant.currency.clone(),
            // natural person
            type_person: "0".to_string(),
            doc_type: withdrawal.id_document_type.code().to_string(),
            doc_number: withdrawal.id_document_number.clone(),
            name: merchant.customer_name.clone(),
            last_name: merchant.customer_last_name.clone(),
            email: merchant.customer_email.clone(),
            country: merchant.country.clone(),
            cell_phone: withdrawal.account_number.clone(),
            url_response: merchant.url_response.clone(),
            url_confirmation: merchant.url_confirmation.clone(),
            method_confirmation: "POST".to_string(),
            test_mode: merchant.test_mode,
        }
    }
}

/// What the gateway answered for an accepted payout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutReceipt {
    /// Gateway-side reference, when the response carries one
    pub reference: Option<String>,
    /// Full response body, passed back to the client untouched
    pub payload: serde_json::Value,
}

impl PayoutReceipt {
    pub fn from_payload(payload: serde_json::Value) -> Self {
        let reference = ["ref_payco", "refPayco", "transactionID", "reference"]
            .iter()
            .find_map(|key| find_scalar(&payload, key));
        Self { reference, payload }
    }
}

fn find_scalar(value: &serde_json::Value, key: &str) -> Option<String> {
    let found = value
        .get(key)
        .or_else(|| value.get("data").and_then(|data| data.get(key)))?;
    match found {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// External payout service
///
/// One call per approved withdrawal. Implementations must not retry a
/// payout on their own: a retried disbursement can pay twice.
#[async_trait]
pub trait PayoutGateway: Send + Sync {
    /// Get the gateway name (for logging)
    fn name(&self) -> &str;

    /// Disburse a payout and wait for the gateway's verdict
    async fn disburse(&self, request: &PayoutRequest) -> Result<PayoutReceipt, GatewayError>;
}
