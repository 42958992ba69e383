//! HTTP client for an ePayco-style payout API
//!
//! Flow per payout: `POST {base}/login` with basic auth to obtain a bearer
//! token, then `POST {base}/payment/process/pse` with the payout body. The
//! configured timeout bounds both requests together.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::GatewayError;
use crate::types::{PayoutGateway, PayoutReceipt, PayoutRequest};

const LOGIN_PATH: &str = "/login";
const PAYOUT_PATH: &str = "/payment/process/pse";

/// Connection settings for [`HttpPayoutGateway`]
#[derive(Clone)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub public_key: String,
    pub private_key: String,
    /// Deadline for a whole payout, login included
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpGatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGatewayConfig")
            .field("base_url", &self.base_url)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Payout gateway reached over HTTPS
pub struct HttpPayoutGateway {
    client: reqwest::Client,
    config: HttpGatewayConfig,
}

impl HttpPayoutGateway {
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GatewayError::Transport)?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn login(&self) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .basic_auth(&self.config.public_key, Some(&self.config.private_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Authentication(format!(
                "login returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: LoginResponse = response.json().await?;
        match body.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(GatewayError::Authentication(
                body.error.unwrap_or_else(|| "login response carried no token".to_string()),
            )),
        }
    }

    async fn send_payout(&self, request: &PayoutRequest) -> Result<PayoutReceipt, GatewayError> {
        let token = self.login().await?;

        tracing::debug!(invoice = %request.invoice, bank = %request.bank, "Sending payout");

        let response = self
            .client
            .post(self.url(PAYOUT_PATH))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Rejected {
                status: Some(status.as_u16()),
                message: rejection_message(&text),
            });
        }

        let payload: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if payload.get("success").and_then(serde_json::Value::as_bool) == Some(false) {
            return Err(GatewayError::Rejected {
                status: Some(status.as_u16()),
                message: rejection_message(&text),
            });
        }

        Ok(PayoutReceipt::from_payload(payload))
    }
}

#[async_trait]
impl PayoutGateway for HttpPayoutGateway {
    fn name(&self) -> &str {
        "epayco"
    }

    async fn disburse(&self, request: &PayoutRequest) -> Result<PayoutReceipt, GatewayError> {
        tokio::time::timeout(self.config.timeout, self.send_payout(request))
            .await
            .map_err(|_| GatewayError::Timeout)?
    }
}

/// Best-effort human message out of an error body
fn rejection_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["textResponse", "text_response", "message", "error", "title_response"]
                .iter()
                .find_map(|key| v.get(key).and_then(serde_json::Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_prefers_known_keys() {
        assert_eq!(
            rejection_message(r#"{"success":false,"textResponse":"Fondos insuficientes"}"#),
            "Fondos insuficientes"
        );
        assert_eq!(rejection_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_url_join() {
        let gateway = HttpPayoutGateway::new(HttpGatewayConfig {
            base_url: "https://gateway.test/".to_string(),
            public_key: "pk".to_string(),
            private_key: "sk".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(gateway.url(LOGIN_PATH), "https://gateway.test/login");
    }
}
