//! API errors and their HTTP mapping
//!
//! Every failure leaves the server as `{ "error": "<text>" }`. Client
//! mistakes carry a descriptive message; failures on our side carry a fixed
//! message and the detail goes to the log.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cashout_auth::AuthError;
use cashout_workflow::WorkflowError;
use serde::Serialize;

pub const MISSING_TOKEN: &str = "access denied: missing token";
pub const INVALID_TOKEN: &str = "invalid token";
pub const INVALID_OR_PROCESSED: &str = "invalid or already processed withdrawal";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// An error response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Map a workflow failure; `failure` is the message shown for server-side errors
    pub fn from_workflow(err: WorkflowError, failure: &'static str) -> Self {
        match err {
            WorkflowError::Validation(_) | WorkflowError::OwnerMismatch => {
                Self::bad_request(err.to_string())
            }
            WorkflowError::InvalidOrProcessed(id) => {
                tracing::info!(withdrawal_id = %id, "Refused to process withdrawal");
                Self::bad_request(INVALID_OR_PROCESSED)
            }
            other => {
                tracing::error!(error = %other, "{failure}");
                Self::internal(failure)
            }
        }
    }

    pub fn from_auth(err: AuthError) -> Self {
        tracing::debug!(reason = %err, "Rejected token");
        Self::unauthorized(INVALID_TOKEN)
    }

    pub fn from_json_rejection(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::from_json_rejection(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashout_core::ValidationError;
    use cashout_gateway::GatewayError;

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = ApiError::from_workflow(
            WorkflowError::Validation(ValidationError::MissingFields(vec!["amount"])),
            "failed",
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "missing required fields: amount");

        let err = ApiError::from_workflow(WorkflowError::InvalidOrProcessed("w-1".into()), "failed");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), INVALID_OR_PROCESSED);
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = ApiError::from_workflow(
            WorkflowError::Gateway(GatewayError::Authentication("bad keys".into())),
            "failed to process withdrawal",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "failed to process withdrawal");
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        let err = ApiError::from_auth(AuthError::Expired);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), INVALID_TOKEN);
    }
}
