//! HTTP handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use cashout_auth::AuthError;
use cashout_core::{WithdrawalDraft, WithdrawalRequest};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub const WELCOME: &str = "Cashout withdrawal service is running";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub record: WithdrawalRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProcessRequest {
    pub withdrawal_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResponse {
    pub message: &'static str,
    pub payout_result: serde_json::Value,
}

pub async fn root() -> &'static str {
    WELCOME
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    let user_id = request.user_id.unwrap_or_default();

    match state.signer.issue(&user_id) {
        Ok(issued) => {
            tracing::info!(user_id = %issued.claims.sub, "Issued token");
            Ok(Json(LoginResponse {
                token: issued.token,
            }))
        }
        Err(AuthError::MissingSubject) => Err(ApiError::bad_request(
            "missing required fields: userId",
        )),
        Err(err) => {
            tracing::error!(error = %err, "Could not issue token");
            Err(ApiError::internal("failed to issue token"))
        }
    }
}

pub async fn create_withdrawal(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<WithdrawalDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(draft) = payload?;

    let record = state
        .workflow
        .submit(&user.user_id, draft)
        .await
        .map_err(|e| ApiError::from_workflow(e, "failed to register withdrawal"))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "withdrawal request registered",
            record,
        }),
    ))
}

pub async fn process_withdrawal(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessedResponse>, ApiError> {
    let Json(request) = payload?;
    let id = request
        .withdrawal_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing required fields: withdrawalId"))?;

    tracing::info!(withdrawal_id = %id, user_id = %user.user_id, "Processing withdrawal");

    let processed = state
        .workflow
        .process(&id)
        .await
        .map_err(|e| ApiError::from_workflow(e, "failed to process withdrawal"))?;

    Ok(Json(ProcessedResponse {
        message: "withdrawal approved and paid out",
        payout_result: processed.receipt.payload,
    }))
}

pub async fn list_withdrawals(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<WithdrawalRequest>>, ApiError> {
    let withdrawals = state
        .workflow
        .list(&user.user_id)
        .await
        .map_err(|e| ApiError::from_workflow(e, "failed to list withdrawals"))?;

    Ok(Json(withdrawals))
}
