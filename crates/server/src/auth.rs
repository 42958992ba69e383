//! Bearer-token gate for protected routes

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::{ApiError, INVALID_TOKEN, MISSING_TOKEN};
use crate::state::AppState;

/// The authenticated caller, taken from the `Authorization` header.
///
/// Accepts `Bearer <token>` as well as the bare token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized(MISSING_TOKEN))?;

        let raw = header
            .to_str()
            .map_err(|_| ApiError::unauthorized(INVALID_TOKEN))?;
        let token = extract_token(raw).ok_or_else(|| ApiError::unauthorized(MISSING_TOKEN))?;

        let claims = state.signer.verify(token).map_err(ApiError::from_auth)?;
        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}

/// Strip an optional `Bearer` scheme; `None` when nothing is left
fn extract_token(value: &str) -> Option<&str> {
    let value = value.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}
