use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use super::handlers::ApiError;
use crate::account::models::AccountId;
use crate::inbound::http::router::AppState;

/// Identity of the caller, stored in request extensions by [`authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentAccount {
    pub account_id: AccountId,
    pub handle: String,
}

/// Middleware that validates bearer tokens and adds the caller to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req).map_err(IntoResponse::into_response)?;

    let claims = state.authenticator.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Token rejected");
        ApiError::Unauthorized(e.to_string()).into_response()
    })?;

    let account_id = AccountId::from_string(&claims.subject_id).map_err(|e| {
        tracing::warn!(error = %e, "Validly signed token carries a bad subject id");
        ApiError::Unauthorized("Token is malformed: invalid subject id".to_string())
            .into_response()
    })?;

    req.extensions_mut().insert(CurrentAccount {
        account_id,
        handle: claims.handle,
    });

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, ApiError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>".to_string(),
        )
    })
}
