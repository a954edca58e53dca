use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::AuthenticatedAccount;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    let Json(body) = body?;

    // Handle parsing happens inside the service so a malformed handle
    // fails exactly like an unknown one.
    state
        .account_service
        .login(&body.username, &body.password)
        .await
        .map_err(ApiError::from)
        .map(|ref logged_in| ApiSuccess::new(StatusCode::OK, logged_in.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub access_token: String,
    pub token_type: String,
    pub user_id: String,
    pub username: String,
    pub name: String,
}

impl From<&AuthenticatedAccount> for LoginResponseData {
    fn from(logged_in: &AuthenticatedAccount) -> Self {
        Self {
            access_token: logged_in.token.clone(),
            token_type: "Bearer".to_string(),
            user_id: logged_in.account.id.to_string(),
            username: logged_in.account.handle.as_str().to_string(),
            name: logged_in.account.display_name.as_str().to_string(),
        }
    }
}
