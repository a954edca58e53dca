use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::ProfileData;
use crate::account::errors::AccountError;
use crate::account::models::EmailAddress;
use crate::account::models::UpdateProfileCommand;
use crate::account::ports::AccountServicePort;
use crate::inbound::http::middleware::CurrentAccount;
use crate::inbound::http::router::AppState;

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<ApiSuccess<ProfileData>, ApiError> {
    let Json(body) = body?;
    tracing::debug!(
        account_id = %current.account_id,
        handle = %current.handle,
        new_handle = %body.username,
        "Profile update requested"
    );

    state
        .account_service
        .update_profile(&current.account_id, body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}

/// HTTP request body for updating the caller's profile (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateProfileRequest {
    username: String,
    email: String,
}

impl UpdateProfileRequest {
    fn try_into_command(self) -> Result<UpdateProfileCommand, AccountError> {
        Ok(UpdateProfileCommand {
            handle: EmailAddress::new(self.username)?,
            email: EmailAddress::new(self.email)?,
        })
    }
}
