use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Lifetime of every issued token.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Identity claims embedded in a bearer token.
///
/// A point-in-time snapshot of the account: later changes to the account
/// are not visible until a new token is issued. Serialized names match the
/// claims other services read (`user_id`, `username`, `name`, `email`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Account identifier
    #[serde(rename = "user_id")]
    pub subject_id: String,

    /// Login handle (an email address)
    #[serde(rename = "username")]
    pub handle: String,

    #[serde(rename = "name")]
    pub display_name: String,

    pub email: String,

    /// Issued at (Unix timestamp)
    #[serde(rename = "iat")]
    pub issued_at: i64,

    /// Expiration time (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: i64,

    /// Unique per issuance, so two tokens for the same account never coincide
    #[serde(rename = "jti")]
    pub token_id: String,
}

impl Claims {
    /// Create claims issued at `issued_at` and valid for [`TOKEN_LIFETIME_HOURS`].
    ///
    /// # Arguments
    /// * `subject_id` - Unique account identifier
    /// * `handle` - Login handle
    /// * `display_name` - Display name
    /// * `email` - Email address
    /// * `issued_at` - Issuance instant
    ///
    /// # Returns
    /// Claims with `expires_at = issued_at + 24h` and a fresh random `jti`
    pub fn new(
        subject_id: impl ToString,
        handle: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let expiration = issued_at + Duration::hours(TOKEN_LIFETIME_HOURS);

        Self {
            subject_id: subject_id.to_string(),
            handle: handle.into(),
            display_name: display_name.into(),
            email: email.into(),
            issued_at: issued_at.timestamp(),
            expires_at: expiration.timestamp(),
            token_id: Uuid::new_v4().to_string(),
        }
    }

    /// Check if the token is expired at `current_timestamp`.
    ///
    /// The expiry instant itself is already outside the validity window.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.expires_at
    }
}
