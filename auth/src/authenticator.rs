use crate::jwt::Claims;
use crate::jwt::JwtHandler;
use crate::jwt::TokenError;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and JWT generation.
///
/// Holds the signing key for the lifetime of the process. Build it once at
/// startup and share it behind an `Arc`; it is never mutated afterwards.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    dummy_hash: String,
}

/// Result of successful authentication.
#[derive(Debug)]
pub struct AuthenticationResult {
    /// JWT access token
    pub access_token: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for JWT signing
    ///
    /// # Returns
    /// Configured Authenticator instance
    ///
    /// # Errors
    /// * `HashingFailed` - The hash used for unknown-account logins could not be computed
    pub fn new(jwt_secret: &[u8]) -> Result<Self, PasswordError> {
        let password_hasher = PasswordHasher::new();
        let dummy_hash = password_hasher.hash("dummy-password-for-timing")?;

        Ok(Self {
            password_hasher,
            jwt_handler: JwtHandler::new(jwt_secret),
            dummy_hash,
        })
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Password too long or hashing failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a password against a stored hash.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Spend the cost of one password verification without a stored hash.
    ///
    /// Used when no account matches a login attempt so that the response
    /// time does not reveal whether the handle exists.
    pub fn verify_dummy_password(&self, password: &str) {
        let _ = self.password_hasher.verify(password, &self.dummy_hash);
    }

    /// Verify credentials and generate JWT token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `claims` - JWT claims to encode in token
    ///
    /// # Returns
    /// AuthenticationResult with access token
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `Token` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        claims: &Claims,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.jwt_handler.encode(claims)?;

        Ok(AuthenticationResult { access_token })
    }

    /// Generate JWT token without password verification.
    ///
    /// Used right after registration, when the password was just set.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token generation failed
    pub fn generate_token(&self, claims: &Claims) -> Result<String, TokenError> {
        self.jwt_handler.encode(claims)
    }

    /// Validate and decode JWT token against the current time.
    ///
    /// # Errors
    /// * `MalformedToken`, `InvalidSignature`, `Expired`
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.jwt_handler.decode(token)
    }

    /// Validate and decode JWT token as of `now` (Unix timestamp).
    pub fn validate_token_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        self.jwt_handler.decode_at(token, now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn claims() -> Claims {
        Claims::new("user123", "a@x.com", "Alice", "a@x.com", Utc::now())
    }

    #[test]
    fn test_authenticate_success() {
        let authenticator = Authenticator::new(b"test_secret_key_at_least_32_bytes!").unwrap();

        let password = "my_password";
        let hash = authenticator
            .hash_password(password)
            .expect("Failed to hash password");

        let result = authenticator
            .authenticate(password, &hash, &claims())
            .expect("Authentication failed");

        assert!(!result.access_token.is_empty());

        let decoded = authenticator
            .validate_token(&result.access_token)
            .expect("Token validation failed");
        assert_eq!(decoded.subject_id, "user123");
        assert_eq!(decoded.handle, "a@x.com");
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let authenticator = Authenticator::new(b"test_secret_key_at_least_32_bytes!").unwrap();

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");

        let result = authenticator.authenticate("wrong_password", &hash, &claims());
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_authenticate_corrupt_stored_hash() {
        let authenticator = Authenticator::new(b"test_secret_key_at_least_32_bytes!").unwrap();

        let result = authenticator.authenticate("my_password", "not-a-phc-string", &claims());
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_generate_and_validate_token() {
        let authenticator = Authenticator::new(b"test_secret_key_at_least_32_bytes!").unwrap();
        let claims = claims();

        let token = authenticator
            .generate_token(&claims)
            .expect("Failed to generate token");

        let decoded = authenticator
            .validate_token(&token)
            .expect("Failed to validate token");
        assert_eq!(decoded, claims);

        assert_eq!(
            authenticator.validate_token_at(&token, claims.expires_at),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_tokens_from_other_process_key_are_rejected() {
        let issuer = Authenticator::new(b"issuer_secret_key_at_least_32_bytes").unwrap();
        let verifier = Authenticator::new(b"verifier_secret_key_at_least_32_byt").unwrap();

        let token = issuer.generate_token(&claims()).unwrap();

        assert_eq!(
            verifier.validate_token(&token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_dummy_hash_is_a_real_hash() {
        let authenticator = Authenticator::new(b"test_secret_key_at_least_32_bytes!").unwrap();

        assert!(authenticator.dummy_hash.starts_with("$argon2id$"));
        assert!(authenticator
            .verify_password("dummy-password-for-timing", &authenticator.dummy_hash));

        authenticator.verify_dummy_password("anything");
        authenticator.verify_dummy_password("anything-else");
    }
}
