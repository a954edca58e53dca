use std::collections::HashSet;

use chrono::Utc;
use jsonwebtoken::crypto;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::TokenError;

/// JWT token handler for encoding and decoding tokens.
///
/// Uses HS256 (HMAC with SHA-256) only. Tokens whose header names any other
/// algorithm are rejected even when the MAC would otherwise check out.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Returns
    /// JwtHandler instance configured with HS256 algorithm
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        let algorithm = Algorithm::HS256;

        let mut validation = Validation::new(algorithm);
        // Expiry is checked against an explicit clock in `decode_at`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            validation,
        }
    }

    /// Encode claims into a signed JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT token against the current time.
    ///
    /// # Errors
    /// See [`JwtHandler::decode_at`].
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_at(token, Utc::now().timestamp())
    }

    /// Decode and validate a JWT token as of `now` (Unix timestamp).
    ///
    /// The MAC over everything before the last dot is checked before the
    /// segment layout or any JSON is looked at, so tampering with any byte of
    /// a signed token, dots included, surfaces as `InvalidSignature`.
    ///
    /// # Errors
    /// * `MalformedToken` - No dot at all, or a correctly signed body that is
    ///   not `header.payload` carrying a complete claim set
    /// * `InvalidSignature` - MAC mismatch or unexpected header algorithm
    /// * `Expired` - `now` is at or past the `exp` claim
    pub fn decode_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let (message, signature) = split_signature(token)?;

        let signature_matches = crypto::verify(
            signature,
            message.as_bytes(),
            &self.decoding_key,
            self.algorithm,
        )
        .unwrap_or(false);

        if !signature_matches {
            return Err(TokenError::InvalidSignature);
        }

        check_segments(message)?;

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::MalformedToken(e.to_string()),
            })?;

        if claims.is_expired(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

/// Split a compact JWS at its last dot into (signed message, signature).
fn split_signature(token: &str) -> Result<(&str, &str), TokenError> {
    token
        .rsplit_once('.')
        .ok_or_else(|| TokenError::MalformedToken("expected header.payload.signature".to_string()))
}

/// A signed message must still be exactly `header.payload`.
fn check_segments(message: &str) -> Result<(), TokenError> {
    match message.split_once('.') {
        Some((header, payload))
            if !header.is_empty() && !payload.is_empty() && !payload.contains('.') =>
        {
            Ok(())
        }
        _ => Err(TokenError::MalformedToken(
            "expected header.payload.signature".to_string(),
        )),
    }
}
