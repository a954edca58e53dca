use thiserror::Error;

/// Error type for token operations.
///
/// `MalformedToken`, `InvalidSignature` and `Expired` are the rejection
/// outcomes of verification; `EncodingFailed` only occurs when signing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    MalformedToken(String),

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    Expired,
}
