use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Signing secret must not be empty")]
    EmptySecret,

    #[error("Token lifetime must be between 1 second and {max_secs} seconds")]
    InvalidTtl { max_secs: i64 },

    #[error("userId is required")]
    MissingSubject,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Token expired")]
    Expired,
}
