//! Credential hashing error types.

use std::fmt;

/// Credential hashing and verification errors.
#[derive(Debug)]
pub enum AuthError {
    /// The supplied value does not match the stored hash.
    InvalidCredentials,
    /// The stored hash could not be parsed.
    MalformedHash(String),
    /// The configured hashing parameters are rejected by Argon2.
    InvalidParameters(String),
    /// Internal error.
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::MalformedHash(msg) => write!(f, "malformed password hash: {msg}"),
            Self::InvalidParameters(msg) => write!(f, "invalid hashing parameters: {msg}"),
            Self::Internal(msg) => write!(f, "internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<AuthError> for kc_core::Error {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidParameters(_) => Self::Config(err.to_string()),
            _ => Self::Store(err.to_string()),
        }
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
