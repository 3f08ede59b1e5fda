//! Error handling for the realm core.
//!
//! ## NIST 800-53 Rev5: SI-11 (Error Handling)
//!
//! Every failure surfaced by the realm manager, the credential policy engine
//! and the RBAC subsystem maps onto one of the variants below. Storage
//! specific signals are translated at the storage boundary and never leak
//! through as strings the caller would have to parse.

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for realm core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied structurally invalid input (empty name, negative lifespan,
    /// unknown credential type). The operation had no effect.
    #[error("validation error: {0}")]
    Validation(String),

    /// A uniqueness invariant would be violated (duplicate role name or
    /// username within a realm).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced realm, user, role or credential does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Operation attempted outside an active unit of work.
    #[error("invalid unit of work state: {0}")]
    State(String),

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a state error.
    #[must_use]
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Config(_))
    }

    /// Returns whether this error was caused by the caller.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Conflict(_) | Self::NotFound(_) | Self::State(_)
        )
    }

    /// Checks if this is a conflict error.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Checks if this is a state error.
    #[must_use]
    pub const fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }

    /// Checks if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_server_errors() {
        let error = Error::Store("connection reset".to_string());
        assert!(error.is_server_error());
        assert!(!error.is_client_error());
    }

    #[test]
    fn caller_errors_are_client_errors() {
        assert!(Error::validation("empty name").is_client_error());
        assert!(Error::conflict("role 'admin'").is_client_error());
        assert!(Error::not_found("user").is_client_error());
        assert!(Error::state("not active").is_client_error());
    }

    #[test]
    fn display_includes_detail() {
        let error = Error::conflict("role 'admin' already exists");
        assert_eq!(error.to_string(), "conflict: role 'admin' already exists");
        assert!(error.is_conflict());
    }
}
