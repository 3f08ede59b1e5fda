//! # kc-auth
//!
//! One-way transformation of secret credentials.
//!
//! Passwords are hashed with Argon2id into PHC strings that carry the salt
//! and cost parameters, so verification recomputes with exactly the
//! parameters used at storage time.
//!
//! ## Example
//!
//! ```ignore
//! use kc_auth::PasswordHasherService;
//!
//! let hasher = PasswordHasherService::with_defaults();
//! let hash = hasher.hash("password123")?;
//! hasher.verify("password123", &hash)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod password;

pub use error::{AuthError, AuthResult};
pub use password::{PasswordHasherService, PasswordPolicy};
