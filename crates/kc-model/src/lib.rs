//! # kc-model
//!
//! Domain models for the realm core (Realm, Role, User, credentials).
//!
//! This crate defines the plain data entities persisted by the identity
//! store. Behaviour that needs a unit of work lives in `kc-realm`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credential;
pub mod realm;
pub mod role;
pub mod user;

pub use credential::{
    CredentialPolicy, CredentialType, PasswordCredentialData, RequiredCredential,
    StoredCredential, UserCredential,
};
pub use realm::Realm;
pub use role::Role;
pub use user::User;
