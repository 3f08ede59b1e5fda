//! # kc-storage
//!
//! Identity store abstraction for the realm core.
//!
//! This crate defines the interfaces that concrete storage backends
//! (in-memory, SQL) implement. All reads and writes happen inside a
//! [`StoreTransaction`] obtained from an [`IdentityStore`]; nothing is
//! visible to other transactions until it commits.
//!
//! ## Provider Traits
//!
//! - [`RealmProvider`] - CRUD operations for realms
//! - [`RoleProvider`] - CRUD operations for roles
//! - [`UserProvider`] - CRUD operations for users and role grants
//! - [`CredentialProvider`] - stored credentials keyed by type

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credential;
pub mod error;
pub mod realm;
pub mod role;
pub mod transaction;
pub mod user;

pub use credential::CredentialProvider;
pub use error::{StorageError, StorageResult};
pub use realm::RealmProvider;
pub use role::RoleProvider;
pub use transaction::{IdentityStore, StoreTransaction};
pub use user::UserProvider;
