//! # kc-storage-sql
//!
//! `PostgreSQL` identity store built on `SQLx`.
//!
//! Every unit of work runs inside one database transaction obtained from
//! [`PgIdentityStore::begin`](kc_storage::IdentityStore::begin). The schema
//! lives in the workspace `migrations/` directory and is applied with
//! [`PgIdentityStore::migrate`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod convert;
mod credential;
mod entities;
pub mod error;
pub mod pool;
mod realm;
mod role;
mod store;
mod user;

pub use pool::{PoolConfig, create_pool};
pub use store::{PgIdentityStore, PgTransaction};
