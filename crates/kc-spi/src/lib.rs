//! # kc-spi
//!
//! Transactional unit of work for the realm core.
//!
//! ## Design
//!
//! - [`KeycloakSessionFactory`] - opened once over an identity store, shut
//!   down once after every session is closed
//! - [`KeycloakSession`] - one unit of work; every realm operation takes it
//!   as `&mut`, so a session is only ever used by one caller at a time

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod factory;
pub mod session;

pub use factory::KeycloakSessionFactory;
pub use session::{KeycloakSession, SharedRealm, TransactionState};
