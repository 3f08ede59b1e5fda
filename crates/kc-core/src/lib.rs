//! # kc-core
//!
//! Core utilities, configuration, and error handling for the realm core.
//!
//! This crate provides foundational types shared by every other crate in the
//! workspace: the error taxonomy surfaced to callers, process configuration,
//! and the audit event records emitted on realm mutations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;

pub use config::Config;
pub use error::{Error, Result};
