//! End-to-End Integration Tests
//!
//! These tests drive the realm core through the session factory exactly as
//! an embedding application would, against the in-memory store. The
//! `postgres_store` tests use testcontainers for an ephemeral `PostgreSQL`
//! instance and are ignored unless Docker is available.

mod common;
mod credentials;
mod postgres_store;
mod realm_lifecycle;
mod roles;
mod unit_of_work;
