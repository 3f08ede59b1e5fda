//! Wiring a session factory from configuration.

use std::sync::Arc;

use kc_core::config::{Config, StoreBackend};
use kc_core::Result;
use kc_spi::KeycloakSessionFactory;
use kc_storage::IdentityStore;
use kc_storage_mem::InMemoryIdentityStore;
use kc_storage_sql::{PgIdentityStore, PoolConfig};

/// Builds the configured identity store and opens a session factory on it.
///
/// `PostgreSQL` stores are migrated before the factory is returned.
///
/// # Errors
///
/// Returns `Error::Config` for invalid configuration and a store error if
/// the database cannot be reached or migrated.
pub async fn build_session_factory(config: &Config) -> Result<KeycloakSessionFactory> {
    config.validate()?;

    let store: Arc<dyn IdentityStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(InMemoryIdentityStore::new()),
        StoreBackend::Postgres => {
            let store = PgIdentityStore::connect(&PoolConfig::from(&config.store)).await?;
            store.migrate().await?;
            Arc::new(store)
        }
    };

    tracing::info!(backend = store.backend(), "Identity store ready");
    Ok(KeycloakSessionFactory::open(store))
}
