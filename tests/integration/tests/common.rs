//! Common test utilities and fixtures.

use std::sync::Arc;

use kc_auth::{PasswordHasherService, PasswordPolicy};
use kc_core::config::RealmDefaults;
use kc_realm::{RealmManager, RealmModel};
use kc_spi::{KeycloakSession, KeycloakSessionFactory};
use kc_storage::IdentityStore;
use kc_storage_mem::InMemoryIdentityStore;

/// Installs a test subscriber once per binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("kc_realm=debug,kc_spi=debug,kc_storage_mem=debug")
        .with_test_writer()
        .try_init();
}

/// A session factory over a fresh store plus a realm manager.
pub struct TestEnv {
    pub factory: KeycloakSessionFactory,
    pub manager: RealmManager,
}

impl TestEnv {
    /// Creates an environment over an empty in-memory store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryIdentityStore::new()))
    }

    /// Creates an environment over the given store.
    pub fn with_store(store: Arc<dyn IdentityStore>) -> Self {
        init_tracing();
        // Minimal Argon2 costs keep the suite fast
        let hasher = PasswordHasherService::new(PasswordPolicy::new().memory_cost(1024).time_cost(1));
        Self {
            factory: KeycloakSessionFactory::open(store),
            manager: RealmManager::new(RealmDefaults::default(), Arc::new(hasher)),
        }
    }

    /// Creates and begins a session.
    pub async fn session(&self) -> anyhow::Result<KeycloakSession> {
        let mut session = self.factory.create_session()?;
        session.begin().await?;
        Ok(session)
    }

    /// Creates and commits a realm, returning its ID.
    pub async fn committed_realm(&self, name: &str) -> anyhow::Result<uuid::Uuid> {
        let mut session = self.session().await?;
        let realm = self.manager.create_realm(&mut session, name).await?;
        session.commit().await?;
        session.close().await?;
        Ok(realm.id())
    }

    /// Loads a committed realm into `session`.
    pub async fn realm(
        &self,
        session: &mut KeycloakSession,
        id: uuid::Uuid,
    ) -> anyhow::Result<RealmModel> {
        self.manager
            .get_realm(session, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("realm {id} not found"))
    }
}
