//! Realm lifecycle.

use std::sync::Arc;

use kc_auth::PasswordHasherService;
use kc_core::config::{Config, RealmDefaults};
use kc_core::event::{Event, EventType};
use kc_core::Result;
use kc_model::Realm;
use kc_spi::{KeycloakSession, SharedRealm};
use kc_storage::RealmProvider;
use uuid::Uuid;

use crate::model::RealmModel;
use crate::require_name;

/// Creates, finds and deletes realms.
///
/// The manager never commits or rolls back; the caller owns the session.
#[derive(Debug, Clone)]
pub struct RealmManager {
    defaults: RealmDefaults,
    hasher: Arc<PasswordHasherService>,
}

impl Default for RealmManager {
    fn default() -> Self {
        Self::new(
            RealmDefaults::default(),
            Arc::new(PasswordHasherService::with_defaults()),
        )
    }
}

impl RealmManager {
    /// Creates a manager with explicit realm defaults and hasher.
    #[must_use]
    pub const fn new(defaults: RealmDefaults, hasher: Arc<PasswordHasherService>) -> Self {
        Self { defaults, hasher }
    }

    /// Creates a manager from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the password hashing parameters are invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let hasher = PasswordHasherService::from_config(&config.password)?;
        Ok(Self::new(config.realm.clone(), Arc::new(hasher)))
    }

    /// Creates a disabled realm with the configured default lifespans.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a blank name and `Error::State`
    /// outside an active session.
    pub async fn create_realm(
        &self,
        session: &mut KeycloakSession,
        name: &str,
    ) -> Result<RealmModel> {
        let name = require_name("realm name", name)?;
        let realm = Realm::new(name).with_lifespans(
            self.defaults.access_code_lifespan,
            self.defaults.token_lifespan,
        );
        session.transaction()?.create_realm(&realm).await?;

        Event::builder(EventType::RealmCreated)
            .realm(realm.id)
            .session(session.id())
            .detail("name", name)
            .emit();
        let shared = session.attach_realm(realm)?;
        Ok(self.handle(session.id(), shared))
    }

    /// Finds a realm by ID, including changes pending in this session.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside an active session.
    pub async fn get_realm(
        &self,
        session: &mut KeycloakSession,
        id: Uuid,
    ) -> Result<Option<RealmModel>> {
        session.ensure_active()?;
        if let Some(shared) = session.attached_realm(id) {
            return Ok(Some(self.handle(session.id(), shared)));
        }

        let loaded = session.transaction()?.get_realm(id).await?;
        let Some(loaded) = loaded else {
            return Ok(None);
        };
        let shared = session.attach_realm(loaded)?;
        Ok(Some(self.handle(session.id(), shared)))
    }

    /// Lists all realms ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside an active session.
    pub async fn list_realms(&self, session: &mut KeycloakSession) -> Result<Vec<RealmModel>> {
        let loaded = session.transaction()?.list_realms().await?;
        let session_id = session.id();
        let mut realms = loaded
            .into_iter()
            .map(|realm| {
                session
                    .attach_realm(realm)
                    .map(|shared| self.handle(session_id, shared))
            })
            .collect::<Result<Vec<_>>>()?;
        // Pending renames change the order
        realms.sort_by_cached_key(|realm| (realm.name(), realm.id()));
        Ok(realms)
    }

    /// Deletes a realm with its users, roles and credentials.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the realm does not exist.
    pub async fn delete_realm(&self, session: &mut KeycloakSession, id: Uuid) -> Result<()> {
        session.transaction()?.delete_realm(id).await?;
        session.discard_realm(id);

        Event::builder(EventType::RealmDeleted)
            .realm(id)
            .session(session.id())
            .emit();
        Ok(())
    }

    fn handle(&self, session_id: Uuid, realm: SharedRealm) -> RealmModel {
        RealmModel::new(realm, session_id, Arc::clone(&self.hasher))
    }
}
