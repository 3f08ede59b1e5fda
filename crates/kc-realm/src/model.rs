//! Realm handle: configuration and users.

use std::sync::Arc;

use kc_auth::PasswordHasherService;
use kc_core::event::{Event, EventType};
use kc_core::{Error, Result};
use kc_model::{Realm, User};
use kc_spi::{KeycloakSession, SharedRealm};
use kc_storage::UserProvider;
use uuid::Uuid;

use crate::require_name;

/// A handle on one realm inside one session.
///
/// Every handle on a realm in the same session shares the session's copy of
/// it. Setters validate their input, then stage the change on that copy; the
/// realm is written to the store when the session commits. Getters return
/// the pending values, whichever handle staged them.
#[derive(Debug, Clone)]
pub struct RealmModel {
    id: Uuid,
    realm: SharedRealm,
    session_id: Uuid,
    pub(crate) hasher: Arc<PasswordHasherService>,
}

impl RealmModel {
    pub(crate) fn new(
        realm: SharedRealm,
        session_id: Uuid,
        hasher: Arc<PasswordHasherService>,
    ) -> Self {
        let id = realm.read().id;
        Self {
            id,
            realm,
            session_id,
            hasher,
        }
    }

    // === Getters ===

    /// Returns the realm ID.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the realm name.
    #[must_use]
    pub fn name(&self) -> String {
        self.read(|realm| realm.name.clone())
    }

    /// Returns whether the realm is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.read(|realm| realm.enabled)
    }

    /// Returns the access code lifespan in seconds.
    #[must_use]
    pub fn access_code_lifespan(&self) -> i32 {
        self.read(|realm| realm.access_code_lifespan)
    }

    /// Returns the token lifespan in seconds.
    #[must_use]
    pub fn token_lifespan(&self) -> i32 {
        self.read(|realm| realm.token_lifespan)
    }

    /// Returns whether cookie login is allowed.
    #[must_use]
    pub fn is_cookie_login_allowed(&self) -> bool {
        self.read(|realm| realm.cookie_login_allowed)
    }

    /// Returns whether users are registered automatically after social login.
    #[must_use]
    pub fn is_automatic_registration_after_social_login(&self) -> bool {
        self.read(|realm| realm.automatic_registration_after_social_login)
    }

    /// Returns the public key PEM.
    #[must_use]
    pub fn public_key_pem(&self) -> Option<String> {
        self.read(|realm| realm.public_key_pem.clone())
    }

    /// Returns the private key PEM.
    #[must_use]
    pub fn private_key_pem(&self) -> Option<String> {
        self.read(|realm| realm.private_key_pem.clone())
    }

    /// Returns a copy of the pending realm data.
    #[must_use]
    pub fn realm(&self) -> Realm {
        self.read(Realm::clone)
    }

    /// Returns the session this handle is bound to.
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Runs `f` against the shared realm. The lock is released on return.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&Realm) -> R) -> R {
        f(&self.realm.read())
    }

    // === Setters ===

    /// Renames the realm.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a blank name.
    pub fn set_name(&mut self, session: &mut KeycloakSession, name: &str) -> Result<()> {
        let name = require_name("realm name", name)?.to_string();
        self.stage(session, |realm| realm.name = name)
    }

    /// Enables or disables the realm.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub fn set_enabled(&mut self, session: &mut KeycloakSession, enabled: bool) -> Result<()> {
        self.stage(session, |realm| realm.enabled = enabled)
    }

    /// Sets the access code lifespan in seconds.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a negative value.
    pub fn set_access_code_lifespan(
        &mut self,
        session: &mut KeycloakSession,
        seconds: i32,
    ) -> Result<()> {
        require_lifespan("access code lifespan", seconds)?;
        self.stage(session, |realm| realm.access_code_lifespan = seconds)
    }

    /// Sets the token lifespan in seconds.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a negative value.
    pub fn set_token_lifespan(&mut self, session: &mut KeycloakSession, seconds: i32) -> Result<()> {
        require_lifespan("token lifespan", seconds)?;
        self.stage(session, |realm| realm.token_lifespan = seconds)
    }

    /// Allows or forbids cookie login.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub fn set_cookie_login_allowed(
        &mut self,
        session: &mut KeycloakSession,
        allowed: bool,
    ) -> Result<()> {
        self.stage(session, |realm| realm.cookie_login_allowed = allowed)
    }

    /// Turns automatic registration after social login on or off.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub fn set_automatic_registration_after_social_login(
        &mut self,
        session: &mut KeycloakSession,
        enabled: bool,
    ) -> Result<()> {
        self.stage(session, |realm| {
            realm.automatic_registration_after_social_login = enabled;
        })
    }

    /// Sets the public key PEM.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub fn set_public_key_pem(
        &mut self,
        session: &mut KeycloakSession,
        pem: impl Into<String>,
    ) -> Result<()> {
        let pem = pem.into();
        self.stage(session, |realm| realm.public_key_pem = Some(pem))
    }

    /// Sets the private key PEM.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub fn set_private_key_pem(
        &mut self,
        session: &mut KeycloakSession,
        pem: impl Into<String>,
    ) -> Result<()> {
        let pem = pem.into();
        self.stage(session, |realm| realm.private_key_pem = Some(pem))
    }

    // === Users ===

    /// Creates a user in this realm.
    ///
    /// Default roles are not granted; see
    /// [`grant_default_roles`](Self::grant_default_roles).
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a blank username and `Error::Conflict`
    /// if the username is taken in this realm.
    pub async fn add_user(&self, session: &mut KeycloakSession, username: &str) -> Result<User> {
        let username = require_name("username", username)?;
        self.bind(session)?;
        let session_id = session.id();
        let tx = session.transaction()?;

        if tx.get_user_by_username(self.id(), username).await?.is_some() {
            return Err(Error::conflict(format!(
                "user '{username}' already exists in realm {}",
                self.id()
            )));
        }

        let user = User::new(self.id(), username);
        tx.create_user(&user).await?;

        Event::builder(EventType::UserCreated)
            .realm(self.id())
            .user(user.id)
            .session(session_id)
            .emit();
        Ok(user)
    }

    /// Looks a user up by username.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub async fn get_user(
        &self,
        session: &mut KeycloakSession,
        username: &str,
    ) -> Result<Option<User>> {
        self.bind(session)?;
        Ok(session
            .transaction()?
            .get_user_by_username(self.id(), username)
            .await?)
    }

    /// Looks a user up by ID.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub async fn get_user_by_id(
        &self,
        session: &mut KeycloakSession,
        id: Uuid,
    ) -> Result<Option<User>> {
        self.bind(session)?;
        Ok(session.transaction()?.get_user(self.id(), id).await?)
    }

    /// Lists the realm's users ordered by username.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub async fn get_users(&self, session: &mut KeycloakSession) -> Result<Vec<User>> {
        self.bind(session)?;
        Ok(session.transaction()?.list_users(self.id()).await?)
    }

    /// Deletes a user together with its credentials and role grants.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the user is not in this realm.
    pub async fn remove_user(&self, session: &mut KeycloakSession, user: &User) -> Result<()> {
        self.bind(session)?;
        if user.realm_id != self.id() {
            return Err(Error::not_found(format!(
                "user {} is not in realm {}",
                user.id,
                self.id()
            )));
        }
        let session_id = session.id();
        session.transaction()?.delete_user(self.id(), user.id).await?;

        Event::builder(EventType::UserDeleted)
            .realm(self.id())
            .user(user.id)
            .session(session_id)
            .emit();
        Ok(())
    }

    // === Session binding ===

    /// Checks that `session` is the active session this handle came from.
    pub(crate) fn bind(&self, session: &KeycloakSession) -> Result<()> {
        if session.id() != self.session_id {
            return Err(Error::state(format!(
                "realm {} belongs to session {}, not {}",
                self.id(),
                self.session_id,
                session.id()
            )));
        }
        session.ensure_active()
    }

    /// Stages a configuration change on the session's copy of the realm.
    pub(crate) fn stage<F>(&mut self, session: &mut KeycloakSession, change: F) -> Result<()>
    where
        F: FnOnce(&mut Realm),
    {
        self.stage_if(session, |realm| {
            change(realm);
            true
        })?;
        Ok(())
    }

    /// Stages a change that reports whether it modified the realm. The
    /// decision is made against the session's copy, not this handle's view.
    pub(crate) fn stage_if<F>(&mut self, session: &mut KeycloakSession, change: F) -> Result<bool>
    where
        F: FnOnce(&mut Realm) -> bool,
    {
        self.bind(session)?;
        session.modify_realm(self.id, change)
    }
}

fn require_lifespan(what: &str, seconds: i32) -> Result<()> {
    if seconds < 0 {
        return Err(Error::validation(format!(
            "{what} must not be negative, got {seconds}"
        )));
    }
    Ok(())
}
