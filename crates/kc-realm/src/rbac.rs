//! Roles, default roles and grants.

use kc_core::event::{Event, EventType};
use kc_core::{Error, Result};
use kc_model::{Role, User};
use kc_spi::KeycloakSession;
use kc_storage::{RoleProvider, UserProvider};
use uuid::Uuid;

use crate::model::RealmModel;
use crate::require_name;

impl RealmModel {
    /// Creates a role in this realm.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a blank name and `Error::Conflict` if
    /// the name is taken in this realm.
    pub async fn add_role(&self, session: &mut KeycloakSession, name: &str) -> Result<Role> {
        let name = require_name("role name", name)?;
        self.bind(session)?;
        let session_id = session.id();
        let tx = session.transaction()?;

        if tx.get_role_by_name(self.id(), name).await?.is_some() {
            return Err(Error::conflict(format!(
                "role '{name}' already exists in realm {}",
                self.id()
            )));
        }

        let role = Role::new(self.id(), name);
        tx.create_role(&role).await?;

        Event::builder(EventType::RoleCreated)
            .realm(self.id())
            .session(session_id)
            .detail("role", name)
            .emit();
        Ok(role)
    }

    /// Returns the role with the given name, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a blank name.
    pub async fn ensure_role(&self, session: &mut KeycloakSession, name: &str) -> Result<Role> {
        require_name("role name", name)?;
        match self.get_role(session, name).await? {
            Some(role) => Ok(role),
            None => self.add_role(session, name).await,
        }
    }

    /// Declares an existing role as a default role of this realm.
    ///
    /// Returns `true` if the declaration list changed.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the role is not in this realm.
    pub async fn mark_default(&mut self, session: &mut KeycloakSession, role: &Role) -> Result<bool> {
        self.require_role(session, role.id).await?;
        let role_id = role.id;
        if !self.stage_if(session, |realm| realm.add_default_role(role_id))? {
            return Ok(false);
        }

        Event::builder(EventType::DefaultRoleAdded)
            .realm(self.id())
            .session(session.id())
            .detail("role", role.name.as_str())
            .emit();
        Ok(true)
    }

    /// Ensures a role named `name` exists and declares it as a default role.
    ///
    /// Idempotent; the declaration order is preserved.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a blank name.
    pub async fn add_default_role(&mut self, session: &mut KeycloakSession, name: &str) -> Result<Role> {
        let role = self.ensure_role(session, name).await?;
        self.mark_default(session, &role).await?;
        Ok(role)
    }

    /// Lists every role of this realm, default roles included.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub async fn get_roles(&self, session: &mut KeycloakSession) -> Result<Vec<Role>> {
        self.bind(session)?;
        Ok(session.transaction()?.list_roles(self.id()).await?)
    }

    /// Looks a role up by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub async fn get_role(&self, session: &mut KeycloakSession, name: &str) -> Result<Option<Role>> {
        self.bind(session)?;
        Ok(session
            .transaction()?
            .get_role_by_name(self.id(), name)
            .await?)
    }

    /// Looks a role up by ID.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub async fn get_role_by_id(
        &self,
        session: &mut KeycloakSession,
        id: Uuid,
    ) -> Result<Option<Role>> {
        self.bind(session)?;
        Ok(session.transaction()?.get_role(self.id(), id).await?)
    }

    /// Returns the default roles in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub async fn get_default_roles(&self, session: &mut KeycloakSession) -> Result<Vec<Role>> {
        self.bind(session)?;
        let ids = self.default_role_ids();
        let tx = session.transaction()?;
        let mut roles = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(role) = tx.get_role(self.id(), id).await? {
                roles.push(role);
            }
        }
        Ok(roles)
    }

    /// Returns the IDs of the default roles in declaration order.
    #[must_use]
    pub fn default_role_ids(&self) -> Vec<Uuid> {
        self.read(|realm| realm.default_roles.clone())
    }

    /// Grants a role to a user. Granting twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the user or role is not in this realm.
    pub async fn grant_role(
        &self,
        session: &mut KeycloakSession,
        user: &User,
        role: &Role,
    ) -> Result<()> {
        self.bind(session)?;
        self.require_membership(user, role)?;
        let session_id = session.id();
        session
            .transaction()?
            .grant_role(self.id(), user.id, role.id)
            .await?;

        Event::builder(EventType::RoleAssignedToUser)
            .realm(self.id())
            .user(user.id)
            .session(session_id)
            .detail("role", role.name.as_str())
            .emit();
        Ok(())
    }

    /// Revokes a role from a user. Revoking a missing grant is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the user or role is not in this realm.
    pub async fn revoke_role(
        &self,
        session: &mut KeycloakSession,
        user: &User,
        role: &Role,
    ) -> Result<()> {
        self.bind(session)?;
        self.require_membership(user, role)?;
        let session_id = session.id();
        session
            .transaction()?
            .revoke_role(self.id(), user.id, role.id)
            .await?;

        Event::builder(EventType::RoleUnassignedFromUser)
            .realm(self.id())
            .user(user.id)
            .session(session_id)
            .detail("role", role.name.as_str())
            .emit();
        Ok(())
    }

    /// Checks whether the user holds the role.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub async fn has_role(
        &self,
        session: &mut KeycloakSession,
        user: &User,
        role: &Role,
    ) -> Result<bool> {
        self.bind(session)?;
        if user.realm_id != self.id() || !role.belongs_to(self.id()) {
            return Ok(false);
        }
        Ok(session
            .transaction()?
            .has_role(self.id(), user.id, role.id)
            .await?)
    }

    /// Lists the roles granted to a user.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub async fn get_user_roles(
        &self,
        session: &mut KeycloakSession,
        user: &User,
    ) -> Result<Vec<Role>> {
        self.bind(session)?;
        let tx = session.transaction()?;
        let ids = tx.get_user_roles(self.id(), user.id).await?;
        let mut roles = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(role) = tx.get_role(self.id(), id).await? {
                roles.push(role);
            }
        }
        Ok(roles)
    }

    /// Deletes a role, its grants and its default declaration.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the role is not in this realm.
    pub async fn remove_role(&mut self, session: &mut KeycloakSession, role: &Role) -> Result<()> {
        self.bind(session)?;
        if !role.belongs_to(self.id()) {
            return Err(role_not_found(role.id, self.id()));
        }
        session
            .transaction()?
            .delete_role(self.id(), role.id)
            .await?;

        let role_id = role.id;
        self.stage_if(session, |realm| realm.remove_default_role(role_id))?;

        Event::builder(EventType::RoleDeleted)
            .realm(self.id())
            .session(session.id())
            .detail("role", role.name.as_str())
            .emit();
        Ok(())
    }

    /// Grants every default role of this realm to a user.
    ///
    /// Nothing calls this implicitly; user-creation logic decides when
    /// default roles apply.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the user is not in this realm.
    pub async fn grant_default_roles(
        &self,
        session: &mut KeycloakSession,
        user: &User,
    ) -> Result<()> {
        for role in self.get_default_roles(session).await? {
            self.grant_role(session, user, &role).await?;
        }
        Ok(())
    }

    async fn require_role(&self, session: &mut KeycloakSession, role_id: Uuid) -> Result<Role> {
        self.get_role_by_id(session, role_id)
            .await?
            .ok_or_else(|| role_not_found(role_id, self.id()))
    }

    fn require_membership(&self, user: &User, role: &Role) -> Result<()> {
        if user.realm_id != self.id() {
            return Err(Error::not_found(format!(
                "user {} not found in realm {}",
                user.id,
                self.id()
            )));
        }
        if !role.belongs_to(self.id()) {
            return Err(role_not_found(role.id, self.id()));
        }
        Ok(())
    }
}

fn role_not_found(role_id: Uuid, realm_id: Uuid) -> Error {
    Error::not_found(format!("role {role_id} not found in realm {realm_id}"))
}
