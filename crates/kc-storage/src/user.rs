//! User storage provider trait.

use async_trait::async_trait;
use kc_model::User;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for user storage operations, including role grants.
#[async_trait]
pub trait UserProvider: Send {
    /// Creates a new user.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if a user with the same username
    /// exists in the realm.
    async fn create_user(&mut self, user: &User) -> StorageResult<()>;

    /// Deletes a user by ID, together with its credentials and grants.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the user doesn't exist.
    async fn delete_user(&mut self, realm_id: Uuid, id: Uuid) -> StorageResult<()>;

    /// Gets a user by ID.
    async fn get_user(&mut self, realm_id: Uuid, id: Uuid) -> StorageResult<Option<User>>;

    /// Gets a user by username.
    async fn get_user_by_username(
        &mut self,
        realm_id: Uuid,
        username: &str,
    ) -> StorageResult<Option<User>>;

    /// Lists all users of a realm ordered by username.
    async fn list_users(&mut self, realm_id: Uuid) -> StorageResult<Vec<User>>;

    /// Grants a role to a user. Granting twice is a no-op.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the user or role doesn't exist.
    async fn grant_role(&mut self, realm_id: Uuid, user_id: Uuid, role_id: Uuid)
    -> StorageResult<()>;

    /// Revokes a role from a user. Revoking a missing grant is a no-op.
    async fn revoke_role(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> StorageResult<()>;

    /// Checks if a grant exists between the user and the role.
    async fn has_role(&mut self, realm_id: Uuid, user_id: Uuid, role_id: Uuid)
    -> StorageResult<bool>;

    /// Gets the role IDs granted to a user.
    async fn get_user_roles(&mut self, realm_id: Uuid, user_id: Uuid) -> StorageResult<Vec<Uuid>>;
}
