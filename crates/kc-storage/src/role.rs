//! Role storage provider trait.

use async_trait::async_trait;
use kc_model::Role;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for role storage operations.
#[async_trait]
pub trait RoleProvider: Send {
    /// Creates a new role.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if a role with the same name exists
    /// in the realm, and `StorageError::NotFound` if the realm doesn't exist.
    async fn create_role(&mut self, role: &Role) -> StorageResult<()>;

    /// Deletes a role by ID, dropping every grant of it.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the role doesn't exist.
    async fn delete_role(&mut self, realm_id: Uuid, id: Uuid) -> StorageResult<()>;

    /// Gets a role by ID.
    async fn get_role(&mut self, realm_id: Uuid, id: Uuid) -> StorageResult<Option<Role>>;

    /// Gets a role by name.
    async fn get_role_by_name(&mut self, realm_id: Uuid, name: &str)
    -> StorageResult<Option<Role>>;

    /// Lists all roles of a realm ordered by name.
    async fn list_roles(&mut self, realm_id: Uuid) -> StorageResult<Vec<Role>>;
}
