//! Realm storage provider trait.

use async_trait::async_trait;
use kc_model::Realm;
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for realm storage operations.
///
/// Methods take `&mut self` because they run inside one store transaction.
#[async_trait]
pub trait RealmProvider: Send {
    /// Creates a new realm.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if a realm with the same ID exists.
    async fn create_realm(&mut self, realm: &Realm) -> StorageResult<()>;

    /// Updates an existing realm.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the realm doesn't exist.
    async fn update_realm(&mut self, realm: &Realm) -> StorageResult<()>;

    /// Deletes a realm and everything it owns.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the realm doesn't exist.
    async fn delete_realm(&mut self, id: Uuid) -> StorageResult<()>;

    /// Gets a realm by ID.
    async fn get_realm(&mut self, id: Uuid) -> StorageResult<Option<Realm>>;

    /// Lists all realms ordered by name.
    async fn list_realms(&mut self) -> StorageResult<Vec<Realm>>;

    /// Checks if a realm exists.
    async fn realm_exists(&mut self, id: Uuid) -> StorageResult<bool> {
        Ok(self.get_realm(id).await?.is_some())
    }
}
