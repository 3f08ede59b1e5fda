//! Credential storage provider trait.

use async_trait::async_trait;
use kc_model::{CredentialType, StoredCredential};
use uuid::Uuid;

use crate::error::StorageResult;

/// Provider for credential storage operations.
///
/// ## Security Note
///
/// Implementations receive credentials that were already transformed by
/// the credential policy and must never log `secret_data`.
#[async_trait]
pub trait CredentialProvider: Send {
    /// Stores a credential, replacing any credential of the same type the
    /// user already has.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::NotFound` if the user doesn't exist.
    async fn upsert_credential(&mut self, credential: &StoredCredential) -> StorageResult<()>;

    /// Gets the credential of the given type for a user (if any).
    async fn get_credential(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
        credential_type: CredentialType,
    ) -> StorageResult<Option<StoredCredential>>;

    /// Lists all credentials for a user.
    async fn list_credentials(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Vec<StoredCredential>>;

    /// Deletes the credential of the given type. Missing credentials are a no-op.
    async fn delete_credential(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
        credential_type: CredentialType,
    ) -> StorageResult<()>;

    /// Checks if a user has a credential of the specified type.
    async fn has_credential_type(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
        credential_type: CredentialType,
    ) -> StorageResult<bool> {
        Ok(self
            .get_credential(realm_id, user_id, credential_type)
            .await?
            .is_some())
    }
}
